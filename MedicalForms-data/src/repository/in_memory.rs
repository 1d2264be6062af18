use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::debug;

use crate::models::medical_record::{
    created_at_search_text, MedicalRecord, MedicalRecordPatch, NewMedicalRecord, CREATED_AT_FIELD,
    SEARCHABLE_FIELDS,
};
use crate::models::RecordId;
use super::errors::RepositoryError;
use super::medical_record::MedicalRecordRepositoryTrait;

/// In-memory storage implementation for medical records.
///
/// Clones share the same storage. Records keep insertion order, which stands
/// in for the document store's natural order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMedicalRecordRepository {
    records: Arc<Mutex<IndexMap<RecordId, MedicalRecord>>>,
}

impl InMemoryMedicalRecordRepository {
    /// Create a new empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.lock().map(|store| store.len()).unwrap_or(0)
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Case-insensitive substring match of an already lowercased needle
fn record_matches(record: &MedicalRecord, needle: &str) -> bool {
    SEARCHABLE_FIELDS.iter().any(|&field| {
        if field == CREATED_AT_FIELD {
            created_at_search_text(&record.created_at).to_lowercase().contains(needle)
        } else {
            record
                .fields
                .get(field)
                .and_then(|value| value.as_text())
                .map_or(false, |text| text.to_lowercase().contains(needle))
        }
    })
}

#[async_trait]
impl MedicalRecordRepositoryTrait for InMemoryMedicalRecordRepository {
    async fn insert(&self, record: NewMedicalRecord) -> Result<MedicalRecord, RepositoryError> {
        let record = record.with_id(RecordId::new());
        debug!("Storing medical record in memory: id={}", record.id);

        let mut store = self.records.lock()?;
        store.insert(record.id, record.clone());
        Ok(record)
    }

    async fn insert_many(&self, records: Vec<NewMedicalRecord>) -> Result<Vec<MedicalRecord>, RepositoryError> {
        let mut store = self.records.lock()?;

        let stored: Vec<MedicalRecord> = records
            .into_iter()
            .map(|record| record.with_id(RecordId::new()))
            .collect();
        for record in &stored {
            store.insert(record.id, record.clone());
        }

        Ok(stored)
    }

    async fn find_all(&self) -> Result<Vec<MedicalRecord>, RepositoryError> {
        let store = self.records.lock()?;
        Ok(store.values().cloned().collect())
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<MedicalRecord>, RepositoryError> {
        let store = self.records.lock()?;
        Ok(store.get(&id).cloned())
    }

    async fn update(&self, id: RecordId, patch: MedicalRecordPatch) -> Result<u64, RepositoryError> {
        let mut store = self.records.lock()?;

        match store.get_mut(&id) {
            Some(record) => {
                patch.apply_to(record);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: RecordId) -> Result<u64, RepositoryError> {
        let mut store = self.records.lock()?;
        Ok(store.shift_remove(&id).map_or(0, |_| 1))
    }

    async fn search(&self, query: &str) -> Result<Vec<MedicalRecord>, RepositoryError> {
        let needle = query.to_lowercase();
        let store = self.records.lock()?;

        Ok(store
            .values()
            .filter(|record| record_matches(record, &needle))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        let _store = self.records.lock()?;
        Ok(())
    }
}
