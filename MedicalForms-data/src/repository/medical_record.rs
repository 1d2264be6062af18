use std::sync::Arc;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};
use tracing::{debug, error};

use crate::database::DatabaseConfig;
use crate::models::medical_record::{MedicalRecord, MedicalRecordPatch, NewMedicalRecord};
use crate::models::RecordId;
use super::errors::RepositoryError;
use super::storage::DocumentStorage;

/// Repository trait for medical records
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait MedicalRecordRepositoryTrait: Send + Sync {
    /// Insert a record; the store assigns its identifier
    async fn insert(&self, record: NewMedicalRecord) -> Result<MedicalRecord, RepositoryError>;

    /// Insert several records in one store call
    async fn insert_many(&self, records: Vec<NewMedicalRecord>) -> Result<Vec<MedicalRecord>, RepositoryError>;

    /// Get every record in store order
    async fn find_all(&self) -> Result<Vec<MedicalRecord>, RepositoryError>;

    /// Get a record by identifier
    async fn find_by_id(&self, id: RecordId) -> Result<Option<MedicalRecord>, RepositoryError>;

    /// Merge fields into a record, returning how many records matched
    async fn update(&self, id: RecordId, patch: MedicalRecordPatch) -> Result<u64, RepositoryError>;

    /// Delete a record, returning how many records were removed
    async fn delete(&self, id: RecordId) -> Result<u64, RepositoryError>;

    /// Records where `query` is a case-insensitive substring of any searchable field
    async fn search(&self, query: &str) -> Result<Vec<MedicalRecord>, RepositoryError>;

    /// Check that the store is reachable
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Shared repositories delegate to the inner one
#[async_trait]
impl<T: MedicalRecordRepositoryTrait + ?Sized> MedicalRecordRepositoryTrait for Arc<T> {
    async fn insert(&self, record: NewMedicalRecord) -> Result<MedicalRecord, RepositoryError> {
        (**self).insert(record).await
    }

    async fn insert_many(&self, records: Vec<NewMedicalRecord>) -> Result<Vec<MedicalRecord>, RepositoryError> {
        (**self).insert_many(records).await
    }

    async fn find_all(&self) -> Result<Vec<MedicalRecord>, RepositoryError> {
        (**self).find_all().await
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<MedicalRecord>, RepositoryError> {
        (**self).find_by_id(id).await
    }

    async fn update(&self, id: RecordId, patch: MedicalRecordPatch) -> Result<u64, RepositoryError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: RecordId) -> Result<u64, RepositoryError> {
        (**self).delete(id).await
    }

    async fn search(&self, query: &str) -> Result<Vec<MedicalRecord>, RepositoryError> {
        (**self).search(query).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        (**self).ping().await
    }
}

/// Repository backed by a MongoDB collection
#[derive(Debug, Clone)]
pub struct MongoMedicalRecordRepository {
    database: Database,
    collection: Collection<Document>,
}

impl MongoMedicalRecordRepository {
    /// Create a repository over the configured collection
    pub fn new(database: Database, config: &DatabaseConfig) -> Self {
        let collection = database.collection::<Document>(&config.collection);
        Self { database, collection }
    }

    async fn collect(&self, filter: Option<Document>) -> Result<Vec<MedicalRecord>, RepositoryError> {
        let cursor = self.collection.find(filter, None).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        documents.into_iter().map(DocumentStorage::decode).collect()
    }
}

#[async_trait]
impl MedicalRecordRepositoryTrait for MongoMedicalRecordRepository {
    async fn insert(&self, record: NewMedicalRecord) -> Result<MedicalRecord, RepositoryError> {
        let id = RecordId::new();
        debug!("Inserting medical record: id={}", id);

        let document = DocumentStorage::encode_new(id, &record);
        self.collection.insert_one(document, None).await.map_err(|e| {
            error!("Failed to insert medical record {}: {}", id, e);
            RepositoryError::from(e)
        })?;

        Ok(record.with_id(id))
    }

    async fn insert_many(&self, records: Vec<NewMedicalRecord>) -> Result<Vec<MedicalRecord>, RepositoryError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let stored: Vec<MedicalRecord> = records
            .into_iter()
            .map(|record| record.with_id(RecordId::new()))
            .collect();
        debug!("Inserting {} medical records", stored.len());

        let documents = stored.iter().map(|record| {
            let new_record = NewMedicalRecord {
                fields: record.fields.clone(),
                created_at: record.created_at,
            };
            DocumentStorage::encode_new(record.id, &new_record)
        });

        self.collection.insert_many(documents, None).await.map_err(|e| {
            error!("Failed to insert medical records: {}", e);
            RepositoryError::from(e)
        })?;

        Ok(stored)
    }

    async fn find_all(&self) -> Result<Vec<MedicalRecord>, RepositoryError> {
        debug!("Getting all medical records from database");
        self.collect(None).await
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<MedicalRecord>, RepositoryError> {
        debug!("Getting medical record by ID from database: id={}", id);

        match self.collection.find_one(DocumentStorage::id_filter(id), None).await? {
            Some(document) => DocumentStorage::decode(document).map(Some),
            None => Ok(None),
        }
    }

    async fn update(&self, id: RecordId, patch: MedicalRecordPatch) -> Result<u64, RepositoryError> {
        debug!("Updating medical record: id={}", id);

        let result = self
            .collection
            .update_one(DocumentStorage::id_filter(id), DocumentStorage::encode_patch(&patch), None)
            .await?;

        Ok(result.matched_count)
    }

    async fn delete(&self, id: RecordId) -> Result<u64, RepositoryError> {
        debug!("Deleting medical record: id={}", id);

        let result = self
            .collection
            .delete_one(DocumentStorage::id_filter(id), None)
            .await?;

        Ok(result.deleted_count)
    }

    async fn search(&self, query: &str) -> Result<Vec<MedicalRecord>, RepositoryError> {
        debug!("Searching medical records for '{}'", query);
        self.collect(Some(DocumentStorage::search_filter(query))).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.database.run_command(doc! { "ping": 1 }, None).await.map_err(|e| {
            error!("MongoDB health check failed: {}", e);
            RepositoryError::from(e)
        })?;
        Ok(())
    }
}
