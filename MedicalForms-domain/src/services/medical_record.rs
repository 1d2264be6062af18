use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::entities::conversions::{
    current_time, epoch_millis_to_datetime, parse_created_at, parse_record_id, split_payload,
};
use crate::entities::{MedicalRecord, MedicalRecordPatch, NewMedicalRecord, RecordId};
use medical_forms_data::repository::{MedicalRecordRepositoryTrait, RepositoryError};

/// Error text for a payload carrying both temporal keys
pub const DUAL_TIMESTAMP_MESSAGE: &str = "Both 'createdAt' and 'timestamp' cannot be provided";

/// Error text for a missing or malformed JSON body
pub const INVALID_JSON_MESSAGE: &str = "Invalid request format. JSON expected.";

/// Medical record service errors.
///
/// The display text of each variant is what clients see.
#[derive(Debug, Error, PartialEq)]
pub enum MedicalRecordServiceError {
    /// Malformed or contradictory input
    #[error("{0}")]
    ValidationError(String),

    /// Identifier is not a valid ObjectId
    #[error("Invalid ObjectId")]
    InvalidIdentifier,

    /// Request body is not the JSON shape the operation expects
    #[error("{0}")]
    BadRequest(String),

    /// No record has the identifier
    #[error("Medical record not found")]
    NotFound,

    /// The document store failed
    #[error("{0}")]
    StorageError(String),
}

impl MedicalRecordServiceError {
    /// Prefix the message with the position of the offending batch element
    fn at_index(self, index: usize) -> Self {
        match self {
            Self::ValidationError(msg) => Self::ValidationError(format!("Record {}: {}", index, msg)),
            Self::BadRequest(msg) => Self::BadRequest(format!("Record {}: {}", index, msg)),
            other => other,
        }
    }
}

/// Trait for medical record service operations
#[async_trait]
pub trait MedicalRecordServiceTrait {
    /// Normalize and store a new record
    async fn create_record(&self, payload: Value) -> Result<MedicalRecord, MedicalRecordServiceError>;

    /// Normalize and store a batch of records; nothing is stored if any element is invalid
    async fn create_records(&self, payloads: Vec<Value>) -> Result<Vec<MedicalRecord>, MedicalRecordServiceError>;

    /// Get all records
    async fn list_records(&self) -> Result<Vec<MedicalRecord>, MedicalRecordServiceError>;

    /// Get a record by its identifier
    async fn get_record(&self, id: &str) -> Result<MedicalRecord, MedicalRecordServiceError>;

    /// Merge fields into a record; an unmatched identifier is not an error
    async fn update_record(&self, id: &str, payload: Value) -> Result<(), MedicalRecordServiceError>;

    /// Delete a record; an unmatched identifier is not an error
    async fn delete_record(&self, id: &str) -> Result<(), MedicalRecordServiceError>;

    /// Free-text search; a missing or blank query matches nothing
    async fn search_records(&self, query: Option<&str>) -> Result<Vec<MedicalRecord>, MedicalRecordServiceError>;
}

/// Turn a create payload into a record, resolving `createdAt`.
///
/// `timestamp` (epoch milliseconds) wins when present, otherwise `now` is used.
/// A client `createdAt` on its own is replaced.
pub fn prepare_new_record(payload: Value, now: DateTime<Utc>) -> Result<NewMedicalRecord, MedicalRecordServiceError> {
    let object = match payload {
        Value::Object(object) => object,
        _ => return Err(MedicalRecordServiceError::BadRequest(INVALID_JSON_MESSAGE.to_string())),
    };

    let payload = split_payload(object).map_err(MedicalRecordServiceError::ValidationError)?;

    let created_at = match (&payload.created_at, &payload.timestamp) {
        (Some(_), Some(_)) => {
            return Err(MedicalRecordServiceError::ValidationError(DUAL_TIMESTAMP_MESSAGE.to_string()))
        }
        (_, Some(timestamp)) => {
            epoch_millis_to_datetime(timestamp).map_err(MedicalRecordServiceError::ValidationError)?
        }
        (Some(_), None) => {
            debug!("Replacing client-supplied createdAt with server time");
            now
        }
        (None, None) => now,
    };

    Ok(NewMedicalRecord {
        fields: payload.fields,
        created_at,
    })
}

/// Turn an update payload into a patch.
///
/// `timestamp` and `createdAt` both resolve to the record's creation time and
/// may not be combined.
pub fn prepare_patch(payload: Value) -> Result<MedicalRecordPatch, MedicalRecordServiceError> {
    let object = match payload {
        Value::Object(object) => object,
        _ => return Err(MedicalRecordServiceError::BadRequest(INVALID_JSON_MESSAGE.to_string())),
    };

    let payload = split_payload(object).map_err(MedicalRecordServiceError::ValidationError)?;

    let created_at = match (&payload.created_at, &payload.timestamp) {
        (Some(_), Some(_)) => {
            return Err(MedicalRecordServiceError::ValidationError(DUAL_TIMESTAMP_MESSAGE.to_string()))
        }
        (Some(created_at), None) => Some(parse_created_at(created_at)),
        (None, Some(timestamp)) => Some(epoch_millis_to_datetime(timestamp)),
        (None, None) => None,
    }
    .transpose()
    .map_err(MedicalRecordServiceError::ValidationError)?;

    Ok(MedicalRecordPatch {
        fields: payload.fields,
        created_at,
    })
}

/// Medical record service for domain logic
pub struct MedicalRecordService<R: MedicalRecordRepositoryTrait> {
    repository: R,
}

impl<R: MedicalRecordRepositoryTrait> MedicalRecordService<R> {
    /// Create a new medical record service
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> MedicalRecordServiceError {
        error!("Document store error: {}", err);
        MedicalRecordServiceError::StorageError(err.to_string())
    }

    fn parse_id(&self, id: &str) -> Result<RecordId, MedicalRecordServiceError> {
        parse_record_id(id).map_err(|e| {
            warn!("{}", e);
            MedicalRecordServiceError::InvalidIdentifier
        })
    }
}

#[async_trait]
impl<R: MedicalRecordRepositoryTrait + Send + Sync> MedicalRecordServiceTrait for MedicalRecordService<R> {
    #[instrument(skip(self, payload))]
    async fn create_record(&self, payload: Value) -> Result<MedicalRecord, MedicalRecordServiceError> {
        let new_record = prepare_new_record(payload, current_time())?;

        let record = self.repository.insert(new_record)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("Medical record created with ID: {}", record.id);
        Ok(record)
    }

    #[instrument(skip(self, payloads), fields(count = payloads.len()))]
    async fn create_records(&self, payloads: Vec<Value>) -> Result<Vec<MedicalRecord>, MedicalRecordServiceError> {
        if payloads.is_empty() {
            return Err(MedicalRecordServiceError::ValidationError(
                "At least one record must be provided".to_string(),
            ));
        }

        // Validate everything before the single insert
        let now = current_time();
        let new_records = payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| prepare_new_record(payload, now).map_err(|e| e.at_index(index)))
            .collect::<Result<Vec<_>, _>>()?;

        let records = self.repository.insert_many(new_records)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("{} medical records created", records.len());
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn list_records(&self) -> Result<Vec<MedicalRecord>, MedicalRecordServiceError> {
        self.repository.find_all()
            .await
            .map_err(|e| self.map_repo_error(e))
    }

    #[instrument(skip(self))]
    async fn get_record(&self, id: &str) -> Result<MedicalRecord, MedicalRecordServiceError> {
        let id = self.parse_id(id)?;

        self.repository.find_by_id(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or(MedicalRecordServiceError::NotFound)
    }

    #[instrument(skip(self, payload))]
    async fn update_record(&self, id: &str, payload: Value) -> Result<(), MedicalRecordServiceError> {
        if !payload.is_object() {
            return Err(MedicalRecordServiceError::BadRequest(INVALID_JSON_MESSAGE.to_string()));
        }
        let id = self.parse_id(id)?;
        let patch = prepare_patch(payload)?;

        if patch.is_empty() {
            debug!("Empty update for medical record {}, nothing to write", id);
            return Ok(());
        }

        let matched = self.repository.update(id, patch)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        if matched == 0 {
            info!("Update matched no medical record with ID: {}", id);
        } else {
            info!("Medical record updated: {}", id);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_record(&self, id: &str) -> Result<(), MedicalRecordServiceError> {
        let id = self.parse_id(id)?;

        let deleted = self.repository.delete(id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("Deleted {} medical record(s) with ID: {}", deleted, id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn search_records(&self, query: Option<&str>) -> Result<Vec<MedicalRecord>, MedicalRecordServiceError> {
        let query = match query {
            Some(query) if !query.trim().is_empty() => query,
            _ => {
                debug!("Empty search query, returning no records");
                return Ok(Vec::new());
            }
        };

        self.repository.search(query)
            .await
            .map_err(|e| self.map_repo_error(e))
    }
}
