pub mod medical_record;

// Domain services
// This module contains business logic implementations.

// Re-export service types
pub use medical_record::{
    MedicalRecordService, MedicalRecordServiceError, MedicalRecordServiceTrait,
    DUAL_TIMESTAMP_MESSAGE, INVALID_JSON_MESSAGE,
};
