// Domain entities and value objects
pub mod conversions;

// Records are schemaless, so the domain works directly on the storage models
pub use medical_forms_data::models::{
    FieldValue, MedicalRecord, MedicalRecordPatch, NewMedicalRecord, RecordFields, RecordId,
    CREATED_AT_FIELD, SEARCHABLE_FIELDS,
};
