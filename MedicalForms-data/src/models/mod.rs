// Storage models
pub mod medical_record;

pub use medical_record::{
    FieldValue, MedicalRecord, MedicalRecordPatch, NewMedicalRecord, RecordFields,
    CREATED_AT_FIELD, SEARCHABLE_FIELDS,
};

// Identifier type used by the document store
pub use mongodb::bson::oid::ObjectId as RecordId;
