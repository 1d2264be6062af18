// Repository module structure
pub mod errors;
mod in_memory;
mod medical_record;
mod storage;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use in_memory::InMemoryMedicalRecordRepository;
pub use medical_record::{MedicalRecordRepositoryTrait, MongoMedicalRecordRepository};
pub use storage::DocumentStorage;

#[cfg(feature = "mock")]
pub use medical_record::MockMedicalRecordRepositoryTrait;
