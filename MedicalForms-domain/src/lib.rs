// MedicalForms Domain
// This crate contains the business logic for the MedicalForms record service

// Services that implement business logic
pub mod services;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Re-export the database module from medical_forms_data for convenience
pub use medical_forms_data::database;
