// Public entities for the MedicalForms API
// Envelopes and documentation schemas shared by the handlers

// Common response envelopes
pub mod common;

// Documented medical form shape
pub mod medical_record;
