// MedicalForms-api lib.rs
//
// HTTP layer for the MedicalForms record service: router, handlers,
// error envelopes, CORS and API documentation.

// Public modules
pub mod api;
pub mod config;
pub mod entities;
pub mod openapi;

pub use api::create_app;
pub use config::AppConfig;
