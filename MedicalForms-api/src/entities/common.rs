use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error envelope for client and storage failures
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Plain confirmation envelope, also used for "not found"
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Response to a single create
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub message: String,
    /// Identifier assigned by the store
    #[schema(example = "65540a8f2f1e4b0a9c3d2e1f")]
    pub id: String,
}

/// Response to a bulk create
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkCreatedResponse {
    pub message: String,
    /// Identifiers in request order
    pub ids: Vec<String>,
}
