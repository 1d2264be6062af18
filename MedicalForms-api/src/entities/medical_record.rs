use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Shape of a medical form as clients usually send it.
///
/// Records are schemaless: any other string or number field is stored as well.
/// Handlers take raw JSON, this type only documents the common fields.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicalFormDocument {
    /// Identifier assigned by the store, present in responses only
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "65540a8f2f1e4b0a9c3d2e1f")]
    pub id: Option<String>,

    #[schema(example = "Jane")]
    pub first_name: Option<String>,

    #[schema(example = "Smith")]
    pub last_name: Option<String>,

    pub email: Option<String>,

    pub phone_number: Option<String>,

    /// Date of birth, free-form
    #[schema(example = "1990-04-12")]
    pub dob: Option<String>,

    pub gender: Option<String>,

    pub disease: Option<String>,

    pub height: Option<String>,

    pub weight: Option<String>,

    pub bmi: Option<String>,

    /// Link to an uploaded attachment
    pub file_url: Option<String>,

    /// Milliseconds since the epoch, request only; becomes `createdAt`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    /// RFC 3339 UTC creation time
    #[schema(example = "2023-11-14T22:13:20Z")]
    pub created_at: Option<String>,
}
