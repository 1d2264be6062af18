use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use medical_forms_data::repository::MedicalRecordRepositoryTrait;
use medical_forms_domain::services::{
    MedicalRecordService, MedicalRecordServiceError, MedicalRecordServiceTrait, INVALID_JSON_MESSAGE,
};

use crate::entities::common::{BulkCreatedResponse, CreatedResponse, ErrorResponse, MessageResponse};
use crate::entities::medical_record::MedicalFormDocument;

pub const SAVED_MESSAGE: &str = "Medical form data saved successfully";
pub const UPDATED_MESSAGE: &str = "Medical record updated successfully";
pub const DELETED_MESSAGE: &str = "Medical record deleted successfully";

/// Query parameters for free-text search
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SearchParams {
    /// Case-insensitive substring looked up in the searchable fields
    pub query: Option<String>,
}

/// Service type for dependency injection
pub type SharedMedicalRecordService = Arc<dyn MedicalRecordServiceTrait + Send + Sync>;

/// Create the record service over a repository
pub fn create_service<R>(repository: R) -> SharedMedicalRecordService
where
    R: MedicalRecordRepositoryTrait + 'static,
{
    Arc::new(MedicalRecordService::new(repository))
}

/// Service error turned into an HTTP response at the handler boundary
#[derive(Debug)]
pub struct ApiError(pub MedicalRecordServiceError);

impl From<MedicalRecordServiceError> for ApiError {
    fn from(err: MedicalRecordServiceError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self(MedicalRecordServiceError::BadRequest(INVALID_JSON_MESSAGE.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        match self.0 {
            MedicalRecordServiceError::NotFound => {
                info!("{}", message);
                (StatusCode::NOT_FOUND, Json(MessageResponse::new(message))).into_response()
            }
            MedicalRecordServiceError::StorageError(_) => {
                error!("Request failed in the document store: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(message))).into_response()
            }
            MedicalRecordServiceError::ValidationError(_)
            | MedicalRecordServiceError::InvalidIdentifier
            | MedicalRecordServiceError::BadRequest(_) => {
                warn!("Client error: {}", message);
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
            }
        }
    }
}

/// Save a new medical form
#[utoipa::path(
    post,
    path = "/medicalForm",
    request_body = MedicalFormDocument,
    responses(
        (status = 200, description = "Medical form saved", body = CreatedResponse),
        (status = 400, description = "Invalid body, field value or timestamps", body = ErrorResponse),
        (status = 500, description = "Document store error", body = ErrorResponse),
    ),
    tag = "medical_records"
)]
#[instrument(skip(service, payload))]
pub async fn create_medical_form(
    State(service): State<SharedMedicalRecordService>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    info!("Saving medical form");

    let record = service.create_record(payload).await?;

    Ok((
        StatusCode::OK,
        Json(CreatedResponse {
            message: SAVED_MESSAGE.to_string(),
            id: record.id.to_hex(),
        }),
    ))
}

/// Save a batch of medical forms in one write
#[utoipa::path(
    post,
    path = "/bulkAddMedicalData",
    request_body = [MedicalFormDocument],
    responses(
        (status = 200, description = "All medical forms saved", body = BulkCreatedResponse),
        (status = 400, description = "Body is not an array or an element is invalid; nothing saved", body = ErrorResponse),
        (status = 500, description = "Document store error", body = ErrorResponse),
    ),
    tag = "medical_records"
)]
#[instrument(skip(service, payload))]
pub async fn bulk_add_medical_data(
    State(service): State<SharedMedicalRecordService>,
    payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payloads) = payload?;
    info!("Saving {} medical forms", payloads.len());

    let records = service.create_records(payloads).await?;

    Ok((
        StatusCode::OK,
        Json(BulkCreatedResponse {
            message: SAVED_MESSAGE.to_string(),
            ids: records.iter().map(|record| record.id.to_hex()).collect(),
        }),
    ))
}

/// List every medical record
#[utoipa::path(
    get,
    path = "/getMedicalData",
    responses(
        (status = 200, description = "All medical records", body = [MedicalFormDocument]),
        (status = 500, description = "Document store error", body = ErrorResponse),
    ),
    tag = "medical_records"
)]
#[instrument(skip(service))]
pub async fn list_medical_data(
    State(service): State<SharedMedicalRecordService>,
) -> Result<impl IntoResponse, ApiError> {
    let records = service.list_records().await?;
    info!("Returning {} medical records", records.len());

    Ok((StatusCode::OK, Json(records)))
}

/// Get a single medical record by ID
#[utoipa::path(
    get,
    path = "/getMedicalData/{id}",
    params(
        ("id" = String, Path, description = "Medical record ObjectId (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Medical record found", body = MedicalFormDocument),
        (status = 400, description = "Invalid ObjectId", body = ErrorResponse),
        (status = 404, description = "Medical record not found", body = MessageResponse),
        (status = 500, description = "Document store error", body = ErrorResponse),
    ),
    tag = "medical_records"
)]
#[instrument(skip(service))]
pub async fn get_medical_data(
    State(service): State<SharedMedicalRecordService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Fetching medical record with ID: {}", id);

    let record = service.get_record(&id).await?;

    Ok((StatusCode::OK, Json(record)))
}

/// Merge fields into a medical record
#[utoipa::path(
    put,
    path = "/updateMedicalData/{id}",
    params(
        ("id" = String, Path, description = "Medical record ObjectId (24 hex characters)")
    ),
    request_body = MedicalFormDocument,
    responses(
        (status = 200, description = "Medical record updated, or no record matched", body = MessageResponse),
        (status = 400, description = "Invalid body or ObjectId", body = ErrorResponse),
        (status = 500, description = "Document store error", body = ErrorResponse),
    ),
    tag = "medical_records"
)]
#[instrument(skip(service, payload))]
pub async fn update_medical_data(
    State(service): State<SharedMedicalRecordService>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // The body is checked before the identifier
    let Json(payload) = payload?;
    info!("Updating medical record with ID: {}", id);

    service.update_record(&id, payload).await?;

    Ok((StatusCode::OK, Json(MessageResponse::new(UPDATED_MESSAGE))))
}

/// Delete a medical record
#[utoipa::path(
    delete,
    path = "/deleteMedicalData/{id}",
    params(
        ("id" = String, Path, description = "Medical record ObjectId (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Medical record deleted, or no record matched", body = MessageResponse),
        (status = 400, description = "Invalid ObjectId", body = ErrorResponse),
        (status = 500, description = "Document store error", body = ErrorResponse),
    ),
    tag = "medical_records"
)]
#[instrument(skip(service))]
pub async fn delete_medical_data(
    State(service): State<SharedMedicalRecordService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Deleting medical record with ID: {}", id);

    service.delete_record(&id).await?;

    Ok((StatusCode::OK, Json(MessageResponse::new(DELETED_MESSAGE))))
}

/// Search medical records by substring
#[utoipa::path(
    get,
    path = "/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching medical records; empty for a blank query", body = [MedicalFormDocument]),
        (status = 500, description = "Document store error", body = ErrorResponse),
    ),
    tag = "medical_records"
)]
#[instrument(skip(service))]
pub async fn search_medical_data(
    State(service): State<SharedMedicalRecordService>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let records = service.search_records(params.query.as_deref()).await?;
    info!("Search matched {} medical records", records.len());

    Ok((StatusCode::OK, Json(records)))
}
