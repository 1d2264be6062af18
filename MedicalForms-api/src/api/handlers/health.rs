use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use medical_forms_data::repository::MedicalRecordRepositoryTrait;
use medical_forms_domain::health::{
    ComponentStatus as DomainComponentStatus, HealthServiceTrait, StoreHealthService, SystemStatus,
    DATABASE_COMPONENT,
};

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Current service status ("ok" or "error")
    pub status: String,
    /// Application version from the Cargo manifest
    pub version: String,
    /// Epoch seconds when the response was generated
    pub timestamp: u64,
    /// Uptime of the service in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Status of the components the service depends on
    pub components: ComponentStatus,
    /// Deployment environment (APP_ENV)
    pub environment: String,
}

/// Status of individual system components
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    /// Document store status
    pub database: ComponentHealthStatus,
}

/// Health status for an individual component
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealthStatus {
    /// Status of the component ("ok" or "error")
    pub status: String,
    /// Optional message with more details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health service plus the environment name it reports
#[derive(Clone)]
pub struct HealthContext {
    pub service: Arc<dyn HealthServiceTrait + Send + Sync>,
    pub environment: String,
}

// Epoch seconds at the first call to `initialize_server_start_time`
static SERVER_START_TIME: OnceCell<u64> = OnceCell::new();

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Record the server start time for uptime reporting; later calls are no-ops
pub fn initialize_server_start_time() {
    SERVER_START_TIME.get_or_init(epoch_seconds);
}

/// Health check endpoint, pings the document store
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and document store are healthy", body = HealthResponse),
        (status = 503, description = "Document store is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
#[instrument(skip(context))]
pub async fn health_check(Extension(context): Extension<HealthContext>) -> impl IntoResponse {
    info!("Health check requested");

    let now = epoch_seconds();
    let uptime = SERVER_START_TIME.get().map(|&start_time| now.saturating_sub(start_time));

    let system_health = context.service.get_system_health().await;

    let database = system_health
        .components
        .get(DATABASE_COMPONENT)
        .map(|component| ComponentHealthStatus {
            status: map_component_status(&component.status),
            message: component.details.clone(),
        })
        .unwrap_or_else(|| ComponentHealthStatus {
            status: "error".to_string(),
            message: Some("Document store status unknown".to_string()),
        });

    let (code, status) = match system_health.status {
        SystemStatus::Healthy => (StatusCode::OK, "ok"),
        SystemStatus::Unhealthy => (StatusCode::SERVICE_UNAVAILABLE, "error"),
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
        uptime,
        components: ComponentStatus { database },
        environment: context.environment,
    };

    (code, Json(response))
}

/// Map domain component status to API status string
fn map_component_status(status: &DomainComponentStatus) -> String {
    match status {
        DomainComponentStatus::Healthy => "ok",
        DomainComponentStatus::Unhealthy => "error",
    }
    .to_string()
}

/// Factory function to create a health service over a repository
pub fn create_health_service<R>(repository: R) -> Arc<dyn HealthServiceTrait + Send + Sync>
where
    R: MedicalRecordRepositoryTrait + 'static,
{
    Arc::new(StoreHealthService::new(repository))
}
