use std::sync::Arc;
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Extension, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use medical_forms_data::repository::MedicalRecordRepositoryTrait;
use crate::api::handlers::{health, medical_records};
use crate::config::AppConfig;
use crate::openapi::configure_swagger_routes;

/// CORS policy for every route except `/search`
fn open_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// CORS policy for `/search`, restricted to one origin
fn search_cors(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}

/// Create the application router over a record repository
pub fn create_app<R>(repository: R, config: &AppConfig) -> Router
where
    R: MedicalRecordRepositoryTrait + 'static,
{
    debug!("Creating application router");

    let repository = Arc::new(repository);
    let record_service = medical_records::create_service(repository.clone());
    let health_context = health::HealthContext {
        service: health::create_health_service(repository),
        environment: config.environment.clone(),
    };

    let record_routes = Router::new()
        .route("/medicalForm", post(medical_records::create_medical_form))
        .route("/bulkAddMedicalData", post(medical_records::bulk_add_medical_data))
        .route("/getMedicalData", get(medical_records::list_medical_data))
        .route("/getMedicalData/:id", get(medical_records::get_medical_data))
        .route(
            "/updateMedicalData/:id",
            put(medical_records::update_medical_data).patch(medical_records::update_medical_data),
        )
        .route("/deleteMedicalData/:id", delete(medical_records::delete_medical_data))
        .with_state(record_service.clone())
        .layer(open_cors());

    debug!("Record routes configured");

    // Only the configured origin may call /search
    let search_routes = Router::new()
        .route("/search", get(medical_records::search_medical_data))
        .with_state(record_service)
        .layer(search_cors(config.search_allowed_origin.clone()));

    debug!("Search route configured for origin {:?}", config.search_allowed_origin);

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .layer(Extension(health_context))
        .merge(configure_swagger_routes())
        .layer(open_cors());

    // Initialize health check service startup time
    health::initialize_server_start_time();

    Router::new()
        .merge(record_routes)
        .merge(search_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
}
