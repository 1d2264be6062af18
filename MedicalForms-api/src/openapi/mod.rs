use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Medical record endpoints
        crate::api::handlers::medical_records::create_medical_form,
        crate::api::handlers::medical_records::bulk_add_medical_data,
        crate::api::handlers::medical_records::list_medical_data,
        crate::api::handlers::medical_records::get_medical_data,
        crate::api::handlers::medical_records::update_medical_data,
        crate::api::handlers::medical_records::delete_medical_data,
        crate::api::handlers::medical_records::search_medical_data
    ),
    components(
        schemas(
            // Entities
            crate::entities::medical_record::MedicalFormDocument,
            crate::entities::common::ErrorResponse,
            crate::entities::common::MessageResponse,
            crate::entities::common::CreatedResponse,
            crate::entities::common::BulkCreatedResponse,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,

            // Medical record handlers
            crate::api::handlers::medical_records::SearchParams
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "medical_records", description = "Medical form storage and search endpoints")
    ),
    info(
        title = "MedicalForms API",
        version = "0.1.0",
        description = "API for storing, editing and searching patient medical forms",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;
