use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Once;
use tower::ServiceExt;

use medical_forms_api::{create_app, AppConfig};
use medical_forms_data::repository::{InMemoryMedicalRecordRepository, MockMedicalRecordRepositoryTrait, RepositoryError};

// Ensure tracing is initialized only once
static INIT: Once = Once::new();

fn initialize() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn create_test_app() -> Router {
    initialize();
    create_app(InMemoryMedicalRecordRepository::new(), &AppConfig::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

async fn create(app: &Router, body: Value) -> String {
    let (status, response) = send(app, Method::POST, "/medicalForm", Some(body)).await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", response);
    response["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_and_read_back_with_timestamp() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/medicalForm",
        Some(json!({ "firstName": "Jane", "lastName": "Doe", "timestamp": 1_700_000_000_000i64 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Medical form data saved successfully");
    let id = body["id"].as_str().unwrap();

    let (status, record) = send(&app, Method::GET, &format!("/getMedicalData/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        record,
        json!({
            "id": id,
            "firstName": "Jane",
            "lastName": "Doe",
            "createdAt": "2023-11-14T22:13:20Z",
        })
    );
}

#[tokio::test]
async fn test_dual_timestamp_is_rejected_and_nothing_is_stored() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/medicalForm",
        Some(json!({ "firstName": "Jane", "createdAt": "2023-01-01T00:00:00Z", "timestamp": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Both 'createdAt' and 'timestamp' cannot be provided" }));

    let (_, all) = send(&app, Method::GET, "/getMedicalData", None).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn test_malformed_create_bodies_are_bad_requests() {
    let app = create_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/medicalForm")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, "/medicalForm", Some(json!({ "allergies": ["pollen"] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("allergies"));

    let (status, _) = send(&app, Method::POST, "/medicalForm", Some(json!({ "_id": "65540a8f2f1e4b0a9c3d2e1f" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, "/medicalForm", Some(json!({ "address.city": "Springfield" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("address.city"));

    let (_, all) = send(&app, Method::GET, "/getMedicalData", None).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn test_null_timestamp_uses_server_time_in_millis() {
    let app = create_test_app();
    let id = create(&app, json!({ "firstName": "Jane", "timestamp": null })).await;

    let (_, record) = send(&app, Method::GET, &format!("/getMedicalData/{}", id), None).await;
    let created_at = record["createdAt"].as_str().unwrap();
    assert!(created_at.ends_with('Z'));
    // At most three fractional digits, as MongoDB stores it
    let fraction = created_at
        .trim_end_matches('Z')
        .rsplit_once('.')
        .map_or("", |(_, f)| f);
    assert!(fraction.len() <= 3, "unexpected precision in {}", created_at);
    assert!(record.get("timestamp").is_none());
}

#[tokio::test]
async fn test_list_returns_records_in_insertion_order() {
    let app = create_test_app();
    let first = create(&app, json!({ "firstName": "A" })).await;
    let second = create(&app, json!({ "firstName": "B", "bmi": 22.5 })).await;

    let (status, all) = send(&app, Method::GET, "/getMedicalData", None).await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["id"], first.as_str());
    assert_eq!(all[1]["id"], second.as_str());
    assert_eq!(all[1]["bmi"], 22.5);
}

#[tokio::test]
async fn test_get_invalid_and_missing_ids() {
    let app = create_test_app();

    let (status, body) = send(&app, Method::GET, "/getMedicalData/123", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid ObjectId" }));

    let (status, body) = send(&app, Method::GET, "/getMedicalData/65540a8f2f1e4b0a9c3d2e1f", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Medical record not found" }));
}

#[tokio::test]
async fn test_update_merges_with_put_and_patch() {
    let app = create_test_app();
    let id = create(&app, json!({ "firstName": "A" })).await;
    let uri = format!("/updateMedicalData/{}", id);

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "disease": "X" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Medical record updated successfully" }));

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "timestamp": 1_700_000_000_000i64 }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, record) = send(&app, Method::GET, &format!("/getMedicalData/{}", id), None).await;
    assert_eq!(record["firstName"], "A");
    assert_eq!(record["disease"], "X");
    assert_eq!(record["createdAt"], "2023-11-14T22:13:20Z");
}

#[tokio::test]
async fn test_update_body_is_checked_before_identifier() {
    let app = create_test_app();

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/updateMedicalData/not-an-id")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "Invalid request format. JSON expected." }));

    let (status, body) = send(&app, Method::PUT, "/updateMedicalData/not-an-id", Some(json!({ "disease": "X" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid ObjectId" }));
}

#[tokio::test]
async fn test_update_and_delete_of_unknown_record_succeed() {
    let app = create_test_app();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/updateMedicalData/65540a8f2f1e4b0a9c3d2e1f",
        Some(json!({ "disease": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::DELETE, "/deleteMedicalData/65540a8f2f1e4b0a9c3d2e1f", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Medical record deleted successfully" }));

    let (_, all) = send(&app, Method::GET, "/getMedicalData", None).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn test_delete_removes_record() {
    let app = create_test_app();
    let id = create(&app, json!({ "firstName": "A" })).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/deleteMedicalData/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &format!("/getMedicalData/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, "/deleteMedicalData/xyz", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid ObjectId" }));
}

#[tokio::test]
async fn test_search() {
    let app = create_test_app();
    create(&app, json!({ "lastName": "Smith", "timestamp": 1_700_000_000_000i64 })).await;
    create(&app, json!({ "lastName": "SMITHERS" })).await;
    create(&app, json!({ "lastName": "Jones", "height": 180 })).await;
    create(&app, json!({ "lastName": "abc" })).await;

    let (status, results) = send(&app, Method::GET, "/search?query=smith", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results.as_array().unwrap().len(), 2);

    // Literal substring, not a pattern
    let (_, results) = send(&app, Method::GET, "/search?query=a.c", None).await;
    assert_eq!(results, json!([]));

    // Numbers do not take part in search
    let (_, results) = send(&app, Method::GET, "/search?query=180", None).await;
    assert_eq!(results, json!([]));

    let (_, results) = send(&app, Method::GET, "/search?query=2023-11-14T22:13:20.000Z", None).await;
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["lastName"], "Smith");

    let (status, results) = send(&app, Method::GET, "/search", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results, json!([]));

    let (_, results) = send(&app, Method::GET, "/search?query=%20%20", None).await;
    assert_eq!(results, json!([]));
}

#[tokio::test]
async fn test_bulk_add_is_all_or_nothing() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/bulkAddMedicalData",
        Some(json!([
            { "firstName": "A" },
            { "firstName": "B", "timestamp": "yesterday" }
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Record 1: "));

    let (_, all) = send(&app, Method::GET, "/getMedicalData", None).await;
    assert_eq!(all, json!([]));

    let (status, body) = send(&app, Method::POST, "/bulkAddMedicalData", Some(json!({ "firstName": "A" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid request format. JSON expected." }));

    let (status, body) = send(
        &app,
        Method::POST,
        "/bulkAddMedicalData",
        Some(json!([{ "firstName": "A" }, { "firstName": "B" }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Medical form data saved successfully");
    assert_eq!(body["ids"].as_array().unwrap().len(), 2);

    let (_, all) = send(&app, Method::GET, "/getMedicalData", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_health_reports_store_status() {
    let app = create_test_app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["components"]["database"]["status"], "ok");

    let mut repo = MockMedicalRecordRepositoryTrait::new();
    repo.expect_ping()
        .returning(|| Err(RepositoryError::Lock("store unavailable".to_string())));
    let app = create_app(repo, &AppConfig::default());

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    initialize();
    let mut repo = MockMedicalRecordRepositoryTrait::new();
    repo.expect_search()
        .returning(|_| Err(RepositoryError::Lock("store unavailable".to_string())));
    let app = create_app(repo, &AppConfig::default());

    let (status, body) = send(&app, Method::GET, "/search?query=smith", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Lock error: store unavailable" }));
}
