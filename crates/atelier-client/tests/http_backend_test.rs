//! Integration tests for the HTTP extraction backend against a mock server.

use atelier_client::{
    ExtractionBackend, ExtractionRequest, HttpExtractionBackend, QueueSubmitRequest,
};
use atelier_core::models::{JobStatus, SchemaMap};
use atelier_core::Error;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> ExtractionRequest {
    ExtractionRequest {
        image_base64: "aGVsbG8=".to_string(),
        schema: SchemaMap::new(),
        category_name: Some("T-Shirts".to_string()),
        discovery_mode: false,
    }
}

#[tokio::test]
async fn test_extract_parses_response() {
    let mock_server = MockServer::start().await;

    let response_body = serde_json::json!({
        "attributes": {
            "neck_type": {"raw_value": "round neck", "confidence": 91.0, "reasoning": ""}
        },
        "tokens_used": 850,
        "model_used": "vision-1",
        "processing_time_ms": 2300,
        "confidence": 87.5
    });

    Mock::given(method("POST"))
        .and(path("/extract"))
        .and(body_partial_json(serde_json::json!({
            "image_base64": "aGVsbG8=",
            "category_name": "T-Shirts"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpExtractionBackend::new(mock_server.uri());
    let result = backend.extract(request()).await.unwrap();

    assert_eq!(result.tokens_used, 850);
    assert_eq!(result.model_used.as_deref(), Some("vision-1"));
    assert_eq!(
        result.attributes["neck_type"].raw_value.as_deref(),
        Some("round neck")
    );
}

#[tokio::test]
async fn test_extract_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/extract"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpExtractionBackend::new(mock_server.uri()).with_api_key("test-key");
    let result = backend.extract(request()).await;
    assert!(result.is_ok(), "request should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_extract_non_success_status_is_extraction_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/extract"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&mock_server)
        .await;

    let backend = HttpExtractionBackend::new(mock_server.uri());
    let err = backend.extract(request()).await.unwrap_err();
    match err {
        Error::Extraction(msg) => {
            assert!(msg.contains("502"), "message should carry the status: {msg}");
            assert!(msg.contains("bad gateway"));
        }
        other => panic!("expected Extraction error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_extract_malformed_body_is_serialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/extract"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let backend = HttpExtractionBackend::new(mock_server.uri());
    let err = backend.extract(request()).await.unwrap_err();
    assert!(matches!(err, Error::Serialization(_)), "got {err:?}");
}

#[tokio::test]
async fn test_submit_job_returns_job_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/queue/submit"))
        .and(body_partial_json(serde_json::json!({
            "priority": 2,
            "department": "Menswear"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"job_id": "job-7", "queue_position": 4})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpExtractionBackend::new(mock_server.uri());
    let job_id = backend
        .submit_job(QueueSubmitRequest {
            request: request(),
            priority: 2,
            department: Some("Menswear".to_string()),
            sub_department: None,
            force_refresh: false,
        })
        .await
        .unwrap();
    assert_eq!(job_id, "job-7");
}

#[tokio::test]
async fn test_job_status_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/queue/status/job-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "processing",
            "queue_position": 0
        })))
        .mount(&mock_server)
        .await;

    let backend = HttpExtractionBackend::new(mock_server.uri());
    let status = backend.job_status("job-7").await.unwrap();
    assert_eq!(status.status, JobStatus::Processing);
    assert_eq!(status.queue_position, 0);
}

#[tokio::test]
async fn test_health_check_up_and_down() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let backend = HttpExtractionBackend::new(mock_server.uri());
    assert!(backend.health_check().await.unwrap());

    // Unreachable server reports unhealthy instead of erroring.
    let dead = HttpExtractionBackend::new("http://127.0.0.1:1".to_string());
    assert!(!dead.health_check().await.unwrap());
}
