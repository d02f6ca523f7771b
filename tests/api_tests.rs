use plant_doctor_relay::routes::create_router;
use plant_doctor_relay::services::static_config::{AdsSource, StaticConfig};
use plant_doctor_relay::services::upstream::{
    ApiKey, CompletionRequest, ContentPart, MessageContent, ModelClient, UpstreamError,
};
use plant_doctor_relay::state::AppState;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use secrecy::Secret;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

enum Scripted {
    Reply(String),
    Status(u16),
    Transport,
}

struct FakeModel {
    script: Scripted,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl FakeModel {
    fn new(script: Scripted) -> Arc<Self> {
        Arc::new(Self { script, calls: Mutex::new(Vec::new()) })
    }

    fn replying(text: &str) -> Arc<Self> {
        Self::new(Scripted::Reply(text.to_string()))
    }

    fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for FakeModel {
    async fn complete(&self, _api_key: &ApiKey, request: &CompletionRequest) -> Result<String, UpstreamError> {
        self.calls.lock().unwrap().push(request.clone());
        match &self.script {
            Scripted::Reply(text) => Ok(text.clone()),
            Scripted::Status(status) => Err(UpstreamError::Status { status: *status, body: "rate limited".into() }),
            Scripted::Transport => Err(UpstreamError::Transport("connection refused".into())),
        }
    }
}

fn app_with(model: Arc<FakeModel>, api_key: Option<&str>) -> Router {
    let static_config = StaticConfig::new(
        "/nonexistent/config.json",
        AdsSource::File("/nonexistent/ads.json".into()),
        None,
        reqwest::Client::new(),
    );
    let state = AppState::new(model, api_key.map(|k| Secret::new(k.to_string())), static_config);
    create_router().with_state(Arc::new(state))
}

fn app(model: Arc<FakeModel>) -> Router {
    app_with(model, Some("sk-test"))
}

async fn send(app: Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body_bytes).unwrap())
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Body::from(body.to_string())).await
}

#[tokio::test]
async fn test_doctor_answer_is_wrapped_in_envelope() {
    let model = FakeModel::replying("Water twice a week.");
    let (status, body) = post_json(
        app(model.clone()),
        "/doctor",
        json!({"question": "How often should I water basil?", "language": "en"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["answer"], json!("Water twice a week."));
    assert!(body["timestamp"].is_string());
    assert_eq!(model.calls().len(), 1);
}

#[tokio::test]
async fn test_empty_question_in_arabic_is_rejected_without_upstream_call() {
    let model = FakeModel::replying("unused");
    let (status, body) = post_json(app(model.clone()), "/doctor", json!({"question": "", "language": "ar"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("السؤال مطلوب"));
    assert!(body["timestamp"].is_string());
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_whitespace_inputs_are_rejected() {
    let model = FakeModel::replying("unused");

    let (status, body) = post_json(app(model.clone()), "/doctor", json!({"question": "  \n\t "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["error"].as_str().unwrap().is_empty());

    let (status, body) = post_json(app(model.clone()), "/analyze", json!({"base64Image": "   ", "language": "en"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Image is required"));

    let (status, _) = post_json(app(model.clone()), "/analyze", json!({"base64Image": "data:image/png;base64,"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(app(model.clone()), "/analyze", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_unreadable_body_gets_error_envelope() {
    let model = FakeModel::replying("unused");
    let (status, body) = send(app(model.clone()), "POST", "/doctor", Body::from("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("السؤال مطلوب"));
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_oversized_image_is_413_not_missing_image() {
    let model = FakeModel::replying("unused");
    let image = "A".repeat(3 * 1024 * 1024);
    let (status, body) = post_json(
        app(model.clone()),
        "/analyze",
        json!({"base64Image": image, "language": "en"}),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], json!(false));
    assert_ne!(body["error"], json!("الصورة مطلوبة"));
    assert_eq!(body["error"], json!("تعذر قراءة الطلب."));
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_missing_content_type_is_415() {
    let model = FakeModel::replying("unused");
    let response = app(model.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/doctor")
                .body(Body::from(r#"{"question": "hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["success"], json!(false));
    assert_ne!(body["error"], json!("السؤال مطلوب"));
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_wrong_typed_field_is_rejected_in_callers_language() {
    let model = FakeModel::replying("unused");
    let (status, body) = post_json(app(model.clone()), "/doctor", json!({"question": 5, "language": "en"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Question is required"));
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_analyze_extracts_json_from_prose() {
    let model = FakeModel::replying(r#"Sure! {"plantName":"Rose","healthStatus":"Healthy","confidence":0.9}"#);
    let (status, body) = post_json(
        app(model.clone()),
        "/analyze",
        json!({"base64Image": "data:image/jpeg;base64,AAAA", "language": "en"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["plantName"], json!("Rose"));
    assert_eq!(body["healthStatus"], json!("Healthy"));
    assert_eq!(body["diseaseName"], Value::Null);
    assert_eq!(body["confidence"], json!(0.9));
    assert_eq!(body["treatment"], json!([]));
    assert_eq!(body["prevention"], json!([]));

    // The data-URI prefix is stripped and re-applied as JPEG.
    let calls = model.calls();
    let MessageContent::Parts(parts) = &calls[0].messages[0].content else {
        panic!("analysis request should be multi-part");
    };
    let urls: Vec<_> = parts
        .iter()
        .filter_map(|p| match p {
            ContentPart::ImageUrl { image_url } => Some(image_url.url.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(urls, ["data:image/jpeg;base64,AAAA"]);
}

#[tokio::test]
async fn test_analyze_without_json_falls_back_to_raw_text() {
    let reply = "I cannot identify this plant, the photo is too dark.";
    let model = FakeModel::replying(reply);
    let (status, body) = post_json(app(model), "/analyze", json!({"base64Image": "AAAA"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], json!(reply));
    assert_eq!(body["plantName"], json!("نبات غير معروف"));
    assert_eq!(body["healthStatus"], json!("Unknown"));
    assert_eq!(body["confidence"], json!(0.5));
    assert_eq!(body["treatment"], json!([]));
}

#[tokio::test]
async fn test_missing_credential_is_a_configuration_error() {
    let model = FakeModel::replying("unused");

    let (status, body) = post_json(app_with(model.clone(), None), "/doctor", json!({"question": "hi", "language": "en"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("API Key not configured. Please contact developer."));

    let (status, body) = post_json(app_with(model.clone(), None), "/analyze", json!({"base64Image": "AAAA"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("مفتاح API غير مُعرّف. يرجى التواصل مع المطور."));

    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_upstream_rate_limit_becomes_500_with_status_in_details() {
    let model = FakeModel::new(Scripted::Status(429));
    let (status, body) = post_json(app(model), "/analyze", json!({"base64Image": "AAAA", "language": "en"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Analysis failed. Please try again."));
    assert!(body["details"].as_str().unwrap().contains("429"));
}

#[tokio::test]
async fn test_upstream_transport_failure_becomes_500() {
    let model = FakeModel::new(Scripted::Transport);
    let (status, body) = post_json(app(model), "/doctor", json!({"question": "hi", "language": "ar"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("فشلت الدردشة. يرجى المحاولة مرة أخرى."));
    assert!(body["details"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_history_is_forwarded_in_order() {
    let model = FakeModel::replying("ok");
    let (status, _) = post_json(
        app(model.clone()),
        "/doctor",
        json!({
            "question": "  and now?  ",
            "history": [
                {"role": "user", "text": "my tomato has spots"},
                {"role": "model", "text": "brown or yellow?"},
                {"role": "user"}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let calls = model.calls();
    let roles: Vec<_> = calls[0].messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, ["system", "user", "assistant", "user"]);
    assert_eq!(calls[0].messages[3].content, MessageContent::Text("and now?".into()));
}

#[tokio::test]
async fn test_unknown_route_gets_json_404() {
    let (status, body) = send(app(FakeModel::replying("unused")), "GET", "/nope", Body::empty()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["details"], json!("Cannot GET /nope"));
    assert_eq!(body["availableEndpoints"]["doctor"], json!("POST /doctor"));
}

#[tokio::test]
async fn test_status_endpoint() {
    let (status, body) = send(app(FakeModel::replying("unused")), "GET", "/", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("running"));
    assert!(body["version"].is_string());
}
