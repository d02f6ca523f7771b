// src/routes/mod.rs
pub mod relay;
pub mod static_config;

use crate::message::{ErrorBody, timestamp};
use crate::state::SharedState;
use axum::{
    Json, Router,
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
};
use relay::{analyze_handler, doctor_handler};
use serde_json::{Value, json};
use static_config::{ads_handler, config_handler};
use tower_http::trace::TraceLayer;

fn endpoint_index() -> Value {
    json!({
        "root": "GET /",
        "config": "GET /config",
        "ads": "GET /ads",
        "doctor": "POST /doctor",
        "analyze": "POST /analyze"
    })
}

pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(status_handler))
        .route("/health", get(|| async { "OK" }))
        .route("/config", get(config_handler))
        .route("/ads", get(ads_handler))
        .route("/doctor", post(doctor_handler))
        .route("/analyze", post(analyze_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

async fn status_handler() -> Json<Value> {
    Json(json!({
        "status": "running",
        "message": "Plant doctor relay is running",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": timestamp(),
        "endpoints": endpoint_index(),
    }))
}

async fn not_found_handler(method: Method, uri: Uri) -> impl IntoResponse {
    let body = ErrorBody::new("Not Found", Some(format!("Cannot {} {}", method, uri.path())));
    let mut value = json!(body);
    value["availableEndpoints"] = endpoint_index();
    (StatusCode::NOT_FOUND, Json(value))
}
