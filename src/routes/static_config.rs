use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::{
    message::{Envelope, ErrorBody, timestamp},
    services::static_config::{AdsConfig, StaticConfigError},
    state::SharedState,
};

pub async fn config_handler(State(state): State<SharedState>) -> Response {
    match state.static_config.app_config().await {
        Ok(mut config) => {
            config.insert("success".to_string(), Value::Bool(true));
            config.insert("timestamp".to_string(), Value::String(timestamp()));
            Json(config).into_response()
        }
        Err(err @ StaticConfigError::NotFound(_)) => {
            tracing::warn!(error = %err, "App config missing");
            (StatusCode::NOT_FOUND, Json(ErrorBody::new("Config file not found", Some(err.to_string())))).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to load app config");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new("Failed to load config", Some(err.to_string())))).into_response()
        }
    }
}

/// Ads failure keeps the success shape with blank ids so the client can
/// render without ads.
#[derive(Serialize)]
struct AdsFallback {
    success: bool,
    error: &'static str,
    details: String,
    #[serde(flatten)]
    ads: AdsConfig,
    timestamp: String,
}

pub async fn ads_handler(State(state): State<SharedState>) -> Response {
    match state.static_config.ads().await {
        Ok(ads) => Json(Envelope::ok(ads)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to load ads config");
            let body = AdsFallback {
                success: false,
                error: "Failed to load ads",
                details: err.to_string(),
                ads: AdsConfig::default(),
                timestamp: timestamp(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
