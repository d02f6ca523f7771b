use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{ApiError, Endpoint, RelayError},
    language::Language,
    message::{AnalyzeRequest, DiagnosisResult, DoctorAnswer, DoctorRequest, Envelope},
    services::relay::{AnalyzePipeline, DoctorPipeline, relay},
    state::SharedState,
};

/// Turns the raw body into `T`. The body is read as a bare `Value` first so
/// a request with a badly typed field is still answered in its own language.
fn parse_body<T: DeserializeOwned>(
    endpoint: Endpoint,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<T, ApiError> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::warn!(endpoint = endpoint.name(), error = %rejection, "Rejected request body");
            let source = match &rejection {
                JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
                    RelayError::Validation(rejection.body_text())
                }
                _ => RelayError::UnreadableBody {
                    status: rejection.status(),
                    reason: rejection.body_text(),
                },
            };
            // Nothing was parsed, so there is no language to honor.
            return Err(ApiError::new(endpoint, Language::default(), source));
        }
    };

    let language = Language::from_code(body.get("language").and_then(Value::as_str));
    serde_json::from_value(body).map_err(|e| {
        tracing::warn!(endpoint = endpoint.name(), error = %e, "Request body has the wrong shape");
        ApiError::new(endpoint, language, RelayError::Validation(e.to_string()))
    })
}

pub async fn doctor_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Envelope<DoctorAnswer>>, ApiError> {
    let request: DoctorRequest = parse_body(Endpoint::Doctor, payload)?;
    let answer = relay(&state, DoctorPipeline::new(request)).await?;
    Ok(Json(Envelope::ok(answer)))
}

pub async fn analyze_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Envelope<DiagnosisResult>>, ApiError> {
    let request: AnalyzeRequest = parse_body(Endpoint::Analyze, payload)?;
    let diagnosis = relay(&state, AnalyzePipeline::new(request)).await?;
    Ok(Json(Envelope::ok(diagnosis)))
}
