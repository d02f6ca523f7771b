// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::language::Language;
use crate::message::ErrorBody;
use crate::services::upstream::UpstreamError;

/// Everything that can stop a relay run before a normalized answer exists.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The body never became JSON: too large, wrong content type, I/O.
    #[error("Unreadable request body: {reason}")]
    UnreadableBody { status: StatusCode, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream transport error: {0}")]
    UpstreamTransport(String),

    #[error("OpenAI API returned {status}")]
    UpstreamStatus { status: u16, body: String },
}

impl From<UpstreamError> for RelayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, body } => RelayError::UpstreamStatus { status, body },
            other => RelayError::UpstreamTransport(other.to_string()),
        }
    }
}

/// The relay endpoints that share the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Doctor,
    Analyze,
}

impl Endpoint {
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Doctor => "doctor",
            Endpoint::Analyze => "analyze",
        }
    }

    fn validation_message(self, language: Language) -> &'static str {
        match self {
            Endpoint::Doctor => language.question_required(),
            Endpoint::Analyze => language.image_required(),
        }
    }

    fn failure_message(self, language: Language) -> &'static str {
        match self {
            Endpoint::Doctor => language.chat_failed(),
            Endpoint::Analyze => language.analysis_failed(),
        }
    }
}

/// A `RelayError` bound to the endpoint and language it must be reported in.
#[derive(Debug, Error)]
#[error("{endpoint:?} failed: {source}")]
pub struct ApiError {
    pub endpoint: Endpoint,
    pub language: Language,
    #[source]
    pub source: RelayError,
}

impl ApiError {
    pub fn new(endpoint: Endpoint, language: Language, source: RelayError) -> Self {
        Self { endpoint, language, source }
    }

    pub fn status(&self) -> StatusCode {
        match self.source {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::UnreadableBody { status, .. } => status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, details) = match &self.source {
            RelayError::Validation(msg) => (self.endpoint.validation_message(self.language), msg.clone()),
            RelayError::UnreadableBody { reason, .. } => (self.language.body_unreadable(), reason.clone()),
            RelayError::Configuration(msg) => (self.language.key_not_configured(), msg.clone()),
            other => (self.endpoint.failure_message(self.language), other.to_string()),
        };
        ErrorBody::new(error, Some(details))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
