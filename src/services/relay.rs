// src/services/relay.rs
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{ApiError, Endpoint, RelayError};
use crate::language::Language;
use crate::message::{AnalyzeRequest, DiagnosisResult, DoctorAnswer, DoctorRequest};
use crate::services::normalizer::{normalize_answer, normalize_diagnosis};
use crate::services::prompts::{analysis_request, chat_request, strip_data_uri};
use crate::services::upstream::CompletionRequest;
use crate::state::AppState;

/// One endpoint's half of a relay run: how to validate the caller input,
/// what to send upstream and how to shape the reply.
pub trait RelayPipeline {
    type Output: Serialize;

    fn endpoint(&self) -> Endpoint;

    fn language(&self) -> Language;

    /// Checks caller input and builds the upstream request. Runs before any
    /// network traffic.
    fn build_request(&self) -> Result<CompletionRequest, RelayError>;

    /// Never fails; bad model output degrades to defaults.
    fn normalize(&self, reply: &str) -> Self::Output;
}

pub struct DoctorPipeline {
    request: DoctorRequest,
}

impl DoctorPipeline {
    pub fn new(request: DoctorRequest) -> Self {
        Self { request }
    }
}

impl RelayPipeline for DoctorPipeline {
    type Output = DoctorAnswer;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Doctor
    }

    fn language(&self) -> Language {
        self.request.language()
    }

    fn build_request(&self) -> Result<CompletionRequest, RelayError> {
        let question = self.request.question.as_deref().map(str::trim).unwrap_or_default();
        if question.is_empty() {
            return Err(RelayError::Validation("question is missing or empty".to_string()));
        }
        Ok(chat_request(self.language(), &self.request.history(), question))
    }

    fn normalize(&self, reply: &str) -> DoctorAnswer {
        normalize_answer(reply)
    }
}

pub struct AnalyzePipeline {
    request: AnalyzeRequest,
}

impl AnalyzePipeline {
    pub fn new(request: AnalyzeRequest) -> Self {
        Self { request }
    }
}

impl RelayPipeline for AnalyzePipeline {
    type Output = DiagnosisResult;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Analyze
    }

    fn language(&self) -> Language {
        self.request.language()
    }

    fn build_request(&self) -> Result<CompletionRequest, RelayError> {
        let payload = self.request.base64_image.as_deref().map(strip_data_uri).unwrap_or_default();
        if payload.is_empty() {
            return Err(RelayError::Validation("base64Image is missing or empty".to_string()));
        }
        Ok(analysis_request(self.language(), payload))
    }

    fn normalize(&self, reply: &str) -> DiagnosisResult {
        normalize_diagnosis(reply, self.language())
    }
}

/// Validate, check the credential, call upstream once, normalize.
pub async fn relay<P: RelayPipeline>(state: &AppState, pipeline: P) -> Result<P::Output, ApiError> {
    let endpoint = pipeline.endpoint();
    let language = pipeline.language();
    let span = tracing::info_span!(
        "relay",
        endpoint = endpoint.name(),
        language = language.code(),
        request_id = %Uuid::new_v4()
    );

    async move {
        let fail = |source: RelayError| ApiError::new(endpoint, language, source);

        let request = pipeline.build_request().map_err(|e| {
            tracing::warn!(error = %e, "Rejected invalid request");
            fail(e)
        })?;

        let Some(api_key) = state.api_key.as_ref() else {
            tracing::error!("Upstream API key is not configured");
            return Err(fail(RelayError::Configuration("OPENAI_API_KEY is not set".to_string())));
        };

        tracing::info!("Calling upstream model");
        let reply = state.model.complete(api_key, &request).await.map_err(|e| {
            tracing::error!(error = %e, "Upstream call failed");
            fail(RelayError::from(e))
        })?;

        let output = pipeline.normalize(&reply);
        tracing::info!("Relay completed");
        Ok(output)
    }
    .instrument(span)
    .await
}
