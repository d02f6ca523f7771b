// src/message.rs
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::language::Language;

/// Current time as the ISO-8601 string every envelope carries.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Deserialize)]
pub struct DoctorRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    // Kept loose so malformed history entries are dropped instead of
    // failing the whole request.
    #[serde(default)]
    pub history: Option<Value>,
}

impl DoctorRequest {
    pub fn language(&self) -> Language {
        Language::from_code(self.language.as_deref())
    }

    /// Well-formed history entries, in caller order.
    pub fn history(&self) -> Vec<ChatMessage> {
        match &self.history {
            Some(Value::Array(entries)) => entries.iter().filter_map(ChatMessage::from_value).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default, rename = "base64Image")]
    pub base64_image: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl AnalyzeRequest {
    pub fn language(&self) -> Language {
        Language::from_code(self.language.as_deref())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// `user` stays the user; every other role is the assistant.
    pub fn normalize(role: &str) -> Self {
        if role == "user" {
            MessageRole::User
        } else {
            MessageRole::Assistant
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub text: String,
}

impl ChatMessage {
    fn from_value(value: &Value) -> Option<Self> {
        let role = value.get("role")?.as_str().filter(|r| !r.is_empty())?;
        let text = value.get("text")?.as_str().filter(|t| !t.is_empty())?;
        Some(Self {
            role: MessageRole::normalize(role),
            text: text.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorAnswer {
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum HealthStatus {
    Healthy,
    Diseased,
    #[default]
    Unknown,
}

impl HealthStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "healthy" => HealthStatus::Healthy,
            "diseased" => HealthStatus::Diseased,
            _ => HealthStatus::Unknown,
        }
    }
}

/// Canonical output of image analysis. Always fully populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub plant_name: String,
    pub health_status: HealthStatus,
    pub disease_name: Option<String>,
    pub description: String,
    pub treatment: Vec<String>,
    pub prevention: Vec<String>,
    pub symptoms: Vec<String>,
    pub causes: Vec<String>,
    pub severity: Option<String>,
    pub confidence: f64,
}

/// Successful response: `{success: true, ...payload, timestamp}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub payload: T,
    pub timestamp: String,
}

impl<T> Envelope<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            payload,
            timestamp: timestamp(),
        }
    }
}

/// Failure response: `{success: false, error, details?, timestamp}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details,
            timestamp: timestamp(),
        }
    }
}
