//! Coerces free-text model replies into the fixed response schemas.
//!
//! Extraction and defaulting are pure functions of the reply text and the
//! language, so the same reply always yields the same result. Malformed model
//! output is never an error here: every field falls back to a default.

use serde_json::{Map, Value};

use crate::language::Language;
use crate::message::{DiagnosisResult, DoctorAnswer, HealthStatus};

const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Finds the JSON object embedded in `text`, if any.
///
/// The greedy span from the first `{` to the last `}` is tried first, then
/// the balanced span opening at each `{` in turn, so brace groups in the
/// surrounding prose are skipped. The first candidate that parses as a JSON
/// object wins.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let greedy = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => Some(&text[start..=end]),
        _ => None,
    };

    greedy
        .into_iter()
        .chain(
            text.match_indices('{')
                .filter_map(|(start, _)| balanced_span_from(text, start)),
        )
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
}

/// Span of the `{...}` opening at byte `start` whose braces balance,
/// skipping braces inside JSON string literals.
fn balanced_span_from(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn normalize_answer(reply: &str) -> DoctorAnswer {
    DoctorAnswer {
        answer: reply.to_string(),
    }
}

pub fn normalize_diagnosis(reply: &str, language: Language) -> DiagnosisResult {
    match extract_json_object(reply) {
        Some(fields) => diagnosis_from_fields(&fields, language),
        None => {
            tracing::warn!("No JSON object in model reply, using raw text as description");
            fallback_diagnosis(reply, language)
        }
    }
}

fn fallback_diagnosis(reply: &str, language: Language) -> DiagnosisResult {
    DiagnosisResult {
        plant_name: language.unknown_plant().to_string(),
        health_status: HealthStatus::Unknown,
        disease_name: None,
        description: reply.to_string(),
        treatment: Vec::new(),
        prevention: Vec::new(),
        symptoms: Vec::new(),
        causes: Vec::new(),
        severity: None,
        confidence: DEFAULT_CONFIDENCE,
    }
}

fn diagnosis_from_fields(fields: &Map<String, Value>, language: Language) -> DiagnosisResult {
    DiagnosisResult {
        plant_name: non_empty_str(fields, "plantName")
            .unwrap_or(language.unknown_plant())
            .to_string(),
        health_status: non_empty_str(fields, "healthStatus")
            .map(HealthStatus::parse)
            .unwrap_or_default(),
        disease_name: nullable_str(fields, "diseaseName"),
        description: non_empty_str(fields, "description").unwrap_or_default().to_string(),
        treatment: string_list(fields, "treatment"),
        prevention: string_list(fields, "prevention"),
        symptoms: string_list(fields, "symptoms"),
        causes: string_list(fields, "causes"),
        severity: nullable_str(fields, "severity"),
        confidence: fields
            .get("confidence")
            .and_then(Value::as_f64)
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_CONFIDENCE),
    }
}

fn non_empty_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

// Models echo the prompt's "or null" literally often enough to matter.
fn nullable_str(fields: &Map<String, Value>, key: &str) -> Option<String> {
    non_empty_str(fields, key)
        .filter(|s| !s.trim().eq_ignore_ascii_case("null"))
        .map(str::to_string)
}

fn string_list(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
