//! Validation of provider responses.
//!
//! A response body is accepted only when a candidate object can be located
//! in it and that object passes `schema/prompt_payload.schema.json`. There
//! is no best-effort parsing: anything else sends the caller to the local
//! deck.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;
use thiserror::Error;

use steadfast_core::{anchor_for, ContentLibrary, PromptCard, PromptRequest, PromptSource};

/// Reflection used when the payload carries none.
pub const DEFAULT_REFLECTION: &str = "What does this reveal about who you are?";

/// Follow-up used when the payload carries none.
pub const DEFAULT_FOLLOW_UP: &str = "Capture one action that keeps you anchored.";

/// Embedded payload schema (loaded at compile time).
const PAYLOAD_SCHEMA_JSON: &str = include_str!("../../../schema/prompt_payload.schema.json");

static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

lazy_static! {
    // Chat models often wrap JSON in a markdown fence
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*(.*?)\s*```\s*$").expect("Invalid regex");
}

/// Errors from payload validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Payload failed schema validation: {}", .0.join("; "))]
    Schema(Vec<String>),
}

/// Candidate fields once the schema has accepted them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptPayload {
    prompt: String,
    #[serde(default)]
    reflection: Option<String>,
    #[serde(default)]
    follow_up: Option<String>,
    #[serde(default)]
    anchor: Option<String>,
    #[serde(default)]
    intention: Option<String>,
}

fn get_validator() -> Result<&'static jsonschema::Validator, PayloadError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: JsonValue = serde_json::from_str(PAYLOAD_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;
        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| PayloadError::Schema(vec![e.clone()]))
}

/// Validate a candidate object against the payload schema.
pub fn validate_payload_schema(candidate: &JsonValue) -> Result<(), PayloadError> {
    let validator = get_validator()?;

    let errors: Vec<String> = validator
        .iter_errors(candidate)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PayloadError::Schema(errors))
    }
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Locate the candidate payload object in a response body.
///
/// Order: `prompt` when it is an object, `data` when it is an object, the
/// JSON object inside `choices[0].message.content`, then the body itself.
///
/// The last step accepts a flat `{"prompt": "..."}` body as the payload
/// itself, which a strict `prompt || data` lookup would reject.
pub fn locate_payload(body: &JsonValue) -> Result<JsonValue, PayloadError> {
    for key in ["prompt", "data"] {
        if let Some(nested) = body.get(key).filter(|v| v.is_object()) {
            return Ok(nested.clone());
        }
    }

    if let Some(content) = body.pointer("/choices/0/message/content") {
        let text = content.as_str().ok_or_else(|| {
            PayloadError::Malformed("choices[0].message.content is not a string".to_string())
        })?;
        let parsed: JsonValue = serde_json::from_str(strip_code_fence(text)).map_err(|e| {
            PayloadError::Malformed(format!("message content is not JSON: {}", e))
        })?;
        return Ok(parsed);
    }

    Ok(body.clone())
}

fn non_blank(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

/// Turn a provider response body into an `llm` card.
///
/// Optional fields that are missing, null or blank are back-filled: the
/// anchor from the request values (or the library default) and the
/// intention from the request (or "Ground me").
pub fn card_from_body(
    body: &JsonValue,
    request: &PromptRequest,
    library: &ContentLibrary,
) -> Result<PromptCard, PayloadError> {
    let candidate = locate_payload(body)?;
    validate_payload_schema(&candidate)?;

    let payload: PromptPayload =
        serde_json::from_value(candidate).map_err(|e| PayloadError::Malformed(e.to_string()))?;

    Ok(PromptCard {
        prompt: payload.prompt,
        reflection: non_blank(payload.reflection)
            .unwrap_or_else(|| DEFAULT_REFLECTION.to_string()),
        follow_up: non_blank(payload.follow_up).unwrap_or_else(|| DEFAULT_FOLLOW_UP.to_string()),
        anchor: non_blank(payload.anchor)
            .unwrap_or_else(|| anchor_for(&request.values, library).to_string()),
        intention: non_blank(payload.intention)
            .unwrap_or_else(|| request.provider_intention().to_string()),
        source: PromptSource::Llm,
    })
}
