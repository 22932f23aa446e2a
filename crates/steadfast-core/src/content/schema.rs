//! JSON Schema validation for content libraries.
//!
//! Content overrides are validated against `schema/content.schema.json`
//! before they are deserialized, so a malformed file is rejected with every
//! offending location listed rather than the first serde error.

use serde_json::Value as JsonValue;
use std::sync::OnceLock;

/// Embedded content schema (loaded at compile time).
const CONTENT_SCHEMA_JSON: &str = include_str!("../../../../schema/content.schema.json");

static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, &'static str> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: JsonValue = serde_json::from_str(CONTENT_SCHEMA_JSON)
            .map_err(|e| format!("Invalid content schema JSON: {}", e))?;
        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile content schema: {}", e))
    });

    result.as_ref().map_err(String::as_str)
}

/// Validate a content library JSON value against the schema.
///
/// Returns every violation as `"<message> at <instance path>"`.
pub fn validate_content_schema(content_json: &JsonValue) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(content_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> serde_json::Value {
        serde_json::json!({
            "anchored": [
                { "prompt": "p", "reflection": "r", "followUp": "f" }
            ],
            "explorer": [
                { "prompt": "p2", "reflection": "r2", "followUp": "f2" }
            ],
            "groundingPrompts": ["Breathe."]
        })
    }

    #[test]
    fn test_embedded_schema_compiles() {
        assert!(get_validator().is_ok());
    }

    #[test]
    fn test_minimal_library_passes() {
        assert!(validate_content_schema(&minimal()).is_ok());
    }

    #[test]
    fn test_empty_deck_fails() {
        let mut value = minimal();
        value["explorer"] = serde_json::json!([]);
        assert!(validate_content_schema(&value).is_err());
    }

    #[test]
    fn test_blank_text_fails() {
        let mut value = minimal();
        value["groundingPrompts"] = serde_json::json!(["   "]);
        let errors = validate_content_schema(&value).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("/groundingPrompts/0")));
    }

    #[test]
    fn test_missing_follow_up_fails() {
        let mut value = minimal();
        value["anchored"] = serde_json::json!([{ "prompt": "p", "reflection": "r" }]);
        assert!(validate_content_schema(&value).is_err());
    }

    #[test]
    fn test_unknown_top_level_key_fails() {
        let mut value = minimal();
        value["mystic"] = serde_json::json!([]);
        assert!(validate_content_schema(&value).is_err());
    }

    #[test]
    fn test_reminders_must_be_text() {
        let mut value = minimal();
        value["valueReminders"] = serde_json::json!({ "Growth": 3 });
        assert!(validate_content_schema(&value).is_err());
    }
}
