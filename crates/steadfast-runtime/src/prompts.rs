//! Messages sent to the external content provider.
//!
//! The request is two messages:
//! 1. A fixed system instruction constraining the reply to one JSON object
//! 2. A user message carrying the request as a compact JSON string

use serde::Serialize;
use steadfast_core::PromptRequest;

use crate::providers::ChatMessage;

/// System instruction shared by every request.
pub const SYSTEM_PROMPT: &str = "You help students stay rooted in their identities. \
Respond with a single JSON object containing prompt, reflection, and followUp fields \
(and optionally anchor and intention) that feel like Apple Journal. \
Do not include any text outside the JSON object.";

/// User message payload.
#[derive(Debug, Serialize)]
struct PromptBrief<'a> {
    persona: &'a str,
    intention: &'a str,
    values: &'a [String],
}

/// Serialize the request as the user message content.
pub fn user_content(request: &PromptRequest) -> String {
    let brief = PromptBrief {
        persona: request.persona.as_str(),
        intention: request.provider_intention(),
        values: &request.values,
    };

    serde_json::to_string(&brief).unwrap_or_else(|_| "{}".to_string())
}

/// Build the full message list for one generation call.
pub fn build_messages(request: &PromptRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user_content(request)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use steadfast_core::Persona;

    #[test]
    fn test_message_roles() {
        let messages = build_messages(&PromptRequest::new(Persona::Anchored, ""));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn test_user_content_defaults_intention() {
        let request = PromptRequest::new(Persona::Explorer, "").with_values(["Courage", "Growth"]);
        let content: Value = serde_json::from_str(&user_content(&request)).unwrap();
        assert_eq!(
            content,
            json!({
                "persona": "explorer",
                "intention": "Ground me",
                "values": ["Courage", "Growth"],
            })
        );
    }

    #[test]
    fn test_user_content_keeps_intention() {
        let request = PromptRequest::new(Persona::Anchored, "Find calm");
        let content: Value = serde_json::from_str(&user_content(&request)).unwrap();
        assert_eq!(content["intention"], "Find calm");
        assert_eq!(content["values"], json!([]));
    }

    #[test]
    fn test_system_prompt_names_fields() {
        assert!(SYSTEM_PROMPT.contains("prompt"));
        assert!(SYSTEM_PROMPT.contains("reflection"));
        assert!(SYSTEM_PROMPT.contains("followUp"));
        assert!(SYSTEM_PROMPT.contains("JSON"));
    }
}
