//! The content library: persona decks, value reminders and grounding prompts.
//!
//! A library is immutable once built. The built-in tables are shared
//! process-wide through [`ContentLibrary::builtin`]; overrides are parsed
//! from YAML/JSON, schema-checked, and then handed out behind an `Arc`.

use lazy_static::lazy_static;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::schema::validate_content_schema;
use crate::types::Persona;

const DEFAULT_PACING_NUDGE: &str =
    "Pause before responding. You decide the pace, not the group chat.";
const DEFAULT_SOMATIC_NUDGE: &str =
    "Drop your shoulders and unclench your jaw. Your nervous system matters.";
const DEFAULT_ANCHOR: &str = "Authenticity";

/// Errors that can occur when loading a content library.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Failed to read content file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Content does not match schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Content validation failed: {0}")]
    ValidationError(String),
}

/// One card of a persona deck, before anchor and intention are overlaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub prompt: String,
    pub reflection: String,
    pub follow_up: String,
}

impl PromptTemplate {
    pub fn new(
        prompt: impl Into<String>,
        reflection: impl Into<String>,
        follow_up: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            reflection: reflection.into(),
            follow_up: follow_up.into(),
        }
    }
}

/// Serialized form of a library; converted through validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContentLibrary {
    anchored: Vec<PromptTemplate>,
    explorer: Vec<PromptTemplate>,
    #[serde(default)]
    value_reminders: BTreeMap<String, String>,
    grounding_prompts: Vec<String>,
    #[serde(default = "default_pacing_nudge")]
    pacing_nudge: String,
    #[serde(default = "default_somatic_nudge")]
    somatic_nudge: String,
    #[serde(default = "default_anchor")]
    default_anchor: String,
}

fn default_pacing_nudge() -> String {
    DEFAULT_PACING_NUDGE.to_string()
}

fn default_somatic_nudge() -> String {
    DEFAULT_SOMATIC_NUDGE.to_string()
}

fn default_anchor() -> String {
    DEFAULT_ANCHOR.to_string()
}

/// Read-only content tables.
///
/// # Invariants
/// - Both persona decks and the grounding deck hold at least one entry
/// - No entry, reminder key or reminder text is blank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawContentLibrary")]
pub struct ContentLibrary {
    anchored: Vec<PromptTemplate>,
    explorer: Vec<PromptTemplate>,
    value_reminders: BTreeMap<String, String>,
    grounding_prompts: Vec<String>,
    pacing_nudge: String,
    somatic_nudge: String,
    default_anchor: String,
}

lazy_static! {
    static ref BUILTIN: Arc<ContentLibrary> = Arc::new(ContentLibrary::builtin_tables());
}

impl ContentLibrary {
    /// The built-in library, shared for the life of the process.
    pub fn builtin() -> Arc<ContentLibrary> {
        Arc::clone(&BUILTIN)
    }

    fn builtin_tables() -> Self {
        let anchored = vec![
            PromptTemplate::new(
                "Name the moment you felt most like yourself this week. What value was present?",
                "How can you create conditions for that value to appear more often tomorrow?",
                "Capture one sentence you can read before stressful moments.",
            ),
            PromptTemplate::new(
                "Recall a time you chose your values over external pressure.",
                "What signal told you it was the right move?",
                "How will you protect that instinct in the next 48 hours?",
            ),
        ];

        let explorer = vec![
            PromptTemplate::new(
                "List three micro-moments that felt like \u{201c}you\u{201d} today\u{2014}even if no one noticed.",
                "What patterns can you spot across them?",
                "Choose one to amplify tomorrow. How will you remind yourself?",
            ),
            PromptTemplate::new(
                "Imagine your future self describing you to a friend. What qualities do they highlight?",
                "Where do you already see early signs of those qualities?",
                "What experiment helps you nurture one of them this week?",
            ),
        ];

        let value_reminders = [
            (
                "Authenticity",
                "Take an action today that reflects what you believe, not what others expect.",
            ),
            ("Growth", "Discomfort can be a teacher. Note one lesson from today."),
            (
                "Compassion",
                "Offer yourself the same kindness you give your closest friend.",
            ),
            ("Resilience", "Progress is non-linear. Celebrate the restart."),
            ("Honesty", "The most stress-free plan is usually the truthful one."),
        ]
        .into_iter()
        .map(|(value, reminder)| (value.to_string(), reminder.to_string()))
        .collect();

        let grounding_prompts = [
            "Name three values you lived today, no matter how small.",
            "Breathe in for four counts, out for six, repeat five times.",
            "Text someone you trust one honest sentence about how you feel.",
            "List two boundaries you want to protect this week.",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            anchored,
            explorer,
            value_reminders,
            grounding_prompts,
            pacing_nudge: default_pacing_nudge(),
            somatic_nudge: default_somatic_nudge(),
            default_anchor: default_anchor(),
        }
    }

    /// Parse a library from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ContentError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a library from JSON string.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a library from a file, picking the format by extension.
    ///
    /// `.json` files are read as JSON; everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ContentError> {
        validate_content_schema(&value).map_err(ContentError::SchemaViolation)?;
        let library: ContentLibrary = serde_json::from_value(value)?;
        tracing::debug!(
            anchored = library.anchored.len(),
            explorer = library.explorer.len(),
            reminders = library.value_reminders.len(),
            grounding = library.grounding_prompts.len(),
            "Loaded content library"
        );
        Ok(library)
    }

    /// Deck for a persona.
    pub fn deck(&self, persona: Persona) -> &[PromptTemplate] {
        match persona {
            Persona::Anchored => &self.anchored,
            Persona::Explorer => &self.explorer,
        }
    }

    /// Draw one template uniformly from the persona's deck.
    pub fn draw_template<R: Rng + ?Sized>(&self, persona: Persona, rng: &mut R) -> &PromptTemplate {
        let deck = self.deck(persona);
        // Decks are non-empty by construction.
        &deck[rng.gen_range(0..deck.len())]
    }

    /// Draw one grounding prompt uniformly.
    pub fn draw_grounding<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        &self.grounding_prompts[rng.gen_range(0..self.grounding_prompts.len())]
    }

    /// Reminder for a value: exact key first, then a case-insensitive match.
    pub fn reminder_for(&self, value: &str) -> Option<&str> {
        let value = value.trim();
        self.value_reminders
            .get(value)
            .or_else(|| {
                self.value_reminders
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(value))
                    .map(|(_, reminder)| reminder)
            })
            .map(String::as_str)
    }

    pub fn value_reminders(&self) -> &BTreeMap<String, String> {
        &self.value_reminders
    }

    pub fn grounding_prompts(&self) -> &[String] {
        &self.grounding_prompts
    }

    pub fn pacing_nudge(&self) -> &str {
        &self.pacing_nudge
    }

    pub fn somatic_nudge(&self) -> &str {
        &self.somatic_nudge
    }

    /// Anchor used when the student listed no values.
    pub fn default_anchor(&self) -> &str {
        &self.default_anchor
    }

    /// Ensure the library invariants hold.
    fn validate(&self) -> Result<(), ContentError> {
        for (name, deck) in [("anchored", &self.anchored), ("explorer", &self.explorer)] {
            if deck.is_empty() {
                return Err(ContentError::ValidationError(format!(
                    "{} deck is empty",
                    name
                )));
            }
            for (index, template) in deck.iter().enumerate() {
                for (field, text) in [
                    ("prompt", &template.prompt),
                    ("reflection", &template.reflection),
                    ("followUp", &template.follow_up),
                ] {
                    if text.trim().is_empty() {
                        return Err(ContentError::ValidationError(format!(
                            "{}[{}].{} is blank",
                            name, index, field
                        )));
                    }
                }
            }
        }

        if self.grounding_prompts.is_empty() {
            return Err(ContentError::ValidationError(
                "groundingPrompts is empty".to_string(),
            ));
        }
        if let Some(index) = self.grounding_prompts.iter().position(|p| p.trim().is_empty()) {
            return Err(ContentError::ValidationError(format!(
                "groundingPrompts[{}] is blank",
                index
            )));
        }

        for (value, reminder) in &self.value_reminders {
            if value.trim().is_empty() || reminder.trim().is_empty() {
                return Err(ContentError::ValidationError(format!(
                    "value reminder '{}' is blank",
                    value
                )));
            }
        }

        for (field, text) in [
            ("pacingNudge", &self.pacing_nudge),
            ("somaticNudge", &self.somatic_nudge),
            ("defaultAnchor", &self.default_anchor),
        ] {
            if text.trim().is_empty() {
                return Err(ContentError::ValidationError(format!("{} is blank", field)));
            }
        }

        Ok(())
    }
}

impl Default for ContentLibrary {
    fn default() -> Self {
        Self::builtin_tables()
    }
}

impl TryFrom<RawContentLibrary> for ContentLibrary {
    type Error = ContentError;

    fn try_from(raw: RawContentLibrary) -> Result<Self, Self::Error> {
        let library = Self {
            anchored: raw.anchored,
            explorer: raw.explorer,
            value_reminders: raw.value_reminders,
            grounding_prompts: raw.grounding_prompts,
            pacing_nudge: raw.pacing_nudge,
            somatic_nudge: raw.somatic_nudge,
            default_anchor: raw.default_anchor,
        };
        library.validate()?;
        Ok(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const OVERRIDE_YAML: &str = r#"
anchored:
  - prompt: "What kept you steady today?"
    reflection: "Which value did that protect?"
    followUp: "Write it on a sticky note."
explorer:
  - prompt: "What surprised you about yourself today?"
    reflection: "What does it hint at?"
    followUp: "Try it again tomorrow."
valueReminders:
  Courage: "Small brave acts count."
groundingPrompts:
  - "Feel your feet on the floor."
"#;

    #[test]
    fn test_builtin_is_valid() {
        let library = ContentLibrary::builtin();
        assert!(library.validate().is_ok());
        assert_eq!(library.deck(Persona::Anchored).len(), 2);
        assert_eq!(library.deck(Persona::Explorer).len(), 2);
        assert_eq!(library.grounding_prompts().len(), 4);
        assert_eq!(library.default_anchor(), "Authenticity");
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = ContentLibrary::builtin();
        let b = ContentLibrary::builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_parse_yaml_override() {
        let library = ContentLibrary::from_yaml(OVERRIDE_YAML).unwrap();
        assert_eq!(library.deck(Persona::Anchored).len(), 1);
        assert_eq!(library.reminder_for("Courage"), Some("Small brave acts count."));
        // Unset nudges fall back to the built-in phrasing
        assert_eq!(library.pacing_nudge(), DEFAULT_PACING_NUDGE);
        assert_eq!(library.default_anchor(), DEFAULT_ANCHOR);
    }

    #[test]
    fn test_parse_json_roundtrip_of_builtin() {
        let json = serde_json::to_string(&*ContentLibrary::builtin()).unwrap();
        let library = ContentLibrary::from_json(&json).unwrap();
        assert_eq!(library, *ContentLibrary::builtin());
    }

    #[test]
    fn test_empty_deck_rejected() {
        let yaml = r#"
anchored: []
explorer:
  - prompt: "p"
    reflection: "r"
    followUp: "f"
groundingPrompts: ["g"]
"#;
        let result = ContentLibrary::from_yaml(yaml);
        assert!(matches!(result, Err(ContentError::SchemaViolation(_))));
    }

    #[test]
    fn test_direct_deserialize_still_validates() {
        let json = serde_json::json!({
            "anchored": [],
            "explorer": [{ "prompt": "p", "reflection": "r", "followUp": "f" }],
            "groundingPrompts": ["g"]
        });
        assert!(serde_json::from_value::<ContentLibrary>(json).is_err());
    }

    #[test]
    fn test_reminder_lookup_ignores_case() {
        let library = ContentLibrary::builtin();
        assert_eq!(
            library.reminder_for("growth"),
            Some("Discomfort can be a teacher. Note one lesson from today.")
        );
        assert_eq!(library.reminder_for("Courage"), None);
    }

    #[test]
    fn test_draws_are_deck_members() {
        let library = ContentLibrary::builtin();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let template = library.draw_template(Persona::Explorer, &mut rng);
            assert!(library.deck(Persona::Explorer).contains(template));

            let grounding = library.draw_grounding(&mut rng);
            assert!(library.grounding_prompts().iter().any(|g| g == grounding));
        }
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = std::env::temp_dir().join(format!("steadfast-content-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let yaml_path = dir.join("library.yaml");
        fs::write(&yaml_path, OVERRIDE_YAML).unwrap();
        assert!(ContentLibrary::from_file(&yaml_path).is_ok());

        let json_path = dir.join("library.json");
        fs::write(&json_path, serde_json::to_string(&*ContentLibrary::builtin()).unwrap()).unwrap();
        assert!(ContentLibrary::from_file(&json_path).is_ok());

        assert!(matches!(
            ContentLibrary::from_file(dir.join("missing.yaml")),
            Err(ContentError::IoError(_))
        ));

        fs::remove_dir_all(&dir).ok();
    }
}
