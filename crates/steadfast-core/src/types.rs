//! Shared data model for nudge composition and prompt generation.
//!
//! Wire names follow the client application (`pressureLevel`, `followUp`),
//! so every type here serializes in camelCase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Intention sent to the external provider when the caller supplied none.
pub const DEFAULT_PROVIDER_INTENTION: &str = "Ground me";

/// A student's identity anchors.
///
/// Owned by the surrounding application. This crate only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProfile {
    /// Values in the order the student listed them
    #[serde(default)]
    pub values: Vec<String>,

    /// Self-described strengths
    #[serde(default)]
    pub strengths: Vec<String>,

    /// Current goals
    #[serde(default)]
    pub goals: Vec<String>,
}

impl IdentityProfile {
    /// Create a profile holding only values.
    pub fn with_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Parse a profile from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse a profile from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Emotional and social-pressure snapshot taken at check-in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInContext {
    /// Emotion tags, lowercase
    #[serde(default)]
    pub emotions: BTreeSet<String>,

    /// Self-reported peer pressure, 0 = none
    #[serde(default)]
    pub pressure_level: u32,
}

impl CheckInContext {
    /// Build a context, normalizing emotion tags to trimmed lowercase and
    /// dropping blank ones.
    pub fn new<I, S>(emotions: I, pressure_level: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emotions = emotions
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            emotions,
            pressure_level,
        }
    }

    /// Whether the snapshot carries `tag`, ignoring case and padding.
    ///
    /// Contexts deserialized from the wire are not normalized, so the
    /// comparison cannot rely on the set's ordering.
    pub fn has_emotion(&self, tag: &str) -> bool {
        self.emotions
            .iter()
            .any(|e| e.trim().eq_ignore_ascii_case(tag))
    }
}

/// Coarse behavioral mode selecting the content deck and default phrasing.
///
/// Any tag other than `explorer` resolves to [`Persona::Anchored`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Persona {
    #[default]
    Anchored,
    Explorer,
}

impl Persona {
    /// Resolve a free-form tag.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("explorer") {
            Persona::Explorer
        } else {
            Persona::Anchored
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Anchored => "anchored",
            Persona::Explorer => "explorer",
        }
    }

    /// Intention used on locally drawn cards when the caller gave none.
    pub fn default_intention(&self) -> &'static str {
        match self {
            Persona::Anchored => "Stay aligned",
            Persona::Explorer => "Discover patterns",
        }
    }
}

impl From<String> for Persona {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl FromStr for Persona {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to prompt generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub persona: Persona,

    /// What the student wants from this session; may be empty
    #[serde(default)]
    pub intention: String,

    /// Identity values to anchor the card to
    #[serde(default)]
    pub values: Vec<String>,
}

impl PromptRequest {
    pub fn new(persona: Persona, intention: impl Into<String>) -> Self {
        Self {
            persona,
            intention: intention.into(),
            values: Vec::new(),
        }
    }

    /// Attach identity values.
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// The caller's intention, or `None` when it is blank.
    pub fn intention(&self) -> Option<&str> {
        let trimmed = self.intention.trim();
        (!trimmed.is_empty()).then_some(self.intention.as_str())
    }

    /// Intention as sent to the external provider.
    pub fn provider_intention(&self) -> &str {
        self.intention().unwrap_or(DEFAULT_PROVIDER_INTENTION)
    }
}

/// Where a prompt card came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptSource {
    /// Drawn from a local persona deck
    Local,
    /// Produced by the external content provider
    Llm,
}

impl fmt::Display for PromptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptSource::Local => f.write_str("local"),
            PromptSource::Llm => f.write_str("llm"),
        }
    }
}

/// A journaling micro-prompt.
///
/// Every textual field is non-empty on cards produced by this workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCard {
    pub prompt: String,
    pub reflection: String,
    pub follow_up: String,
    pub anchor: String,
    pub intention: String,
    pub source: PromptSource,
}

impl PromptCard {
    /// Whether all five textual fields carry visible text.
    pub fn is_well_formed(&self) -> bool {
        [
            &self.prompt,
            &self.reflection,
            &self.follow_up,
            &self.anchor,
            &self.intention,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// Returned when constructing a [`NudgeList`] from an empty sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("nudge list must contain at least one nudge")]
pub struct EmptyNudgeList;

/// Ordered check-in nudges, most urgent first. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct NudgeList(Vec<String>);

impl NudgeList {
    /// Assemble a list whose final element is always present.
    pub(crate) fn from_parts(mut leading: Vec<String>, last: String) -> Self {
        leading.push(last);
        Self(leading)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The most urgent nudge.
    pub fn first(&self) -> &str {
        &self.0[0]
    }

    /// The closing grounding nudge.
    pub fn last(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    pub fn contains(&self, nudge: &str) -> bool {
        self.0.iter().any(|n| n == nudge)
    }

    pub fn position(&self, nudge: &str) -> Option<usize> {
        self.0.iter().position(|n| n == nudge)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl TryFrom<Vec<String>> for NudgeList {
    type Error = EmptyNudgeList;

    fn try_from(nudges: Vec<String>) -> Result<Self, Self::Error> {
        if nudges.is_empty() {
            Err(EmptyNudgeList)
        } else {
            Ok(Self(nudges))
        }
    }
}

impl From<NudgeList> for Vec<String> {
    fn from(list: NudgeList) -> Self {
        list.0
    }
}

impl<'a> IntoIterator for &'a NudgeList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
