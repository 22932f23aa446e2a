//! Outcome of the external generation branch.
//!
//! Every failure of the external branch is a [`FallbackReason`]. None of
//! them reach the caller of `generate_prompt`; they exist for logging and
//! for tests that need to know which path was taken.

use std::time::Duration;
use thiserror::Error;

use steadfast_core::PromptCard;

use crate::providers::ProviderError;
use crate::validation::PayloadError;

/// Why the local deck was used instead of the external provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Endpoint or key absent; not an error
    #[error("provider not configured")]
    NotConfigured,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled by caller")]
    Cancelled,

    #[error("provider returned status {0}")]
    Status(u16),

    /// Body was not JSON, or the located payload could not be read
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("payload rejected: {0}")]
    Schema(String),
}

impl FallbackReason {
    /// Whether this reason indicates a failure worth a warning.
    pub fn is_error(&self) -> bool {
        !matches!(self, FallbackReason::NotConfigured)
    }
}

impl From<ProviderError> for FallbackReason {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::HttpError(msg) => FallbackReason::Transport(msg),
            ProviderError::ApiError { status, .. } => FallbackReason::Status(status),
            ProviderError::ParseError(msg) => FallbackReason::Malformed(msg),
            ProviderError::Timeout(after) => FallbackReason::Timeout(after),
            ProviderError::NotConfigured(_) => FallbackReason::NotConfigured,
        }
    }
}

impl From<PayloadError> for FallbackReason {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::Malformed(msg) => FallbackReason::Malformed(msg),
            PayloadError::Schema(errors) => FallbackReason::Schema(errors.join("; ")),
        }
    }
}

/// Result of one attempt at external generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// A validated card with `source = llm`
    Generated(PromptCard),

    /// The caller must draw from the local deck
    Fallback(FallbackReason),
}

impl ProviderOutcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, ProviderOutcome::Generated(_))
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            ProviderOutcome::Fallback(reason) => Some(reason),
            ProviderOutcome::Generated(_) => None,
        }
    }
}
