//! Content provider abstractions for steadfast-runtime.
//!
//! This module defines the trait for external generation providers and the
//! HTTP chat-endpoint implementation used in production.
//!
//! ## Security
//!
//! Providers use the [`secrets`] module for credential handling.
//! See [`ApiCredential`] for the recommended patterns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

pub mod secrets;

#[cfg(feature = "http")]
mod http;

pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "http")]
pub use http::HttpChatProvider;

/// Errors from content providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Configuration for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model name forwarded to the endpoint, if any
    pub model: Option<String>,

    /// Upper bound on a single external call
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: None,
            timeout: Duration::from_secs(5),
        }
    }
}

/// A chat message sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Successful (2xx) provider response.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Parsed JSON body, not yet validated
    pub body: JsonValue,

    /// HTTP status the body arrived with
    pub status: u16,
}

impl CompletionResponse {
    pub fn new(body: JsonValue) -> Self {
        Self { body, status: 200 }
    }
}

/// Provider abstraction allows swapping generation backends.
///
/// Implementations perform exactly one attempt per call. Retrying,
/// timeouts and fallback are the caller's concern.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Get provider name for logs.
    fn name(&self) -> &str;
}
