//! Runtime configuration.
//!
//! The external provider is enabled only when both an endpoint and a
//! credential are present. Empty variables count as absent.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `LLM_API_URL` | Provider endpoint | unset (local-only) |
//! | `LLM_API_KEY` | Bearer credential | unset (local-only) |
//! | `LLM_MODEL` | Model name forwarded in the request body | unset |
//! | `LLM_TIMEOUT` | Bound on one external call, humantime syntax (`5s`, `750ms`) | `5s` |

use std::time::Duration;
use thiserror::Error;

use crate::providers::{ApiCredential, CompletionConfig, CredentialSource};

pub const LLM_API_URL_ENV: &str = "LLM_API_URL";
pub const LLM_API_KEY_ENV: &str = "LLM_API_KEY";
pub const LLM_MODEL_ENV: &str = "LLM_MODEL";
pub const LLM_TIMEOUT_ENV: &str = "LLM_TIMEOUT";

/// Default bound on one external call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a configuration value was ignored.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {var} value '{value}': {reason}")]
    InvalidDuration {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid {var}: endpoint must start with http:// or https://")]
    InvalidEndpoint { var: &'static str },

    #[error("{var} must be greater than zero")]
    ZeroTimeout { var: &'static str },
}

/// Connection details for the external provider.
#[derive(Debug)]
pub struct ProviderSettings {
    pub endpoint: String,
    pub credential: ApiCredential,
}

/// Configuration for the prompt runtime.
#[derive(Debug)]
pub struct RuntimeConfig {
    /// `None` means local-only mode: no network call is ever attempted
    pub provider: Option<ProviderSettings>,

    /// Model name forwarded to the endpoint
    pub model: Option<String>,

    /// Bound on one external call
    pub timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::local_only()
    }
}

impl RuntimeConfig {
    /// Configuration that never contacts an external provider.
    pub fn local_only() -> Self {
        Self {
            provider: None,
            model: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Configuration for a programmatically supplied endpoint and key.
    pub fn with_provider(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider: Some(ProviderSettings {
                endpoint: endpoint.into(),
                credential: ApiCredential::new(
                    api_key,
                    CredentialSource::Programmatic,
                    "content provider API key",
                ),
            }),
            ..Self::local_only()
        }
    }

    /// Set the call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Load from process environment.
    ///
    /// Never fails: invalid values are logged and degrade to local-only
    /// mode or the default timeout.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = read(LLM_API_URL_ENV).and_then(|raw| match parse_endpoint(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring provider endpoint, running in local-only mode");
                None
            }
        });

        let provider = match (endpoint, read(LLM_API_KEY_ENV)) {
            (Some(endpoint), Some(key)) => Some(ProviderSettings {
                endpoint,
                credential: ApiCredential::new(
                    key,
                    CredentialSource::Environment,
                    "content provider API key",
                ),
            }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::info!(
                    "Only one of {} / {} is usable, running in local-only mode",
                    LLM_API_URL_ENV,
                    LLM_API_KEY_ENV
                );
                None
            }
            (None, None) => None,
        };

        let timeout = match read(LLM_TIMEOUT_ENV) {
            Some(raw) => parse_timeout(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, default = ?DEFAULT_TIMEOUT, "Ignoring provider timeout");
                DEFAULT_TIMEOUT
            }),
            None => DEFAULT_TIMEOUT,
        };

        Self {
            provider,
            model: read(LLM_MODEL_ENV).map(|v| v.trim().to_string()),
            timeout,
        }
    }

    /// Whether an external call will be attempted.
    pub fn is_configured(&self) -> bool {
        self.provider
            .as_ref()
            .is_some_and(|p| !p.credential.is_empty() && !p.endpoint.trim().is_empty())
    }

    /// Per-call settings derived from this configuration.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            timeout: self.timeout,
        }
    }
}

/// Check that `raw` is an absolute http(s) URL.
pub fn parse_endpoint(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(ConfigError::InvalidEndpoint {
            var: LLM_API_URL_ENV,
        })
    }
}

/// Parse a humantime duration such as `5s` or `750ms`. Zero is rejected.
pub fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let parsed =
        humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::InvalidDuration {
            var: LLM_TIMEOUT_ENV,
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
    if parsed.is_zero() {
        return Err(ConfigError::ZeroTimeout {
            var: LLM_TIMEOUT_ENV,
        });
    }
    Ok(parsed)
}
