//! # steadfast-runtime
//!
//! Optional LLM-assisted prompt generation for Steadfast.
//!
//! This crate asks an external content provider for a journaling prompt
//! and falls back to the local persona decks in `steadfast-core` whenever
//! that fails.
//!
//! ## Important
//!
//! This crate is OPTIONAL. Everything in `steadfast-core` is deterministic
//! and never makes network calls. Without `LLM_API_URL` and `LLM_API_KEY`
//! the [`PromptProvider`] behaves exactly like a local deck draw.
//!
//! ## Example
//!
//! ```rust,ignore
//! use steadfast_core::{Persona, PromptRequest};
//! use steadfast_runtime::{PromptProvider, RuntimeConfig};
//!
//! let provider = PromptProvider::from_config(RuntimeConfig::from_env());
//!
//! let request = PromptRequest::new(Persona::Explorer, "Prepare for finals")
//!     .with_values(["Courage"]);
//! let card = provider.generate_prompt(&request).await;
//! println!("[{}] {}", card.source, card.prompt);
//! ```

pub mod config;
pub mod fallback;
pub mod prompt_provider;
pub mod prompts;
pub mod providers;
pub mod validation;

pub use config::{ConfigError, RuntimeConfig, DEFAULT_TIMEOUT};
pub use fallback::{FallbackReason, ProviderOutcome};
pub use prompt_provider::{PromptProvider, PromptProviderBuilder};
pub use providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, CredentialSource,
    LlmProvider, ProviderError,
};
pub use validation::PayloadError;

#[cfg(feature = "http")]
pub use providers::HttpChatProvider;
