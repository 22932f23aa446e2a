//! Prompt Provider: external generation with local fallback.
//!
//! Each call makes at most one external attempt:
//! - Not configured: draw locally, no network
//! - Transport error, timeout, cancellation, non-2xx: draw locally
//! - Response without a usable `prompt`: draw locally
//! - Valid response: return it with `source = llm`
//!
//! Callers never see an error. The path taken is visible in
//! [`PromptCard::source`] and in the logs.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use steadfast_core::{draw_local_card, ContentLibrary, PromptCard, PromptRequest};

use crate::fallback::{FallbackReason, ProviderOutcome};
use crate::prompts::build_messages;
use crate::providers::{CompletionConfig, LlmProvider};
use crate::validation::card_from_body;

#[cfg(feature = "http")]
use crate::config::RuntimeConfig;
#[cfg(feature = "http")]
use crate::providers::HttpChatProvider;

/// Produces one prompt card per request.
///
/// Safe to share across tasks. The only mutable state is the random source,
/// locked for the duration of a deck draw and never across an `.await`.
pub struct PromptProvider {
    /// External provider; `None` means local-only
    provider: Option<Arc<dyn LlmProvider>>,

    /// Decks used for fallback and anchor defaults
    library: Arc<ContentLibrary>,

    /// Model and timeout for the external call
    completion: CompletionConfig,

    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for PromptProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptProvider")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("completion", &self.completion)
            .finish_non_exhaustive()
    }
}

impl Default for PromptProvider {
    fn default() -> Self {
        Self::local_only()
    }
}

impl PromptProvider {
    /// A provider that only ever draws from the built-in decks.
    pub fn local_only() -> Self {
        PromptProviderBuilder::new().build()
    }

    pub fn builder() -> PromptProviderBuilder {
        PromptProviderBuilder::new()
    }

    /// Build from runtime configuration, wiring the HTTP provider when an
    /// endpoint and key are present. Unusable settings leave it local-only.
    #[cfg(feature = "http")]
    pub fn from_config(config: RuntimeConfig) -> Self {
        PromptProviderBuilder::new().config(config).build()
    }

    /// Whether an external call will be attempted.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn library(&self) -> &Arc<ContentLibrary> {
        &self.library
    }

    pub fn timeout(&self) -> Duration {
        self.completion.timeout
    }

    /// Generate a prompt card. Never fails.
    pub async fn generate_prompt(&self, request: &PromptRequest) -> PromptCard {
        self.generate_prompt_until(request, futures::future::pending::<()>())
            .await
    }

    /// Generate a prompt card, abandoning the external call when `cancel`
    /// completes first. Cancellation falls back to the local deck.
    pub async fn generate_prompt_until<F>(&self, request: &PromptRequest, cancel: F) -> PromptCard
    where
        F: Future<Output = ()>,
    {
        let outcome = self.try_external_until(request, cancel).await;
        self.resolve(request, outcome)
    }

    /// Run only the external branch.
    pub async fn try_external(&self, request: &PromptRequest) -> ProviderOutcome {
        self.try_external_until(request, futures::future::pending::<()>())
            .await
    }

    /// Run only the external branch, with cancellation.
    pub async fn try_external_until<F>(&self, request: &PromptRequest, cancel: F) -> ProviderOutcome
    where
        F: Future<Output = ()>,
    {
        let Some(provider) = &self.provider else {
            return ProviderOutcome::Fallback(FallbackReason::NotConfigured);
        };

        let timeout = self.completion.timeout;
        let call = tokio::time::timeout(
            timeout,
            provider.complete(build_messages(request), &self.completion),
        );

        tokio::select! {
            result = call => match result {
                Ok(Ok(response)) => {
                    tracing::debug!(provider = provider.name(), status = response.status, "Provider responded");
                    match card_from_body(&response.body, request, &self.library) {
                        Ok(card) => ProviderOutcome::Generated(card),
                        Err(e) => ProviderOutcome::Fallback(e.into()),
                    }
                }
                Ok(Err(e)) => ProviderOutcome::Fallback(e.into()),
                Err(_) => ProviderOutcome::Fallback(FallbackReason::Timeout(timeout)),
            },
            _ = cancel => ProviderOutcome::Fallback(FallbackReason::Cancelled),
        }
    }

    /// Draw from the request persona's local deck.
    pub fn draw_local(&self, request: &PromptRequest) -> PromptCard {
        let mut rng = self.rng.lock();
        draw_local_card(request, &self.library, &mut *rng)
    }

    /// Collapse an outcome into a card, logging any fallback.
    fn resolve(&self, request: &PromptRequest, outcome: ProviderOutcome) -> PromptCard {
        match outcome {
            ProviderOutcome::Generated(card) => {
                tracing::debug!(persona = %request.persona, "Using generated prompt");
                card
            }
            ProviderOutcome::Fallback(reason) => {
                if reason.is_error() {
                    tracing::warn!(
                        persona = %request.persona,
                        provider = self.provider.as_ref().map(|p| p.name()).unwrap_or("none"),
                        reason = %reason,
                        "Falling back to local prompt deck"
                    );
                } else {
                    tracing::debug!(persona = %request.persona, "No provider configured, using local prompt deck");
                }
                self.draw_local(request)
            }
        }
    }
}

/// Builder for [`PromptProvider`].
pub struct PromptProviderBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    library: Option<Arc<ContentLibrary>>,
    completion: CompletionConfig,
    seed: Option<u64>,
}

impl PromptProviderBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            library: None,
            completion: CompletionConfig::default(),
            seed: None,
        }
    }

    /// Set the external provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use a custom content library instead of the built-in one.
    pub fn library(mut self, library: Arc<ContentLibrary>) -> Self {
        self.library = Some(library);
        self
    }

    pub fn completion(mut self, completion: CompletionConfig) -> Self {
        self.completion = completion;
        self
    }

    /// Bound on one external call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.completion.timeout = timeout;
        self
    }

    /// Seed the local draw for reproducible output.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Apply runtime configuration.
    ///
    /// A provider that cannot be constructed is logged and skipped, so the
    /// result draws locally instead of failing.
    #[cfg(feature = "http")]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.completion = config.completion_config();

        if let Some(settings) = config.provider {
            if !settings.credential.is_empty() {
                match HttpChatProvider::new(settings.endpoint, settings.credential) {
                    Ok(provider) => self.provider = Some(Arc::new(provider)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring content provider, running in local-only mode");
                    }
                }
            }
        }

        self
    }

    pub fn build(self) -> PromptProvider {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        PromptProvider {
            provider: self.provider,
            library: self.library.unwrap_or_else(ContentLibrary::builtin),
            completion: self.completion,
            rng: Mutex::new(rng),
        }
    }
}

impl Default for PromptProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, CompletionResponse, ProviderError};
    use async_trait::async_trait;
    use serde_json::{json, Value as JsonValue};
    use steadfast_core::{Persona, PromptSource, PromptTemplate};

    /// Returns a fixed body.
    struct StaticProvider(JsonValue);

    #[async_trait]
    impl LlmProvider for StaticProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse::new(self.0.clone()))
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    /// Fails with a fixed status.
    struct StatusProvider(u16);

    #[async_trait]
    impl LlmProvider for StatusProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Err(ProviderError::ApiError {
                status: self.0,
                message: "unavailable".to_string(),
            })
        }

        fn name(&self) -> &str {
            "status"
        }
    }

    /// Never answers within a test's patience.
    struct SlowProvider;

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(CompletionResponse::new(json!({ "prompt": "too late" })))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    /// Records the messages it receives.
    #[derive(Default)]
    struct RecordingProvider {
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.seen.lock().extend(messages);
            Ok(CompletionResponse::new(json!({ "prompt": { "prompt": "X" } })))
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn in_deck(card: &PromptCard, deck: &[PromptTemplate]) -> bool {
        deck.iter().any(|t| t.prompt == card.prompt && t.reflection == card.reflection)
    }

    fn with_provider(provider: impl LlmProvider + 'static) -> PromptProvider {
        PromptProvider::builder()
            .provider(Arc::new(provider))
            .seed(11)
            .build()
    }

    #[tokio::test]
    async fn test_unconfigured_draws_locally() {
        let provider = PromptProvider::builder().seed(1).build();
        assert!(!provider.is_configured());

        let request = PromptRequest::new(Persona::Anchored, "").with_values(["Courage"]);
        let card = provider.generate_prompt(&request).await;

        assert_eq!(card.source, PromptSource::Local);
        assert_eq!(card.anchor, "Courage");
        assert!(in_deck(&card, provider.library().deck(Persona::Anchored)));
        assert!(card.is_well_formed());
    }

    #[tokio::test]
    async fn test_unconfigured_outcome() {
        let provider = PromptProvider::local_only();
        let outcome = provider
            .try_external(&PromptRequest::new(Persona::Explorer, ""))
            .await;
        assert_eq!(outcome.fallback_reason(), Some(&FallbackReason::NotConfigured));
    }

    #[tokio::test]
    async fn test_error_status_falls_back() {
        let provider = with_provider(StatusProvider(500));
        let request = PromptRequest::new(Persona::Explorer, "");

        let outcome = provider.try_external(&request).await;
        assert_eq!(outcome.fallback_reason(), Some(&FallbackReason::Status(500)));
        assert!(!outcome.is_generated());

        let card = provider.generate_prompt(&request).await;
        assert_eq!(card.source, PromptSource::Local);
        assert!(in_deck(&card, provider.library().deck(Persona::Explorer)));
    }

    #[tokio::test]
    async fn test_missing_prompt_falls_back() {
        let provider = with_provider(StaticProvider(json!({ "reflection": "only this" })));
        let request = PromptRequest::new(Persona::Anchored, "");

        let outcome = provider.try_external(&request).await;
        assert!(matches!(
            outcome.fallback_reason(),
            Some(FallbackReason::Schema(_))
        ));

        let card = provider.generate_prompt(&request).await;
        assert_eq!(card.source, PromptSource::Local);
    }

    #[tokio::test]
    async fn test_nested_prompt_is_used() {
        let provider = with_provider(StaticProvider(
            json!({ "prompt": { "prompt": "X", "reflection": "Y" } }),
        ));
        let request = PromptRequest::new(Persona::Anchored, "").with_values(["Courage"]);

        let outcome = provider.try_external(&request).await;
        assert!(outcome.is_generated());
        assert_eq!(outcome.fallback_reason(), None);

        let card = provider.generate_prompt(&request).await;
        assert_eq!(card.source, PromptSource::Llm);
        assert_eq!(card.prompt, "X");
        assert_eq!(card.reflection, "Y");
        assert_eq!(card.follow_up, "Capture one action that keeps you anchored.");
        assert_eq!(card.anchor, "Courage");
        assert_eq!(card.intention, "Ground me");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let provider = PromptProvider::builder()
            .provider(Arc::new(SlowProvider))
            .timeout(Duration::from_millis(250))
            .build();
        let request = PromptRequest::new(Persona::Anchored, "");

        let outcome = provider.try_external(&request).await;
        assert_eq!(
            outcome.fallback_reason(),
            Some(&FallbackReason::Timeout(Duration::from_millis(250)))
        );

        let card = provider.generate_prompt(&request).await;
        assert_eq!(card.source, PromptSource::Local);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_falls_back() {
        let provider = with_provider(SlowProvider);
        let request = PromptRequest::new(Persona::Explorer, "");

        let outcome = provider
            .try_external_until(&request, tokio::time::sleep(Duration::from_millis(10)))
            .await;
        assert_eq!(outcome.fallback_reason(), Some(&FallbackReason::Cancelled));

        let card = provider.generate_prompt_until(&request, async {}).await;
        assert_eq!(card.source, PromptSource::Local);
        assert!(in_deck(&card, provider.library().deck(Persona::Explorer)));
    }

    #[tokio::test]
    async fn test_unknown_persona_uses_anchored_deck() {
        let provider = PromptProvider::builder().seed(5).build();
        let request = PromptRequest::new("mystic".parse().unwrap(), "");

        let card = provider.generate_prompt(&request).await;
        assert!(in_deck(&card, provider.library().deck(Persona::Anchored)));
        assert_eq!(card.intention, "Stay aligned");
    }

    #[tokio::test]
    async fn test_request_messages() {
        let recorder = Arc::new(RecordingProvider::default());
        let provider = PromptProvider::builder()
            .provider(recorder.clone())
            .build();
        let request = PromptRequest::new(Persona::Explorer, "").with_values(["Growth"]);

        let card = provider.generate_prompt(&request).await;
        assert_eq!(card.source, PromptSource::Llm);

        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].role, "system");
        let brief: JsonValue = serde_json::from_str(&seen[1].content).unwrap();
        assert_eq!(brief["persona"], "explorer");
        assert_eq!(brief["intention"], "Ground me");
        assert_eq!(brief["values"], json!(["Growth"]));
    }

    #[tokio::test]
    async fn test_seeded_draws_are_reproducible() {
        let request = PromptRequest::new(Persona::Explorer, "");
        let a = PromptProvider::builder().seed(42).build();
        let b = PromptProvider::builder().seed(42).build();

        for _ in 0..5 {
            assert_eq!(a.generate_prompt(&request).await, b.generate_prompt(&request).await);
        }
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_unusable_endpoint_draws_locally() {
        let provider =
            PromptProvider::from_config(RuntimeConfig::with_provider("llm.example.com", "sk-test"));
        assert!(!provider.is_configured());

        let request = PromptRequest::new(Persona::Explorer, "").with_values(["Courage"]);
        let card = provider.generate_prompt(&request).await;
        assert_eq!(card.source, PromptSource::Local);
        assert_eq!(card.anchor, "Courage");
        assert!(in_deck(&card, provider.library().deck(Persona::Explorer)));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_invalid_environment_draws_locally() {
        let config = RuntimeConfig::from_lookup(|key| match key {
            "LLM_API_URL" => Some("llm.example.com/v1/chat".to_string()),
            "LLM_API_KEY" => Some("sk-test".to_string()),
            "LLM_TIMEOUT" => Some("soon".to_string()),
            _ => None,
        });
        let provider = PromptProvider::builder().config(config).seed(9).build();
        assert!(!provider.is_configured());
        assert_eq!(provider.timeout(), crate::config::DEFAULT_TIMEOUT);

        let card = provider
            .generate_prompt(&PromptRequest::new(Persona::Anchored, ""))
            .await;
        assert_eq!(card.source, PromptSource::Local);
        assert!(card.is_well_formed());
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let provider = Arc::new(with_provider(StatusProvider(502)));
        let request = PromptRequest::new(Persona::Anchored, "Rest");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                let request = request.clone();
                tokio::spawn(async move { provider.generate_prompt(&request).await })
            })
            .collect();

        for handle in handles {
            let card = handle.await.unwrap();
            assert_eq!(card.source, PromptSource::Local);
            assert_eq!(card.intention, "Rest");
        }
    }
}
