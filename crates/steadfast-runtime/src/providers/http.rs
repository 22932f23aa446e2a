//! Generic JSON chat-endpoint provider.
//!
//! Posts `{"messages": [...]}` (plus `model` when configured) to a single
//! URL with bearer authentication and hands the parsed JSON body back
//! unvalidated. Works against any endpoint that accepts that shape,
//! including OpenAI-compatible chat completion routes.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::{
    secrets::ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, LlmProvider,
    ProviderError,
};

/// Longest error body excerpt kept in [`ProviderError::ApiError`].
const ERROR_EXCERPT_CHARS: usize = 200;

/// Provider backed by a single HTTP endpoint.
///
/// The credential lives in an [`ApiCredential`], so `Debug` output never
/// contains the key.
pub struct HttpChatProvider {
    credential: ApiCredential,
    endpoint: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChatProvider")
            .field("credential", &self.credential)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpChatProvider {
    /// Create a provider for `endpoint`.
    ///
    /// The endpoint must be an absolute `http://` or `https://` URL.
    pub fn new(endpoint: impl Into<String>, credential: ApiCredential) -> Result<Self, ProviderError> {
        let endpoint = endpoint.into();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ProviderError::NotConfigured(
                "endpoint must start with http:// or https://".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        Ok(Self {
            credential,
            endpoint,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Request body posted to the endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [ChatMessage],
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_EXCERPT_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(ERROR_EXCERPT_CHARS).collect();
        format!("{}...", cut)
    }
}

#[async_trait]
impl LlmProvider for HttpChatProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = ChatRequest {
            model: config.model.as_deref(),
            messages: &messages,
        };

        // SECURITY: Only expose the credential here, at the point of use
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.credential.expose())
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: excerpt(&text),
            });
        }

        let body: JsonValue =
            serde_json::from_str(&text).map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(CompletionResponse {
            body,
            status: status.as_u16(),
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
