//! Generative text providers.
//!
//! Every provider turns a single prompt into raw text. Parsing that text into
//! a dataset is the generator's job, not the provider's.
//! - OpenAI (chat completions)
//! - Anthropic (messages)
//! - Google Gemini (generateContent)

mod anthropic;
pub mod error;
mod gemini;
mod openai;
mod retry;

pub use anthropic::AnthropicProvider;
pub use error::{LlmError, LlmResult};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use retry::RetryingProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{GeneratorSettings, ProviderKind};

/// A generative text service.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;

    /// Send one prompt and return the raw text answer.
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse>;
}

/// A single-prompt completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Short description of the output the caller expects, sent as the
    /// system instruction.
    pub output_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, output_format: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            output_format: output_format.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// System instruction shared by every provider.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a test data generator. Answer with {} encoded as JSON and nothing else.",
            self.output_format
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Create the configured provider, wrapped for retry when enabled.
///
/// Returns `None` for the offline faker backend.
pub fn create_provider(config: &GeneratorSettings) -> LlmResult<Option<Arc<dyn LlmProvider>>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::Faker => return Ok(None),
        ProviderKind::OpenAI => Arc::new(OpenAiProvider::new(config)?),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(config)?),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(config)?),
    };

    if config.retry.enabled {
        Ok(Some(Arc::new(RetryingProvider::new(provider, &config.retry))))
    } else {
        Ok(Some(provider))
    }
}

/// Read the API key from the configured variable, or the provider's default one.
pub(crate) fn api_key(config: &GeneratorSettings, default_env: &str) -> LlmResult<String> {
    let env_var = config.api_key_env.as_deref().unwrap_or(default_env);
    std::env::var(env_var)
        .map_err(|_| LlmError::Authentication(format!("Environment variable {} not set", env_var)))
}

/// Build the HTTP client with the configured request timeout.
pub(crate) fn http_client(config: &GeneratorSettings) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .build()
        .map_err(LlmError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faker_has_no_provider() {
        let config = GeneratorSettings::default();
        assert!(create_provider(&config).unwrap().is_none());
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let config = GeneratorSettings {
            provider: ProviderKind::Anthropic,
            api_key_env: Some("MIMIC_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..Default::default()
        };
        assert!(matches!(create_provider(&config), Err(LlmError::Authentication(_))));
    }

    #[test]
    fn test_system_prompt_names_format() {
        let request = CompletionRequest::new("hi", "an array of records");
        assert!(request.system_prompt().contains("an array of records"));
    }
}
