//! Synthetic data generation.
//!
//! One call builds a prompt (or fakes data locally), asks the backend once,
//! extracts the JSON payload from the answer and validates it against the
//! shape. Nothing is merged or stored here.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::extract::extract_json;
use super::faker::fake_dataset;
use super::prompt::build_prompt;
use super::validator::validate_and_normalize;
use crate::config::{GeneratorSettings, ProviderKind};
use crate::domain::{ApiShape, Dataset, FieldStructure, GenerationError};
use crate::llm::error::into_generation_error;
use crate::llm::{create_provider, CompletionRequest, LlmProvider, LlmResult};

/// Where generated text comes from.
#[derive(Clone)]
pub enum Backend {
    Llm(Arc<dyn LlmProvider>),
    Faker,
}

pub struct DataGenerator {
    backend: Backend,
    timeout: Duration,
    max_count: u32,
    temperature: f32,
    max_tokens: u32,
}

impl DataGenerator {
    pub fn new(backend: Backend, config: &GeneratorSettings) -> Self {
        Self {
            backend,
            timeout: Duration::from_secs(config.timeout_seconds),
            max_count: config.max_count,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Build the generator for the configured provider.
    pub fn from_settings(config: &GeneratorSettings) -> LlmResult<Self> {
        let backend = match create_provider(config)? {
            Some(provider) => Backend::Llm(provider),
            None => Backend::Faker,
        };
        Ok(Self::new(backend, config))
    }

    pub fn provider_name(&self) -> &str {
        match &self.backend {
            Backend::Llm(provider) => provider.name(),
            Backend::Faker => ProviderKind::Faker.as_str(),
        }
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Generate `count` records for `shape` following `structure`.
    ///
    /// `count` must already be within `1..=max_count`; the service layer
    /// clamps user input before calling this.
    pub async fn generate(
        &self,
        shape: ApiShape,
        structure: &FieldStructure,
        count: u32,
    ) -> Result<Dataset, GenerationError> {
        if count == 0 || count > self.max_count {
            return Err(GenerationError::InvalidCount {
                count,
                max: self.max_count,
            });
        }

        let started = Instant::now();
        let text = match &self.backend {
            Backend::Faker => serde_json::to_string(&fake_dataset(shape, structure, count))
                .map_err(|e| GenerationError::Prompt(e.to_string()))?,
            Backend::Llm(provider) => self.complete(provider.as_ref(), shape, structure, count).await?,
        };

        let raw = extract_json(&text)?;
        let dataset = validate_and_normalize(shape, &raw)?;

        debug!(
            provider = self.provider_name(),
            shape = %shape,
            count,
            records = dataset.record_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated candidate dataset"
        );
        Ok(dataset)
    }

    async fn complete(
        &self,
        provider: &dyn LlmProvider,
        shape: ApiShape,
        structure: &FieldStructure,
        count: u32,
    ) -> Result<String, GenerationError> {
        let prompt = build_prompt(shape, structure, count)?;
        let mut request = CompletionRequest::new(prompt.text, prompt.output_format);
        request.temperature = Some(self.temperature);
        request.max_tokens = Some(self.max_tokens);

        let timeout_seconds = self.timeout.as_secs();
        match tokio::time::timeout(self.timeout, provider.complete(request)).await {
            Ok(Ok(response)) => Ok(response.text),
            Ok(Err(err)) => {
                warn!(provider = provider.name(), error = %err, "Generation request failed");
                Err(into_generation_error(err, timeout_seconds))
            }
            Err(_) => {
                warn!(provider = provider.name(), timeout_seconds, "Generation request timed out");
                Err(GenerationError::Timeout(timeout_seconds))
            }
        }
    }
}
