//! Google Gemini generateContent provider

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{api_key, http_client, CompletionRequest, CompletionResponse, LlmProvider, TokenUsage};
use crate::config::{GeneratorSettings, ProviderKind};
use crate::llm::error::{LlmError, LlmResult};

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    default_temperature: f32,
    default_max_tokens: u32,
}

impl GeminiProvider {
    /// Create a new Gemini provider from configuration
    pub fn new(config: &GeneratorSettings) -> LlmResult<Self> {
        let api_key = api_key(config, "GOOGLE_API_KEY")?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string());

        Ok(Self {
            client: http_client(config)?,
            api_key,
            base_url,
            model: config.model_or_default(),
            default_temperature: config.temperature,
            default_max_tokens: config.max_tokens,
        })
    }

    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "systemInstruction": { "parts": [{ "text": request.system_prompt() }] },
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "temperature": request.temperature.unwrap_or(self.default_temperature),
                "maxOutputTokens": request.max_tokens.unwrap_or(self.default_max_tokens),
            }
        })
    }

    fn parse_response(response: GeminiResponse) -> LlmResult<CompletionResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("No candidates in response".to_string()))?;

        let text: String = candidate
            .content
            .and_then(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.is_empty() {
            return Err(LlmError::Parse("No text in response candidate".to_string()));
        }

        Ok(CompletionResponse {
            text,
            usage: response.usage_metadata.map(|u| {
                let prompt = u.prompt_token_count.unwrap_or(0);
                let completion = u.candidates_token_count.unwrap_or(0);
                TokenUsage {
                    prompt_tokens: prompt,
                    completion_tokens: completion,
                    total_tokens: u.total_token_count.unwrap_or(prompt + completion),
                }
            }),
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        ProviderKind::Gemini.as_str()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let body = self.build_request_body(&request);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            // Gemini reports an invalid key as 400 INVALID_ARGUMENT
            if error_text.contains("API key not valid") {
                return Err(LlmError::Authentication(error_text));
            }
            return Err(LlmError::from_status(status, error_text));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("Failed to parse response: {}", e)))?;

        Self::parse_response(gemini_response)
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config() {
        let provider = GeminiProvider {
            client: reqwest::Client::new(),
            api_key: "test".to_string(),
            base_url: "http://localhost".to_string(),
            model: "gemini-test".to_string(),
            default_temperature: 0.7,
            default_max_tokens: 2000,
        };
        let body = provider.build_request_body(&CompletionRequest::new("p", "an array of records"));

        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2000);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "p");
    }

    #[test]
    fn test_parse_candidate_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "```json\n[]\n```" }], "role": "model" } }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 4 }
        }))
        .unwrap();

        let parsed = GeminiProvider::parse_response(response).unwrap();
        assert_eq!(parsed.text, "```json\n[]\n```");
        assert_eq!(parsed.usage.unwrap().total_tokens, 16);
    }

    #[test]
    fn test_parse_no_candidates() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(GeminiProvider::parse_response(response), Err(LlmError::Parse(_))));
    }
}
