//! Errors raised by generative text providers.

use thiserror::Error;

use crate::domain::GenerationError;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Non-success HTTP status not covered by a more specific variant
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered but the body was not in the expected format
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Request timed out")]
    Timeout,
}

impl LlmError {
    /// Classify a non-success response from a provider.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => LlmError::Authentication(body),
            429 => LlmError::RateLimited(body),
            408 | 504 => LlmError::Timeout,
            code => LlmError::Api {
                status: code,
                message: body,
            },
        }
    }

    /// Failures worth retrying when retry is enabled.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Network(_) | LlmError::Timeout => true,
            LlmError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::Network(format!("Connection error: {}", err))
        } else if err.is_decode() {
            LlmError::Parse(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// Provider failures surface to callers as generation failures.
pub fn into_generation_error(err: LlmError, timeout_seconds: u64) -> GenerationError {
    match err {
        LlmError::Authentication(msg) => GenerationError::AuthFailure(msg),
        LlmError::RateLimited(msg) => GenerationError::QuotaExceeded(msg),
        LlmError::Timeout => GenerationError::Timeout(timeout_seconds),
        LlmError::Network(msg) => GenerationError::NetworkFailure(msg),
        LlmError::Api { status, message } if status >= 500 => {
            GenerationError::NetworkFailure(format!("HTTP {}: {}", status, message))
        }
        LlmError::Api { status, message } => GenerationError::ProviderError { status, message },
        LlmError::Parse(msg) => GenerationError::Unparsable { excerpt: msg },
    }
}

pub type LlmResult<T> = Result<T, LlmError>;
