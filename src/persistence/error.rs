//! Persistence layer error types

use thiserror::Error;

/// Errors that can occur in the persistence layer
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Item not found
    #[error("Item not found: {entity_type} with identifier '{identifier}'")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// Duplicate entry
    #[error("Duplicate entry: {entity_type} with name '{name}' already exists")]
    Duplicate { entity_type: String, name: String },

    /// Stored value does not fit its definition
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PersistenceError {
    pub fn definition_not_found(id: &str) -> Self {
        Self::NotFound {
            entity_type: "api".to_string(),
            identifier: id.to_string(),
        }
    }

    /// Convert to HTTP status code for API responses
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Duplicate { .. } => StatusCode::CONFLICT,
            Self::Serialization(_) => StatusCode::BAD_REQUEST,
        }
    }
}
