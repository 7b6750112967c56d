//! Error taxonomy of the engine.
//!
//! Validation, generation and routing failures are kept as separate types so
//! hosts can map each to its own status code without inspecting messages.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::shape::ApiShape;

/// A candidate dataset does not fit its declared shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The outer container has the wrong kind for the shape.
    #[error("Shape mismatch: {shape} data must be {}, found {found}", .shape.container_description())]
    ShapeMismatch { shape: ApiShape, found: String },

    /// An entry that must be a record (or a collection of records) is not.
    #[error("Malformed record at {}: expected {expected}, found {found}", location(.collection, .index))]
    RecordMalformed {
        collection: Option<String>,
        index: Option<usize>,
        expected: &'static str,
        found: &'static str,
    },
}

fn location(collection: &Option<String>, index: &Option<usize>) -> String {
    match (collection, index) {
        (Some(name), Some(i)) => format!("'{}'[{}]", name, i),
        (Some(name), None) => format!("'{}'", name),
        (None, Some(i)) => format!("[{}]", i),
        (None, None) => "root".to_string(),
    }
}

/// Name of the JSON kind of `value`, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Failure of the generate pipeline. Nothing is merged or saved when one occurs.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid record count {count}: must be between 1 and {max}")]
    InvalidCount { count: u32, max: u32 },

    #[error("Generation service unreachable: {0}")]
    NetworkFailure(String),

    #[error("Generation service rejected credentials: {0}")]
    AuthFailure(String),

    #[error("Generation service quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The service refused the request itself (4xx other than auth or quota)
    #[error("Generation service returned HTTP {status}: {message}")]
    ProviderError { status: u16, message: String },

    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    #[error("No JSON array or object found in generated output: {excerpt}")]
    Unparsable { excerpt: String },

    #[error("Generated data rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("Failed to build generation prompt: {0}")]
    Prompt(String),
}

impl GenerationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCount { .. } => StatusCode::BAD_REQUEST,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Prompt(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCount { .. } => "invalid_count",
            Self::NetworkFailure(_) => "network",
            Self::AuthFailure(_) => "auth",
            Self::QuotaExceeded(_) => "quota",
            Self::ProviderError { .. } => "provider",
            Self::Timeout(_) => "timeout",
            Self::Unparsable { .. } => "unparsable",
            Self::Rejected(_) => "rejected",
            Self::Prompt(_) => "prompt",
        }
    }
}

/// A declared (path, method) pair, as listed in not-found diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointKey {
    pub path: String,
    pub method: String,
}

/// No declared endpoint matches the request. A normal routing outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("No endpoint declared for {method} {path}")]
pub struct EndpointNotFound {
    pub path: String,
    pub method: String,
    /// Every declared pair, in declaration order.
    pub available: Vec<EndpointKey>,
}

/// Rejected endpoint declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("Endpoint path must start with '/': {0}")]
    InvalidPath(String),

    /// `/` is the dataset route and a query string is stripped before matching
    #[error("Endpoint path '{0}' cannot be reached: use a path below '/' without a query string")]
    UnreachablePath(String),

    #[error("Invalid HTTP method '{0}': expected one of GET, POST, PUT, DELETE")]
    InvalidMethod(String),

    #[error("Endpoint response must not be null")]
    MissingResponse,

    #[error("Endpoint {method} {path} is already declared")]
    DuplicateEndpoint { path: String, method: String },
}

impl EndpointError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DuplicateEndpoint { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Rejected field structure declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("A {0} structure must declare at least one {1}")]
    Empty(ApiShape, &'static str),

    #[error("'{0}' is not used by {1} structures")]
    Unexpected(&'static str, ApiShape),

    #[error("Entity name must not be empty (index {0})")]
    UnnamedEntity(usize),

    #[error("Entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    #[error("Entity '{0}' must declare at least one field")]
    NoFields(String),

    #[error("Field name must not be empty in '{0}'")]
    UnnamedField(String),

    #[error("Relation name '{relation}' on '{entity}' must start with a letter and contain only letters and digits")]
    InvalidRelationName { entity: String, relation: String },

    #[error("Relation '{relation}' on '{entity}' targets unknown entity '{target}'")]
    UnknownTarget {
        entity: String,
        relation: String,
        target: String,
    },

    #[error("Relation '{relation}' on '{entity}' targets its own entity")]
    SelfRelation { entity: String, relation: String },

    #[error("Field '{field}' on '{entity}' references unknown type '{target}'")]
    UnknownFieldType {
        entity: String,
        field: String,
        target: String,
    },
}
