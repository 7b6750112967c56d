use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::EndpointError;

/// Verbs a mock endpoint can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = EndpointError;

    /// Case-sensitive: only the upper-case verb is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(EndpointError::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared mock endpoint with its stored response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Uuid,
    pub path: String,
    pub method: HttpMethod,
    pub response: Value,
    pub created_at: DateTime<Utc>,
}

/// Endpoint declaration as submitted by a definition owner.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewEndpoint {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub response: Value,
}

impl NewEndpoint {
    /// Check the declaration against the endpoints already declared on the
    /// same definition and build the stored endpoint.
    pub fn validate(self, existing: &[Endpoint]) -> Result<Endpoint, EndpointError> {
        if !self.path.starts_with('/') {
            return Err(EndpointError::InvalidPath(self.path));
        }
        if self.path == "/" || self.path.contains('?') {
            return Err(EndpointError::UnreachablePath(self.path));
        }
        let method: HttpMethod = self.method.parse()?;
        if self.response.is_null() {
            return Err(EndpointError::MissingResponse);
        }
        if existing
            .iter()
            .any(|e| e.path == self.path && e.method == method)
        {
            return Err(EndpointError::DuplicateEndpoint {
                path: self.path,
                method: method.to_string(),
            });
        }

        Ok(Endpoint {
            id: Uuid::new_v4(),
            path: self.path,
            method,
            response: self.response,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declare(path: &str, method: &str) -> NewEndpoint {
        NewEndpoint {
            path: path.to_string(),
            method: method.to_string(),
            response: json!({ "ok": true }),
        }
    }

    #[test]
    fn test_valid_endpoint() {
        let endpoint = declare("/users", "GET").validate(&[]).unwrap();
        assert_eq!(endpoint.path, "/users");
        assert_eq!(endpoint.method, HttpMethod::Get);
    }

    #[test]
    fn test_path_must_be_absolute() {
        let err = declare("users", "GET").validate(&[]).unwrap_err();
        assert_eq!(err, EndpointError::InvalidPath("users".to_string()));
    }

    #[test]
    fn test_unreachable_paths_rejected() {
        let err = declare("/", "GET").validate(&[]).unwrap_err();
        assert_eq!(err, EndpointError::UnreachablePath("/".to_string()));

        let err = declare("/users?page=2", "GET").validate(&[]).unwrap_err();
        assert_eq!(err, EndpointError::UnreachablePath("/users?page=2".to_string()));

        assert!(declare("/users/", "GET").validate(&[]).is_ok());
    }

    #[test]
    fn test_method_is_case_sensitive() {
        let err = declare("/users", "get").validate(&[]).unwrap_err();
        assert_eq!(err, EndpointError::InvalidMethod("get".to_string()));
        assert!(declare("/users", "PATCH").validate(&[]).is_err());
    }

    #[test]
    fn test_null_response_rejected() {
        let mut endpoint = declare("/users", "GET");
        endpoint.response = Value::Null;
        assert_eq!(endpoint.validate(&[]).unwrap_err(), EndpointError::MissingResponse);
    }

    #[test]
    fn test_duplicate_rejected() {
        let first = declare("/users", "GET").validate(&[]).unwrap();
        let existing = vec![first];

        let err = declare("/users", "GET").validate(&existing).unwrap_err();
        assert!(matches!(err, EndpointError::DuplicateEndpoint { .. }));

        assert!(declare("/users", "POST").validate(&existing).is_ok());
        assert!(declare("/users/", "GET").validate(&existing).is_ok());
    }
}
