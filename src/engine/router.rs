//! Mock routing: exact lookup of a declared endpoint.

use serde_json::Value;

use crate::domain::{Endpoint, EndpointKey, EndpointNotFound};

/// Find the endpoint declared for `path` and `method` and return its stored
/// response.
///
/// Matching is exact and case-sensitive on both path and method; there is no
/// templating and no trailing-slash folding. When several endpoints match,
/// the first in declaration order wins.
pub fn resolve_endpoint<'a>(
    endpoints: &'a [Endpoint],
    path: &str,
    method: &str,
) -> Result<&'a Value, EndpointNotFound> {
    endpoints
        .iter()
        .find(|e| e.path == path && e.method.as_str() == method)
        .map(|e| &e.response)
        .ok_or_else(|| EndpointNotFound {
            path: path.to_string(),
            method: method.to_string(),
            available: endpoints
                .iter()
                .map(|e| EndpointKey {
                    path: e.path.clone(),
                    method: e.method.to_string(),
                })
                .collect(),
        })
}
