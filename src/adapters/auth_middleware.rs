use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::domain::auth::{AuthConfig, AuthContext, AuthMode, LOCAL_OWNER};

/// Header naming the caller when authentication is disabled.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    #[serde(default)]
    roles: Vec<String>,
}

pub struct AuthMiddleware {
    config: Arc<AuthConfig>,
}

pub type SharedAuthMiddleware = Arc<AuthMiddleware>;

impl AuthMiddleware {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        if !self.config.enabled {
            return Ok(Self::local_identity(headers));
        }

        match self.config.mode {
            AuthMode::None => Ok(Self::local_identity(headers)),
            AuthMode::ApiKey => self.validate_api_key(headers),
            AuthMode::BearerToken => self.validate_bearer_token(headers),
        }
    }

    fn local_identity(headers: &HeaderMap) -> AuthContext {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(LOCAL_OWNER);
        AuthContext::local(user_id)
    }

    fn validate_api_key(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let api_key = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        let valid_keys = self
            .config
            .api_keys
            .as_ref()
            .ok_or(AuthError::ConfigurationError)?;

        if valid_keys.iter().any(|k| k == api_key) {
            Ok(AuthContext {
                authenticated: true,
                user_id: Some(api_key.to_string()),
                roles: vec!["owner".to_string()],
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    fn validate_bearer_token(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let auth_header = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidCredentials)?;
        let secret = self
            .config
            .jwt_secret
            .as_ref()
            .ok_or(AuthError::ConfigurationError)?;

        let algorithm = match self.config.jwt_algorithm.as_deref() {
            Some("HS384") => Algorithm::HS384,
            Some("HS512") => Algorithm::HS512,
            _ => Algorithm::HS256,
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AuthError::InvalidCredentials
        })?;

        Ok(AuthContext {
            authenticated: true,
            user_id: Some(token_data.claims.sub),
            roles: token_data.claims.roles,
        })
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingCredentials,
    InvalidCredentials,
    ConfigurationError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "Missing credentials"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::ConfigurationError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Auth configuration error")
            }
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

/// Public reads on the mock surface: `GET /mock/:id` and any method on
/// `/mock/:id/*path`. Accepts the path with or without the `/api` prefix.
pub fn is_public_mock_request(method: &Method, path: &str) -> bool {
    let path = path.strip_prefix("/api").unwrap_or(path);
    let Some(rest) = path.strip_prefix("/mock/") else {
        return false;
    };
    match rest.split_once('/') {
        Some((id, _)) => !id.is_empty(),
        None => !rest.is_empty() && *method == Method::GET,
    }
}

/// Resolve the caller's identity and store it in the request extensions.
///
/// A request without credentials continues unauthenticated so that public
/// mock routes keep working; owner routes reject it. Wrong credentials are
/// rejected here, except on public mock reads where they are ignored.
pub async fn auth_middleware(
    State(auth): State<SharedAuthMiddleware>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_context = match auth.authenticate(request.headers()).await {
        Ok(context) => context,
        Err(AuthError::MissingCredentials) => AuthContext::default(),
        Err(e) if is_public_mock_request(request.method(), request.uri().path()) => {
            tracing::debug!("Ignoring {:?} on public mock request {}", e, request.uri().path());
            AuthContext::default()
        }
        Err(e) => return Err(e),
    };

    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn api_key_config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig {
            enabled: true,
            mode: AuthMode::ApiKey,
            api_keys: Some(vec!["test-key-123".to_string()]),
            jwt_secret: None,
            jwt_algorithm: None,
        })
    }

    fn bearer_config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig {
            enabled: true,
            mode: AuthMode::BearerToken,
            api_keys: None,
            jwt_secret: Some("s3cret".to_string()),
            jwt_algorithm: Some("HS384".to_string()),
        })
    }

    #[test]
    fn test_public_mock_requests() {
        assert!(is_public_mock_request(&Method::GET, "/mock/blog"));
        assert!(is_public_mock_request(&Method::GET, "/api/mock/blog/users"));
        assert!(is_public_mock_request(&Method::POST, "/mock/blog/users"));
        assert!(is_public_mock_request(&Method::DELETE, "/mock/blog/users/1"));

        assert!(!is_public_mock_request(&Method::POST, "/mock/blog"));
        assert!(!is_public_mock_request(&Method::PUT, "/api/mock/blog"));
        assert!(!is_public_mock_request(&Method::DELETE, "/mock/blog"));
        assert!(!is_public_mock_request(&Method::GET, "/apis/blog"));
        assert!(!is_public_mock_request(&Method::GET, "/mock/"));
    }

    #[tokio::test]
    async fn test_api_key_auth_success() {
        let middleware = AuthMiddleware::new(api_key_config());
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("test-key-123"));

        let context = middleware.authenticate(&headers).await.unwrap();
        assert!(context.authenticated);
        assert_eq!(context.owner_id(), Some("test-key-123"));
    }

    #[tokio::test]
    async fn test_api_key_auth_failure() {
        let middleware = AuthMiddleware::new(api_key_config());
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("wrong-key"));

        let result = middleware.authenticate(&headers).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_bearer_token_auth() {
        let middleware = AuthMiddleware::new(bearer_config());
        let claims = Claims {
            sub: "alice".to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            roles: vec!["owner".to_string()],
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let context = middleware.authenticate(&headers).await.unwrap();
        assert_eq!(context.owner_id(), Some("alice"));
    }

    #[tokio::test]
    async fn test_bearer_token_wrong_secret() {
        let middleware = AuthMiddleware::new(bearer_config());
        let claims = Claims {
            sub: "mallory".to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            roles: vec![],
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"guessed"),
        )
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let result = middleware.authenticate(&headers).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_disabled_auth_uses_user_header() {
        let middleware = AuthMiddleware::new(Arc::new(AuthConfig::default()));

        let context = middleware.authenticate(&HeaderMap::new()).await.unwrap();
        assert_eq!(context.owner_id(), Some(LOCAL_OWNER));

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("bob"));
        let context = middleware.authenticate(&headers).await.unwrap();
        assert_eq!(context.owner_id(), Some("bob"));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let middleware = AuthMiddleware::new(api_key_config());
        let result = middleware.authenticate(&HeaderMap::new()).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }
}
