use serde::{Deserialize, Serialize};

/// Owner id assumed when authentication is disabled and no `x-user-id` is sent.
pub const LOCAL_OWNER: &str = "local";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    None,
    ApiKey,
    BearerToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    pub mode: AuthMode,
    pub api_keys: Option<Vec<String>>,
    pub jwt_secret: Option<String>,
    pub jwt_algorithm: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: AuthMode::None,
            api_keys: None,
            jwt_secret: None,
            jwt_algorithm: Some("HS256".to_string()),
        }
    }
}

/// Identity resolved for one request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthContext {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub roles: Vec<String>,
}

impl AuthContext {
    pub fn local(user_id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            user_id: Some(user_id.into()),
            roles: vec!["owner".to_string()],
        }
    }

    /// The owner id, when the caller was identified.
    pub fn owner_id(&self) -> Option<&str> {
        if self.authenticated {
            self.user_id.as_deref()
        } else {
            None
        }
    }
}
