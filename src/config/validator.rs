use std::collections::HashMap;
use thiserror::Error;

use crate::config::{GeneratorSettings, ServerSettings, Settings};
use crate::domain::auth::{AuthConfig, AuthMode};
use crate::domain::{DefinitionSeed, Endpoint};
use crate::engine::validate_and_normalize;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_server(&settings.server) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_auth(&settings.auth) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_generator(&settings.generator) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_apis(&settings.apis) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_auth(auth: &AuthConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if auth.enabled {
            match auth.mode {
                AuthMode::ApiKey if auth.api_keys.as_ref().map_or(true, |k| k.is_empty()) => {
                    errors.push(ValidationError::MissingField("auth.api_keys".to_string()));
                }
                AuthMode::BearerToken if auth.jwt_secret.is_none() => {
                    errors.push(ValidationError::MissingField("auth.jwt_secret".to_string()));
                }
                _ => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_generator(generator: &GeneratorSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !(0.0..=2.0).contains(&generator.temperature) {
            errors.push(ValidationError::InvalidValue {
                field: "generator.temperature".to_string(),
                reason: "Temperature must be between 0.0 and 2.0".to_string(),
            });
        }

        if generator.max_tokens == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.max_tokens".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if generator.timeout_seconds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.timeout_seconds".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if generator.max_count == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.max_count".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        } else if generator.default_count == 0 || generator.default_count > generator.max_count {
            errors.push(ValidationError::InvalidValue {
                field: "generator.default_count".to_string(),
                reason: format!("Must be between 1 and {}", generator.max_count),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_apis(apis: &[DefinitionSeed]) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen_ids = HashMap::new();

        for (idx, seed) in apis.iter().enumerate() {
            let definition = &seed.definition;
            let label = definition.id.clone().unwrap_or_else(|| format!("apis[{}]", idx));

            if let Some(id) = &definition.id {
                if let Some(prev_idx) = seen_ids.insert(id, idx) {
                    errors.push(ValidationError::Duplicate(format!(
                        "API id '{}' appears at indices {} and {}",
                        id, prev_idx, idx
                    )));
                }
            }

            if definition.name.trim().is_empty() {
                errors.push(ValidationError::MissingField(format!("{}.name", label)));
            }

            if let Err(structure_errors) = definition.structure.check(definition.shape) {
                errors.extend(structure_errors.into_iter().map(|e| ValidationError::InvalidValue {
                    field: format!("{}.structure", label),
                    reason: e.to_string(),
                }));
            }

            let mut endpoints: Vec<Endpoint> = Vec::new();
            for (endpoint_idx, endpoint) in seed.endpoints.iter().enumerate() {
                match endpoint.clone().validate(&endpoints) {
                    Ok(endpoint) => endpoints.push(endpoint),
                    Err(e) => errors.push(ValidationError::InvalidValue {
                        field: format!("{}.endpoints[{}]", label, endpoint_idx),
                        reason: e.to_string(),
                    }),
                }
            }

            if let Some(dataset) = &seed.dataset {
                if let Err(e) = validate_and_normalize(definition.shape, dataset) {
                    errors.push(ValidationError::InvalidValue {
                        field: format!("{}.dataset", label),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seed(value: serde_json::Value) -> DefinitionSeed {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(ConfigValidator::validate(&Settings::default()).is_ok());
    }

    #[test]
    fn test_invalid_port() {
        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            ..Default::default()
        };

        let result = ConfigValidator::validate(&settings);
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_generator_bounds() {
        let settings = Settings {
            generator: GeneratorSettings {
                temperature: 3.5,
                default_count: 500,
                max_count: 100,
                ..Default::default()
            },
            ..Default::default()
        };

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.to_string().contains("generator.temperature")));
        assert!(errors.iter().any(|e| e.to_string().contains("generator.default_count")));
    }

    #[test]
    fn test_bearer_auth_requires_secret() {
        let settings = Settings {
            auth: AuthConfig {
                enabled: true,
                mode: AuthMode::BearerToken,
                ..Default::default()
            },
            ..Default::default()
        };

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert!(matches!(&errors[0], ValidationError::MissingField(f) if f == "auth.jwt_secret"));
    }

    #[test]
    fn test_duplicate_api_ids() {
        let people = json!({
            "id": "people",
            "name": "People",
            "type": "SIMPLE",
            "structure": { "fields": { "name": { "type": "string" } } }
        });
        let settings = Settings {
            apis: vec![seed(people.clone()), seed(people)],
            ..Default::default()
        };

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::Duplicate(_)));
    }

    #[test]
    fn test_seed_contents_are_checked() {
        let settings = Settings {
            apis: vec![seed(json!({
                "id": "blog",
                "name": "Blog",
                "type": "RELATIONAL",
                "structure": {
                    "entities": [{
                        "name": "users",
                        "fields": { "name": { "type": "string" } },
                        "relations": { "posts": { "type": "oneToMany", "target": "posts" } }
                    }]
                },
                "endpoints": [
                    { "path": "/users", "method": "GET", "response": [] },
                    { "path": "/users", "method": "GET", "response": [] }
                ],
                "dataset": [{ "name": "flat rows are not relational" }]
            }))],
            ..Default::default()
        };

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        let fields: Vec<String> = errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::InvalidValue { field, .. } => Some(field.clone()),
                _ => None,
            })
            .collect();

        assert!(fields.contains(&"blog.structure".to_string()));
        assert!(fields.contains(&"blog.endpoints[1]".to_string()));
        assert!(fields.contains(&"blog.dataset".to_string()));
    }
}
