//! Repository traits and implementations for the persistence layer

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{ApiDefinition, Dataset, Endpoint};
use crate::persistence::error::PersistenceError;

/// Storage of API definitions together with their endpoints and datasets.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Get a definition by id, regardless of owner
    async fn load_definition(&self, id: &str) -> Result<Option<ApiDefinition>, PersistenceError>;

    /// List the definitions of one owner, oldest first
    async fn list_definitions(&self, owner_id: &str) -> Result<Vec<ApiDefinition>, PersistenceError>;

    /// Store a new definition; fails if the id is taken
    async fn create_definition(&self, definition: ApiDefinition) -> Result<(), PersistenceError>;

    /// Replace an existing definition
    async fn update_definition(&self, definition: ApiDefinition) -> Result<(), PersistenceError>;

    async fn delete_definition(&self, id: &str) -> Result<bool, PersistenceError>;

    /// Replace the dataset of a definition
    async fn save_dataset(&self, id: &str, dataset: Dataset) -> Result<(), PersistenceError>;

    /// Append an endpoint to a definition
    async fn save_endpoint(&self, id: &str, endpoint: Endpoint) -> Result<(), PersistenceError>;

    async fn delete_endpoint(&self, id: &str, endpoint_id: Uuid) -> Result<bool, PersistenceError>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryDefinitionStore {
    definitions: Arc<RwLock<HashMap<String, ApiDefinition>>>,
}

impl InMemoryDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.definitions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.definitions.read().await.is_empty()
    }
}

#[async_trait]
impl DefinitionStore for InMemoryDefinitionStore {
    async fn load_definition(&self, id: &str) -> Result<Option<ApiDefinition>, PersistenceError> {
        let definitions = self.definitions.read().await;
        Ok(definitions.get(id).cloned())
    }

    async fn list_definitions(&self, owner_id: &str) -> Result<Vec<ApiDefinition>, PersistenceError> {
        let definitions = self.definitions.read().await;
        let mut owned: Vec<ApiDefinition> = definitions
            .values()
            .filter(|d| d.is_owned_by(owner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn create_definition(&self, definition: ApiDefinition) -> Result<(), PersistenceError> {
        let mut definitions = self.definitions.write().await;
        if definitions.contains_key(&definition.id) {
            return Err(PersistenceError::Duplicate {
                entity_type: "api".to_string(),
                name: definition.id,
            });
        }
        definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    async fn update_definition(&self, definition: ApiDefinition) -> Result<(), PersistenceError> {
        let mut definitions = self.definitions.write().await;
        match definitions.get_mut(&definition.id) {
            Some(stored) => {
                *stored = definition;
                Ok(())
            }
            None => Err(PersistenceError::definition_not_found(&definition.id)),
        }
    }

    async fn delete_definition(&self, id: &str) -> Result<bool, PersistenceError> {
        let mut definitions = self.definitions.write().await;
        Ok(definitions.remove(id).is_some())
    }

    async fn save_dataset(&self, id: &str, dataset: Dataset) -> Result<(), PersistenceError> {
        let mut definitions = self.definitions.write().await;
        let definition = definitions
            .get_mut(id)
            .ok_or_else(|| PersistenceError::definition_not_found(id))?;
        definition
            .shape
            .ensure_matches(&dataset)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        definition.dataset = dataset;
        definition.updated_at = Utc::now();
        Ok(())
    }

    async fn save_endpoint(&self, id: &str, endpoint: Endpoint) -> Result<(), PersistenceError> {
        let mut definitions = self.definitions.write().await;
        let definition = definitions
            .get_mut(id)
            .ok_or_else(|| PersistenceError::definition_not_found(id))?;
        if definition
            .endpoints
            .iter()
            .any(|e| e.path == endpoint.path && e.method == endpoint.method)
        {
            return Err(PersistenceError::Duplicate {
                entity_type: "endpoint".to_string(),
                name: format!("{} {}", endpoint.method, endpoint.path),
            });
        }

        definition.endpoints.push(endpoint);
        definition.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_endpoint(&self, id: &str, endpoint_id: Uuid) -> Result<bool, PersistenceError> {
        let mut definitions = self.definitions.write().await;
        let definition = definitions
            .get_mut(id)
            .ok_or_else(|| PersistenceError::definition_not_found(id))?;

        let before = definition.endpoints.len();
        definition.endpoints.retain(|e| e.id != endpoint_id);
        let removed = definition.endpoints.len() != before;
        if removed {
            definition.updated_at = Utc::now();
        }
        Ok(removed)
    }
}
