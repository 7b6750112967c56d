//! Definition service: ownership, write serialization and the generate pipeline.
//!
//! Every mutation goes through here. The service loads the definition,
//! checks the caller owns it, runs the engine and hands the result to the
//! store. Writes to one definition are serialized with a per-id mutex.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapters::metrics_handler::MetricsCollector;
use crate::domain::{
    ApiDefinition, ApiShape, CollectionCounts, Dataset, DefinitionSeed, DefinitionSummary, DefinitionUpdate,
    Endpoint, EndpointError, EndpointNotFound, GenerationError, MergeSummary, NewDefinition,
    NewEndpoint, StructureError, ValidationError,
};
use crate::engine::{merge, resolve_endpoint, validate_and_normalize, DataGenerator};
use crate::persistence::{DefinitionStore, PersistenceError};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing, or owned by someone else
    #[error("API '{0}' not found")]
    NotFound(String),

    #[error("Endpoint '{0}' not found")]
    EndpointMissing(Uuid),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("The type of an API cannot be changed (is {current}, requested {requested})")]
    ShapeImmutable {
        current: ApiShape,
        requested: ApiShape,
    },

    #[error("Invalid field structure")]
    Structure(Vec<StructureError>),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::EndpointMissing(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidInput(_)
            | Self::ShapeImmutable { .. }
            | Self::Structure(_)
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Endpoint(e) => e.status_code(),
            Self::Generation(e) => e.status_code(),
            Self::Persistence(e) => e.status_code(),
        }
    }

    /// Extra context for the error envelope.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::Structure(errors) => Some(Value::Array(
                errors.iter().map(|e| Value::String(e.to_string())).collect(),
            )),
            Self::Generation(e) => Some(json!({ "kind": e.kind() })),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Body of a generate request. Missing values fall back to the configured
/// default count and to overwrite.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    pub count: Option<i64>,
    pub overwrite: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub provider: String,
    /// Count actually generated, after clamping
    pub count: u32,
    pub overwrite: bool,
    #[serde(flatten)]
    pub summary: MergeSummary,
    pub collections: CollectionCounts,
}

/// Outcome of a request on the public mock surface.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOutcome {
    Hit(Value),
    Miss(EndpointNotFound),
}

pub struct DefinitionService {
    store: Arc<dyn DefinitionStore>,
    generator: Arc<DataGenerator>,
    metrics: Arc<MetricsCollector>,
    default_count: u32,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DefinitionService {
    pub fn new(
        store: Arc<dyn DefinitionStore>,
        generator: Arc<DataGenerator>,
        metrics: Arc<MetricsCollector>,
        default_count: u32,
    ) -> Self {
        Self {
            store,
            generator,
            metrics,
            default_count,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.generator.provider_name()
    }

    pub async fn create(&self, owner: &str, new: NewDefinition) -> ServiceResult<ApiDefinition> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("name must not be empty".to_string()));
        }
        new.structure.check(new.shape).map_err(ServiceError::Structure)?;

        let definition = ApiDefinition::new(owner, new);
        self.store.create_definition(definition.clone()).await?;

        info!(id = %definition.id, owner, shape = %definition.shape, "Created API definition");
        Ok(definition)
    }

    pub async fn list(&self, owner: &str) -> ServiceResult<Vec<DefinitionSummary>> {
        let definitions = self.store.list_definitions(owner).await?;
        Ok(definitions.iter().map(ApiDefinition::summary).collect())
    }

    pub async fn get(&self, owner: &str, id: &str) -> ServiceResult<ApiDefinition> {
        self.owned(owner, id).await
    }

    pub async fn update(
        &self,
        owner: &str,
        id: &str,
        update: DefinitionUpdate,
    ) -> ServiceResult<ApiDefinition> {
        let (_guard, mut definition) = self.lock_owned(owner, id).await?;
        if let Some(requested) = update.shape {
            if requested != definition.shape {
                return Err(ServiceError::ShapeImmutable {
                    current: definition.shape,
                    requested,
                });
            }
        }
        if let Some(structure) = update.structure {
            structure.check(definition.shape).map_err(ServiceError::Structure)?;
            definition.structure = structure;
        }
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ServiceError::InvalidInput("name must not be empty".to_string()));
            }
            definition.name = name;
        }
        if let Some(description) = update.description {
            definition.description = Some(description);
        }
        definition.updated_at = chrono::Utc::now();

        self.store.update_definition(definition.clone()).await?;
        info!(id, owner, "Updated API definition");
        Ok(definition)
    }

    pub async fn delete(&self, owner: &str, id: &str) -> ServiceResult<()> {
        let (_guard, _) = self.lock_owned(owner, id).await?;
        if !self.store.delete_definition(id).await? {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        self.locks.lock().await.remove(id);

        info!(id, owner, "Deleted API definition");
        Ok(())
    }

    pub async fn add_endpoint(
        &self,
        owner: &str,
        id: &str,
        new: NewEndpoint,
    ) -> ServiceResult<Endpoint> {
        let (_guard, definition) = self.lock_owned(owner, id).await?;
        let endpoint = new.validate(&definition.endpoints)?;
        self.store.save_endpoint(id, endpoint.clone()).await?;

        info!(id, method = %endpoint.method, path = %endpoint.path, "Added endpoint");
        Ok(endpoint)
    }

    pub async fn delete_endpoint(&self, owner: &str, id: &str, endpoint_id: Uuid) -> ServiceResult<()> {
        let (_guard, _) = self.lock_owned(owner, id).await?;
        if !self.store.delete_endpoint(id, endpoint_id).await? {
            return Err(ServiceError::EndpointMissing(endpoint_id));
        }

        info!(id, %endpoint_id, "Removed endpoint");
        Ok(())
    }

    /// Replace the stored dataset with `raw` once it validates.
    pub async fn replace_dataset(&self, owner: &str, id: &str, raw: &Value) -> ServiceResult<MergeSummary> {
        let (_guard, definition) = self.lock_owned(owner, id).await?;
        let incoming = validate_and_normalize(definition.shape, raw)?;
        let outcome = merge(definition.shape, &definition.dataset, &incoming, true)?;
        self.store.save_dataset(id, outcome.dataset).await?;

        info!(id, records = outcome.summary.result_count, "Replaced dataset");
        Ok(outcome.summary)
    }

    /// Reset the dataset to the empty container of its shape.
    pub async fn clear_dataset(&self, owner: &str, id: &str) -> ServiceResult<MergeSummary> {
        let (_guard, definition) = self.lock_owned(owner, id).await?;
        let previous_count = definition.dataset.record_count();
        self.store
            .save_dataset(id, definition.shape.empty_container())
            .await?;

        info!(id, previous_count, "Cleared dataset");
        Ok(MergeSummary {
            previous_count,
            ..Default::default()
        })
    }

    /// Generate records, merge them under the requested policy and save.
    ///
    /// The requested count is clamped to `1..=max_count`. A generation
    /// failure leaves the stored dataset untouched.
    pub async fn generate(
        &self,
        owner: &str,
        id: &str,
        request: GenerateRequest,
    ) -> ServiceResult<GenerationReport> {
        let count = self.clamp_count(request.count);
        let overwrite = request.overwrite.unwrap_or(true);

        let (_guard, definition) = self.lock_owned(owner, id).await?;
        let provider = self.generator.provider_name().to_string();
        info!(id, provider = %provider, shape = %definition.shape, count, overwrite, "Generating data");

        let started = Instant::now();
        let incoming = match self
            .generator
            .generate(definition.shape, &definition.structure, count)
            .await
        {
            Ok(dataset) => dataset,
            Err(e) => {
                self.metrics
                    .record_generation(&provider, e.kind(), started.elapsed(), 0);
                warn!(id, provider = %provider, error = %e, "Generation failed");
                return Err(e.into());
            }
        };

        let outcome = merge(definition.shape, &definition.dataset, &incoming, overwrite)?;
        let collections = outcome.dataset.collection_counts();
        self.store.save_dataset(id, outcome.dataset).await?;

        let elapsed = started.elapsed();
        self.metrics
            .record_generation(&provider, "success", elapsed, outcome.summary.incoming_count);
        info!(
            id,
            provider = %provider,
            generated = outcome.summary.incoming_count,
            total = outcome.summary.result_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "Generation finished"
        );

        Ok(GenerationReport {
            provider,
            count,
            overwrite,
            summary: outcome.summary,
            collections,
        })
    }

    /// Stored dataset of a definition, for the public mock surface.
    pub async fn mock_dataset(&self, id: &str) -> ServiceResult<Dataset> {
        let definition = self.public(id).await?;
        self.metrics.record_mock_request("dataset");
        Ok(definition.dataset)
    }

    /// Route a public mock request to one of the definition's endpoints.
    pub async fn serve_mock(&self, id: &str, path: &str, method: &str) -> ServiceResult<MockOutcome> {
        let definition = self.public(id).await?;
        match resolve_endpoint(&definition.endpoints, path, method) {
            Ok(response) => {
                self.metrics.record_mock_request("hit");
                Ok(MockOutcome::Hit(response.clone()))
            }
            Err(not_found) => {
                self.metrics.record_mock_request("miss");
                debug!(id, method, path, available = not_found.available.len(), "Mock miss");
                Ok(MockOutcome::Miss(not_found))
            }
        }
    }

    /// Load seed definitions into the store. Seeds must already be validated.
    pub async fn seed(&self, seeds: &[DefinitionSeed]) -> ServiceResult<usize> {
        let mut loaded = 0;
        for seed in seeds {
            let new = seed.definition.clone();
            new.structure.check(new.shape).map_err(ServiceError::Structure)?;

            let mut definition = ApiDefinition::new(seed.owner_id.as_str(), new);
            for endpoint in &seed.endpoints {
                let endpoint = endpoint.clone().validate(&definition.endpoints)?;
                definition.endpoints.push(endpoint);
            }
            if let Some(raw) = &seed.dataset {
                definition.dataset = validate_and_normalize(definition.shape, raw)?;
            }

            debug!(
                id = %definition.id,
                endpoints = definition.endpoints.len(),
                records = definition.dataset.record_count(),
                "Seeding API definition"
            );
            self.store.create_definition(definition).await?;
            loaded += 1;
        }
        if loaded > 0 {
            info!("Seeded {} API definitions", loaded);
        }
        Ok(loaded)
    }

    fn clamp_count(&self, requested: Option<i64>) -> u32 {
        let max = self.generator.max_count().max(1);
        let requested = requested.unwrap_or(i64::from(self.default_count));
        requested.clamp(1, i64::from(max)) as u32
    }

    async fn owned(&self, owner: &str, id: &str) -> ServiceResult<ApiDefinition> {
        match self.store.load_definition(id).await? {
            Some(definition) if definition.is_owned_by(owner) => Ok(definition),
            _ => Err(ServiceError::NotFound(id.to_string())),
        }
    }

    async fn public(&self, id: &str) -> ServiceResult<ApiDefinition> {
        self.store
            .load_definition(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Take the write lock of a definition the caller owns and load it.
    ///
    /// No lock entry is created for an id the caller cannot see. The
    /// definition is reloaded once the lock is held; if it vanished meanwhile
    /// the entry is dropped again.
    async fn lock_owned(&self, owner: &str, id: &str) -> ServiceResult<(OwnedMutexGuard<()>, ApiDefinition)> {
        self.owned(owner, id).await?;

        let lock = self.lock_for(id).await;
        let guard = lock.clone().lock_owned().await;
        match self.owned(owner, id).await {
            Ok(definition) => Ok((guard, definition)),
            Err(e) => {
                self.release_lock(id, &lock).await;
                Err(e)
            }
        }
    }

    async fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id.to_string()).or_default().clone()
    }

    async fn release_lock(&self, id: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        if locks.get(id).is_some_and(|held| Arc::ptr_eq(held, lock)) {
            locks.remove(id);
        }
    }

    #[cfg(test)]
    pub(crate) async fn lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }
}
