//! Core types of mock API definitions.
//!
//! Nothing in this module performs I/O. Validation of raw datasets and merging
//! live in [`crate::engine`]; storage sits behind
//! [`crate::persistence::DefinitionStore`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

pub mod auth;
pub mod dataset;
pub mod endpoint;
pub mod error;
pub mod shape;
pub mod structure;

pub use dataset::{Collections, Dataset, Record};
pub use endpoint::{Endpoint, HttpMethod, NewEndpoint};
pub use error::{
    EndpointError, EndpointKey, EndpointNotFound, GenerationError, StructureError, ValidationError,
};
pub use shape::ApiShape;
pub use structure::{EntitySpec, FieldSpec, FieldStructure, FieldType, RelationKind, RelationSpec};

/// A user-owned mock API: its shape, declared structure, endpoints and data.
#[derive(Debug, Clone, Serialize)]
pub struct ApiDefinition {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub shape: ApiShape,
    pub structure: FieldStructure,
    pub endpoints: Vec<Endpoint>,
    pub dataset: Dataset,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApiDefinition {
    /// Build a fresh definition with an empty dataset for its shape.
    pub fn new(owner_id: impl Into<String>, new: NewDefinition) -> Self {
        let now = Utc::now();
        Self {
            id: new.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            owner_id: owner_id.into(),
            name: new.name,
            description: new.description,
            shape: new.shape,
            dataset: new.shape.empty_container(),
            structure: new.structure,
            endpoints: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    pub fn summary(&self) -> DefinitionSummary {
        DefinitionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            shape: self.shape,
            endpoint_count: self.endpoints.len(),
            record_count: self.dataset.record_count(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Listing view of a definition.
#[derive(Debug, Clone, Serialize)]
pub struct DefinitionSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub shape: ApiShape,
    pub endpoint_count: usize,
    pub record_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewDefinition {
    /// Caller-chosen id; a UUID is assigned when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", alias = "shape")]
    pub shape: ApiShape,
    #[serde(default)]
    pub structure: FieldStructure,
}

/// Partial update of a definition. The shape can never change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefinitionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type", alias = "shape")]
    pub shape: Option<ApiShape>,
    pub structure: Option<FieldStructure>,
}

/// A definition as written in a seed file under `config/apis/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefinitionSeed {
    #[serde(flatten)]
    pub definition: NewDefinition,
    #[serde(default = "default_seed_owner")]
    pub owner_id: String,
    #[serde(default)]
    pub endpoints: Vec<NewEndpoint>,
    /// Raw dataset, validated against the shape when the seed is loaded.
    #[serde(default)]
    pub dataset: Option<Value>,
}

fn default_seed_owner() -> String {
    auth::LOCAL_OWNER.to_string()
}

/// Counts reported after a dataset write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub previous_count: usize,
    pub incoming_count: usize,
    pub result_count: usize,
}

/// Per-collection record counts keyed by collection name.
pub type CollectionCounts = BTreeMap<String, usize>;
