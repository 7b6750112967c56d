//! Shape model: the three structural kinds an API definition can take.
//!
//! Every shape maps to exactly one dataset container. This module is the
//! single place that knows how to build an empty container, recognise a
//! well-shaped raw value, and count the records a dataset holds.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::dataset::{Collections, Dataset};
use super::error::ValidationError;

/// Structural kind of a mock API. Immutable once a definition exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiShape {
    /// A single homogeneous list of records.
    #[serde(rename = "SIMPLE", alias = "flat", alias = "simple")]
    Flat,
    /// Named collections of records linked by relation declarations.
    #[serde(rename = "RELATIONAL", alias = "relational")]
    Relational,
    /// `{ "data": { Type: [records] } }`, mirroring a GraphQL type set.
    #[serde(rename = "GRAPHQL", alias = "graph", alias = "graphql")]
    Graph,
}

impl ApiShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiShape::Flat => "SIMPLE",
            ApiShape::Relational => "RELATIONAL",
            ApiShape::Graph => "GRAPHQL",
        }
    }

    /// Human readable description of the container this shape requires.
    pub fn container_description(&self) -> &'static str {
        match self {
            ApiShape::Flat => "an array of records",
            ApiShape::Relational => "an object mapping collection names to arrays of records",
            ApiShape::Graph => "an object with a single `data` field mapping type names to arrays of records",
        }
    }

    /// The empty dataset for this shape.
    pub fn empty_container(&self) -> Dataset {
        match self {
            ApiShape::Flat => Dataset::Flat(Vec::new()),
            ApiShape::Relational => Dataset::Relational(Collections::new()),
            ApiShape::Graph => Dataset::Graph(Collections::new()),
        }
    }

    /// Structural check of the outer container only; records are not inspected.
    pub fn is_well_shaped(&self, value: &Value) -> bool {
        match self {
            ApiShape::Flat => value.is_array(),
            ApiShape::Relational => value.is_object(),
            ApiShape::Graph => value
                .as_object()
                .map(|obj| obj.len() == 1 && obj.get("data").map_or(false, Value::is_object))
                .unwrap_or(false),
        }
    }

    /// Number of records held by `dataset`, which must be of this shape.
    pub fn count_records(&self, dataset: &Dataset) -> Result<usize, ValidationError> {
        self.ensure_matches(dataset)?;
        Ok(dataset.record_count())
    }

    /// Fails with `ShapeMismatch` when `dataset` was built for another shape.
    pub fn ensure_matches(&self, dataset: &Dataset) -> Result<(), ValidationError> {
        if dataset.shape() == *self {
            Ok(())
        } else {
            Err(ValidationError::ShapeMismatch {
                shape: *self,
                found: format!("a {} dataset", dataset.shape()),
            })
        }
    }
}

impl fmt::Display for ApiShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_containers() {
        assert_eq!(ApiShape::Flat.empty_container().to_value(), json!([]));
        assert_eq!(ApiShape::Relational.empty_container().to_value(), json!({}));
        assert_eq!(ApiShape::Graph.empty_container().to_value(), json!({ "data": {} }));
    }

    #[test]
    fn test_is_well_shaped() {
        assert!(ApiShape::Flat.is_well_shaped(&json!([1, "two"])));
        assert!(!ApiShape::Flat.is_well_shaped(&json!({})));

        assert!(ApiShape::Relational.is_well_shaped(&json!({ "users": "not checked" })));
        assert!(!ApiShape::Relational.is_well_shaped(&json!([])));

        assert!(ApiShape::Graph.is_well_shaped(&json!({ "data": {} })));
        assert!(!ApiShape::Graph.is_well_shaped(&json!({ "data": [] })));
        assert!(!ApiShape::Graph.is_well_shaped(&json!({ "Book": [] })));
        assert!(!ApiShape::Graph.is_well_shaped(&json!({ "data": {}, "errors": [] })));
    }

    #[test]
    fn test_count_records() {
        let mut collections = Collections::new();
        collections.insert("users".to_string(), vec![Default::default(), Default::default()]);
        collections.insert("posts".to_string(), vec![Default::default()]);

        let relational = Dataset::Relational(collections.clone());
        assert_eq!(ApiShape::Relational.count_records(&relational).unwrap(), 3);

        let graph = Dataset::Graph(collections);
        assert_eq!(ApiShape::Graph.count_records(&graph).unwrap(), 3);

        let flat = Dataset::Flat(vec![Default::default()]);
        assert_eq!(ApiShape::Flat.count_records(&flat).unwrap(), 1);
    }

    #[test]
    fn test_count_records_rejects_foreign_shape() {
        let flat = ApiShape::Flat.empty_container();
        let err = ApiShape::Graph.count_records(&flat).unwrap_err();
        assert!(matches!(err, ValidationError::ShapeMismatch { shape: ApiShape::Graph, .. }));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_value(ApiShape::Graph).unwrap(), json!("GRAPHQL"));
        let shape: ApiShape = serde_json::from_value(json!("flat")).unwrap();
        assert_eq!(shape, ApiShape::Flat);
        let shape: ApiShape = serde_json::from_value(json!("RELATIONAL")).unwrap();
        assert_eq!(shape, ApiShape::Relational);
    }
}
