//! Typed dataset containers.
//!
//! A `Dataset` is only ever built by the validator or by the shape model, so
//! holding one means the outer container already matches its shape.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::shape::ApiShape;
use super::CollectionCounts;

/// One generated row: a JSON object.
pub type Record = Map<String, Value>;

/// Named collections of records, used by both relational and graph datasets.
pub type Collections = BTreeMap<String, Vec<Record>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Flat(Vec<Record>),
    Relational(Collections),
    Graph(Collections),
}

impl Dataset {
    pub fn shape(&self) -> ApiShape {
        match self {
            Dataset::Flat(_) => ApiShape::Flat,
            Dataset::Relational(_) => ApiShape::Relational,
            Dataset::Graph(_) => ApiShape::Graph,
        }
    }

    pub fn record_count(&self) -> usize {
        match self {
            Dataset::Flat(records) => records.len(),
            Dataset::Relational(collections) | Dataset::Graph(collections) => {
                collections.values().map(Vec::len).sum()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Per-collection record counts; a flat dataset reports a single `items` entry.
    pub fn collection_counts(&self) -> CollectionCounts {
        match self {
            Dataset::Flat(records) => BTreeMap::from([("items".to_string(), records.len())]),
            Dataset::Relational(collections) | Dataset::Graph(collections) => collections
                .iter()
                .map(|(name, records)| (name.clone(), records.len()))
                .collect(),
        }
    }

    /// The JSON wire form of this dataset.
    pub fn to_value(&self) -> Value {
        match self {
            Dataset::Flat(records) => records_to_value(records),
            Dataset::Relational(collections) => collections_to_value(collections),
            Dataset::Graph(collections) => {
                let mut wrapper = Map::new();
                wrapper.insert("data".to_string(), collections_to_value(collections));
                Value::Object(wrapper)
            }
        }
    }
}

fn records_to_value(records: &[Record]) -> Value {
    Value::Array(records.iter().cloned().map(Value::Object).collect())
}

fn collections_to_value(collections: &Collections) -> Value {
    Value::Object(
        collections
            .iter()
            .map(|(name, records)| (name.clone(), records_to_value(records)))
            .collect(),
    )
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl From<&Dataset> for Value {
    fn from(dataset: &Dataset) -> Self {
        dataset.to_value()
    }
}
