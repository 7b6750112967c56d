//! Dataset validation and normalization.
//!
//! Raw JSON is checked against a shape and turned into a typed [`Dataset`].
//! Nothing is ever coerced: a bare object is not wrapped into an array and a
//! missing `data` wrapper is not invented.

use serde_json::{Map, Value};

use crate::domain::error::json_kind;
use crate::domain::{ApiShape, Collections, Dataset, Record, ValidationError};

/// Validate `raw` against `shape` and return the normalized dataset.
///
/// The returned dataset owns copies of every record; `raw` is left untouched.
pub fn validate_and_normalize(shape: ApiShape, raw: &Value) -> Result<Dataset, ValidationError> {
    match shape {
        ApiShape::Flat => {
            let items = raw.as_array().ok_or_else(|| mismatch(shape, raw))?;
            Ok(Dataset::Flat(records(None, items)?))
        }
        ApiShape::Relational => {
            let map = raw.as_object().ok_or_else(|| mismatch(shape, raw))?;
            Ok(Dataset::Relational(collections(map)?))
        }
        ApiShape::Graph => {
            let wrapper = raw.as_object().ok_or_else(|| mismatch(shape, raw))?;
            let data = match wrapper.get("data") {
                Some(Value::Object(data)) if wrapper.len() == 1 => data,
                Some(Value::Object(_)) => {
                    let extra: Vec<&str> = wrapper
                        .keys()
                        .map(String::as_str)
                        .filter(|k| *k != "data")
                        .collect();
                    return Err(ValidationError::ShapeMismatch {
                        shape,
                        found: format!("unexpected top-level keys {:?}", extra),
                    });
                }
                Some(other) => {
                    return Err(ValidationError::ShapeMismatch {
                        shape,
                        found: format!("`data` holding {}", json_kind(other)),
                    })
                }
                None => {
                    return Err(ValidationError::ShapeMismatch {
                        shape,
                        found: "an object without `data`".to_string(),
                    })
                }
            };
            Ok(Dataset::Graph(collections(data)?))
        }
    }
}

fn mismatch(shape: ApiShape, raw: &Value) -> ValidationError {
    ValidationError::ShapeMismatch {
        shape,
        found: json_kind(raw).to_string(),
    }
}

fn collections(map: &Map<String, Value>) -> Result<Collections, ValidationError> {
    let mut out = Collections::new();
    for (name, value) in map {
        let items = value
            .as_array()
            .ok_or_else(|| ValidationError::RecordMalformed {
                collection: Some(name.clone()),
                index: None,
                expected: "an array of records",
                found: json_kind(value),
            })?;
        out.insert(name.clone(), records(Some(name), items)?);
    }
    Ok(out)
}

fn records(collection: Option<&String>, items: &[Value]) -> Result<Vec<Record>, ValidationError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record.clone()),
            other => Err(ValidationError::RecordMalformed {
                collection: collection.cloned(),
                index: Some(index),
                expected: "an object",
                found: json_kind(other),
            }),
        })
        .collect()
}
