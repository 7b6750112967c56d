//! Shape-aware combination of an existing dataset with newly generated data.

use crate::domain::{ApiShape, Collections, Dataset, MergeSummary, ValidationError};

/// Result of a merge: the combined dataset and the record counts around it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub dataset: Dataset,
    pub summary: MergeSummary,
}

/// Combine `existing` and `incoming` under the overwrite or append policy.
///
/// With `overwrite` the result is `incoming`, whatever `existing` holds.
/// Otherwise flat datasets are concatenated and collection datasets are
/// unioned key by key, concatenating collections present on both sides.
/// Neither input is modified.
pub fn merge(
    shape: ApiShape,
    existing: &Dataset,
    incoming: &Dataset,
    overwrite: bool,
) -> Result<MergeOutcome, ValidationError> {
    let previous_count = shape.count_records(existing)?;
    let incoming_count = shape.count_records(incoming)?;

    let dataset = if overwrite {
        incoming.clone()
    } else {
        match (existing, incoming) {
            (Dataset::Flat(a), Dataset::Flat(b)) => {
                Dataset::Flat(a.iter().chain(b.iter()).cloned().collect())
            }
            (Dataset::Relational(a), Dataset::Relational(b)) => Dataset::Relational(union(a, b)),
            (Dataset::Graph(a), Dataset::Graph(b)) => Dataset::Graph(union(a, b)),
            (_, other) => {
                return Err(ValidationError::ShapeMismatch {
                    shape,
                    found: format!("a {} dataset", other.shape()),
                })
            }
        }
    };

    Ok(MergeOutcome {
        summary: MergeSummary {
            previous_count,
            incoming_count,
            result_count: dataset.record_count(),
        },
        dataset,
    })
}

fn union(existing: &Collections, incoming: &Collections) -> Collections {
    let mut out = existing.clone();
    for (name, records) in incoming {
        out.entry(name.clone())
            .or_default()
            .extend(records.iter().cloned());
    }
    out
}
