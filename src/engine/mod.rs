//! Mock-API engine: dataset validation, merging, generation and routing.
//!
//! Everything here is request-scoped. No function keeps state between calls;
//! callers load a definition, run the engine and persist the result.

pub mod extract;
pub mod faker;
pub mod generator;
pub mod merge;
pub mod prompt;
pub mod router;
pub mod validator;

pub use extract::extract_json;
pub use generator::{Backend, DataGenerator};
pub use merge::{merge, MergeOutcome};
pub use router::resolve_endpoint;
pub use validator::validate_and_normalize;
