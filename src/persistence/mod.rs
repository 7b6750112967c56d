//! Definition storage.
//!
//! - `DefinitionStore`: the collaborator the service layer talks to
//! - `InMemoryDefinitionStore`: process-local implementation used by the server
//!
//! The store does not check ownership or structure; the service does that
//! before every write. It only guarantees that a stored dataset matches its
//! definition's shape and that endpoint (path, method) pairs stay unique.

pub mod error;
pub mod repository;

pub use error::PersistenceError;
pub use repository::{DefinitionStore, InMemoryDefinitionStore};
