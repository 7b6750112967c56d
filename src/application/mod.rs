//! Application layer: use cases over the engine and the definition store.

pub mod definition_service;

pub use definition_service::{
    DefinitionService, GenerateRequest, GenerationReport, MockOutcome, ServiceError, ServiceResult,
};
