//! # Mimic - Mock API Server
//!
//! Mimic serves user-declared mock APIs and fills them with synthetic data.
//! A definition declares one of three shapes (flat records, relational
//! entities, or a GraphQL-style typed graph), its endpoints with their static
//! responses, and a dataset that generation runs merge into.
//!
//! ## Features
//!
//! - **Mock routing**: exact (path, method) lookup with "did you mean" diagnostics
//! - **Generation**: OpenAI, Anthropic, Gemini or a local faker backend
//! - **Validation**: every dataset is checked against its shape before it is stored
//! - **Authentication**: API Key and JWT Bearer Token support
//! - **Metrics**: Prometheus metrics for monitoring
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mimic::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let settings = Settings::new()?;
//!
//!     // Server will start on configured host:port
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Mimic follows Hexagonal Architecture:
//! - **Domain**: Shapes, datasets, endpoints and their errors
//! - **Engine**: Validation, merging, generation and routing
//! - **Application**: The definition service
//! - **Adapters**: HTTP handlers and middleware
//! - **Persistence**: The definition store
//! - **Config**: Configuration management

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod llm;
pub mod persistence;

use crate::adapters::api_handler::{self, ApiState};
use crate::adapters::auth_middleware::{auth_middleware, AuthMiddleware, SharedAuthMiddleware};
use crate::adapters::health_handler::HealthHandler;
use crate::adapters::metrics_handler::MetricsHandler;
use crate::adapters::mock_handler;
use crate::application::DefinitionService;
use crate::domain::auth::AuthConfig;
use axum::{
    routing::{any, delete, get, post},
    Router,
};
use std::sync::Arc;

/// Creates the Axum application router with all endpoints configured.
///
/// # Arguments
///
/// * `service` - Definition service shared by every API route
/// * `health_handler` - Health check handler
/// * `metrics_handler` - Metrics collection handler
/// * `auth` - Authentication settings for the identity middleware
///
/// # Returns
///
/// Configured Axum Router
pub fn create_app(
    service: Arc<DefinitionService>,
    health_handler: Arc<HealthHandler>,
    metrics_handler: Arc<MetricsHandler>,
    auth: AuthConfig,
) -> Router {
    // Public routes (no identity needed)
    let public_router = Router::new()
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/ready", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.ready().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }))
        .route("/metrics", get({
            let handler = metrics_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.metrics().await }
            }
        }));

    let api_state = ApiState { service };

    // Definition management and the mock surface; owner checks happen per handler
    let api_router = Router::new()
        .route("/apis", get(api_handler::list_apis).post(api_handler::create_api))
        .route("/apis/:id", get(api_handler::get_api).put(api_handler::update_api).delete(api_handler::delete_api))
        .route("/apis/:id/endpoints", post(api_handler::create_endpoint))
        .route("/apis/:id/endpoints/:endpoint_id", delete(api_handler::delete_endpoint))
        .route("/apis/:id/generate", post(api_handler::generate))
        .route(
            "/mock/:id",
            get(mock_handler::get_dataset)
                .post(mock_handler::replace_dataset)
                .put(mock_handler::replace_dataset)
                .delete(mock_handler::clear_dataset),
        )
        .route("/mock/:id/*path", any(mock_handler::route_mock))
        .with_state(api_state);

    let auth: SharedAuthMiddleware = Arc::new(AuthMiddleware::new(Arc::new(auth)));
    let api_router = api_router.layer(axum::middleware::from_fn_with_state(auth, auth_middleware));

    let router = public_router.nest("/api", api_router);

    router.layer(
        tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
