use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::DefinitionService;
use crate::domain::auth::LOCAL_OWNER;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub store: String,
    pub generator: String,
}

pub struct HealthHandler {
    service: Arc<DefinitionService>,
    start_time: std::time::Instant,
}

impl HealthHandler {
    pub fn new(service: Arc<DefinitionService>) -> Self {
        Self {
            service,
            start_time: std::time::Instant::now(),
        }
    }

    /// Basic health check - returns 200 if server is running
    pub async fn health(&self) -> impl IntoResponse {
        let status = HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            checks: HealthChecks {
                store: "ok".to_string(),
                generator: self.service.provider_name().to_string(),
            },
        };

        (StatusCode::OK, Json(status))
    }

    /// Readiness check - returns 200 once the definition store answers
    pub async fn ready(&self) -> impl IntoResponse {
        match self.service.list(LOCAL_OWNER).await {
            Ok(_) => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "ready",
                    "message": "Server is ready to accept requests"
                })),
            ),
            Err(e) => {
                tracing::warn!("Readiness check failed: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(serde_json::json!({
                        "status": "not_ready",
                        "message": "Definition store unavailable"
                    })),
                )
            }
        }
    }

    /// Liveness check - returns 200 if server is alive
    pub async fn live(&self) -> impl IntoResponse {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "alive",
                "message": "Server is alive"
            })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::metrics_handler::MetricsCollector;
    use crate::config::GeneratorSettings;
    use crate::engine::{Backend, DataGenerator};
    use crate::persistence::InMemoryDefinitionStore;

    fn handler() -> HealthHandler {
        let service = DefinitionService::new(
            Arc::new(InMemoryDefinitionStore::new()),
            Arc::new(DataGenerator::new(Backend::Faker, &GeneratorSettings::default())),
            Arc::new(MetricsCollector::new().unwrap()),
            10,
        );
        HealthHandler::new(Arc::new(service))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = handler().health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let response = handler().ready().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_live_endpoint() {
        let response = handler().live().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
