pub mod api_handler;
pub mod auth_middleware;
pub mod health_handler;
pub mod metrics_handler;
pub mod mock_handler;
