use clap::Parser;
use mimic::adapters::health_handler::HealthHandler;
use mimic::adapters::metrics_handler::{MetricsCollector, MetricsHandler};
use mimic::application::DefinitionService;
use mimic::cli::Cli;
use mimic::config::Settings;
use mimic::engine::DataGenerator;
use mimic::persistence::InMemoryDefinitionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration (CLI > env vars > config file)
    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;
    let host = settings.server.host.clone();
    let port = settings.server.port;

    info!("Starting Mimic mock API server on {}:{}", host, port);

    // Generation backend
    let generator = DataGenerator::from_settings(&settings.generator)?;
    info!(
        "Generation provider: {} (model {})",
        generator.provider_name(),
        settings.generator.model_or_default()
    );

    // Definition store, seeded from config/apis
    let store = Arc::new(InMemoryDefinitionStore::new());
    let metrics = Arc::new(MetricsCollector::new()?);
    let service = Arc::new(DefinitionService::new(
        store,
        Arc::new(generator),
        metrics.clone(),
        settings.generator.default_count,
    ));
    service.seed(&settings.apis).await?;

    // Initialize handlers
    let health_handler = Arc::new(HealthHandler::new(service.clone()));
    let metrics_handler = Arc::new(MetricsHandler::new(metrics));

    if !settings.auth.enabled {
        info!("Authentication disabled; callers are identified by the x-user-id header");
    }

    // Create application using the library function
    let app = mimic::create_app(service, health_handler, metrics_handler, settings.auth.clone());

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
