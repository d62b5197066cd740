// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::ingest_service::IngestService;
use crate::application::reading_repository::ReadingRepository;
use crate::infrastructure::config::{load_dashboard_config, StoreBackend};
use crate::infrastructure::firestore_repository::FirestoreRepository;
use crate::infrastructure::memory_repository::MemoryRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn ReadingRepository> = match config.store.backend {
        StoreBackend::Firestore => Arc::new(FirestoreRepository::new(
            &config.firestore,
            config.store.collection.clone(),
        )?),
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory reading store; readings are lost on restart");
            Arc::new(MemoryRepository::new())
        }
    };

    // Create services (application layer)
    let ingest_service = IngestService::new(repository.clone());
    let dashboard_service = DashboardService::new(repository, config.display.clone());

    let state = Arc::new(AppState {
        ingest_service,
        dashboard_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr = config.server.bind;
    tracing::info!(
        "Starting temperature-dashboard on {} (timezone {}, window {})",
        addr,
        config.display.timezone,
        config.display.window
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
