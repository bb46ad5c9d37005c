use physio_coach::api::{create_routes, AppState};
use physio_coach::config::AppConfig;
use physio_coach::services::CaptureService;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    if config.is_development() {
        info!(tracker = ?config.tracker, capture = ?config.capture, "Loaded configuration");
    }

    let capture = CaptureService::from_config(config.tracker.clone(), &config.capture)?;
    if !capture.is_available() {
        warn!("No pose source configured; live capture endpoints will return 503");
    }

    let state = AppState::new(config.tracker.clone(), capture);
    let app = create_routes(state);

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!(
        environment = %config.environment,
        "Physio coach server starting on http://{}",
        address
    );
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
