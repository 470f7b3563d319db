use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use answer_engine::{
    config::Config,
    api::routes::create_router,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;

    let missing = config.missing_api_keys();
    if !missing.is_empty() {
        tracing::warn!(
            keys = ?missing,
            "Missing API keys; affected providers will degrade in-band"
        );
    }
    tracing::info!(
        cache_duration = ?config.cache_duration,
        max_history = config.max_history,
        rate_limit = config.rate_limit_searches,
        "Configuration loaded"
    );

    // Create application state
    let app_state = AppState::new(config);

    // Build the router with routes
    let app = create_router(app_state);

    // Create the listener
    let listener = TcpListener::bind(server_addr).await?;

    // Start the server
    tracing::info!(%server_addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
