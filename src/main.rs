use tokio::net::TcpListener;
use tracing::{info, warn};
use link_dashboard_api::{
    api::routes::create_router,
    config::Config,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;
    if config.api_keys.is_empty() {
        warn!("no OpenRouter API keys configured; summarize requests will fail");
    } else {
        info!(keys = config.api_keys.len(), "loaded OpenRouter API key pool");
    }

    // Create application state
    let app_state = AppState::new(config);

    // Build the router with routes
    let app = create_router(app_state);

    // Create the listener
    let listener = TcpListener::bind(server_addr).await?;

    // Start the server
    info!(%server_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
