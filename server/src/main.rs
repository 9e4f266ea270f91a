use anyhow::Result;
use tracing::info;
use loan_tracker_server::backend::{create_router, initialize_backend};
use loan_tracker_server::config::AppConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; the library logs through `log`, bridged into tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load()?;
    info!("Starting loan tracker with {:?}", config);

    let app_state = initialize_backend(&config).await?;
    let router = create_router(app_state, &config.cors_origin)?;

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
