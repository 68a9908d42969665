use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use fantasy_rugby::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(Config::from_env());

    let pool = fantasy_rugby::connect(&config).await?;
    info!("Connected to sqlite database.");

    let app = fantasy_rugby::build_router(pool, config.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Started server on {}.", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
