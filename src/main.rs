//! HealPrint Marketplace - storefront cart and checkout service

use anyhow::Result;
use healprint_marketplace::{api, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let state = api::AppState::from_config(&config);
    tracing::info!(
        products = state.catalog.len(),
        payment_delay = ?config.payment_delay,
        payment_max_attempts = config.payment_max_attempts,
        "catalog loaded"
    );

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("HealPrint marketplace listening on 0.0.0.0:{}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}
