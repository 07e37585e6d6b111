use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use stocklens_backend::app;
use stocklens_backend::config::{AppConfig, ProviderKind};
use stocklens_backend::external::mock::MockPriceProvider;
use stocklens_backend::external::price_provider::PriceProvider;
use stocklens_backend::external::yahoo::YahooProvider;
use stocklens_backend::logging::{init_logging, LoggingConfig};
use stocklens_backend::state::AppState;

const FAILURE_CACHE_SWEEP: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env()).context("failed to initialize logging")?;

    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;

    let provider: Arc<dyn PriceProvider> = match config.provider {
        ProviderKind::Mock => {
            tracing::info!("📊 Using price provider: mock (seed {})", config.mock_seed);
            Arc::new(MockPriceProvider::new(config.mock_seed))
        }
        ProviderKind::Yahoo => {
            tracing::info!("📊 Using price provider: Yahoo Finance chart API");
            Arc::new(YahooProvider::new().context("failed to create Yahoo client")?)
        }
    };

    let state = AppState::new(provider, config.clone());

    let failure_cache = state.failure_cache.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FAILURE_CACHE_SWEEP);
        loop {
            ticker.tick().await;
            failure_cache.cleanup_expired();
        }
    });

    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 StockLens backend running at http://{}/", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
