use async_trait::async_trait;
use thiserror::Error;

use crate::models::{IntradayTick, PriceSeries, SeriesError};

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("no data for ticker {0}")]
    NotFound(String),
}

impl From<SeriesError> for PriceProviderError {
    fn from(value: SeriesError) -> Self {
        match value {
            SeriesError::Empty(symbol) => PriceProviderError::NotFound(symbol),
            other => PriceProviderError::BadResponse(other.to_string()),
        }
    }
}

/// Source of market data for the analysis pipeline.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily bars covering roughly the last `days` calendar days, oldest first.
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<PriceSeries, PriceProviderError>;

    /// Bars for the most recent trading session at the given interval, oldest first.
    async fn fetch_intraday(
        &self,
        ticker: &str,
        interval_minutes: u32,
    ) -> Result<Vec<IntradayTick>, PriceProviderError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}
