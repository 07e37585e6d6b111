use std::future::Future;

use tokio::time::{sleep as async_sleep, Duration};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{IntradayTick, PriceSeries};
use crate::services::failure_cache::{FailureCache, FailureType};

const MAX_RETRIES: u32 = 2;
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Daily history for `ticker`, consulting the failure cache first.
pub async fn fetch_history(
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    ticker: &str,
    days: u32,
) -> Result<PriceSeries, AppError> {
    let key = format!("daily:{}", ticker);
    fetch_with_cache(failure_cache, &key, ticker, provider.name(), move || {
        provider.fetch_daily_history(ticker, days)
    })
    .await
}

/// One session of intraday ticks for `ticker`, consulting the failure cache first.
pub async fn fetch_intraday(
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    ticker: &str,
    interval_minutes: u32,
) -> Result<Vec<IntradayTick>, AppError> {
    let key = format!("intraday:{}:{}", ticker, interval_minutes);
    let ticks = fetch_with_cache(failure_cache, &key, ticker, provider.name(), move || {
        provider.fetch_intraday(ticker, interval_minutes)
    })
    .await?;

    if ticks.is_empty() {
        let err = PriceProviderError::NotFound(ticker.to_string());
        failure_cache.record_failure(&key, &err);
        return Err(err.into());
    }

    Ok(ticks)
}

async fn fetch_with_cache<T, F, Fut>(
    failure_cache: &FailureCache,
    key: &str,
    ticker: &str,
    provider_name: &str,
    fetch: F,
) -> Result<T, AppError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, PriceProviderError>>,
{
    if let Some(failure) = failure_cache.is_failed(key) {
        info!(
            "⚠️ Skipping fetch for {} - ticker is in failure cache ({}). Will retry after {}",
            ticker,
            failure.failure_type.as_str(),
            failure.retry_after()
        );
        return Err(match failure.failure_type {
            FailureType::NotFound => {
                AppError::NotFound(format!("No price data found for ticker {}", ticker))
            }
            FailureType::RateLimited => AppError::RateLimited,
            FailureType::ApiError => {
                AppError::External(failure.message)
            }
        });
    }

    // Retry rate limits with a short linear backoff
    let mut retry_count = 0;

    loop {
        match fetch().await {
            Ok(data) => {
                failure_cache.clear(key);
                info!("✓ Fetched {} from {}", key, provider_name);
                return Ok(data);
            }
            Err(PriceProviderError::RateLimited) if retry_count < MAX_RETRIES => {
                retry_count += 1;
                let delay = Duration::from_millis(RETRY_BASE_DELAY_MS * u64::from(retry_count));
                warn!(
                    "Rate limited for ticker {}, retrying in {}ms (attempt {}/{})",
                    ticker,
                    delay.as_millis(),
                    retry_count,
                    MAX_RETRIES
                );
                async_sleep(delay).await;
            }
            Err(e) => {
                failure_cache.record_failure(key, &e);
                match &e {
                    PriceProviderError::NotFound(_) => warn!("✗ No data for {}: {}", ticker, e),
                    _ => error!("✗ Failed to fetch {} from {}: {}", key, provider_name, e),
                }
                return Err(e.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mock::MockPriceProvider;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MissingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceProvider for MissingProvider {
        async fn fetch_daily_history(
            &self,
            ticker: &str,
            _days: u32,
        ) -> Result<PriceSeries, PriceProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PriceProviderError::NotFound(ticker.to_string()))
        }

        async fn fetch_intraday(
            &self,
            _ticker: &str,
            _interval_minutes: u32,
        ) -> Result<Vec<IntradayTick>, PriceProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        fn name(&self) -> &'static str {
            "missing"
        }
    }

    #[tokio::test]
    async fn test_failed_ticker_is_not_refetched() {
        let provider = MissingProvider { calls: AtomicUsize::new(0) };
        let cache = FailureCache::new();

        let first = fetch_history(&provider, &cache, "NOPE", 30).await;
        let second = fetch_history(&provider, &cache, "NOPE", 30).await;

        assert!(matches!(first, Err(AppError::NotFound(_))));
        assert!(matches!(second, Err(AppError::NotFound(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_intraday_is_not_found() {
        let provider = MissingProvider { calls: AtomicUsize::new(0) };
        let cache = FailureCache::new();

        let result = fetch_intraday(&provider, &cache, "NOPE", 5).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(cache.is_failed("intraday:NOPE:5").is_some());
    }

    #[tokio::test]
    async fn test_success_leaves_other_failures_alone() {
        let provider =
            MockPriceProvider::new(1).with_anchor(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        let cache = FailureCache::new();
        cache.record_failure("daily:MSFT", &PriceProviderError::RateLimited);

        let series = fetch_history(&provider, &cache, "AAPL", 30).await.unwrap();

        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(cache.len(), 1);
        assert!(cache.is_failed("daily:AAPL").is_none());
    }
}
