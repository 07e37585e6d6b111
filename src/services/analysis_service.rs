use rand::Rng;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{PriceSeries, StockAnalysis};
use crate::services::failure_cache::FailureCache;
use crate::services::{anomaly_service, forecasting_service, price_service, signal_service};

/// Forecasts, anomalies and signals for an already-fetched series.
pub fn run_full_analysis(series: PriceSeries) -> StockAnalysis {
    run_full_analysis_with_rng(series, &mut rand::rng())
}

pub fn run_full_analysis_with_rng<R: Rng>(series: PriceSeries, rng: &mut R) -> StockAnalysis {
    let forecasts = forecasting_service::generate_forecasts_with_rng(&series, rng);
    let anomalies = anomaly_service::detect_anomalies(&series);
    let signals = signal_service::generate_trading_signals(&series, &forecasts);

    debug!(
        "Analysis for {}: {} models, {} anomalies, {} signals",
        series.symbol(),
        forecasts.len(),
        anomalies.len(),
        signals.len()
    );

    StockAnalysis {
        series,
        forecasts,
        anomalies,
        signals,
    }
}

/// Fetch `days` of history for `ticker` and analyze it.
pub async fn analyze_ticker(
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    ticker: &str,
    days: u32,
) -> Result<StockAnalysis, AppError> {
    let series = price_service::fetch_history(provider, failure_cache, ticker, days).await?;

    info!("Analyzing {} daily points for {}", series.len(), ticker);

    Ok(run_full_analysis(series))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mock::MockPriceProvider;
    use crate::models::{PricePoint, SignalType};
    use chrono::{Duration, NaiveDate};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_full_analysis_shape() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = (0..60)
            .map(|i| PricePoint::flat(start + Duration::days(i), 100.0, 1_000.0))
            .collect();
        let series = PriceSeries::new("FLAT", points).unwrap();

        let analysis = run_full_analysis_with_rng(series, &mut StdRng::seed_from_u64(3));

        assert_eq!(analysis.forecasts.len(), 3);
        assert!(analysis.anomalies.is_empty());
        assert_eq!(analysis.signals.len(), 1);
        assert_eq!(analysis.signals[0].signal_type, SignalType::Hold);
        assert_eq!(analysis.series.symbol(), "FLAT");
    }

    #[tokio::test]
    async fn test_analyze_ticker_fetches_then_analyzes() {
        let provider =
            MockPriceProvider::new(8).with_anchor(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
        let cache = FailureCache::new();

        let analysis = analyze_ticker(&provider, &cache, "AAPL", 120).await.unwrap();

        assert_eq!(analysis.series.symbol(), "AAPL");
        assert_eq!(
            analysis.series.latest().date,
            NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
        );
        assert_eq!(analysis.forecasts.len(), 3);
        assert_eq!(analysis.signals.len(), 1);
    }
}
