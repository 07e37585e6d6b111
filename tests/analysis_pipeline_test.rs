/// Analysis pipeline tests
///
/// Exercises the public library API end to end: a series goes in, forecasts,
/// anomalies and a signal come out.
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;

use stocklens_backend::external::mock::MockPriceProvider;
use stocklens_backend::external::price_provider::PriceProvider;
use stocklens_backend::models::{
    AnomalySeverity, AnomalyType, ForecastModelType, PricePoint, PriceSeries, SignalType,
};
use stocklens_backend::services::analysis_service::run_full_analysis_with_rng;
use stocklens_backend::services::failure_cache::FailureCache;
use stocklens_backend::services::{anomaly_service, forecasting_service, intraday_service};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn series(closes: &[f64], volume: f64) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::flat(start + Duration::days(i as i64), c, volume))
        .collect();
    PriceSeries::new("TEST", points).unwrap()
}

// ---------------------------------------------------------------------------
// Forecasts
// ---------------------------------------------------------------------------

#[test]
fn test_linear_series_forecasts() {
    let closes: Vec<f64> = (0..90).map(|i| 50.0 + 2.0 * i as f64).collect();
    let series = series(&closes, 1_000.0);

    let mut rng = StdRng::seed_from_u64(11);
    let models = forecasting_service::generate_forecasts_with_rng(&series, &mut rng);

    assert_eq!(models.len(), 3);
    for model in &models {
        assert_eq!(model.predictions.len(), 30);
        assert!(model.predictions[0].date > series.latest().date);
        assert!(model.predictions.windows(2).all(|w| w[0].date < w[1].date));
    }

    let regression = models
        .iter()
        .find(|m| m.model_type == ForecastModelType::LinearRegression)
        .unwrap();
    assert!((regression.parameters["slope"] - 2.0).abs() < 1e-9);
    assert!((regression.parameters["intercept"] - 50.0).abs() < 1e-9);
    assert!(regression.metrics.rmse < 1e-9);
    // next value on the line
    assert!((regression.predictions[0].predicted_value - 230.0).abs() < 1e-6);
}

#[test]
fn test_constant_series_moving_average_is_exact() {
    let series = series(&[100.0; 60], 1_000.0);

    let mut rng = StdRng::seed_from_u64(5);
    let models = forecasting_service::generate_forecasts_with_rng(&series, &mut rng);
    let ma = &models[0];

    assert_eq!(ma.model_type, ForecastModelType::MovingAverage);
    assert_eq!(ma.metrics.rmse, 0.0);
    assert_eq!(ma.metrics.mae, 0.0);
    // drift of 0.1% per day plus at most 1% noise
    assert!((ma.predictions[0].predicted_value - 100.1).abs() <= 100.1 * 0.01 + 1e-9);
    assert!(ma.predictions.iter().all(|p| p.predicted_value > 99.0 && p.predicted_value < 104.1));
}

// ---------------------------------------------------------------------------
// Anomalies and signals
// ---------------------------------------------------------------------------

#[test]
fn test_single_outlier_flagged_once() {
    let mut closes: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 100.5 } else { 99.5 }).collect();
    closes[70] = 120.0;
    let series = series(&closes, 2_000.0);

    let spikes: Vec<_> = anomaly_service::detect_anomalies(&series)
        .into_iter()
        .filter(|a| a.anomaly_type == AnomalyType::PriceSpike)
        .collect();

    assert_eq!(spikes.len(), 1);
    assert_eq!(spikes[0].date, series.points()[70].date);
    assert_eq!(spikes[0].severity, AnomalySeverity::High);
}

#[test]
fn test_steady_downtrend_alone_is_not_directional() {
    let closes: Vec<f64> = (0..120).map(|i| 300.0 - i as f64).collect();
    let series = series(&closes, 1_000.0);

    let analysis = run_full_analysis_with_rng(series, &mut StdRng::seed_from_u64(9));

    // the lagging moving average pulls the forecast consensus back above
    // price, leaving only the bearish crossover
    assert_eq!(analysis.signals.len(), 1);
    let signal = &analysis.signals[0];
    assert_eq!(signal.signal_type, SignalType::Hold);
    assert!(signal.target_price.is_none());
}

// ---------------------------------------------------------------------------
// Providers and intraday
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mock_provider_feeds_intraday_analysis() {
    let provider =
        MockPriceProvider::new(3).with_anchor(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
    let cache = FailureCache::new();

    let analysis = intraday_service::analyze_intraday(&provider, &cache, "AMD", 1, 5)
        .await
        .unwrap();

    assert_eq!(analysis.ticks.len(), 390);
    assert_eq!(analysis.ticks[0].factor_ratio, 1.0);
    assert_eq!(analysis.summary.total_points, 390);
    let counted: usize = analysis.summary.behavior_counts.iter().map(|c| c.count).sum();
    assert_eq!(counted, 390);
    assert!(analysis.summary.most_common_count >= 390 / 9);
}

#[tokio::test]
async fn test_mock_history_is_reproducible_per_seed() {
    let anchor = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    let a = MockPriceProvider::new(1).with_anchor(anchor);
    let b = MockPriceProvider::new(2).with_anchor(anchor);

    let first = a.fetch_daily_history("AAPL", 60).await.unwrap();
    let again = a.fetch_daily_history("AAPL", 60).await.unwrap();
    let other_seed = b.fetch_daily_history("AAPL", 60).await.unwrap();

    assert_eq!(first.points(), again.points());
    assert_ne!(first.points(), other_seed.points());
}
