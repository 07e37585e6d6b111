use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rand::Rng;
use tracing::debug;

use crate::models::{
    ConfidenceInterval, ErrorMetrics, ForecastModel, ForecastModelType, ForecastPoint, PriceSeries,
};
use crate::services::indicators::{daily_returns, mean, regression_trend, trailing_mean};

/// Number of calendar days every model projects forward.
pub const FORECAST_DAYS: usize = 30;

/// Default lookback of the moving average model.
pub const MOVING_AVERAGE_WINDOW: usize = 20;

/// Recent closes the moving average model is scored against.
const MOVING_AVERAGE_METRICS_WINDOW: usize = 10;

/// Per-day drift applied to the moving average projection.
const MOVING_AVERAGE_DRIFT: f64 = 0.001;

/// Half-width of the uniform noise applied to moving average predictions.
const MOVING_AVERAGE_NOISE: f64 = 0.01;

/// Lagged-return variance at or below this is treated as zero.
const MIN_RETURN_VARIANCE: f64 = 1e-18;

/// |φ| used for projection is capped here so the recursion stays stationary.
const MAX_AR_COEFFICIENT: f64 = 0.99;

/// Run every forecasting strategy over `series` using the thread-local RNG.
///
/// Returns the moving average, linear regression and AR(1) models, in that order.
pub fn generate_forecasts(series: &PriceSeries) -> Vec<ForecastModel> {
    let mut rng = rand::rng();
    generate_forecasts_with_rng(series, &mut rng)
}

/// Same as [`generate_forecasts`] with an explicit random source.
///
/// Only the moving average model draws from `rng`; seeding it makes the whole
/// output reproducible.
pub fn generate_forecasts_with_rng<R: Rng>(
    series: &PriceSeries,
    rng: &mut R,
) -> Vec<ForecastModel> {
    let models = vec![
        moving_average_forecast(series, MOVING_AVERAGE_WINDOW, rng),
        linear_regression_forecast(series),
        arima_forecast(series),
    ];

    debug!(
        "Generated {} forecast models for {} from {} observations",
        models.len(),
        series.symbol(),
        series.len()
    );

    models
}

/// Moving average forecast
///
/// Projects the trailing-window mean forward with a small linear drift and
/// ±1% noise per day.
pub fn moving_average_forecast<R: Rng>(
    series: &PriceSeries,
    window: usize,
    rng: &mut R,
) -> ForecastModel {
    let closes = series.closes();
    let window = window.clamp(1, closes.len());
    let window_mean = trailing_mean(&closes, window);

    let predictions = forecast_dates(series.latest().date)
        .enumerate()
        .map(|(i, date)| {
            let day = (i + 1) as f64;
            let drift = 1.0 + MOVING_AVERAGE_DRIFT * day;
            let noise = 1.0 + rng.random_range(-MOVING_AVERAGE_NOISE..=MOVING_AVERAGE_NOISE);
            let predicted_value = window_mean * drift * noise;

            ForecastPoint {
                date,
                predicted_value,
                confidence_interval: Some(ConfidenceInterval {
                    lower: predicted_value * 0.95,
                    upper: predicted_value * 1.05,
                }),
            }
        })
        .collect();

    let start = closes.len().saturating_sub(MOVING_AVERAGE_METRICS_WINDOW);
    let recent = &closes[start..];
    let constant = vec![window_mean; recent.len()];
    let metrics = error_metrics(recent, &constant, window_mean);

    let mut parameters = BTreeMap::new();
    parameters.insert("window".to_string(), window as f64);
    parameters.insert("window_mean".to_string(), window_mean);

    build_model(ForecastModelType::MovingAverage, predictions, metrics, parameters)
}

/// Linear regression forecast
///
/// Ordinary least squares of close against trading-day index, extrapolated
/// past the last observation and floored at zero.
pub fn linear_regression_forecast(series: &PriceSeries) -> ForecastModel {
    let closes = series.closes();
    let n = closes.len();
    let (slope, intercept) = regression_trend(&closes);

    let predictions = forecast_dates(series.latest().date)
        .enumerate()
        .map(|(i, date)| {
            let x = (n + i) as f64;
            let predicted_value = (slope * x + intercept).max(0.0);

            ForecastPoint {
                date,
                predicted_value,
                confidence_interval: Some(ConfidenceInterval {
                    lower: (predicted_value * 0.9).max(0.0),
                    upper: predicted_value * 1.1,
                }),
            }
        })
        .collect();

    let fitted: Vec<f64> = (0..n).map(|i| slope * i as f64 + intercept).collect();
    let metrics = error_metrics(&closes, &fitted, mean(&closes));

    let mut parameters = BTreeMap::new();
    parameters.insert("slope".to_string(), slope);
    parameters.insert("intercept".to_string(), intercept);
    parameters.insert("observations".to_string(), n as f64);

    build_model(ForecastModelType::LinearRegression, predictions, metrics, parameters)
}

/// AR(1) forecast on daily returns
///
/// Each projected return reverts toward the mean return by the lag-one
/// coefficient φ, and prices compound from the last close. φ is capped to
/// ±0.99; a step that is not finite falls back to zero drift.
pub fn arima_forecast(series: &PriceSeries) -> ForecastModel {
    let closes = series.closes();
    let returns = daily_returns(&closes);
    let mean_return = mean(&returns);
    let phi = lag_one_coefficient(&returns).clamp(-MAX_AR_COEFFICIENT, MAX_AR_COEFFICIENT);

    let mut previous_return = returns.last().copied().unwrap_or(mean_return);
    let mut previous_price = series.latest().close;

    let predictions = forecast_dates(series.latest().date)
        .map(|date| {
            let mut predicted_return = mean_return + phi * (previous_return - mean_return);
            let mut predicted_value = (previous_price * (1.0 + predicted_return)).max(0.0);

            if !predicted_value.is_finite() {
                predicted_return = 0.0;
                predicted_value = previous_price;
            }

            previous_return = predicted_return;
            previous_price = predicted_value;

            ForecastPoint {
                date,
                predicted_value,
                confidence_interval: Some(ConfidenceInterval {
                    lower: (predicted_value * 0.92).max(0.0),
                    upper: predicted_value * 1.08,
                }),
            }
        })
        .collect();

    // One-step-ahead reconstruction: predict close[t + 1] from close[t] and return[t - 1].
    let (actual, reconstructed): (Vec<f64>, Vec<f64>) = (0..returns.len())
        .map(|t| {
            let lagged = if t == 0 { mean_return } else { returns[t - 1] };
            let predicted_return = mean_return + phi * (lagged - mean_return);
            (closes[t + 1], closes[t] * (1.0 + predicted_return))
        })
        .unzip();
    let metrics = error_metrics(&actual, &reconstructed, mean(&actual));

    let mut parameters = BTreeMap::new();
    parameters.insert("phi".to_string(), phi);
    parameters.insert("mean_return".to_string(), mean_return);

    build_model(ForecastModelType::Arima, predictions, metrics, parameters)
}

/// Lag-one autoregressive coefficient of a return series.
///
/// Covariance of r[t] with r[t - 1] divided by the variance of the lagged
/// series. Falls back to 0.0 when there is too little data or the lagged
/// series has (numerically) no variance.
pub fn lag_one_coefficient(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let current = &returns[1..];
    let lagged = &returns[..returns.len() - 1];
    let current_mean = mean(current);
    let lagged_mean = mean(lagged);

    let covariance = current
        .iter()
        .zip(lagged)
        .map(|(c, l)| (c - current_mean) * (l - lagged_mean))
        .sum::<f64>()
        / current.len() as f64;

    let variance = lagged
        .iter()
        .map(|l| (l - lagged_mean).powi(2))
        .sum::<f64>()
        / lagged.len() as f64;

    if variance <= MIN_RETURN_VARIANCE {
        return 0.0;
    }

    let phi = covariance / variance;
    if phi.is_finite() { phi } else { 0.0 }
}

/// RMSE, MAE and MAPE of `predicted` against `actual`.
///
/// MAPE is the MAE expressed as a percentage of `scale`; it is 0.0 when
/// `scale` is zero.
fn error_metrics(actual: &[f64], predicted: &[f64], scale: f64) -> ErrorMetrics {
    let count = actual.len().min(predicted.len());
    if count == 0 {
        return ErrorMetrics::default();
    }

    let (sum_sq, sum_abs) = actual
        .iter()
        .zip(predicted)
        .fold((0.0, 0.0), |(sq, abs), (a, p)| {
            let err = a - p;
            (sq + err * err, abs + err.abs())
        });

    let rmse = (sum_sq / count as f64).sqrt();
    let mae = sum_abs / count as f64;
    let mape = if scale == 0.0 { 0.0 } else { (mae / scale * 100.0).abs() };

    ErrorMetrics { rmse, mae, mape }
}

fn forecast_dates(last_date: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (1..=FORECAST_DAYS as i64).map(move |day| last_date + Duration::days(day))
}

fn build_model(
    model_type: ForecastModelType,
    predictions: Vec<ForecastPoint>,
    metrics: ErrorMetrics,
    parameters: BTreeMap<String, f64>,
) -> ForecastModel {
    ForecastModel {
        name: model_type.display_name().to_string(),
        model_type,
        predictions,
        metrics,
        parameters,
    }
}
