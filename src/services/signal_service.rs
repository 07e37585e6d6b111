use chrono::Utc;
use tracing::{debug, info};

use crate::models::{ForecastModel, PriceSeries, SignalType, TradingSignal};
use crate::services::indicators::{daily_returns, mean, std_dev, trailing_mean};

/// Relative gap between forecast consensus and price that counts as directional.
const FORECAST_THRESHOLD: f64 = 0.03;
const FORECAST_WEIGHT: f64 = 0.3;

const SHORT_SMA: usize = 20;
const LONG_SMA: usize = 50;
const CROSSOVER_WEIGHT: f64 = 0.2;

const VOLUME_WINDOW: usize = 20;
const VOLUME_RATIO_THRESHOLD: f64 = 1.5;
const VOLUME_WEIGHT: f64 = 0.2;

const VOLATILITY_WINDOW: usize = 10;
const VOLATILITY_THRESHOLD: f64 = 0.05;
const VOLATILITY_DAMPING: f64 = 0.8;

/// Strength a directional signal must exceed to be emitted instead of a hold.
const MIN_DIRECTIONAL_STRENGTH: f64 = 0.3;

const TARGET_MOVE: f64 = 0.10;
const STOP_LOSS_MOVE: f64 = 0.05;

/// Generate trading signals for a series and its forecasts.
///
/// Always returns exactly one signal: a buy/sell when the accumulated
/// strength clears the directional threshold, otherwise a hold.
pub fn generate_trading_signals(
    series: &PriceSeries,
    forecasts: &[ForecastModel],
) -> Vec<TradingSignal> {
    let signal = evaluate_signal(series, forecasts);

    if signal.is_directional() {
        info!(
            "Signal for {}: {} (strength {:.2}, target {:?}, stop {:?})",
            series.symbol(),
            signal.signal_type,
            signal.strength,
            signal.target_price,
            signal.stop_loss
        );
    } else {
        debug!("Signal for {}: hold", series.symbol());
    }

    vec![signal]
}

/// Score the series factor by factor.
///
/// Rules are applied in a fixed order and the order matters: the forecast
/// rule sets the direction unconditionally, while the crossover rule never
/// flips a direction that is already set.
fn evaluate_signal(series: &PriceSeries, forecasts: &[ForecastModel]) -> TradingSignal {
    let closes = series.closes();
    let volumes = series.volumes();
    let current_price = series.latest().close;
    let current_volume = series.latest().volume;

    let mut signal_type = SignalType::Hold;
    let mut strength = 0.0_f64;
    let mut reasons: Vec<String> = Vec::new();

    // Forecast consensus
    let first_predictions: Vec<f64> = forecasts
        .iter()
        .filter_map(|model| model.first_prediction())
        .collect();

    if !first_predictions.is_empty() && current_price > 0.0 {
        let consensus = mean(&first_predictions);
        let expected_change = (consensus - current_price) / current_price;

        if expected_change > FORECAST_THRESHOLD {
            strength += FORECAST_WEIGHT;
            signal_type = SignalType::Buy;
            reasons.push(format!(
                "Forecasts point {:.1}% above the current price",
                expected_change * 100.0
            ));
        } else if expected_change < -FORECAST_THRESHOLD {
            strength += FORECAST_WEIGHT;
            signal_type = SignalType::Sell;
            reasons.push(format!(
                "Forecasts point {:.1}% below the current price",
                expected_change.abs() * 100.0
            ));
        }
    }

    // Moving average crossover
    let short_sma = trailing_mean(&closes, SHORT_SMA);
    let long_sma = trailing_mean(&closes, LONG_SMA);

    if current_price > short_sma && short_sma > long_sma {
        strength += CROSSOVER_WEIGHT;
        if signal_type != SignalType::Sell {
            signal_type = SignalType::Buy;
        }
        reasons.push(format!(
            "Bullish moving average alignment (price > SMA20 {:.2} > SMA50 {:.2})",
            short_sma, long_sma
        ));
    } else if current_price < short_sma && short_sma < long_sma {
        strength += CROSSOVER_WEIGHT;
        if signal_type != SignalType::Buy {
            signal_type = SignalType::Sell;
        }
        reasons.push(format!(
            "Bearish moving average alignment (price < SMA20 {:.2} < SMA50 {:.2})",
            short_sma, long_sma
        ));
    }

    // Volume confirmation
    let average_volume = trailing_mean(&volumes, VOLUME_WINDOW);
    if average_volume > 0.0 {
        let volume_ratio = current_volume / average_volume;
        if volume_ratio > VOLUME_RATIO_THRESHOLD {
            strength += VOLUME_WEIGHT;
            reasons.push(format!(
                "Volume is {:.1}x the 20-day average",
                volume_ratio
            ));
        }
    }

    // Volatility dampening
    let returns = daily_returns(&closes);
    let start = returns.len().saturating_sub(VOLATILITY_WINDOW);
    let volatility = std_dev(&returns[start..]);
    if volatility > VOLATILITY_THRESHOLD {
        strength *= VOLATILITY_DAMPING;
        reasons.push(format!(
            "High volatility ({:.1}% daily) lowers confidence",
            volatility * 100.0
        ));
    }

    let strength = strength.clamp(0.0, 1.0);

    match signal_type {
        SignalType::Buy | SignalType::Sell if strength > MIN_DIRECTIONAL_STRENGTH => {
            let (target_price, stop_loss) = match signal_type {
                SignalType::Buy => (
                    current_price * (1.0 + TARGET_MOVE),
                    current_price * (1.0 - STOP_LOSS_MOVE),
                ),
                _ => (
                    current_price * (1.0 - TARGET_MOVE),
                    current_price * (1.0 + STOP_LOSS_MOVE),
                ),
            };

            TradingSignal {
                signal_type,
                strength,
                reason: reasons.join("; "),
                timestamp: Utc::now(),
                target_price: Some(target_price),
                stop_loss: Some(stop_loss),
            }
        }
        _ => TradingSignal::hold("No strong directional signal; conditions look neutral"),
    }
}
