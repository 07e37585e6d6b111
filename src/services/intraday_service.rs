use std::io::Write;

use tracing::{debug, info};

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::intraday::{all_combination_labels, combination_label};
use crate::models::{
    BehaviorCount, CombinationCount, EnrichedTick, IntradayAnalysis, IntradayInsights,
    IntradaySummary, IntradayTick, MarketBehavior, Trend,
};
use crate::services::failure_cache::FailureCache;
use crate::services::indicators::{mean, rolling_mean};
use crate::services::price_service;

/// Relative distance from the moving average below which a value is Stable.
pub const TREND_THRESHOLD: f64 = 0.001;

/// Fetch one session of ticks for `ticker` and classify them.
pub async fn analyze_intraday(
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    ticker: &str,
    interval_minutes: u32,
    ma_window: usize,
) -> Result<IntradayAnalysis, AppError> {
    let ticks =
        price_service::fetch_intraday(provider, failure_cache, ticker, interval_minutes).await?;

    info!(
        "Analyzing {} intraday ticks for {} ({}m interval, window {})",
        ticks.len(),
        ticker,
        interval_minutes,
        ma_window
    );

    Ok(build_analysis(ticker, interval_minutes, &ticks, ma_window))
}

/// Classify already-fetched ticks and attach summary and insights.
pub fn build_analysis(
    ticker: &str,
    interval_minutes: u32,
    ticks: &[IntradayTick],
    window: usize,
) -> IntradayAnalysis {
    let enriched = analyze_ticks(ticks, window);
    let summary = summarize(&enriched);
    let insights = compute_insights(&enriched, &summary);

    IntradayAnalysis {
        ticker: ticker.to_string(),
        interval_minutes,
        window: window.max(1),
        ticks: enriched,
        summary,
        insights,
    }
}

/// Compare `value` with its moving average.
pub fn classify_trend(value: f64, moving_average: f64) -> Trend {
    if moving_average == 0.0 {
        return Trend::Stable;
    }

    let ratio = (value - moving_average) / moving_average;
    if ratio > TREND_THRESHOLD {
        Trend::Increase
    } else if ratio < -TREND_THRESHOLD {
        Trend::Decrease
    } else {
        Trend::Stable
    }
}

/// Enrich each tick with trailing moving averages, trends, behavior and factor.
///
/// The moving average at tick `i` covers up to `window` ticks ending at `i`;
/// a window of zero is treated as one.
pub fn analyze_ticks(ticks: &[IntradayTick], window: usize) -> Vec<EnrichedTick> {
    let prices: Vec<f64> = ticks.iter().map(|t| t.price).collect();
    let volumes: Vec<f64> = ticks.iter().map(|t| t.volume).collect();
    let price_ma = rolling_mean(&prices, window);
    let volume_ma = rolling_mean(&volumes, window);

    let mut previous_factor: Option<f64> = None;

    ticks
        .iter()
        .enumerate()
        .map(|(i, tick)| {
            let price_trend = classify_trend(tick.price, price_ma[i]);
            let volume_trend = classify_trend(tick.volume, volume_ma[i]);
            let behavior = MarketBehavior::from_trends(price_trend, volume_trend);

            let factor = tick.price * tick.volume;
            let factor_ratio = match previous_factor {
                Some(prev) if prev != 0.0 => factor / prev,
                _ => 1.0,
            };
            previous_factor = Some(factor);

            EnrichedTick {
                timestamp: tick.timestamp,
                price: tick.price,
                volume: tick.volume,
                price_ma: price_ma[i],
                volume_ma: volume_ma[i],
                price_trend,
                price_trend_color: price_trend.color().to_string(),
                volume_trend,
                volume_trend_color: volume_trend.color().to_string(),
                combination: combination_label(price_trend, volume_trend),
                behavior,
                behavior_color: behavior.color().to_string(),
                factor,
                factor_ratio,
            }
        })
        .collect()
}

/// Count behaviors and combinations over an enriched series.
///
/// Every known label is reported, zero counts included; labels outside the
/// known set are ignored. Ties for the most common behavior go to the label
/// that comes first in canonical order.
pub fn summarize(ticks: &[EnrichedTick]) -> IntradaySummary {
    let mut behavior_counts: Vec<BehaviorCount> = MarketBehavior::ALL
        .iter()
        .map(|&behavior| BehaviorCount::empty(behavior))
        .collect();

    let mut combination_counts: Vec<CombinationCount> = all_combination_labels()
        .into_iter()
        .map(|combination| CombinationCount { combination, count: 0 })
        .collect();

    for tick in ticks {
        if let Some(entry) = behavior_counts.iter_mut().find(|c| c.behavior == tick.behavior) {
            entry.count += 1;
        }
        if let Some(entry) = combination_counts
            .iter_mut()
            .find(|c| c.combination == tick.combination)
        {
            entry.count += 1;
        }
    }

    // strict comparison keeps the earliest label on ties
    let (most_common_behavior, most_common_count) = behavior_counts.iter().fold(
        (MarketBehavior::ALL[0], 0),
        |(best, best_count), c| {
            if c.count > best_count {
                (c.behavior, c.count)
            } else {
                (best, best_count)
            }
        },
    );

    debug!(
        "Intraday summary: {} points, most common behavior {} ({})",
        ticks.len(),
        most_common_behavior,
        most_common_count
    );

    IntradaySummary {
        behavior_counts,
        combination_counts,
        most_common_behavior,
        most_common_count,
        total_points: ticks.len(),
    }
}

/// Headline numbers for the latest tick; None for an empty session.
pub fn compute_insights(
    ticks: &[EnrichedTick],
    summary: &IntradaySummary,
) -> Option<IntradayInsights> {
    let first = ticks.first()?;
    let last = ticks.last()?;

    let price_change = last.price - first.price;
    let price_change_pct = if first.price == 0.0 {
        0.0
    } else {
        price_change / first.price * 100.0
    };

    let volumes: Vec<f64> = ticks.iter().map(|t| t.volume).collect();
    let average_volume = mean(&volumes);
    let volume_vs_average_pct = if average_volume == 0.0 {
        0.0
    } else {
        (last.volume - average_volume) / average_volume * 100.0
    };

    Some(IntradayInsights {
        current_price: last.price,
        price_change,
        price_change_pct,
        current_volume: last.volume,
        average_volume,
        volume_vs_average_pct,
        latest_behavior: last.behavior,
        latest_combination: last.combination.clone(),
        latest_factor_ratio: last.factor_ratio,
        factor_change_pct: (last.factor_ratio - 1.0) * 100.0,
        buying_pressure_pct: summary.behavior_share(MarketBehavior::BuyingPressure),
        selling_pressure_pct: summary.behavior_share(MarketBehavior::SellingPressure),
        stable_market_pct: summary.behavior_share(MarketBehavior::StableMarket),
    })
}

/// Write the enriched ticks as CSV, rounded the way the dashboard table shows them.
///
/// Tick times are written in UTC and the header says so.
pub fn write_intraday_csv<W: Write>(
    analysis: &IntradayAnalysis,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record([
        "Timestamp_UTC",
        "Price",
        "Volume",
        "Price_MA",
        "Volume_MA",
        "Price_Trend",
        "Volume_Trend",
        "Combination",
        "Behavior",
        "Factor",
        "Factor_Ratio",
    ])?;

    for tick in &analysis.ticks {
        wtr.write_record([
            tick.timestamp.format("%H:%M:%S").to_string(),
            format!("{:.2}", tick.price),
            format!("{:.0}", tick.volume),
            format!("{:.2}", tick.price_ma),
            format!("{:.0}", tick.volume_ma),
            tick.price_trend.to_string(),
            tick.volume_trend.to_string(),
            tick.combination.clone(),
            tick.behavior.to_string(),
            format!("{:.0}", tick.factor),
            format!("{:.3}", tick.factor_ratio),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
