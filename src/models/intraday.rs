use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw intraday bar: last traded price and volume for one interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntradayTick {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
}

/// Direction of a value relative to its moving average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Increase,
    Decrease,
    Stable,
}

impl Trend {
    pub const ALL: [Trend; 3] = [Trend::Increase, Trend::Decrease, Trend::Stable];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increase => "Increase",
            Trend::Decrease => "Decrease",
            Trend::Stable => "Stable",
        }
    }

    /// Dashboard color for this trend
    pub fn color(&self) -> &'static str {
        match self {
            Trend::Increase => "#00cc44",
            Trend::Decrease => "#ff4444",
            Trend::Stable => "#888888",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market behavior implied by a (price trend, volume trend) pair.
///
/// Variants are declared in the canonical reporting order, which is also the
/// tie-break order for the most common behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketBehavior {
    #[serde(rename = "Buying Pressure")]
    BuyingPressure,
    #[serde(rename = "Mild Buying")]
    MildBuying,
    #[serde(rename = "Cautious Buying")]
    CautiousBuying,
    #[serde(rename = "Selling Pressure")]
    SellingPressure,
    #[serde(rename = "Mild Selling")]
    MildSelling,
    #[serde(rename = "Cautious Selling")]
    CautiousSelling,
    #[serde(rename = "Volume Spike")]
    VolumeSpike,
    #[serde(rename = "Low Activity")]
    LowActivity,
    #[serde(rename = "Stable Market")]
    StableMarket,
}

impl MarketBehavior {
    pub const ALL: [MarketBehavior; 9] = [
        MarketBehavior::BuyingPressure,
        MarketBehavior::MildBuying,
        MarketBehavior::CautiousBuying,
        MarketBehavior::SellingPressure,
        MarketBehavior::MildSelling,
        MarketBehavior::CautiousSelling,
        MarketBehavior::VolumeSpike,
        MarketBehavior::LowActivity,
        MarketBehavior::StableMarket,
    ];

    pub fn from_trends(price: Trend, volume: Trend) -> Self {
        match (price, volume) {
            (Trend::Increase, Trend::Increase) => MarketBehavior::BuyingPressure,
            (Trend::Increase, Trend::Decrease) => MarketBehavior::MildBuying,
            (Trend::Increase, Trend::Stable) => MarketBehavior::CautiousBuying,
            (Trend::Decrease, Trend::Increase) => MarketBehavior::SellingPressure,
            (Trend::Decrease, Trend::Decrease) => MarketBehavior::MildSelling,
            (Trend::Decrease, Trend::Stable) => MarketBehavior::CautiousSelling,
            (Trend::Stable, Trend::Increase) => MarketBehavior::VolumeSpike,
            (Trend::Stable, Trend::Decrease) => MarketBehavior::LowActivity,
            (Trend::Stable, Trend::Stable) => MarketBehavior::StableMarket,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketBehavior::BuyingPressure => "Buying Pressure",
            MarketBehavior::MildBuying => "Mild Buying",
            MarketBehavior::CautiousBuying => "Cautious Buying",
            MarketBehavior::SellingPressure => "Selling Pressure",
            MarketBehavior::MildSelling => "Mild Selling",
            MarketBehavior::CautiousSelling => "Cautious Selling",
            MarketBehavior::VolumeSpike => "Volume Spike",
            MarketBehavior::LowActivity => "Low Activity",
            MarketBehavior::StableMarket => "Stable Market",
        }
    }

    /// Bar color used by the behavior frequency chart
    pub fn color(&self) -> &'static str {
        match self {
            MarketBehavior::BuyingPressure => "#00cc44",
            MarketBehavior::MildBuying => "#66ff66",
            MarketBehavior::CautiousBuying => "#44cc44",
            MarketBehavior::SellingPressure => "#ff4444",
            MarketBehavior::MildSelling => "#ff6666",
            MarketBehavior::CautiousSelling => "#cc4444",
            MarketBehavior::VolumeSpike => "#ffaa00",
            MarketBehavior::LowActivity => "#cccccc",
            MarketBehavior::StableMarket => "#888888",
        }
    }
}

impl std::fmt::Display for MarketBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// "Price {trend} & Volume {trend}"
pub fn combination_label(price: Trend, volume: Trend) -> String {
    format!("Price {} & Volume {}", price, volume)
}

/// Every combination label, in the same order as [`MarketBehavior::ALL`].
pub fn all_combination_labels() -> Vec<String> {
    Trend::ALL
        .iter()
        .flat_map(|&p| Trend::ALL.iter().map(move |&v| combination_label(p, v)))
        .collect()
}

/// Intraday tick with its moving averages and trend classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTick {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
    pub price_ma: f64,
    pub volume_ma: f64,
    pub price_trend: Trend,
    pub price_trend_color: String,
    pub volume_trend: Trend,
    pub volume_trend_color: String,
    pub combination: String,
    pub behavior: MarketBehavior,
    pub behavior_color: String,
    /// price × volume
    pub factor: f64,
    /// factor / previous factor (1.0 for the first tick)
    pub factor_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorCount {
    pub behavior: MarketBehavior,
    pub count: usize,
    pub color: String,
}

impl BehaviorCount {
    pub fn empty(behavior: MarketBehavior) -> Self {
        Self {
            behavior,
            count: 0,
            color: behavior.color().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationCount {
    pub combination: String,
    pub count: usize,
}

/// Frequency tables over an enriched tick series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradaySummary {
    /// One entry per behavior, in canonical order, including zero counts
    pub behavior_counts: Vec<BehaviorCount>,
    pub combination_counts: Vec<CombinationCount>,
    pub most_common_behavior: MarketBehavior,
    pub most_common_count: usize,
    pub total_points: usize,
}

impl IntradaySummary {
    pub fn count_for(&self, behavior: MarketBehavior) -> usize {
        self.behavior_counts
            .iter()
            .find(|c| c.behavior == behavior)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    pub fn count_for_combination(&self, combination: &str) -> usize {
        self.combination_counts
            .iter()
            .find(|c| c.combination == combination)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Share of ticks with the given behavior, in percent
    pub fn behavior_share(&self, behavior: MarketBehavior) -> f64 {
        if self.total_points == 0 {
            return 0.0;
        }
        self.count_for(behavior) as f64 / self.total_points as f64 * 100.0
    }
}

/// Headline figures for the latest tick of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayInsights {
    pub current_price: f64,
    pub price_change: f64,
    pub price_change_pct: f64,
    pub current_volume: f64,
    pub average_volume: f64,
    pub volume_vs_average_pct: f64,
    pub latest_behavior: MarketBehavior,
    pub latest_combination: String,
    pub latest_factor_ratio: f64,
    pub factor_change_pct: f64,
    pub buying_pressure_pct: f64,
    pub selling_pressure_pct: f64,
    pub stable_market_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntradayAnalysis {
    pub ticker: String,
    pub interval_minutes: u32,
    pub window: usize,
    pub ticks: Vec<EnrichedTick>,
    pub summary: IntradaySummary,
    /// None when there are no ticks
    pub insights: Option<IntradayInsights>,
}
