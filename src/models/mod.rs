mod price_point;
mod analysis;
pub mod anomaly;
pub mod forecast;
pub mod intraday;
pub mod signal;

pub use price_point::{PricePoint, PriceSeries, SeriesError};
pub use analysis::StockAnalysis;
pub use anomaly::{Anomaly, AnomalySeverity, AnomalyType};
pub use forecast::{
    ConfidenceInterval, ErrorMetrics, ForecastModel, ForecastModelType, ForecastPoint,
};
pub use intraday::{
    BehaviorCount, CombinationCount, EnrichedTick, IntradayAnalysis, IntradayInsights,
    IntradaySummary, IntradayTick, MarketBehavior, Trend,
};
pub use signal::{SignalType, TradingSignal};
