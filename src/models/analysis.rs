use serde::Serialize;

use super::{Anomaly, ForecastModel, PriceSeries, TradingSignal};

/// Everything the dashboard shows for one ticker and date range
#[derive(Debug, Clone, Serialize)]
pub struct StockAnalysis {
    pub series: PriceSeries,
    pub forecasts: Vec<ForecastModel>,
    pub anomalies: Vec<Anomaly>,
    pub signals: Vec<TradingSignal>,
}
