use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lower/upper band around a single prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Single point in a forecast time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_value: f64,
    pub confidence_interval: Option<ConfidenceInterval>,
}

/// In-sample accuracy of a forecasting model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub rmse: f64,
    pub mae: f64,
    /// Mean absolute percentage error, in percent
    pub mape: f64,
}

/// Forecasting methodology used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastModelType {
    MovingAverage,
    LinearRegression,
    /// Single-lag autoregression on daily returns.
    Arima,
}

impl ForecastModelType {
    pub fn display_name(&self) -> &'static str {
        match self {
            ForecastModelType::MovingAverage => "Moving Average",
            ForecastModelType::LinearRegression => "Linear Regression",
            ForecastModelType::Arima => "ARIMA",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ForecastModelType::MovingAverage => {
                "Trailing mean of closing prices with a small upward drift"
            }
            ForecastModelType::LinearRegression => {
                "Least-squares trend line of close price against trading day"
            }
            ForecastModelType::Arima => {
                "First-order autoregression of daily returns"
            }
        }
    }
}

impl std::fmt::Display for ForecastModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastModelType::MovingAverage => write!(f, "moving_average"),
            ForecastModelType::LinearRegression => write!(f, "linear_regression"),
            ForecastModelType::Arima => write!(f, "arima"),
        }
    }
}

/// Output of one forecasting strategy over a price series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastModel {
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: ForecastModelType,
    pub predictions: Vec<ForecastPoint>,
    pub metrics: ErrorMetrics,
    /// Fitted parameters, e.g. `window`, `slope`, `phi`
    pub parameters: BTreeMap<String, f64>,
}

impl ForecastModel {
    pub fn first_prediction(&self) -> Option<f64> {
        self.predictions.first().map(|p| p.predicted_value)
    }
}
