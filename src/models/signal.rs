use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a trading recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::Buy => write!(f, "buy"),
            SignalType::Sell => write!(f, "sell"),
            SignalType::Hold => write!(f, "hold"),
        }
    }
}

/// Trading recommendation derived from one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    #[serde(rename = "type")]
    pub signal_type: SignalType,

    /// Conviction in [0, 1]
    pub strength: f64,

    /// Human-readable explanation of the contributing factors
    pub reason: String,

    pub timestamp: DateTime<Utc>,

    /// Take-profit level for directional signals
    pub target_price: Option<f64>,

    pub stop_loss: Option<f64>,
}

impl TradingSignal {
    pub fn hold(reason: impl Into<String>) -> Self {
        Self {
            signal_type: SignalType::Hold,
            strength: 0.5,
            reason: reason.into(),
            timestamp: Utc::now(),
            target_price: None,
            stop_loss: None,
        }
    }

    pub fn is_directional(&self) -> bool {
        self.signal_type != SignalType::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_type_display_matches_json() {
        for kind in [SignalType::Buy, SignalType::Sell, SignalType::Hold] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_hold_signal_defaults() {
        let signal = TradingSignal::hold("No clear edge");
        assert_eq!(signal.signal_type, SignalType::Hold);
        assert_eq!(signal.strength, 0.5);
        assert!(signal.target_price.is_none());
        assert!(signal.stop_loss.is_none());
        assert!(!signal.is_directional());
    }

    #[test]
    fn test_signal_json_shape() {
        let signal = TradingSignal::hold("x");
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["type"], "hold");
        assert!(json["target_price"].is_null());
    }
}
