use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    PriceSpike,
    VolumeSpike,
    TrendReversal,
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyType::PriceSpike => write!(f, "price_spike"),
            AnomalyType::VolumeSpike => write!(f, "volume_spike"),
            AnomalyType::TrendReversal => write!(f, "trend_reversal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

impl AnomalySeverity {
    /// Severity for a spike whose |z| already crossed its detection threshold.
    pub fn from_z_score(z: f64) -> Self {
        if z.abs() > 3.0 {
            AnomalySeverity::High
        } else {
            AnomalySeverity::Medium
        }
    }
}

/// A statistically unusual observation in a daily price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub severity: AnomalySeverity,
    pub description: String,
    pub value: f64,
    pub threshold: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_z_score() {
        assert_eq!(AnomalySeverity::from_z_score(3.5), AnomalySeverity::High);
        assert_eq!(AnomalySeverity::from_z_score(-4.0), AnomalySeverity::High);
        assert_eq!(AnomalySeverity::from_z_score(2.6), AnomalySeverity::Medium);
        assert_eq!(AnomalySeverity::from_z_score(3.0), AnomalySeverity::Medium);
    }

    #[test]
    fn test_anomaly_serializes_type_tag() {
        let anomaly = Anomaly {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            anomaly_type: AnomalyType::VolumeSpike,
            severity: AnomalySeverity::Medium,
            description: "Unusual volume".to_string(),
            value: 2.4,
            threshold: 2.0,
        };

        let json = serde_json::to_value(&anomaly).unwrap();
        assert_eq!(json["type"], "volume_spike");
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["date"], "2024-01-02");
    }
}
