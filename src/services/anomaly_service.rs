use tracing::debug;

use crate::models::{Anomaly, AnomalySeverity, AnomalyType, PricePoint, PriceSeries};
use crate::services::indicators::{mean, std_dev, z_score};

/// |z| above which a close is reported as a price spike.
pub const PRICE_Z_THRESHOLD: f64 = 2.5;

/// |z| above which a volume is reported as a volume spike.
pub const VOLUME_Z_THRESHOLD: f64 = 2.0;

/// Points in the window used for trend reversal detection.
const REVERSAL_WINDOW: usize = 6;

/// Scan a daily series for price spikes, volume spikes and trend reversals.
///
/// Spikes are population z-scores over the whole series. A reversal is
/// reported at point `i` when the three closes ending at `i` move in the
/// opposite direction to the three closes before them. Results are sorted by
/// date, newest first; one date can carry several anomalies.
pub fn detect_anomalies(series: &PriceSeries) -> Vec<Anomaly> {
    let points = series.points();
    let closes = series.closes();
    let volumes = series.volumes();

    let price_mean = mean(&closes);
    let price_std = std_dev(&closes);
    let volume_mean = mean(&volumes);
    let volume_std = std_dev(&volumes);

    let mut anomalies = Vec::new();

    for (i, point) in points.iter().enumerate() {
        let price_z = z_score(point.close, price_mean, price_std);
        if price_z.abs() > PRICE_Z_THRESHOLD {
            anomalies.push(price_spike(point, price_z, price_mean, price_std));
        }

        let volume_z = z_score(point.volume, volume_mean, volume_std);
        if volume_z.abs() > VOLUME_Z_THRESHOLD {
            anomalies.push(volume_spike(point, volume_z, volume_mean, volume_std));
        }

        if i + 1 >= REVERSAL_WINDOW {
            if let Some(anomaly) = trend_reversal(point, &closes[i + 1 - REVERSAL_WINDOW..=i]) {
                anomalies.push(anomaly);
            }
        }
    }

    // stable sort keeps price, volume, reversal order within a date
    anomalies.sort_by(|a, b| b.date.cmp(&a.date));

    debug!(
        "Detected {} anomalies in {} points for {}",
        anomalies.len(),
        points.len(),
        series.symbol()
    );

    anomalies
}

fn price_spike(point: &PricePoint, z: f64, mean: f64, std: f64) -> Anomaly {
    let direction = if z > 0.0 { "above" } else { "below" };
    let threshold = mean + PRICE_Z_THRESHOLD * std * z.signum();

    Anomaly {
        date: point.date,
        anomaly_type: AnomalyType::PriceSpike,
        severity: AnomalySeverity::from_z_score(z),
        description: format!(
            "Close of {:.2} is {:.1} standard deviations {} the average of {:.2}",
            point.close,
            z.abs(),
            direction,
            mean
        ),
        value: point.close,
        threshold,
    }
}

fn volume_spike(point: &PricePoint, z: f64, mean: f64, std: f64) -> Anomaly {
    let direction = if z > 0.0 { "above" } else { "below" };
    let threshold = mean + VOLUME_Z_THRESHOLD * std * z.signum();

    Anomaly {
        date: point.date,
        anomaly_type: AnomalyType::VolumeSpike,
        severity: AnomalySeverity::from_z_score(z),
        description: format!(
            "Volume of {:.0} is {:.1} standard deviations {} the average of {:.0}",
            point.volume,
            z.abs(),
            direction,
            mean
        ),
        value: point.volume,
        threshold,
    }
}

/// `window` holds the six closes ending at `point`.
fn trend_reversal(point: &PricePoint, window: &[f64]) -> Option<Anomaly> {
    let (leading, trailing) = window.split_at(window.len() / 2);
    let leading_slope = leading[leading.len() - 1] - leading[0];
    let trailing_slope = trailing[trailing.len() - 1] - trailing[0];

    let description = if leading_slope > 0.0 && trailing_slope < 0.0 {
        "Uptrend reversed into a downtrend"
    } else if leading_slope < 0.0 && trailing_slope > 0.0 {
        "Downtrend reversed into an uptrend"
    } else {
        return None;
    };

    Some(Anomaly {
        date: point.date,
        anomaly_type: AnomalyType::TrendReversal,
        severity: AnomalySeverity::Low,
        description: format!(
            "{} (move of {:+.2} followed by {:+.2})",
            description, leading_slope, trailing_slope
        ),
        value: trailing_slope,
        threshold: 0.0,
    })
}
