/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Mean of the last `window` values, or of all values when fewer exist.
pub fn trailing_mean(values: &[f64], window: usize) -> f64 {
    let start = values.len().saturating_sub(window.max(1));
    mean(&values[start..])
}

/// Rolling mean aligned with `values`, where the window at index `i` covers
/// up to `window` values ending at `i` (shorter at the start of the series).
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);

    // Each window is summed from scratch so no drift accumulates from a running sum.
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&values[start..=i])
        })
        .collect()
}

/// Simple day-over-day returns: (p[t] - p[t-1]) / p[t-1].
///
/// A zero previous price yields a 0.0 return rather than an infinity.
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { (w[1] - w[0]) / w[0] })
        .collect()
}

/// Standard score of `value`; 0.0 when the distribution has no spread.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }
    (value - mean) / std_dev
}

/// Linear regression trend line for y-values using x = 0..n-1
/// Returns (slope m, intercept b) for y = m*x + b
pub fn regression_trend(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    if n == 1 {
        return (0.0, values[0]);
    }

    let n_f = n as f64;

    let (sum_x, sum_y, sum_xy, sum_x2) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0, 0.0, 0.0), |(sx, sy, sxy, sx2), (i, &y)| {
            let x = i as f64;
            (sx + x, sy + y, sxy + x * y, sx2 + x * x)
        });

    let denom = n_f * sum_x2 - sum_x * sum_x;
    if denom == 0.0 {
        // fallback: horizontal line at mean
        return (0.0, sum_y / n_f);
    }

    let m = (n_f * sum_xy - sum_x * sum_y) / denom;
    let b = (sum_y - m * sum_x) / n_f;

    (m, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);

        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
    }

    #[test]
    fn test_trailing_mean_uses_available_history() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(trailing_mean(&values, 2), 3.5);
        assert_eq!(trailing_mean(&values, 20), 2.5);
        assert_eq!(trailing_mean(&[], 5), 0.0);
    }

    #[test]
    fn test_rolling_mean_partial_windows() {
        let values = [10.0, 20.0, 30.0, 40.0];
        let rolled = rolling_mean(&values, 3);
        assert_eq!(rolled, vec![10.0, 15.0, 20.0, 30.0]);

        // window of one is the identity
        assert_eq!(rolling_mean(&values, 1), values.to_vec());
    }

    #[test]
    fn test_daily_returns() {
        let returns = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.1).abs() < 1e-12);
        assert!((returns[1] + 0.1).abs() < 1e-12);

        assert_eq!(daily_returns(&[0.0, 5.0]), vec![0.0]);
        assert!(daily_returns(&[1.0]).is_empty());
    }

    #[test]
    fn test_z_score_guards_zero_spread() {
        assert_eq!(z_score(5.0, 5.0, 0.0), 0.0);
        assert_eq!(z_score(7.0, 5.0, 1.0), 2.0);
    }

    #[test]
    fn test_regression_trend_recovers_line() {
        let values: Vec<f64> = (0..30).map(|i| 50.0 + 2.0 * i as f64).collect();
        let (m, b) = regression_trend(&values);
        assert!((m - 2.0).abs() < 1e-9);
        assert!((b - 50.0).abs() < 1e-9);

        assert_eq!(regression_trend(&[7.0]), (0.0, 7.0));
    }
}
