use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// One trading day of OHLCV data for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

impl PricePoint {
    /// Point where every price field equals `close` (useful for synthetic data).
    pub fn flat(date: NaiveDate, close: f64, volume: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("price series for {0} is empty")]
    Empty(String),

    #[error("price series for {symbol} is not strictly increasing at index {index} ({date})")]
    OutOfOrder {
        symbol: String,
        index: usize,
        date: NaiveDate,
    },
}

/// Chronological daily history for one symbol.
///
/// Only constructible through [`PriceSeries::new`], which guarantees the series
/// is non-empty and its dates are strictly increasing.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
    last_updated: DateTime<Utc>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();

        if points.is_empty() {
            return Err(SeriesError::Empty(symbol));
        }

        if let Some(index) = points
            .windows(2)
            .position(|w| w[1].date <= w[0].date)
        {
            return Err(SeriesError::OutOfOrder {
                date: points[index + 1].date,
                index: index + 1,
                symbol,
            });
        }

        Ok(Self {
            symbol,
            points,
            last_updated: Utc::now(),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> &PricePoint {
        // non-empty by construction
        &self.points[self.points.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.volume).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_series_rejects_empty() {
        let err = PriceSeries::new("AAPL", vec![]).unwrap_err();
        assert_eq!(err, SeriesError::Empty("AAPL".to_string()));
    }

    #[test]
    fn test_series_rejects_duplicate_dates() {
        let points = vec![
            PricePoint::flat(day(1), 10.0, 100.0),
            PricePoint::flat(day(2), 11.0, 100.0),
            PricePoint::flat(day(2), 12.0, 100.0),
        ];

        match PriceSeries::new("AAPL", points) {
            Err(SeriesError::OutOfOrder { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected OutOfOrder, got {:?}", other),
        }
    }

    #[test]
    fn test_series_accessors() {
        let points = vec![
            PricePoint::flat(day(1), 10.0, 100.0),
            PricePoint::flat(day(4), 12.0, 300.0),
        ];
        let series = PriceSeries::new("MSFT", points).unwrap();

        assert_eq!(series.symbol(), "MSFT");
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().close, 12.0);
        assert_eq!(series.closes(), vec![10.0, 12.0]);
        assert_eq!(series.volumes(), vec![100.0, 300.0]);
    }
}
