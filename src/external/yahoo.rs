use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{IntradayTick, PricePoint, PriceSeries};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; stocklens/0.1)";

pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, PriceProviderError> {
        Self::with_base_url(CHART_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, PriceProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn fetch_chart(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<String, PriceProviderError> {
        let url = format!("{}/{}?range={}&interval={}", self.base_url, ticker, range, interval);
        debug!("Requesting Yahoo chart {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(PriceProviderError::RateLimited),
            reqwest::StatusCode::NOT_FOUND => {
                return Err(PriceProviderError::NotFound(ticker.to_string()))
            }
            status if !status.is_success() => {
                warn!("Yahoo returned {} for {}", status, ticker);
                return Err(PriceProviderError::BadResponse(format!("HTTP {}", status)));
            }
            _ => {}
        }

        resp.text()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    #[serde(default)]
    adjclose: Vec<YahooAdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Smallest Yahoo range that covers `days` calendar days.
fn range_for_days(days: u32) -> &'static str {
    match days {
        0..=5 => "5d",
        6..=30 => "1mo",
        31..=90 => "3mo",
        91..=180 => "6mo",
        181..=365 => "1y",
        366..=730 => "2y",
        _ => "5y",
    }
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

fn parse_chart(
    ticker: &str,
    body: &str,
) -> Result<(Vec<i64>, YahooQuote, Vec<Option<f64>>), PriceProviderError> {
    let parsed: YahooChartResponse =
        serde_json::from_str(body).map_err(|e| PriceProviderError::Parse(e.to_string()))?;

    if let Some(err) = parsed.chart.error {
        if err.code.as_deref() == Some("Not Found") {
            return Err(PriceProviderError::NotFound(ticker.to_string()));
        }
        return Err(PriceProviderError::BadResponse(
            err.description.unwrap_or_else(|| "unknown chart error".to_string()),
        ));
    }

    let mut result = parsed
        .chart
        .result
        .and_then(|mut r| r.pop())
        .ok_or_else(|| PriceProviderError::NotFound(ticker.to_string()))?;

    let quote = result.indicators.quote.pop().unwrap_or_default();
    let adj = result
        .indicators
        .adjclose
        .pop()
        .map(|a| a.adjclose)
        .unwrap_or_default();

    Ok((result.timestamp, quote, adj))
}

/// Daily bars from a chart response, limited to `days` calendar days before
/// the most recent bar. Rows without a close are skipped.
fn parse_daily(ticker: &str, body: &str, days: u32) -> Result<PriceSeries, PriceProviderError> {
    let (timestamps, quote, adj) = parse_chart(ticker, body)?;

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        // timestamp aligns with quote arrays by index
        let Some(close) = value_at(&quote.close, i) else { continue };

        let date = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| PriceProviderError::Parse(format!("bad timestamp {}", ts)))?
            .date_naive();

        points.push(PricePoint {
            date,
            open: value_at(&quote.open, i).unwrap_or(close),
            high: value_at(&quote.high, i).unwrap_or(close),
            low: value_at(&quote.low, i).unwrap_or(close),
            close,
            adj_close: value_at(&adj, i).unwrap_or(close),
            volume: value_at(&quote.volume, i).unwrap_or(0.0),
        });
    }

    // Yahoo occasionally repeats the live bar for today; the later one is fresher
    keep_last_by_key(&mut points, |p| p.date);

    if let Some(last) = points.last().map(|p| p.date) {
        let cutoff = last - Duration::days(i64::from(days.max(1)) - 1);
        points.retain(|p| p.date >= cutoff);
    }

    Ok(PriceSeries::new(ticker, points)?)
}

/// Sort by key and drop duplicates, keeping the element that came last in the
/// response.
fn keep_last_by_key<T, K: Ord>(items: &mut Vec<T>, mut key: impl FnMut(&T) -> K) {
    // stable sort, so duplicates stay in response order
    items.sort_by_key(&mut key);
    items.reverse();
    items.dedup_by_key(|item| key(item));
    items.reverse();
}

fn parse_intraday(ticker: &str, body: &str) -> Result<Vec<IntradayTick>, PriceProviderError> {
    let (timestamps, quote, _) = parse_chart(ticker, body)?;

    let mut ticks = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(price) = value_at(&quote.close, i) else { continue };

        let timestamp: DateTime<Utc> = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| PriceProviderError::Parse(format!("bad timestamp {}", ts)))?;

        ticks.push(IntradayTick {
            timestamp,
            price,
            volume: value_at(&quote.volume, i).unwrap_or(0.0),
        });
    }

    keep_last_by_key(&mut ticks, |t| t.timestamp);

    if ticks.is_empty() {
        return Err(PriceProviderError::NotFound(ticker.to_string()));
    }

    Ok(ticks)
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<PriceSeries, PriceProviderError> {
        let body = self.fetch_chart(ticker, range_for_days(days), "1d").await?;
        parse_daily(ticker, &body, days)
    }

    async fn fetch_intraday(
        &self,
        ticker: &str,
        interval_minutes: u32,
    ) -> Result<Vec<IntradayTick>, PriceProviderError> {
        let interval = format!("{}m", interval_minutes);
        let body = self.fetch_chart(ticker, "1d", &interval).await?;
        parse_intraday(ticker, &body)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // 2024-03-11 .. 2024-03-14, 14:30 UTC each day
    const DAILY_BODY: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1710167400, 1710253800, 1710340200, 1710426600],
                "indicators": {
                    "quote": [{
                        "open":   [170.0, 171.0, null, 173.0],
                        "high":   [172.0, 173.5, null, 175.0],
                        "low":    [169.0, 170.5, null, 172.0],
                        "close":  [171.5, 172.8, null, 174.2],
                        "volume": [1000000, 1200000, null, null]
                    }],
                    "adjclose": [{ "adjclose": [171.0, 172.3, null, 174.0] }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_daily_skips_missing_close() {
        let series = parse_daily("AAPL", DAILY_BODY, 30).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.points()[0].date, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(series.points()[0].adj_close, 171.0);
        assert_eq!(series.latest().close, 174.2);
        assert_eq!(series.latest().volume, 0.0);
    }

    #[test]
    fn test_parse_daily_trims_to_requested_days() {
        let series = parse_daily("AAPL", DAILY_BODY, 2).unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series.latest().date, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
    }

    #[test]
    fn test_chart_error_maps_to_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;

        let err = parse_daily("NOPE", body, 30).unwrap_err();
        assert!(matches!(err, PriceProviderError::NotFound(t) if t == "NOPE"));
    }

    #[test]
    fn test_empty_result_is_not_found() {
        let body = r#"{"chart":{"result":[{"timestamp":[],"indicators":{"quote":[{}]}}],"error":null}}"#;

        assert!(matches!(
            parse_daily("EMPTY", body, 30),
            Err(PriceProviderError::NotFound(_))
        ));
        assert!(matches!(
            parse_intraday("EMPTY", body),
            Err(PriceProviderError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_intraday() {
        let body = r#"{"chart":{"result":[{
            "timestamp": [1710426600, 1710426900, 1710427200],
            "indicators": {"quote": [{
                "close":  [174.0, null, 174.5],
                "volume": [5000, 6000, 7000]
            }]}
        }],"error":null}}"#;

        let ticks = parse_intraday("AAPL", body).unwrap();

        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[1].price, 174.5);
        assert_eq!(ticks[1].volume, 7000.0);
        assert_eq!(ticks[0].timestamp.format("%H:%M").to_string(), "14:30");
    }

    #[test]
    fn test_repeated_bars_keep_the_latest() {
        // second 2024-03-14 bar at 18:30 UTC is the live update
        let daily = r#"{"chart":{"result":[{
            "timestamp": [1710340200, 1710426600, 1710441000],
            "indicators": {"quote": [{
                "close":  [173.0, 174.0, 176.5],
                "volume": [900, 1000, 2500]
            }]}
        }],"error":null}}"#;

        let series = parse_daily("AAPL", daily, 30).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().date, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(series.latest().close, 176.5);
        assert_eq!(series.latest().volume, 2500.0);

        let intraday = r#"{"chart":{"result":[{
            "timestamp": [1710426600, 1710426900, 1710426900],
            "indicators": {"quote": [{
                "close":  [174.0, 174.2, 174.9],
                "volume": [5000, 6000, 6400]
            }]}
        }],"error":null}}"#;

        let ticks = parse_intraday("AAPL", intraday).unwrap();

        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[1].price, 174.9);
        assert_eq!(ticks[1].volume, 6400.0);
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        assert!(matches!(
            parse_daily("AAPL", "not json", 30),
            Err(PriceProviderError::Parse(_))
        ));
    }

    #[test]
    fn test_range_for_days() {
        assert_eq!(range_for_days(1), "5d");
        assert_eq!(range_for_days(30), "1mo");
        assert_eq!(range_for_days(180), "6mo");
        assert_eq!(range_for_days(365), "1y");
        assert_eq!(range_for_days(1825), "5y");
    }
}
