use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{IntradayTick, PricePoint, PriceSeries};

/// Regular session length in minutes (09:30 to 16:00 New York).
const SESSION_MINUTES: u32 = 390;

/// Session open expressed in UTC, ignoring daylight saving.
const SESSION_OPEN_UTC: (u32, u32) = (14, 30);

const DAILY_DRIFT: f64 = 0.0003;
const DAILY_SHOCK: f64 = 0.02;
const INTRADAY_SHOCK: f64 = 0.002;

/// Synthetic market data: a seeded geometric random walk per ticker.
///
/// The same seed, ticker and anchor date always produce the same data.
#[derive(Debug, Clone)]
pub struct MockPriceProvider {
    seed: u64,
    anchor: Option<NaiveDate>,
}

impl MockPriceProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed, anchor: None }
    }

    /// Pin the last generated day instead of using today's date.
    pub fn with_anchor(mut self, anchor: NaiveDate) -> Self {
        self.anchor = Some(anchor);
        self
    }

    fn anchor_date(&self) -> NaiveDate {
        self.anchor.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn rng_for(&self, ticker: &str, salt: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ ticker_hash(ticker) ^ salt)
    }

    pub fn daily_series(&self, ticker: &str, days: u32) -> Result<PriceSeries, PriceProviderError> {
        let anchor = self.anchor_date();
        let dates = business_days(anchor, days);

        let mut rng = self.rng_for(ticker, 0);
        let mut previous_close: f64 = rng.random_range(20.0..500.0);
        let base_volume: f64 = rng.random_range(500_000.0..20_000_000.0);

        let points = dates
            .into_iter()
            .map(|date| {
                let open = previous_close * (1.0 + rng.random_range(-0.005..0.005));
                let close = previous_close
                    * (1.0 + DAILY_DRIFT + rng.random_range(-DAILY_SHOCK..DAILY_SHOCK));
                let high = open.max(close) * (1.0 + rng.random_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.random_range(0.0..0.01));
                let volume = (base_volume * rng.random_range(0.5..1.5)).round();

                previous_close = close;

                PricePoint {
                    date,
                    open,
                    high,
                    low,
                    close,
                    adj_close: close,
                    volume,
                }
            })
            .collect();

        Ok(PriceSeries::new(ticker, points)?)
    }

    pub fn session_ticks(&self, ticker: &str, interval_minutes: u32) -> Vec<IntradayTick> {
        let interval = interval_minutes.max(1);
        let session_day = last_business_day(self.anchor_date());
        let (hour, minute) = SESSION_OPEN_UTC;
        let open = Utc.from_utc_datetime(
            &session_day.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()),
        );

        let mut rng = self.rng_for(ticker, u64::from(interval) << 32);
        let mut price: f64 = rng.random_range(20.0..500.0);
        let base_volume: f64 = rng.random_range(10_000.0..500_000.0) * f64::from(interval);

        (0..SESSION_MINUTES / interval)
            .map(|i| {
                price *= 1.0 + rng.random_range(-INTRADAY_SHOCK..INTRADAY_SHOCK);
                let volume = (base_volume * rng.random_range(0.3..1.7)).round();

                IntradayTick {
                    timestamp: open + Duration::minutes(i64::from(i * interval)),
                    price,
                    volume,
                }
            })
            .collect()
    }
}

#[async_trait]
impl PriceProvider for MockPriceProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<PriceSeries, PriceProviderError> {
        self.daily_series(ticker, days)
    }

    async fn fetch_intraday(
        &self,
        ticker: &str,
        interval_minutes: u32,
    ) -> Result<Vec<IntradayTick>, PriceProviderError> {
        Ok(self.session_ticks(ticker, interval_minutes))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// FNV-1a; stable across builds unlike std's DefaultHasher
fn ticker_hash(ticker: &str) -> u64 {
    ticker.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn last_business_day(mut date: NaiveDate) -> NaiveDate {
    while !is_business_day(date) {
        date -= Duration::days(1);
    }
    date
}

/// Weekdays within the `days` calendar days ending at `anchor`, oldest first.
/// Falls back to the latest weekday when the window holds none.
fn business_days(anchor: NaiveDate, days: u32) -> Vec<NaiveDate> {
    let dates: Vec<NaiveDate> = (0..i64::from(days.max(1)))
        .rev()
        .map(|offset| anchor - Duration::days(offset))
        .filter(|d| is_business_day(*d))
        .collect();

    if dates.is_empty() {
        vec![last_business_day(anchor)]
    } else {
        dates
    }
}
