use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::errors::AppError;

pub const MIN_HISTORY_DAYS: u32 = 1;
pub const MAX_HISTORY_DAYS: u32 = 1825;

/// Bar sizes offered for intraday analysis, in minutes.
pub const INTRADAY_INTERVALS: [u32; 6] = [1, 2, 5, 15, 30, 60];
pub const DEFAULT_INTERVAL: u32 = 5;

pub const MIN_WINDOW: usize = 1;
pub const MAX_WINDOW: usize = 20;
pub const DEFAULT_WINDOW: usize = 3;

static TICKER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9.\-^]{1,12}$").ok());

/// Upper-case and validate a ticker from the URL path.
pub fn normalize_ticker(raw: &str) -> Result<String, AppError> {
    let ticker = raw.trim().to_uppercase();
    if TICKER_RE.as_ref().is_some_and(|re| re.is_match(&ticker)) {
        Ok(ticker)
    } else {
        Err(AppError::Validation(format!("Invalid ticker symbol: {}", raw)))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<u32>,
}

impl HistoryQuery {
    pub fn resolve(&self, default_days: u32) -> Result<u32, AppError> {
        let days = self.days.unwrap_or(default_days);
        if (MIN_HISTORY_DAYS..=MAX_HISTORY_DAYS).contains(&days) {
            Ok(days)
        } else {
            Err(AppError::Validation(format!(
                "days must be between {} and {}, got {}",
                MIN_HISTORY_DAYS, MAX_HISTORY_DAYS, days
            )))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IntradayQuery {
    pub interval: Option<u32>,
    pub window: Option<usize>,
}

impl IntradayQuery {
    /// (interval minutes, moving average window)
    pub fn resolve(&self) -> Result<(u32, usize), AppError> {
        let interval = self.interval.unwrap_or(DEFAULT_INTERVAL);
        if !INTRADAY_INTERVALS.contains(&interval) {
            return Err(AppError::Validation(format!(
                "interval must be one of {:?} minutes, got {}",
                INTRADAY_INTERVALS, interval
            )));
        }

        let window = self.window.unwrap_or(DEFAULT_WINDOW);
        if !(MIN_WINDOW..=MAX_WINDOW).contains(&window) {
            return Err(AppError::Validation(format!(
                "window must be between {} and {}, got {}",
                MIN_WINDOW, MAX_WINDOW, window
            )));
        }

        Ok((interval, window))
    }
}
