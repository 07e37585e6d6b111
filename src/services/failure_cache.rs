use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::external::price_provider::PriceProviderError;

/// Information about a failed fetch for a ticker
#[derive(Debug, Clone)]
pub struct FailureInfo {
    pub failed_at: DateTime<Utc>,
    pub failure_type: FailureType,
    pub message: String,
}

impl FailureInfo {
    pub fn retry_after(&self) -> DateTime<Utc> {
        self.failed_at + self.failure_type.ttl()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    NotFound,
    RateLimited,
    ApiError,
}

impl FailureType {
    pub fn ttl(&self) -> Duration {
        match self {
            FailureType::NotFound => Duration::hours(24),
            FailureType::RateLimited => Duration::hours(1),
            FailureType::ApiError => Duration::hours(6),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureType::NotFound => "not_found",
            FailureType::RateLimited => "rate_limited",
            FailureType::ApiError => "api_error",
        }
    }
}

impl From<&PriceProviderError> for FailureType {
    fn from(value: &PriceProviderError) -> Self {
        match value {
            PriceProviderError::NotFound(_) => FailureType::NotFound,
            PriceProviderError::RateLimited => FailureType::RateLimited,
            _ => FailureType::ApiError,
        }
    }
}

/// Thread-safe cache of tickers whose last fetch failed.
///
/// Keys are `"{kind}:{TICKER}"` so daily and intraday fetches fail independently.
#[derive(Clone, Default)]
pub struct FailureCache {
    cache: Arc<DashMap<String, FailureInfo>>,
}

impl FailureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active failure for `key`, if it has not expired yet.
    pub fn is_failed(&self, key: &str) -> Option<FailureInfo> {
        self.is_failed_at(key, Utc::now())
    }

    fn is_failed_at(&self, key: &str, now: DateTime<Utc>) -> Option<FailureInfo> {
        let info = self.cache.get(key)?.value().clone();

        if now < info.retry_after() {
            return Some(info);
        }

        // TTL expired
        self.cache.remove(key);
        None
    }

    pub fn record_failure(&self, key: &str, error: &PriceProviderError) {
        self.record_failure_at(key, error, Utc::now());
    }

    fn record_failure_at(&self, key: &str, error: &PriceProviderError, now: DateTime<Utc>) {
        let info = FailureInfo {
            failed_at: now,
            failure_type: FailureType::from(error),
            message: error.to_string(),
        };

        self.cache.insert(key.to_string(), info);
    }

    /// Forget a key, e.g. after a successful fetch
    pub fn clear(&self, key: &str) {
        self.cache.remove(key);
    }

    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.cache.retain(|_, info| now < info.retry_after());
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
