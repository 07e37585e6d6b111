use std::net::SocketAddr;
use std::str::FromStr;

use crate::routes::params::{MAX_HISTORY_DAYS, MIN_HISTORY_DAYS};

/// Where market data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Mock,
    Yahoo,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "yahoo" => Ok(ProviderKind::Yahoo),
            other => Err(format!(
                "Invalid PRICE_PROVIDER: {}. Must be 'mock' or 'yahoo'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub mock_seed: u64,
    pub bind_addr: SocketAddr,
    pub default_history_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            mock_seed: 42,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            default_history_days: 180,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let provider = match lookup("PRICE_PROVIDER") {
            Some(v) => v.parse()?,
            None => defaults.provider,
        };

        let mock_seed = match lookup("MOCK_SEED") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| format!("Invalid MOCK_SEED: {}", v))?,
            None => defaults.mock_seed,
        };

        let bind_addr = match lookup("BIND_ADDR") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| format!("Invalid BIND_ADDR: {}", v))?,
            None => defaults.bind_addr,
        };

        let default_history_days = match lookup("DEFAULT_HISTORY_DAYS") {
            Some(v) => {
                let days: u32 = v
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid DEFAULT_HISTORY_DAYS: {}", v))?;
                if !(MIN_HISTORY_DAYS..=MAX_HISTORY_DAYS).contains(&days) {
                    return Err(format!(
                        "DEFAULT_HISTORY_DAYS must be between {} and {}",
                        MIN_HISTORY_DAYS, MAX_HISTORY_DAYS
                    ));
                }
                days
            }
            None => defaults.default_history_days,
        };

        Ok(Self {
            provider,
            mock_seed,
            bind_addr,
            default_history_days,
        })
    }
}
