pub mod analysis_service;
pub mod anomaly_service;
pub mod failure_cache;
pub mod forecasting_service;
pub mod indicators;
pub mod intraday_service;
pub mod price_service;
pub mod signal_service;
