use std::sync::Arc;

use crate::config::AppConfig;
use crate::external::price_provider::PriceProvider;
use crate::services::failure_cache::FailureCache;

#[derive(Clone)]
pub struct AppState {
    pub price_provider: Arc<dyn PriceProvider>,
    pub failure_cache: FailureCache,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(price_provider: Arc<dyn PriceProvider>, config: AppConfig) -> Self {
        Self {
            price_provider,
            failure_cache: FailureCache::new(),
            config,
        }
    }
}
