use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::PriceSeries;
use crate::routes::params::{normalize_ticker, HistoryQuery};
use crate::services::price_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:ticker", get(get_prices))
}

pub async fn get_prices(
    Path(ticker): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<PriceSeries>, AppError> {
    let ticker = normalize_ticker(&ticker)?;
    let days = query.resolve(state.config.default_history_days)?;
    info!("GET /prices/{} - Getting {} days of price history", ticker, days);

    let series = price_service::fetch_history(
        state.price_provider.as_ref(),
        &state.failure_cache,
        &ticker,
        days,
    )
    .await
    .map_err(|e| {
        error!("Failed to get price history for {}: {}", ticker, e);
        e
    })?;

    Ok(Json(series))
}
