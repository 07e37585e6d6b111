use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{Anomaly, ForecastModel, PriceSeries, StockAnalysis, TradingSignal};
use crate::routes::params::{normalize_ticker, HistoryQuery};
use crate::services::{
    analysis_service, anomaly_service, forecasting_service, price_service, signal_service,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:ticker", get(get_analysis))
        .route("/:ticker/forecasts", get(get_forecasts))
        .route("/:ticker/anomalies", get(get_anomalies))
        .route("/:ticker/signals", get(get_signals))
}

async fn load_series(
    state: &AppState,
    raw_ticker: &str,
    query: &HistoryQuery,
) -> Result<PriceSeries, AppError> {
    let ticker = normalize_ticker(raw_ticker)?;
    let days = query.resolve(state.config.default_history_days)?;

    price_service::fetch_history(
        state.price_provider.as_ref(),
        &state.failure_cache,
        &ticker,
        days,
    )
    .await
    .map_err(|e| {
        error!("Failed to load price history for {}: {}", ticker, e);
        e
    })
}

/// Forecasts, anomalies and signals in one payload
pub async fn get_analysis(
    Path(ticker): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<StockAnalysis>, AppError> {
    info!("GET /analysis/{} - Running full analysis", ticker);
    let symbol = normalize_ticker(&ticker)?;
    let days = query.resolve(state.config.default_history_days)?;

    let analysis = analysis_service::analyze_ticker(
        state.price_provider.as_ref(),
        &state.failure_cache,
        &symbol,
        days,
    )
    .await
    .map_err(|e| {
        error!("Failed to analyze {}: {}", symbol, e);
        e
    })?;

    Ok(Json(analysis))
}

pub async fn get_forecasts(
    Path(ticker): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ForecastModel>>, AppError> {
    info!("GET /analysis/{}/forecasts - Generating forecasts", ticker);
    let series = load_series(&state, &ticker, &query).await?;
    Ok(Json(forecasting_service::generate_forecasts(&series)))
}

pub async fn get_anomalies(
    Path(ticker): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Anomaly>>, AppError> {
    info!("GET /analysis/{}/anomalies - Detecting anomalies", ticker);
    let series = load_series(&state, &ticker, &query).await?;
    Ok(Json(anomaly_service::detect_anomalies(&series)))
}

pub async fn get_signals(
    Path(ticker): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TradingSignal>>, AppError> {
    info!("GET /analysis/{}/signals - Generating trading signals", ticker);
    let series = load_series(&state, &ticker, &query).await?;
    let forecasts = forecasting_service::generate_forecasts(&series);
    Ok(Json(signal_service::generate_trading_signals(&series, &forecasts)))
}
