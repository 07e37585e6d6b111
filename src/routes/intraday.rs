use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use http::header;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::IntradayAnalysis;
use crate::routes::params::{normalize_ticker, IntradayQuery};
use crate::services::intraday_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:ticker", get(get_intraday))
        .route("/:ticker/csv", get(get_intraday_csv))
}

async fn load_analysis(
    state: &AppState,
    raw_ticker: &str,
    query: &IntradayQuery,
) -> Result<IntradayAnalysis, AppError> {
    let ticker = normalize_ticker(raw_ticker)?;
    let (interval, window) = query.resolve()?;

    intraday_service::analyze_intraday(
        state.price_provider.as_ref(),
        &state.failure_cache,
        &ticker,
        interval,
        window,
    )
    .await
    .map_err(|e| {
        error!("Failed to analyze intraday data for {}: {}", ticker, e);
        e
    })
}

pub async fn get_intraday(
    Path(ticker): Path<String>,
    Query(query): Query<IntradayQuery>,
    State(state): State<AppState>,
) -> Result<Json<IntradayAnalysis>, AppError> {
    info!("GET /intraday/{} - Classifying intraday trends", ticker);
    let analysis = load_analysis(&state, &ticker, &query).await?;
    Ok(Json(analysis))
}

pub async fn get_intraday_csv(
    Path(ticker): Path<String>,
    Query(query): Query<IntradayQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    info!("GET /intraday/{}/csv - Exporting intraday analysis", ticker);
    let analysis = load_analysis(&state, &ticker, &query).await?;

    let mut body = Vec::new();
    intraday_service::write_intraday_csv(&analysis, &mut body)?;

    let disposition = format!(
        "attachment; filename=\"{}_intraday_analysis.csv\"",
        analysis.ticker
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
