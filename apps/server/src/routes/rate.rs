//! # Exchange Rate Routes
//!
//! Read and set the daily KHR/USD rate.

use axum::extract::State;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;
use bayon_core::validation::validate_rate;
use bayon_core::KhrPerUsd;

/// Today's effective rate, with provenance.
#[derive(Debug, Clone, Serialize)]
pub struct RateResponse {
    pub rate_date: NaiveDate,
    pub khr_per_usd: KhrPerUsd,
    /// Who set the rate; absent when the configured default is in effect.
    pub set_by: Option<String>,
}

/// `GET /api/rates/today`.
pub async fn get_today(State(state): State<AppState>) -> Result<Json<RateResponse>, ApiError> {
    let today = Utc::now().date_naive();

    let response = match state.db.rates().get(today).await? {
        Some(row) => RateResponse {
            rate_date: row.rate_date,
            khr_per_usd: row.khr_per_usd,
            set_by: Some(row.set_by),
        },
        None => RateResponse {
            rate_date: today,
            khr_per_usd: state.default_rate,
            set_by: None,
        },
    };

    Ok(Json(response))
}

/// Body of `PUT /api/rates/today`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRateRequest {
    pub khr_per_usd: i64,
    pub set_by: String,
}

/// `PUT /api/rates/today` - sets today's rate, recording the actor.
pub async fn set_today(
    State(state): State<AppState>,
    Json(req): Json<SetRateRequest>,
) -> Result<Json<RateResponse>, ApiError> {
    let rate = KhrPerUsd::new(req.khr_per_usd);
    validate_rate(rate)?;

    if req.set_by.trim().is_empty() {
        return Err(ApiError::validation("set_by is required"));
    }

    let today = Utc::now().date_naive();
    state.db.rates().upsert(today, rate, &req.set_by).await?;

    info!(%rate, set_by = %req.set_by, "Exchange rate updated");

    Ok(Json(RateResponse {
        rate_date: today,
        khr_per_usd: rate,
        set_by: Some(req.set_by),
    }))
}
