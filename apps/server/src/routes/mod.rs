//! # Route Layer
//!
//! Thin handlers over the db layer: deserialize, delegate, project, map
//! errors to status codes. No business math lives here.

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub mod product;
pub mod rate;
pub mod sale;
pub mod warranty;

/// Builds the full API router.
///
/// ## Status surface
/// - `201` sale created
/// - `400` validation / stock / payment failure
/// - `404` missing sale / product / serial unit
/// - `409` already voided, invoice collision
/// - `200` successful void / reads
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sales", post(sale::create_sale))
        .route("/api/sales/{id}", get(sale::get_sale))
        .route("/api/sales/{id}/void", post(sale::void_sale))
        .route(
            "/api/products/{id}/serial-items",
            get(product::list_serial_units),
        )
        .route("/api/products/by-sku/{sku}", get(product::get_by_sku))
        .route("/api/warranties/by-imei/{imei}", get(warranty::get_by_imei))
        .route(
            "/api/rates/today",
            get(rate::get_today).put(rate::set_today),
        )
        .with_state(state)
}

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
