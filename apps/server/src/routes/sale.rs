//! # Sale Routes
//!
//! Checkout, lookup, and void.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dto::{CheckoutResponse, SaleDto};
use crate::error::{ApiError, ErrorCode};
use crate::AppState;
use bayon_core::{CheckoutRequest, PaymentMethod};

/// `POST /api/sales` - commits a checkout.
///
/// KHQR sales are verified against the gateway's status endpoint BEFORE
/// the ledger runs; an unconfirmed payment never reaches the engine. The
/// gateway response is treated as opaque success/failure - amount and
/// currency reconciliation is deliberately out of scope here.
pub async fn create_sale(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    debug!(lines = req.items.len(), method = ?req.payment_method, "create_sale");

    if req.payment_method == PaymentMethod::Khqr {
        verify_khqr(&state, &req).await?;
    }

    let rates = state.db.rates().with_default(state.default_rate);
    let outcome = state.db.ledger().checkout(&rates, req).await?;

    Ok((StatusCode::CREATED, Json(CheckoutResponse::from(&outcome))))
}

/// Consults the KHQR gateway for the payment reference carried by the
/// request. A missing reference falls through: the engine's own
/// validation rejects it with a descriptive 400.
async fn verify_khqr(state: &AppState, req: &CheckoutRequest) -> Result<(), ApiError> {
    let Some(reference) = req
        .khqr_reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
    else {
        return Ok(());
    };

    let Some(client) = &state.khqr else {
        warn!("KHQR gateway not configured, accepting sale without status check");
        return Ok(());
    };

    let status = client.check_status(reference).await.map_err(|err| {
        warn!(%err, "KHQR status check failed");
        ApiError::new(ErrorCode::GatewayError, "KHQR gateway unavailable")
    })?;

    if !status.success {
        return Err(ApiError::payment(format!(
            "KHQR payment not confirmed: {}",
            status.message
        )));
    }

    Ok(())
}

/// `GET /api/sales/{id}` - a sale with items and warranties.
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaleDto>, ApiError> {
    let details = state
        .db
        .sales()
        .get_with_details(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;

    Ok(Json(SaleDto::from(&details)))
}

/// Body of `POST /api/sales/{id}/void`.
#[derive(Debug, Clone, Deserialize)]
pub struct VoidRequest {
    /// Who is reversing the sale; recorded in the audit trail.
    pub actor: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body of a successful void.
#[derive(Debug, Clone, Serialize)]
pub struct VoidResponse {
    pub sale: SaleDto,
}

/// `POST /api/sales/{id}/void` - atomically reverses a committed sale.
pub async fn void_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VoidRequest>,
) -> Result<Json<VoidResponse>, ApiError> {
    debug!(sale_id = %id, actor = %req.actor, "void_sale");

    state
        .db
        .ledger()
        .void_sale(&id, &req.actor, req.reason.as_deref())
        .await?;

    // Re-read for the response so items/warranties reflect committed state.
    let details = state
        .db
        .sales()
        .get_with_details(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;

    Ok(Json(VoidResponse {
        sale: SaleDto::from(&details),
    }))
}
