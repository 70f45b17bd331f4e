//! # Warranty Routes
//!
//! Service-desk lookup: warranty history for a unit brought to the counter.

use axum::extract::{Path, State};
use axum::Json;

use crate::error::ApiError;
use crate::AppState;
use bayon_core::Warranty;

/// `GET /api/warranties/by-imei/{imei}` - warranty history for a unit,
/// newest first. Voided sales leave their warranty behind as `voided`, so
/// the history shows what was ever issued, not just current coverage.
pub async fn get_by_imei(
    State(state): State<AppState>,
    Path(imei): Path<String>,
) -> Result<Json<Vec<Warranty>>, ApiError> {
    let unit = state
        .db
        .serial_items()
        .get_by_imei(&imei)
        .await?
        .ok_or_else(|| ApiError::not_found("Serial unit", &imei))?;

    let warranties = state.db.warranties().list_for_serial_item(&unit.id).await?;

    Ok(Json(warranties))
}
