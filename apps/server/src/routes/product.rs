//! # Product Routes
//!
//! Register-facing reads: which units of a serialized product can be sold.

use axum::extract::{Path, State};
use axum::Json;

use crate::dto::{ProductDto, SerialItemDto};
use crate::error::ApiError;
use crate::AppState;

/// `GET /api/products/by-sku/{sku}` - barcode-scan lookup.
pub async fn get_by_sku(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_sku(&sku)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &sku))?;

    Ok(Json(ProductDto::from(&product)))
}

/// `GET /api/products/{id}/serial-items` - in-stock units of a product,
/// oldest intake first. The register picks an IMEI from this list when
/// building a serialized checkout line.
pub async fn list_serial_units(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SerialItemDto>>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    let units = state.db.serial_items().list_in_stock(&product.id).await?;

    Ok(Json(units.iter().map(SerialItemDto::from).collect()))
}
