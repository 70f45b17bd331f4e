//! # Warranty Repository
//!
//! Read paths for warranties. Issuance happens only inside the checkout
//! transaction; voiding happens only inside the void transaction.

use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::repository::sale::WARRANTY_COLUMNS;
use bayon_core::Warranty;

/// Repository for warranty reads.
#[derive(Debug, Clone)]
pub struct WarrantyRepository {
    pool: SqlitePool,
}

impl WarrantyRepository {
    /// Creates a new WarrantyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WarrantyRepository { pool }
    }

    /// Lists the warranties issued with a sale.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<Warranty>> {
        let warranties = sqlx::query_as::<_, Warranty>(&format!(
            "SELECT {WARRANTY_COLUMNS} FROM warranties WHERE sale_id = ?1 ORDER BY created_at, id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(warranties)
    }

    /// Lists the warranty history of a serial unit, newest first.
    ///
    /// A unit accumulates one row per sale it was part of; voided sales
    /// leave their warranty behind with status `voided`.
    pub async fn list_for_serial_item(&self, serial_item_id: &str) -> DbResult<Vec<Warranty>> {
        let warranties = sqlx::query_as::<_, Warranty>(&format!(
            "SELECT {WARRANTY_COLUMNS} FROM warranties \
             WHERE serial_item_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(serial_item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(warranties)
    }
}
