//! # Serial Item Repository
//!
//! Read paths for individually tracked units, plus inserts for intake.
//!
//! Status flips (`in_stock → sold` and back) happen ONLY inside the sale
//! ledger's transactions, guarded by the unit's current status.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use bayon_core::{SerialItem, SerialStatus};

pub(crate) const SERIAL_COLUMNS: &str = "id, product_id, imei, serial_no, status, cost_price, \
     sale_id, sold_at, created_at, updated_at";

/// Repository for serial-unit reads.
#[derive(Debug, Clone)]
pub struct SerialItemRepository {
    pool: SqlitePool,
}

impl SerialItemRepository {
    /// Creates a new SerialItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SerialItemRepository { pool }
    }

    /// Gets a serial unit by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SerialItem>> {
        let unit = sqlx::query_as::<_, SerialItem>(&format!(
            "SELECT {SERIAL_COLUMNS} FROM serial_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Gets a serial unit by IMEI.
    pub async fn get_by_imei(&self, imei: &str) -> DbResult<Option<SerialItem>> {
        let unit = sqlx::query_as::<_, SerialItem>(&format!(
            "SELECT {SERIAL_COLUMNS} FROM serial_items WHERE imei = ?1"
        ))
        .bind(imei)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Lists the sellable units of a product (register picks an IMEI from
    /// this list).
    pub async fn list_in_stock(&self, product_id: &str) -> DbResult<Vec<SerialItem>> {
        let units = sqlx::query_as::<_, SerialItem>(&format!(
            "SELECT {SERIAL_COLUMNS} FROM serial_items \
             WHERE product_id = ?1 AND status = 'in_stock' \
             ORDER BY created_at"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(units)
    }

    /// Inserts a new unit as `in_stock` (stock intake / seeding).
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - IMEI or serial number already known
    pub async fn insert(&self, unit: &SerialItem) -> DbResult<()> {
        debug!(product_id = %unit.product_id, identifier = %unit.identifier(), "Inserting serial unit");

        sqlx::query(
            r#"
            INSERT INTO serial_items (
                id, product_id, imei, serial_no, status, cost_price,
                sale_id, sold_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&unit.id)
        .bind(&unit.product_id)
        .bind(&unit.imei)
        .bind(&unit.serial_no)
        .bind(unit.status)
        .bind(unit.cost_price)
        .bind(&unit.sale_id)
        .bind(unit.sold_at)
        .bind(unit.created_at)
        .bind(unit.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Builds an in-stock unit row with fresh timestamps (intake and tests).
pub fn new_serial_item(
    product_id: &str,
    imei: Option<&str>,
    serial_no: Option<&str>,
    cost_price_cents: Option<i64>,
) -> SerialItem {
    let now = Utc::now();
    SerialItem {
        id: Uuid::new_v4().to_string(),
        product_id: product_id.to_string(),
        imei: imei.map(str::to_string),
        serial_no: serial_no.map(str::to_string),
        status: SerialStatus::InStock,
        cost_price: cost_price_cents.map(bayon_core::Usd::from_cents),
        sale_id: None,
        sold_at: None,
        created_at: now,
        updated_at: now,
    }
}
