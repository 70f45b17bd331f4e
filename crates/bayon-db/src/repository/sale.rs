//! # Sale Repository
//!
//! Read paths for committed sales: receipt reprinting, void preview, the
//! checkout response body.
//!
//! There is deliberately no `insert_sale`/`update_sale` here. The sale
//! ledger is the sole writer of sale state and performs every write inside
//! its own transaction (see `ledger.rs` and `void.rs`).

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::DbResult;
use bayon_core::{Sale, SaleItem, Warranty};

pub(crate) const SALE_COLUMNS: &str = "id, invoice_no, cashier_id, customer_id, status, \
     subtotal_usd, discount_usd, total_usd, paid_usd, paid_khr, change_usd, change_khr, \
     exchange_rate, payment_method, khqr_reference, notes, created_at, updated_at, voided_at";

pub(crate) const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, serial_item_id, quantity, \
     unit_price, cost_price, discount, line_total, created_at";

pub(crate) const WARRANTY_COLUMNS: &str = "id, sale_id, serial_item_id, months, start_date, \
     end_date, status, created_at, updated_at";

/// A sale with its lines and issued warranties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetails {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub warranties: Vec<Warranty>,
}

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by its invoice number.
    pub async fn get_by_invoice_no(&self, invoice_no: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE invoice_no = ?1"
        ))
        .bind(invoice_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a sale together with its items and warranties.
    ///
    /// ## Returns
    /// * `Ok(None)` - Sale not found
    pub async fn get_with_details(&self, id: &str) -> DbResult<Option<SaleDetails>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let items = self.get_items(id).await?;

        let warranties = sqlx::query_as::<_, Warranty>(&format!(
            "SELECT {WARRANTY_COLUMNS} FROM warranties WHERE sale_id = ?1 ORDER BY created_at, id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SaleDetails {
            sale,
            items,
            warranties,
        }))
    }
}
