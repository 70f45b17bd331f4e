//! # Product Repository
//!
//! Read paths for the product catalog, plus inserts for seeding.
//!
//! Stock mutation during checkout/void does NOT live here: the sale ledger
//! owns every inventory write and performs it inside its own transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use bayon_core::Product;

pub(crate) const PRODUCT_COLUMNS: &str = "id, sku, name, selling_price, cost_price, quantity, \
     low_stock_threshold, is_serialized, is_active, created_at, updated_at";

/// Repository for product reads.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product (seeding and catalog bootstrap).
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, selling_price, cost_price,
                quantity, low_stock_threshold, is_serialized, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.selling_price)
        .bind(product.cost_price)
        .bind(product.quantity)
        .bind(product.low_stock_threshold)
        .bind(product.is_serialized)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a product row with fresh timestamps (seeding and tests).
pub fn new_product(
    sku: &str,
    name: &str,
    selling_price_cents: i64,
    cost_price_cents: Option<i64>,
    quantity: i64,
    is_serialized: bool,
) -> Product {
    let now = Utc::now();
    Product {
        id: generate_product_id(),
        sku: sku.to_string(),
        name: name.to_string(),
        selling_price: bayon_core::Usd::from_cents(selling_price_cents),
        cost_price: cost_price_cents.map(bayon_core::Usd::from_cents),
        quantity,
        low_stock_threshold: 5,
        is_serialized,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
