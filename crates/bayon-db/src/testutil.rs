//! Shared fixtures for the engine tests: an in-memory store seeded with a
//! small café-plus-phone-counter catalog.

use crate::pool::{Database, DbConfig};
use crate::repository::product::new_product;
use crate::repository::serial::new_serial_item;
use crate::SaleLedger;
use bayon_core::{CheckoutRequest, KhrPerUsd, LineRequest, PaymentMethod, Product, Riel, Usd};

pub(crate) const RATE: KhrPerUsd = KhrPerUsd::new(4100);

pub(crate) struct TestStore {
    pub db: Database,
    /// Bulk, $2.50, stock 20.
    pub espresso: Product,
    /// Bulk, $1.80, stock 8.
    pub croissant: Product,
    /// Serialized, $349.00.
    pub phone: Product,
    /// Two in-stock units of `phone`.
    pub phone_units: Vec<String>,
}

impl TestStore {
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let espresso = new_product("ESP-DBL", "Double Espresso", 2_50, Some(80), 20, false);
        let croissant = new_product("CRS-BTR", "Butter Croissant", 1_80, Some(60), 8, false);
        let phone = new_product("PHN-A54", "Galaxy A54", 349_00, Some(280_00), 0, true);

        db.products().insert(&espresso).await.unwrap();
        db.products().insert(&croissant).await.unwrap();
        db.products().insert(&phone).await.unwrap();

        let unit_a = new_serial_item(&phone.id, Some("356938035643809"), None, Some(275_00));
        let unit_b = new_serial_item(&phone.id, Some("356938035643810"), None, None);
        db.serial_items().insert(&unit_a).await.unwrap();
        db.serial_items().insert(&unit_b).await.unwrap();

        TestStore {
            db,
            espresso,
            croissant,
            phone,
            phone_units: vec![unit_a.id, unit_b.id],
        }
    }

    pub fn ledger(&self) -> SaleLedger {
        self.db.ledger()
    }

    pub async fn sale_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    pub async fn warranty_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM warranties")
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}

pub(crate) fn bulk_line(product_id: &str, quantity: i64) -> LineRequest {
    LineRequest {
        product_id: product_id.to_string(),
        quantity: Some(quantity),
        serial_item_id: None,
        unit_price: None,
        discount: None,
    }
}

pub(crate) fn serial_line(product_id: &str, serial_item_id: &str) -> LineRequest {
    LineRequest {
        product_id: product_id.to_string(),
        quantity: None,
        serial_item_id: Some(serial_item_id.to_string()),
        unit_price: None,
        discount: None,
    }
}

pub(crate) fn cash_request(
    items: Vec<LineRequest>,
    paid_usd: Usd,
    paid_khr: Riel,
) -> CheckoutRequest {
    CheckoutRequest {
        items,
        cashier_id: "cashier-1".to_string(),
        customer_id: None,
        payment_method: PaymentMethod::Cash,
        paid_usd,
        paid_khr,
        discount_usd: Usd::zero(),
        khqr_reference: None,
        notes: None,
        warranty_months: None,
    }
}
