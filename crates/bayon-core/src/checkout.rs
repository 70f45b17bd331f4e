//! # Checkout Planning
//!
//! The pure half of the inventory allocator, plus invoice numbering.
//!
//! ## Where This Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Data Flow                                   │
//! │                                                                         │
//! │  CheckoutRequest (API boundary)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Sale Ledger (bayon-db) ── loads product / serial rows in the tx        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plan_line() ← THIS MODULE: validates one line against loaded rows      │
//! │       │        and snapshots prices. Pure - same rows in, same plan out │
//! │       ▼                                                                 │
//! │  AllocatedLine → ledger persists, flips serial units, issues warranty   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Splitting planning from persistence keeps the allocation rules fully
//! unit-testable; the ledger supplies row locking and atomicity on top.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Riel, Usd};
use crate::types::{PaymentMethod, Product, SerialItem};
use crate::MAX_LINE_QUANTITY;

// =============================================================================
// Request Types
// =============================================================================

/// One requested line of a checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: String,

    /// Requested quantity for bulk products. Defaults to 1.
    /// Serialized lines are implicitly quantity 1.
    #[serde(default)]
    pub quantity: Option<i64>,

    /// Required for serialized products: the exact unit being sold.
    #[serde(default)]
    pub serial_item_id: Option<String>,

    /// Price override in USD cents; falls back to the catalog price.
    #[serde(default)]
    pub unit_price: Option<Usd>,

    /// Line-level discount in USD cents.
    #[serde(default)]
    pub discount: Option<Usd>,
}

/// A full checkout request as the ledger consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<LineRequest>,
    pub cashier_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    /// USD tendered, in cents.
    #[serde(default)]
    pub paid_usd: Usd,
    /// KHR tendered, in whole riel.
    #[serde(default)]
    pub paid_khr: Riel,
    /// Sale-level discount in USD cents.
    #[serde(default)]
    pub discount_usd: Usd,
    /// Gateway reference hash; required for KHQR sales.
    #[serde(default)]
    pub khqr_reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Warranty duration for serialized lines. Defaults to 12.
    #[serde(default)]
    pub warranty_months: Option<i64>,
}

// =============================================================================
// Allocated Line
// =============================================================================

/// A validated, price-snapshotted line ready to persist.
///
/// Prices and costs are frozen HERE, at allocation time: later edits to the
/// product's catalog prices must never rewrite historical margin data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedLine {
    pub product_id: String,
    /// Set for serialized lines; the unit the ledger will flip to `sold`.
    pub serial_item_id: Option<String>,
    pub quantity: i64,
    pub unit_price: Usd,
    pub cost_price: Option<Usd>,
    pub discount: Usd,
    /// `unit_price * quantity - discount`.
    pub line_total: Usd,
}

/// Validates one requested line against the product (and serial unit) rows
/// the ledger loaded, and snapshots prices.
///
/// ## Rules
/// - Serialized product: `serial_item_id` required, the unit must belong to
///   this product and be exactly `in_stock`; quantity is implicitly 1.
/// - Bulk product: `quantity` (default 1) must be positive and covered by
///   current stock; the failure message reports what IS available.
/// - `unit_price` falls back to the catalog selling price; the cost
///   snapshot prefers the serial unit's per-unit override.
/// - The discount may not exceed the gross line amount.
///
/// Any failure aborts the whole batch upstream - partial allocation is
/// never committed.
pub fn plan_line(
    product: &Product,
    serial: Option<&SerialItem>,
    line: &LineRequest,
) -> CoreResult<AllocatedLine> {
    let (quantity, serial_item_id, cost_price) = if product.is_serialized {
        let serial_id = line.serial_item_id.as_deref().ok_or_else(|| {
            ValidationError::Required {
                field: format!("serial_item_id (product {})", product.sku),
            }
        })?;

        let unit = serial.ok_or_else(|| CoreError::SerialUnitNotFound(serial_id.to_string()))?;

        if unit.product_id != product.id {
            return Err(ValidationError::InvalidFormat {
                field: "serial_item_id".to_string(),
                reason: format!("unit {} belongs to a different product", unit.identifier()),
            }
            .into());
        }

        if !unit.is_available() {
            return Err(CoreError::Unavailable {
                identifier: unit.identifier().to_string(),
                status: unit.status.as_str().to_string(),
            });
        }

        // A serialized line is always exactly one unit.
        if let Some(q) = line.quantity {
            if q != 1 {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 1,
                    max: 1,
                }
                .into());
            }
        }

        (1, Some(unit.id.clone()), unit.cost_price.or(product.cost_price))
    } else {
        let quantity = line.quantity.unwrap_or(1);
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_LINE_QUANTITY,
            }
            .into());
        }

        if !product.can_fulfill(quantity) {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.quantity,
                requested: quantity,
            });
        }

        (quantity, None, product.cost_price)
    };

    let unit_price = line.unit_price.unwrap_or(product.selling_price);
    if unit_price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit_price".to_string(),
        }
        .into());
    }

    let discount = line.discount.unwrap_or_default();
    let gross = unit_price.multiply_quantity(quantity);
    if discount.is_negative() || discount > gross {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: gross.cents(),
        }
        .into());
    }

    Ok(AllocatedLine {
        product_id: product.id.clone(),
        serial_item_id,
        quantity,
        unit_price,
        cost_price,
        discount,
        line_total: gross - discount,
    })
}

// =============================================================================
// Invoice Numbers
// =============================================================================

/// Formats a date-scoped invoice number: `INV-YYYYMMDD-NNNN`.
///
/// `seq` is 1-based within the day (`1 + sales already created today`).
/// The ledger computes and consumes the sequence inside the committing
/// transaction; this function only formats.
///
/// ## Example
/// ```rust
/// use bayon_core::checkout::invoice_number;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
/// assert_eq!(invoice_number(date, 7), "INV-20260806-0007");
/// ```
pub fn invoice_number(date: NaiveDate, seq: i64) -> String {
    format!("INV-{}-{:04}", date.format("%Y%m%d"), seq)
}

/// Prefix shared by every invoice issued on `date`; used to count a day's
/// sales with a single indexed range scan.
pub fn invoice_prefix(date: NaiveDate) -> String {
    format!("INV-{}-", date.format("%Y%m%d"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SerialStatus;
    use chrono::Utc;

    fn bulk_product(quantity: i64) -> Product {
        Product {
            id: "p-bulk".to_string(),
            sku: "ESP-DBL".to_string(),
            name: "Double Espresso".to_string(),
            selling_price: Usd::from_cents(250),
            cost_price: Some(Usd::from_cents(80)),
            quantity,
            low_stock_threshold: 5,
            is_serialized: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn phone_product() -> Product {
        Product {
            id: "p-phone".to_string(),
            sku: "PHN-A54".to_string(),
            name: "Galaxy A54".to_string(),
            selling_price: Usd::from_cents(349_00),
            cost_price: Some(Usd::from_cents(280_00)),
            quantity: 0,
            low_stock_threshold: 0,
            is_serialized: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn unit(status: SerialStatus, cost: Option<i64>) -> SerialItem {
        SerialItem {
            id: "u1".to_string(),
            product_id: "p-phone".to_string(),
            imei: Some("356938035643809".to_string()),
            serial_no: None,
            status,
            cost_price: cost.map(Usd::from_cents),
            sale_id: None,
            sold_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(product_id: &str) -> LineRequest {
        LineRequest {
            product_id: product_id.to_string(),
            quantity: None,
            serial_item_id: None,
            unit_price: None,
            discount: None,
        }
    }

    #[test]
    fn test_bulk_line_defaults() {
        let product = bulk_product(10);
        let planned = plan_line(&product, None, &line("p-bulk")).unwrap();

        assert_eq!(planned.quantity, 1);
        assert_eq!(planned.unit_price, Usd::from_cents(250));
        assert_eq!(planned.cost_price, Some(Usd::from_cents(80)));
        assert_eq!(planned.line_total, Usd::from_cents(250));
        assert!(planned.serial_item_id.is_none());
    }

    #[test]
    fn test_bulk_line_total_math() {
        let product = bulk_product(10);
        let mut req = line("p-bulk");
        req.quantity = Some(3);
        req.discount = Some(Usd::from_cents(50));

        let planned = plan_line(&product, None, &req).unwrap();
        // 250 * 3 - 50 = 700
        assert_eq!(planned.line_total, Usd::from_cents(700));
    }

    #[test]
    fn test_bulk_insufficient_stock_reports_available() {
        let product = bulk_product(3);
        let mut req = line("p-bulk");
        req.quantity = Some(5);

        let err = plan_line(&product, None, &req).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                sku,
                available,
                requested,
            } => {
                assert_eq!(sku, "ESP-DBL");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_bulk_zero_quantity_rejected() {
        let product = bulk_product(3);
        let mut req = line("p-bulk");
        req.quantity = Some(0);

        assert!(matches!(
            plan_line(&product, None, &req),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_serialized_line_snapshots_unit_cost_override() {
        let product = phone_product();
        let unit = unit(SerialStatus::InStock, Some(275_00));
        let mut req = line("p-phone");
        req.serial_item_id = Some("u1".to_string());

        let planned = plan_line(&product, Some(&unit), &req).unwrap();

        assert_eq!(planned.quantity, 1);
        assert_eq!(planned.serial_item_id.as_deref(), Some("u1"));
        // per-unit override wins over product cost
        assert_eq!(planned.cost_price, Some(Usd::from_cents(275_00)));
        assert_eq!(planned.line_total, Usd::from_cents(349_00));
    }

    #[test]
    fn test_serialized_line_falls_back_to_product_cost() {
        let product = phone_product();
        let unit = unit(SerialStatus::InStock, None);
        let mut req = line("p-phone");
        req.serial_item_id = Some("u1".to_string());

        let planned = plan_line(&product, Some(&unit), &req).unwrap();
        assert_eq!(planned.cost_price, Some(Usd::from_cents(280_00)));
    }

    #[test]
    fn test_serialized_line_requires_serial_item_id() {
        let product = phone_product();
        let req = line("p-phone");

        assert!(matches!(
            plan_line(&product, None, &req),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_sold_unit_is_unavailable() {
        let product = phone_product();
        let unit = unit(SerialStatus::Sold, None);
        let mut req = line("p-phone");
        req.serial_item_id = Some("u1".to_string());

        let err = plan_line(&product, Some(&unit), &req).unwrap_err();
        match err {
            CoreError::Unavailable { identifier, status } => {
                assert_eq!(identifier, "356938035643809");
                assert_eq!(status, "sold");
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_unit_of_other_product_rejected() {
        let product = phone_product();
        let mut foreign = unit(SerialStatus::InStock, None);
        foreign.product_id = "p-other".to_string();
        let mut req = line("p-phone");
        req.serial_item_id = Some("u1".to_string());

        assert!(matches!(
            plan_line(&product, Some(&foreign), &req),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_discount_cannot_exceed_gross() {
        let product = bulk_product(10);
        let mut req = line("p-bulk");
        req.discount = Some(Usd::from_cents(300)); // gross is 250

        assert!(matches!(
            plan_line(&product, None, &req),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_price_override_is_snapshotted() {
        let product = bulk_product(10);
        let mut req = line("p-bulk");
        req.unit_price = Some(Usd::from_cents(200));

        let planned = plan_line(&product, None, &req).unwrap();
        assert_eq!(planned.unit_price, Usd::from_cents(200));
    }

    #[test]
    fn test_request_deserializes_from_json() {
        // The wire shape the register sends: cents for USD, whole riel
        // for KHR, optional fields omitted.
        let req: CheckoutRequest = serde_json::from_str(
            r#"{
                "items": [
                    { "product_id": "p-phone", "serial_item_id": "u1" },
                    { "product_id": "p-bulk", "quantity": 2, "discount": 50 }
                ],
                "cashier_id": "cashier-1",
                "payment_method": "cash",
                "paid_usd": 35400,
                "paid_khr": 0
            }"#,
        )
        .unwrap();

        assert_eq!(req.items.len(), 2);
        assert_eq!(req.items[0].serial_item_id.as_deref(), Some("u1"));
        assert_eq!(req.items[1].quantity, Some(2));
        assert_eq!(req.items[1].discount, Some(Usd::from_cents(50)));
        assert_eq!(req.paid_usd, Usd::from_cents(354_00));
        assert!(req.khqr_reference.is_none());
        assert!(req.warranty_months.is_none());
    }

    #[test]
    fn test_invoice_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(invoice_number(date, 1), "INV-20260806-0001");
        assert_eq!(invoice_number(date, 42), "INV-20260806-0042");
        assert_eq!(invoice_number(date, 10_000), "INV-20260806-10000");
        assert_eq!(invoice_prefix(date), "INV-20260806-");
    }
}
