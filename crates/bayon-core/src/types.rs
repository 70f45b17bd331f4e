//! # Domain Types
//!
//! Core domain types for the sale transaction engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │   SerialItem    │   │    Warranty     │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │◄──│  product_id     │◄──│  serial_item_id │        │
//! │  │  quantity       │   │  imei/serial_no │   │  start/end date │        │
//! │  │  is_serialized  │   │  status         │   │  status         │        │
//! │  └─────────────────┘   └────────┬────────┘   └────────┬────────┘        │
//! │                                 │                     │                 │
//! │  ┌─────────────────┐   ┌────────┴────────┐            │                 │
//! │  │      Sale       │◄──│    SaleItem     │            │                 │
//! │  │  ─────────────  │   │  ─────────────  │            │                 │
//! │  │  invoice_no     │   │  price snapshot │            │                 │
//! │  │  dual-currency  │   │  serial link    │            │                 │
//! │  │  paid/change    │   └─────────────────┘            │                 │
//! │  │  status         │◄───────────────────────────────── sale_id          │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (invoice_no, sku, imei) - human-readable

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{KhrPerUsd, Riel, Usd};

// =============================================================================
// Status Enums
// =============================================================================

/// The status of a sale transaction.
///
/// `Voided` is terminal: a voided sale only ever changes again by having
/// audit lines appended to its notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been paid and committed.
    Completed,
    /// Sale was reversed; inventory and warranties restored.
    Voided,
    /// Sale was refunded through the maintenance flows.
    Refunded,
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash (USD notes, KHR notes, or both).
    Cash,
    /// Card payment on external terminal.
    Card,
    /// KHQR interoperable QR payment.
    Khqr,
    /// Mixed tender across methods.
    Split,
}

/// Lifecycle of an individually tracked inventory unit.
///
/// ```text
/// created ──► in_stock ──► sold ──► in_stock   (on void)
///                 │
///                 └──► returned / defective    (maintenance flows)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SerialStatus {
    /// Available for sale.
    InStock,
    /// Consumed by a committed sale.
    Sold,
    /// Returned by a customer (maintenance flows).
    Returned,
    /// Pulled from sellable stock (maintenance flows).
    Defective,
}

impl SerialStatus {
    /// Storage/display form, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SerialStatus::InStock => "in_stock",
            SerialStatus::Sold => "sold",
            SerialStatus::Returned => "returned",
            SerialStatus::Defective => "defective",
        }
    }
}

/// Warranty lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum WarrantyStatus {
    Active,
    Expired,
    Claimed,
    /// Set when the originating sale is voided.
    Voided,
}

// =============================================================================
// Product (read subset)
// =============================================================================

/// A product as the sale engine sees it.
///
/// The engine reads prices/stock and mutates only `quantity`, and only for
/// non-serialized products. Catalog editing lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Selling price in USD cents.
    pub selling_price: Usd,

    /// Cost price in USD cents (for margin reporting).
    pub cost_price: Option<Usd>,

    /// Bulk stock count. Meaningful only when `is_serialized` is false.
    pub quantity: i64,

    /// Stock level at or below which the product counts as low.
    pub low_stock_threshold: i64,

    /// Whether units are tracked individually by IMEI/serial number.
    pub is_serialized: bool,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether bulk stock can cover a requested quantity.
    ///
    /// Serialized products never fulfill from bulk stock; their units are
    /// allocated individually.
    pub fn can_fulfill(&self, requested: i64) -> bool {
        !self.is_serialized && self.quantity >= requested
    }

    /// Checks whether bulk stock has fallen to the low-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        !self.is_serialized && self.quantity <= self.low_stock_threshold
    }
}

// =============================================================================
// Serial Item
// =============================================================================

/// An individually tracked inventory unit (e.g. a phone).
///
/// At least one of `imei`/`serial_no` is always present; the schema
/// enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SerialItem {
    pub id: String,
    pub product_id: String,
    /// IMEI for phones/devices.
    pub imei: Option<String>,
    /// Manufacturer serial number.
    pub serial_no: Option<String>,
    pub status: SerialStatus,
    /// Per-unit cost override; falls back to the product cost.
    pub cost_price: Option<Usd>,
    /// Sale that consumed this unit, while `status` is `sold`.
    pub sale_id: Option<String>,
    /// When the unit was sold, while `status` is `sold`.
    pub sold_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SerialItem {
    /// Human-readable identifier for messages: IMEI, else serial number,
    /// else the row id.
    pub fn identifier(&self) -> &str {
        self.imei
            .as_deref()
            .or(self.serial_no.as_deref())
            .unwrap_or(&self.id)
    }

    /// Whether the unit can be allocated to a sale right now.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.status == SerialStatus::InStock
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed (or reversed) sale transaction.
///
/// Invariant: `total_usd == subtotal_usd - discount_usd`, exact to the cent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Date-scoped human-readable identifier: `INV-YYYYMMDD-NNNN`.
    pub invoice_no: String,
    pub cashier_id: String,
    pub customer_id: Option<String>,
    pub status: SaleStatus,
    pub subtotal_usd: Usd,
    pub discount_usd: Usd,
    pub total_usd: Usd,
    /// USD tendered.
    pub paid_usd: Usd,
    /// KHR tendered.
    pub paid_khr: Riel,
    /// Change returned in USD notes.
    pub change_usd: Usd,
    /// Change returned in KHR notes.
    pub change_khr: Riel,
    /// Rate in effect when the sale committed.
    pub exchange_rate: KhrPerUsd,
    pub payment_method: PaymentMethod,
    /// Gateway reference hash for KHQR payments.
    pub khqr_reference: Option<String>,
    /// Free text; void appends audit lines here, never overwrites.
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn is_voided(&self) -> bool {
        self.status == SaleStatus::Voided
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// Uses the snapshot pattern: unit price and cost price are frozen at sale
/// time so later catalog edits never rewrite historical margins.
///
/// Invariant: `line_total == unit_price * quantity - discount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Set when this line consumed an individually tracked unit.
    pub serial_item_id: Option<String>,
    /// Always 1 for serialized lines.
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price: Usd,
    /// Cost at time of sale (frozen; serial override wins over product cost).
    pub cost_price: Option<Usd>,
    /// Discount applied to this line.
    pub discount: Usd,
    /// `unit_price * quantity - discount`.
    pub line_total: Usd,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Warranty
// =============================================================================

/// A warranty issued for one sold serial unit.
///
/// Created only alongside a serialized sale line, inside the ledger's
/// transaction; voided when its sale is voided.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Warranty {
    pub id: String,
    pub sale_id: String,
    pub serial_item_id: String,
    /// Duration in months.
    pub months: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: WarrantyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Warranty {
    /// Issues a new active warranty starting today.
    ///
    /// Pure creation step: computes the coverage window and nothing else.
    /// `months` is validated upstream (1..=120), so the end date always
    /// lands inside chrono's representable range.
    pub fn issue(
        sale_id: &str,
        serial_item_id: &str,
        months: i64,
        today: NaiveDate,
        now: DateTime<Utc>,
        id: String,
    ) -> Self {
        let end_date = today
            .checked_add_months(Months::new(months as u32))
            .unwrap_or(today);

        Warranty {
            id,
            sale_id: sale_id.to_string(),
            serial_item_id: serial_item_id.to_string(),
            months,
            start_date: today,
            end_date,
            status: WarrantyStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether coverage has lapsed by `today` (status notwithstanding).
    pub fn is_lapsed(&self, today: NaiveDate) -> bool {
        today > self.end_date
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// One exchange-rate row per calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExchangeRate {
    /// Calendar date this rate applies to.
    pub rate_date: NaiveDate,
    pub khr_per_usd: KhrPerUsd,
    /// Actor who set the rate.
    pub set_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
