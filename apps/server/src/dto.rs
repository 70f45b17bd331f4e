//! # Response DTOs
//!
//! Projections of domain types for the API boundary.
//!
//! ## Cost-Price Redaction
//! Margin data (`cost_price` on items, per-unit costs) stays in the domain
//! model and the database but never crosses this boundary: redaction is a
//! presentation concern, handled here by simply not projecting the fields.

use serde::Serialize;

use bayon_core::{
    KhrPerUsd, PaymentMethod, Product, Riel, Sale, SaleItem, SaleStatus, SerialItem, SerialStatus,
    Settlement, Usd, Warranty,
};
use bayon_db::{CheckoutOutcome, SaleDetails};

/// A catalog product as the register sees it: selling price and stock,
/// no cost price.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDto {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub selling_price: Usd,
    pub quantity: i64,
    pub is_serialized: bool,
    pub is_low_stock: bool,
}

impl From<&Product> for ProductDto {
    fn from(product: &Product) -> Self {
        ProductDto {
            id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            selling_price: product.selling_price,
            quantity: product.quantity,
            is_serialized: product.is_serialized,
            is_low_stock: product.is_low_stock(),
        }
    }
}

/// A sellable serial unit as the register sees it: identifiers only,
/// no per-unit cost.
#[derive(Debug, Clone, Serialize)]
pub struct SerialItemDto {
    pub id: String,
    pub product_id: String,
    pub imei: Option<String>,
    pub serial_no: Option<String>,
    pub status: SerialStatus,
}

impl From<&SerialItem> for SerialItemDto {
    fn from(unit: &SerialItem) -> Self {
        SerialItemDto {
            id: unit.id.clone(),
            product_id: unit.product_id.clone(),
            imei: unit.imei.clone(),
            serial_no: unit.serial_no.clone(),
            status: unit.status,
        }
    }
}

/// A sale line as clients see it: snapshot prices, no costs.
#[derive(Debug, Clone, Serialize)]
pub struct SaleItemDto {
    pub id: String,
    pub product_id: String,
    pub serial_item_id: Option<String>,
    pub quantity: i64,
    pub unit_price: Usd,
    pub discount: Usd,
    pub line_total: Usd,
}

impl From<&SaleItem> for SaleItemDto {
    fn from(item: &SaleItem) -> Self {
        SaleItemDto {
            id: item.id.clone(),
            product_id: item.product_id.clone(),
            serial_item_id: item.serial_item_id.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            discount: item.discount,
            line_total: item.line_total,
        }
    }
}

/// A sale with its lines and warranties.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDto {
    pub id: String,
    pub invoice_no: String,
    pub cashier_id: String,
    pub customer_id: Option<String>,
    pub status: SaleStatus,
    pub subtotal_usd: Usd,
    pub discount_usd: Usd,
    pub total_usd: Usd,
    pub paid_usd: Usd,
    pub paid_khr: Riel,
    pub change_usd: Usd,
    pub change_khr: Riel,
    pub exchange_rate: KhrPerUsd,
    pub payment_method: PaymentMethod,
    pub khqr_reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub voided_at: Option<chrono::DateTime<chrono::Utc>>,
    pub items: Vec<SaleItemDto>,
    pub warranties: Vec<Warranty>,
}

impl SaleDto {
    fn project(sale: &Sale, items: &[SaleItem], warranties: &[Warranty]) -> Self {
        SaleDto {
            id: sale.id.clone(),
            invoice_no: sale.invoice_no.clone(),
            cashier_id: sale.cashier_id.clone(),
            customer_id: sale.customer_id.clone(),
            status: sale.status,
            subtotal_usd: sale.subtotal_usd,
            discount_usd: sale.discount_usd,
            total_usd: sale.total_usd,
            paid_usd: sale.paid_usd,
            paid_khr: sale.paid_khr,
            change_usd: sale.change_usd,
            change_khr: sale.change_khr,
            exchange_rate: sale.exchange_rate,
            payment_method: sale.payment_method,
            khqr_reference: sale.khqr_reference.clone(),
            notes: sale.notes.clone(),
            created_at: sale.created_at,
            voided_at: sale.voided_at,
            items: items.iter().map(SaleItemDto::from).collect(),
            warranties: warranties.to_vec(),
        }
    }
}

impl From<&SaleDetails> for SaleDto {
    fn from(details: &SaleDetails) -> Self {
        SaleDto::project(&details.sale, &details.items, &details.warranties)
    }
}

/// Settlement detail plus the human-readable change line.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentDto {
    pub rate: KhrPerUsd,
    pub paid_usd: Usd,
    pub paid_khr: Riel,
    pub total_paid_usd: Usd,
    pub is_paid: bool,
    pub is_exact: bool,
    pub change_usd: Usd,
    pub change_khr: Riel,
    pub change_message: String,
}

impl From<&Settlement> for PaymentDto {
    fn from(s: &Settlement) -> Self {
        PaymentDto {
            rate: s.rate,
            paid_usd: s.paid_usd,
            paid_khr: s.paid_khr,
            total_paid_usd: s.total_paid_usd,
            is_paid: s.is_paid,
            is_exact: s.is_exact,
            change_usd: s.change_usd,
            change_khr: s.change_khr,
            change_message: s.change_message(),
        }
    }
}

/// Body of a successful `POST /api/sales`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub sale: SaleDto,
    pub payment: PaymentDto,
}

impl From<&CheckoutOutcome> for CheckoutResponse {
    fn from(outcome: &CheckoutOutcome) -> Self {
        CheckoutResponse {
            sale: SaleDto::project(&outcome.sale, &outcome.items, &outcome.warranties),
            payment: PaymentDto::from(&outcome.settlement),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_item_projection_drops_cost_price() {
        let item = SaleItem {
            id: "i1".to_string(),
            sale_id: "s1".to_string(),
            product_id: "p1".to_string(),
            serial_item_id: None,
            quantity: 2,
            unit_price: Usd::from_cents(250),
            cost_price: Some(Usd::from_cents(80)),
            discount: Usd::zero(),
            line_total: Usd::from_cents(500),
            created_at: Utc::now(),
        };

        let dto = SaleItemDto::from(&item);
        let json = serde_json::to_value(&dto).unwrap();

        assert!(json.get("cost_price").is_none());
        assert_eq!(json["unit_price"], 250);
        assert_eq!(json["line_total"], 500);
    }
}
