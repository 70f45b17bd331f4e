//! # Validation Module
//!
//! Request validation for the sale engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary (serde)                                         │
//! │  └── Type/shape validation (deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - request-level rules, before any DB work         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: plan_line() - per-line rules against loaded stock rows        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database constraints (NOT NULL, UNIQUE, FK, CHECK)            │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::checkout::CheckoutRequest;
use crate::error::ValidationError;
use crate::money::KhrPerUsd;
use crate::types::PaymentMethod;
use crate::{MAX_SALE_LINES, MAX_WARRANTY_MONTHS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a checkout request before any database work.
///
/// ## Rules
/// - At least one line, at most `MAX_SALE_LINES`
/// - Every line names a product
/// - A cashier is identified
/// - Tendered amounts and the sale discount are non-negative
/// - KHQR sales carry a gateway reference
/// - Warranty duration, when given, is 1..=120 months
pub fn validate_checkout(req: &CheckoutRequest) -> ValidationResult<()> {
    if req.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if req.items.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    for line in &req.items {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
    }

    if req.cashier_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "cashier_id".to_string(),
        });
    }

    if req.paid_usd.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "paid_usd".to_string(),
        });
    }

    if req.paid_khr.riel() < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "paid_khr".to_string(),
        });
    }

    if req.discount_usd.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "discount_usd".to_string(),
        });
    }

    if req.payment_method == PaymentMethod::Khqr
        && req
            .khqr_reference
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .is_empty()
    {
        return Err(ValidationError::Required {
            field: "khqr_reference".to_string(),
        });
    }

    if let Some(months) = req.warranty_months {
        validate_warranty_months(months)?;
    }

    Ok(())
}

/// Validates a warranty duration in months.
pub fn validate_warranty_months(months: i64) -> ValidationResult<()> {
    if months < 1 || months > MAX_WARRANTY_MONTHS {
        return Err(ValidationError::OutOfRange {
            field: "warranty_months".to_string(),
            min: 1,
            max: MAX_WARRANTY_MONTHS,
        });
    }
    Ok(())
}

/// Validates the actor identifier on a void request.
///
/// The actor lands in the sale's audit trail, so it must not be blank.
pub fn validate_void_actor(actor: &str) -> ValidationResult<()> {
    if actor.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "actor".to_string(),
        });
    }
    Ok(())
}

/// Validates an exchange rate before it is stored or used as a default.
pub fn validate_rate(rate: KhrPerUsd) -> ValidationResult<()> {
    if !rate.is_valid() {
        return Err(ValidationError::MustBePositive {
            field: "khr_per_usd".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::LineRequest;
    use crate::money::{Riel, Usd};

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            items: vec![LineRequest {
                product_id: "p1".to_string(),
                quantity: Some(1),
                serial_item_id: None,
                unit_price: None,
                discount: None,
            }],
            cashier_id: "cashier-1".to_string(),
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            paid_usd: Usd::from_cents(1000),
            paid_khr: Riel::zero(),
            discount_usd: Usd::zero(),
            khqr_reference: None,
            notes: None,
            warranty_months: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(validate_checkout(&request()).is_ok());
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut req = request();
        req.items.clear();
        assert!(validate_checkout(&req).is_err());
    }

    #[test]
    fn test_blank_cashier_rejected() {
        let mut req = request();
        req.cashier_id = "  ".to_string();
        assert!(validate_checkout(&req).is_err());
    }

    #[test]
    fn test_negative_tender_rejected() {
        let mut req = request();
        req.paid_usd = Usd::from_cents(-100);
        assert!(validate_checkout(&req).is_err());

        let mut req = request();
        req.paid_khr = Riel::new(-1);
        assert!(validate_checkout(&req).is_err());
    }

    #[test]
    fn test_khqr_requires_reference() {
        let mut req = request();
        req.payment_method = PaymentMethod::Khqr;
        assert!(validate_checkout(&req).is_err());

        req.khqr_reference = Some("d9a1c3".to_string());
        assert!(validate_checkout(&req).is_ok());
    }

    #[test]
    fn test_warranty_months_bounds() {
        assert!(validate_warranty_months(1).is_ok());
        assert!(validate_warranty_months(12).is_ok());
        assert!(validate_warranty_months(120).is_ok());
        assert!(validate_warranty_months(0).is_err());
        assert!(validate_warranty_months(121).is_err());
    }

    #[test]
    fn test_void_actor_required() {
        assert!(validate_void_actor("manager-1").is_ok());
        assert!(validate_void_actor("").is_err());
        assert!(validate_void_actor("   ").is_err());
    }

    #[test]
    fn test_rate_must_be_positive() {
        assert!(validate_rate(KhrPerUsd::new(4100)).is_ok());
        assert!(validate_rate(KhrPerUsd::new(0)).is_err());
    }
}
