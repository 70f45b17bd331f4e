//! # Error Types
//!
//! Domain-specific error types for bayon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bayon-core errors (this file)                                          │
//! │  ├── CoreError        - Checkout/void business failures                 │
//! │  └── ValidationError  - Malformed request input                         │
//! │                                                                         │
//! │  bayon-db errors (separate crate)                                       │
//! │  ├── DbError          - Database operation failures                     │
//! │  └── LedgerError      - CoreError | DbError, returned by the engine     │
//! │                                                                         │
//! │  Server errors (apps/server)                                            │
//! │  └── ApiError         - What clients see (status code + message)        │
//! │                                                                         │
//! │  Every CoreError is an EXPECTED outcome: the transaction rolls back     │
//! │  completely and the client gets a descriptive 4xx.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (IMEI, available stock, amounts due)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::money::{Riel, Usd};

// =============================================================================
// Core Error
// =============================================================================

/// Business failures of the sale transaction engine.
///
/// Every variant causes a full transaction rollback; none of them leave a
/// partial sale, orphaned inventory mutation, or dangling warranty behind.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product referenced by a line does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Serial unit referenced by a line does not exist.
    #[error("Serial unit not found: {0}")]
    SerialUnitNotFound(String),

    /// Sale does not exist (lookup or void target).
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Serial unit exists but is not `in_stock` - either it was never
    /// available or a concurrent checkout won the unit first. The caller
    /// is expected to re-select inventory and resubmit.
    #[error("Serial unit {identifier} is not available (status: {status})")]
    Unavailable { identifier: String, status: String },

    /// Bulk stock cannot cover the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout line (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "ESP-DBL", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Register shows: "Only 3 ESP-DBL in stock"
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Tendered amounts do not cover the total. The message carries the
    /// remaining balance in both currencies.
    #[error("Insufficient payment: {remaining_usd} ({remaining_khr}) still due")]
    PaymentInsufficient {
        remaining_usd: Usd,
        remaining_khr: Riel,
    },

    /// The sale was already voided. Void is deliberately not idempotent:
    /// a second reversal must fail loudly, not silently retry.
    #[error("Sale {0} is already voided")]
    AlreadyVoided(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request doesn't meet requirements; they are caught
/// before any business logic or database work runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. malformed UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
