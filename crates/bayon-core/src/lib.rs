//! # bayon-core: Pure Business Logic for Bayon POS
//!
//! This crate is the **heart** of the sale transaction engine. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bayon POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    HTTP API (apps/server)                       │    │
//! │  │    checkout ──► void ──► sale lookup ──► daily rate             │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ bayon-core (THIS CRATE) ★                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   money   │  │  payment  │  │ checkout  │  │ validation│    │    │
//! │  │   │ Usd, Riel │  │  settle   │  │ plan_line │  │   rules   │    │    │
//! │  │   │ KhrPerUsd │  │ Settlement│  │ invoices  │  │  checks   │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    bayon-db (Database Layer)                    │    │
//! │  │        SQLite ledger transactions, repositories, migrations     │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, SaleItem, SerialItem, Warranty, ...)
//! - [`money`] - Dual-currency integer money (USD cents, KHR riel, rates)
//! - [`payment`] - The settlement calculator and change-denomination policy
//! - [`checkout`] - Request types, line allocation planning, invoice numbers
//! - [`error`] - Domain error types
//! - [`validation`] - Request validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input =
//!    same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: USD in cents, KHR in whole riel, rates in whole
//!    riel per dollar - no floats in money paths
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use bayon_core::money::{KhrPerUsd, Riel, Usd};
//! use bayon_core::payment::settle;
//!
//! // $10.00 total, customer hands over $15.00
//! let s = settle(
//!     Usd::from_cents(10_00),
//!     Usd::from_cents(15_00),
//!     Riel::zero(),
//!     KhrPerUsd::new(4100),
//! );
//!
//! // Overpay under $20 comes back entirely in riel
//! assert_eq!(s.change_message(), "Change: ៛20,500");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod payment;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bayon_core::Usd` instead of
// `use bayon_core::money::Usd`

pub use checkout::{AllocatedLine, CheckoutRequest, LineRequest};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{KhrPerUsd, Riel, Usd};
pub use payment::{settle, Settlement};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default warranty duration for serialized sales, in months.
///
/// Applied when a checkout request does not specify `warranty_months`.
pub const DEFAULT_WARRANTY_MONTHS: i64 = 12;

/// Maximum warranty duration a request may ask for, in months.
pub const MAX_WARRANTY_MONTHS: i64 = 120;

/// Maximum lines allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single bulk line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
