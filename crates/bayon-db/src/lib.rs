//! # bayon-db: Database Layer for Bayon POS
//!
//! This crate provides database access for the sale transaction engine.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bayon POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     bayon-db (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐    │    │
//! │  │   │   Database    │   │  SaleLedger    │   │ Repositories  │    │    │
//! │  │   │   (pool.rs)   │   │  checkout()    │   │ (read paths)  │    │    │
//! │  │   │               │◄──│  void_sale()   │   │               │    │    │
//! │  │   │ SqlitePool    │   │  ONE tx each   │   │ product, sale │    │    │
//! │  │   │ + migrations  │   │  sole writer   │   │ serial, ...   │    │    │
//! │  │   └───────────────┘   └────────────────┘   └───────────────┘    │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) - all ordering guarantees come from transaction           │
//! │  isolation and status-guarded UPDATEs, not application locks            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and engine error types
//! - [`repository`] - Read paths per aggregate (product, serial, sale, ...)
//! - [`rate`] - The `RateProvider` seam and the daily-rate store
//! - [`ledger`] - The atomic checkout engine
//! - [`void`] - The atomic reversal workflow
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bayon_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/pos.db")).await?;
//!
//! let outcome = db.ledger().checkout(&db.rates(), request).await?;
//! println!("{}", outcome.settlement.change_message());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod rate;
pub mod repository;
pub mod void;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, LedgerError};
pub use ledger::{CheckoutOutcome, SaleLedger};
pub use pool::{Database, DbConfig};
pub use rate::{ExchangeRates, FixedRate, RateProvider, DEFAULT_KHR_PER_USD};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleDetails, SaleRepository};
pub use repository::serial::SerialItemRepository;
pub use repository::warranty::WarrantyRepository;
