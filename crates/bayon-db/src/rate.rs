//! # Exchange Rate Provider
//!
//! Resolves the KHR/USD rate in effect for a given calendar date.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleLedger::checkout(rates: &impl RateProvider, ...)                   │
//! │                         │                                               │
//! │            ┌────────────┴────────────┐                                  │
//! │            ▼                         ▼                                  │
//! │     ExchangeRates               FixedRate                               │
//! │     (database-backed,           (deterministic,                         │
//! │      daily rows, fallback)       tests/tools)                           │
//! │                                                                         │
//! │  The provider is injected into the ledger call rather than read from    │
//! │  a global, so tests settle at a known rate.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rate resolution NEVER raises: a missing row (or a failed read) is not an
//! error, only a degraded-precision fallback to the configured default.

use std::future::Future;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;
use bayon_core::{ExchangeRate, KhrPerUsd};

/// Fallback rate when no row exists for the requested date.
///
/// Deployments set their own default via `ExchangeRates::with_default`;
/// this constant only anchors fresh installs.
pub const DEFAULT_KHR_PER_USD: KhrPerUsd = KhrPerUsd::new(4100);

/// Source of the daily exchange rate, injected into ledger calls.
pub trait RateProvider: Send + Sync {
    /// Returns the rate in effect for `date`. Infallible by contract.
    fn rate_for(&self, date: NaiveDate) -> impl Future<Output = KhrPerUsd> + Send;
}

// =============================================================================
// Database-backed provider
// =============================================================================

/// Daily exchange-rate store; the production `RateProvider`.
#[derive(Debug, Clone)]
pub struct ExchangeRates {
    pool: SqlitePool,
    default_rate: KhrPerUsd,
}

impl ExchangeRates {
    /// Creates a store with the stock default rate.
    pub fn new(pool: SqlitePool) -> Self {
        ExchangeRates {
            pool,
            default_rate: DEFAULT_KHR_PER_USD,
        }
    }

    /// Overrides the fallback rate (from server configuration).
    pub fn with_default(mut self, default_rate: KhrPerUsd) -> Self {
        self.default_rate = default_rate;
        self
    }

    /// Gets the stored rate row for a date, if any.
    pub async fn get(&self, date: NaiveDate) -> DbResult<Option<ExchangeRate>> {
        let rate = sqlx::query_as::<_, ExchangeRate>(
            "SELECT rate_date, khr_per_usd, set_by, created_at, updated_at \
             FROM exchange_rates WHERE rate_date = ?1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rate)
    }

    /// Sets (or replaces) the rate for a date, recording who set it.
    pub async fn upsert(&self, date: NaiveDate, rate: KhrPerUsd, set_by: &str) -> DbResult<()> {
        debug!(%date, %rate, set_by, "Setting exchange rate");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO exchange_rates (rate_date, khr_per_usd, set_by, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT (rate_date) DO UPDATE SET
                khr_per_usd = excluded.khr_per_usd,
                set_by = excluded.set_by,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(date)
        .bind(rate)
        .bind(set_by)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl RateProvider for ExchangeRates {
    async fn rate_for(&self, date: NaiveDate) -> KhrPerUsd {
        match self.get(date).await {
            Ok(Some(row)) if row.khr_per_usd.is_valid() => row.khr_per_usd,
            Ok(Some(row)) => {
                warn!(%date, rate = %row.khr_per_usd, "Stored rate is unusable, using default");
                self.default_rate
            }
            Ok(None) => {
                debug!(%date, fallback = %self.default_rate, "No rate row for date, using default");
                self.default_rate
            }
            Err(err) => {
                warn!(%date, %err, "Rate lookup failed, using default");
                self.default_rate
            }
        }
    }
}

// =============================================================================
// Fixed provider (tests, offline tools)
// =============================================================================

/// A provider that always answers with one rate.
#[derive(Debug, Clone, Copy)]
pub struct FixedRate(pub KhrPerUsd);

impl RateProvider for FixedRate {
    async fn rate_for(&self, _date: NaiveDate) -> KhrPerUsd {
        self.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_missing_row_falls_back_to_default() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let rates = ExchangeRates::new(db.pool().clone());

        let today = Utc::now().date_naive();
        assert_eq!(rates.rate_for(today).await, DEFAULT_KHR_PER_USD);
    }

    #[tokio::test]
    async fn test_stored_rate_wins_over_default() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let rates = ExchangeRates::new(db.pool().clone());

        let today = Utc::now().date_naive();
        rates
            .upsert(today, KhrPerUsd::new(4050), "manager-1")
            .await
            .unwrap();

        assert_eq!(rates.rate_for(today).await, KhrPerUsd::new(4050));

        let row = rates.get(today).await.unwrap().unwrap();
        assert_eq!(row.set_by, "manager-1");
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_day_rate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let rates = ExchangeRates::new(db.pool().clone());

        let today = Utc::now().date_naive();
        rates
            .upsert(today, KhrPerUsd::new(4100), "manager-1")
            .await
            .unwrap();
        rates
            .upsert(today, KhrPerUsd::new(4150), "manager-2")
            .await
            .unwrap();

        let row = rates.get(today).await.unwrap().unwrap();
        assert_eq!(row.khr_per_usd, KhrPerUsd::new(4150));
        assert_eq!(row.set_by, "manager-2");
    }

    #[tokio::test]
    async fn test_configured_default_applies() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let rates = ExchangeRates::new(db.pool().clone()).with_default(KhrPerUsd::new(4000));

        let today = Utc::now().date_naive();
        assert_eq!(rates.rate_for(today).await, KhrPerUsd::new(4000));
    }

    #[tokio::test]
    async fn test_fixed_rate_provider() {
        let provider = FixedRate(KhrPerUsd::new(4100));
        let today = Utc::now().date_naive();
        assert_eq!(provider.rate_for(today).await, KhrPerUsd::new(4100));
    }
}
