//! # Void / Reversal Workflow
//!
//! Atomically undoes a previously committed sale's inventory and warranty
//! effects.
//!
//! ## Reversal Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  void_sale() - ONE transaction                          │
//! │                                                                         │
//! │  1. BEGIN                                                               │
//! │  2. Load sale ── missing? → SaleNotFound                                │
//! │  3. Already voided? → AlreadyVoided (void is NOT idempotent)            │
//! │  4. Flip sale completed → voided (status-guarded CAS) - the loser of    │
//! │     two concurrent voids fails here with AlreadyVoided                  │
//! │  5. Per item:                                                           │
//! │       serialized → unit back to in_stock, clear sale_id/sold_at,        │
//! │                    warranty → voided                                    │
//! │       bulk       → quantity += n                                        │
//! │  6. Append audit line to notes (never overwrite)                        │
//! │  7. COMMIT ── any failure unwinds the entire reversal                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The status CAS runs before any inventory write, so a double reversal is
//! impossible: exactly one of two racing voids restores stock.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::{DbError, LedgerResult};
use crate::ledger::SaleLedger;
use crate::repository::sale::{SALE_COLUMNS, SALE_ITEM_COLUMNS};
use bayon_core::validation::validate_void_actor;
use bayon_core::{CoreError, Sale, SaleItem, SaleStatus};

impl SaleLedger {
    /// Voids a committed sale, reversing its inventory and warranty
    /// effects. Returns the sale as it stands after the reversal.
    ///
    /// Deliberately NOT idempotent: a second void of the same sale fails
    /// with `AlreadyVoided` and changes nothing.
    pub async fn void_sale(
        &self,
        sale_id: &str,
        actor: &str,
        reason: Option<&str>,
    ) -> LedgerResult<Sale> {
        validate_void_actor(actor)?;

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let mut sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if sale.status == SaleStatus::Voided {
            return Err(CoreError::AlreadyVoided(sale_id.to_string()).into());
        }

        // Audit line is appended, never overwriting prior notes.
        let mut audit = format!("Voided by {} at {}", actor, now.to_rfc3339());
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            audit.push_str(&format!(": {reason}"));
        }
        let notes = match &sale.notes {
            Some(existing) => format!("{existing}\n{audit}"),
            None => audit,
        };

        // Status CAS first: between the read above and this write another
        // void may have committed. Zero rows = we lost that race.
        let flipped = sqlx::query(
            r#"
            UPDATE sales
            SET status = 'voided', notes = ?1, voided_at = ?2, updated_at = ?2
            WHERE id = ?3 AND status != 'voided'
            "#,
        )
        .bind(&notes)
        .bind(now)
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            return Err(CoreError::AlreadyVoided(sale_id.to_string()).into());
        }

        // Reverse every line's inventory effect.
        let items = fetch_items(&mut tx, sale_id).await?;
        for item in &items {
            if let Some(serial_id) = &item.serial_item_id {
                let released = sqlx::query(
                    r#"
                    UPDATE serial_items
                    SET status = 'in_stock', sale_id = NULL, sold_at = NULL, updated_at = ?1
                    WHERE id = ?2 AND status = 'sold' AND sale_id = ?3
                    "#,
                )
                .bind(now)
                .bind(serial_id)
                .bind(sale_id)
                .execute(&mut *tx)
                .await?;

                // The unit must still be in the sold state this sale put it
                // in; anything else is state drift and aborts the reversal.
                if released.rows_affected() == 0 {
                    return Err(DbError::Internal(format!(
                        "serial unit {serial_id} is not in the sold state expected for sale {sale_id}"
                    ))
                    .into());
                }

                sqlx::query(
                    r#"
                    UPDATE warranties
                    SET status = 'voided', updated_at = ?1
                    WHERE sale_id = ?2 AND serial_item_id = ?3
                    "#,
                )
                .bind(now)
                .bind(sale_id)
                .bind(serial_id)
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query(
                    r#"
                    UPDATE products
                    SET quantity = quantity + ?1, updated_at = ?2
                    WHERE id = ?3
                    "#,
                )
                .bind(item.quantity)
                .bind(now)
                .bind(&item.product_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        info!(
            invoice_no = %sale.invoice_no,
            actor,
            lines = items.len(),
            "Sale voided"
        );

        sale.status = SaleStatus::Voided;
        sale.notes = Some(notes);
        sale.voided_at = Some(now);
        sale.updated_at = now;
        Ok(sale)
    }
}

// =============================================================================
// Transaction-scoped loads
// =============================================================================

async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> Result<Option<Sale>, DbError> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(sale)
}

async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> Result<Vec<SaleItem>, DbError> {
    let items = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
    ))
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::rate::FixedRate;
    use crate::testutil::{bulk_line, cash_request, serial_line, TestStore, RATE};
    use bayon_core::{Riel, SerialStatus, Usd, WarrantyStatus};

    /// Commits a sale with one serialized line and one bulk line.
    async fn committed_sale(store: &TestStore) -> (String, String) {
        let unit = store.phone_units[0].clone();
        let req = cash_request(
            vec![
                serial_line(&store.phone.id, &unit),
                bulk_line(&store.espresso.id, 3),
            ],
            Usd::from_cents(356_50),
            Riel::zero(),
        );
        let outcome = store.ledger().checkout(&FixedRate(RATE), req).await.unwrap();
        (outcome.sale.id, unit)
    }

    #[tokio::test]
    async fn test_void_round_trip_restores_everything() {
        let store = TestStore::new().await;
        let pre_sale_quantity = store.espresso.quantity;
        let (sale_id, unit_id) = committed_sale(&store).await;

        let voided = store
            .ledger()
            .void_sale(&sale_id, "manager-1", Some("customer changed mind"))
            .await
            .unwrap();

        assert_eq!(voided.status, SaleStatus::Voided);
        assert!(voided.voided_at.is_some());

        // Serial unit back in stock with links cleared
        let unit = store
            .db
            .serial_items()
            .get_by_id(&unit_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unit.status, SerialStatus::InStock);
        assert!(unit.sale_id.is_none());
        assert!(unit.sold_at.is_none());

        // Warranty voided
        let warranties = store.db.warranties().list_for_sale(&sale_id).await.unwrap();
        assert_eq!(warranties.len(), 1);
        assert_eq!(warranties[0].status, WarrantyStatus::Voided);

        // Bulk stock restored to its exact pre-sale value
        let espresso = store
            .db
            .products()
            .get_by_id(&store.espresso.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(espresso.quantity, pre_sale_quantity);

        // Audit line recorded
        let notes = voided.notes.unwrap();
        assert!(notes.contains("Voided by manager-1"));
        assert!(notes.contains("customer changed mind"));
    }

    #[tokio::test]
    async fn test_void_appends_to_existing_notes() {
        let store = TestStore::new().await;
        let unit = store.phone_units[0].clone();

        let mut req = cash_request(
            vec![serial_line(&store.phone.id, &unit)],
            Usd::from_cents(349_00),
            Riel::zero(),
        );
        req.notes = Some("walk-in customer".to_string());
        let outcome = store.ledger().checkout(&FixedRate(RATE), req).await.unwrap();

        let voided = store
            .ledger()
            .void_sale(&outcome.sale.id, "manager-1", None)
            .await
            .unwrap();

        let notes = voided.notes.unwrap();
        assert!(notes.starts_with("walk-in customer\n"));
        assert!(notes.contains("Voided by manager-1"));
    }

    #[tokio::test]
    async fn test_second_void_fails_and_changes_nothing() {
        let store = TestStore::new().await;
        let (sale_id, unit_id) = committed_sale(&store).await;

        store
            .ledger()
            .void_sale(&sale_id, "manager-1", None)
            .await
            .unwrap();

        let after_first = store
            .db
            .sales()
            .get_with_details(&sale_id)
            .await
            .unwrap()
            .unwrap();
        let quantity_after_first = store
            .db
            .products()
            .get_by_id(&store.espresso.id)
            .await
            .unwrap()
            .unwrap()
            .quantity;

        let err = store
            .ledger()
            .void_sale(&sale_id, "manager-2", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::AlreadyVoided(_))
        ));

        // State identical to after the first void: no double restock,
        // no extra audit line
        let after_second = store
            .db
            .sales()
            .get_with_details(&sale_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after_second.sale.notes, after_first.sale.notes);
        assert_eq!(
            store
                .db
                .products()
                .get_by_id(&store.espresso.id)
                .await
                .unwrap()
                .unwrap()
                .quantity,
            quantity_after_first
        );
        let unit = store
            .db
            .serial_items()
            .get_by_id(&unit_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unit.status, SerialStatus::InStock);
    }

    #[tokio::test]
    async fn test_concurrent_voids_resolve_to_one_success() {
        let store = TestStore::new().await;
        let (sale_id, _) = committed_sale(&store).await;
        let pre_void_quantity = store.espresso.quantity - 3;

        let ledger_a = store.ledger();
        let ledger_b = store.ledger();
        let (a, b) = tokio::join!(
            ledger_a.void_sale(&sale_id, "manager-1", None),
            ledger_b.void_sale(&sale_id, "manager-2", None)
        );

        let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "exactly one void must win");

        let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(
            loser,
            LedgerError::Domain(CoreError::AlreadyVoided(_))
        ));

        // Stock restored exactly once
        let espresso = store
            .db
            .products()
            .get_by_id(&store.espresso.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(espresso.quantity, pre_void_quantity + 3);
    }

    #[tokio::test]
    async fn test_void_missing_sale_is_not_found() {
        let store = TestStore::new().await;

        let err = store
            .ledger()
            .void_sale("no-such-sale", "manager-1", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::SaleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_void_requires_an_actor() {
        let store = TestStore::new().await;
        let (sale_id, _) = committed_sale(&store).await;

        let err = store
            .ledger()
            .void_sale(&sale_id, "   ", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::Validation(_))
        ));
    }
}
