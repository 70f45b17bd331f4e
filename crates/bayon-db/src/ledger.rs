//! # Sale Ledger
//!
//! The atomic writer: turns a validated cart into a committed, internally
//! consistent financial record.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  checkout() - ONE transaction                           │
//! │                                                                         │
//! │  1. Resolve today's rate (injected RateProvider)                        │
//! │  2. BEGIN                                                               │
//! │  3. Load + plan every line (plan_line) ── any failure aborts the batch  │
//! │  4. total = subtotal - discount                                         │
//! │  5. settle() ── not paid? → PaymentInsufficient, rollback               │
//! │  6. invoice_no = INV-YYYYMMDD-(count of today's sales + 1)              │
//! │  7. INSERT sale (status = completed)                                    │
//! │  8. INSERT sale items (price/cost snapshots)                            │
//! │  9. Serialized lines: flip unit in_stock → sold (status-guarded),       │
//! │     issue warranty                                                      │
//! │ 10. Bulk lines: quantity -= n (guarded by quantity >= n)                │
//! │ 11. COMMIT                                                              │
//! │                                                                         │
//! │  Any error between 2 and 11 unwinds EVERYTHING: no partial sale, no     │
//! │  orphaned inventory mutation, no dangling warranty.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Ordering comes from transaction isolation plus status-guarded UPDATEs,
//! never application locks. Two checkouts racing for one serial unit: the
//! guard `WHERE status = 'in_stock'` lets exactly one through; the loser
//! sees zero rows affected and gets `Unavailable`. Invoice numbering is
//! backstopped by the UNIQUE index on `invoice_no`: a same-instant
//! collision rejects one transaction, which the client may resubmit -
//! numbers are never reused.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, LedgerResult};
use crate::rate::RateProvider;
use crate::repository::product::PRODUCT_COLUMNS;
use crate::repository::serial::SERIAL_COLUMNS;
use bayon_core::checkout::{invoice_number, invoice_prefix, plan_line, AllocatedLine};
use bayon_core::validation::validate_checkout;
use bayon_core::{
    settle, CheckoutRequest, CoreError, Product, Sale, SaleItem, SaleStatus, SerialItem,
    Settlement, Usd, Warranty, DEFAULT_WARRANTY_MONTHS,
};

/// The committed result of a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub warranties: Vec<Warranty>,
    /// Settlement detail for the register display ("Change: ៛20,500").
    pub settlement: Settlement,
}

/// The sale transaction engine.
///
/// The ledger is the ONLY writer of sale, sale-item, and warranty rows,
/// and the only mutator of inventory state during checkout; the void
/// workflow (`void.rs`) is the only writer that reverses those same
/// fields.
#[derive(Debug, Clone)]
pub struct SaleLedger {
    pool: SqlitePool,
}

impl SaleLedger {
    /// Creates a new SaleLedger.
    pub fn new(pool: SqlitePool) -> Self {
        SaleLedger { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Commits a checkout as one transaction. See the module docs for the
    /// exact sequence.
    pub async fn checkout<R: RateProvider>(
        &self,
        rates: &R,
        req: CheckoutRequest,
    ) -> LedgerResult<CheckoutOutcome> {
        validate_checkout(&req)?;

        let now = Utc::now();
        let today = now.date_naive();
        let rate = rates.rate_for(today).await;
        let warranty_months = req.warranty_months.unwrap_or(DEFAULT_WARRANTY_MONTHS);

        let mut tx = self.pool.begin().await?;

        // ---------------------------------------------------------------------
        // Allocate every line against current stock state
        // ---------------------------------------------------------------------
        let mut allocated: Vec<(AllocatedLine, Product)> = Vec::with_capacity(req.items.len());
        let mut subtotal = Usd::zero();

        for line in &req.items {
            let product = fetch_product(&mut tx, &line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let serial = match &line.serial_item_id {
                Some(serial_id) => fetch_serial(&mut tx, serial_id).await?,
                None => None,
            };

            let planned = plan_line(&product, serial.as_ref(), line)?;
            subtotal += planned.line_total;
            allocated.push((planned, product));
        }

        // ---------------------------------------------------------------------
        // Totals and the settlement gate
        // ---------------------------------------------------------------------
        if req.discount_usd > subtotal {
            return Err(bayon_core::ValidationError::OutOfRange {
                field: "discount_usd".to_string(),
                min: 0,
                max: subtotal.cents(),
            }
            .into());
        }
        let total = subtotal - req.discount_usd;

        let settlement = settle(total, req.paid_usd, req.paid_khr, rate);
        if !settlement.is_paid {
            return Err(CoreError::PaymentInsufficient {
                remaining_usd: settlement.remaining_usd,
                remaining_khr: settlement.remaining_khr,
            }
            .into());
        }

        // ---------------------------------------------------------------------
        // Invoice number: 1 + count of today's sales, inside THIS transaction.
        // The UNIQUE index on invoice_no backstops same-instant races.
        // ---------------------------------------------------------------------
        let prefix = invoice_prefix(today);
        let today_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE invoice_no LIKE ?1")
                .bind(format!("{prefix}%"))
                .fetch_one(&mut *tx)
                .await?;
        let invoice_no = invoice_number(today, today_count + 1);

        debug!(%invoice_no, lines = allocated.len(), total = %total, "Committing sale");

        // ---------------------------------------------------------------------
        // Persist the sale row
        // ---------------------------------------------------------------------
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            invoice_no,
            cashier_id: req.cashier_id.clone(),
            customer_id: req.customer_id.clone(),
            status: SaleStatus::Completed,
            subtotal_usd: subtotal,
            discount_usd: req.discount_usd,
            total_usd: total,
            paid_usd: req.paid_usd,
            paid_khr: req.paid_khr,
            change_usd: settlement.change_usd,
            change_khr: settlement.change_khr,
            exchange_rate: rate,
            payment_method: req.payment_method,
            khqr_reference: req.khqr_reference.clone(),
            notes: req.notes.clone(),
            created_at: now,
            updated_at: now,
            voided_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, invoice_no, cashier_id, customer_id, status,
                subtotal_usd, discount_usd, total_usd,
                paid_usd, paid_khr, change_usd, change_khr,
                exchange_rate, payment_method, khqr_reference, notes,
                created_at, updated_at, voided_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.invoice_no)
        .bind(&sale.cashier_id)
        .bind(&sale.customer_id)
        .bind(sale.status)
        .bind(sale.subtotal_usd)
        .bind(sale.discount_usd)
        .bind(sale.total_usd)
        .bind(sale.paid_usd)
        .bind(sale.paid_khr)
        .bind(sale.change_usd)
        .bind(sale.change_khr)
        .bind(sale.exchange_rate)
        .bind(sale.payment_method)
        .bind(&sale.khqr_reference)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .bind(sale.voided_at)
        .execute(&mut *tx)
        .await?;

        // ---------------------------------------------------------------------
        // Lines, serial flips, warranties, bulk decrements
        // ---------------------------------------------------------------------
        let mut items = Vec::with_capacity(allocated.len());
        let mut warranties = Vec::new();

        for (planned, product) in &allocated {
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: planned.product_id.clone(),
                serial_item_id: planned.serial_item_id.clone(),
                quantity: planned.quantity,
                unit_price: planned.unit_price,
                cost_price: planned.cost_price,
                discount: planned.discount,
                line_total: planned.line_total,
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, serial_item_id, quantity,
                    unit_price, cost_price, discount, line_total, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.serial_item_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.cost_price)
            .bind(item.discount)
            .bind(item.line_total)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;

            if let Some(serial_id) = &planned.serial_item_id {
                // Status-guarded flip: only one transaction can take the
                // unit from in_stock to sold. Zero rows = we lost the race.
                let flipped = sqlx::query(
                    r#"
                    UPDATE serial_items
                    SET status = 'sold', sale_id = ?1, sold_at = ?2, updated_at = ?2
                    WHERE id = ?3 AND status = 'in_stock'
                    "#,
                )
                .bind(&sale.id)
                .bind(now)
                .bind(serial_id)
                .execute(&mut *tx)
                .await?;

                if flipped.rows_affected() == 0 {
                    let current = fetch_serial(&mut tx, serial_id).await?;
                    let (identifier, status) = current
                        .map(|u| (u.identifier().to_string(), u.status.as_str().to_string()))
                        .unwrap_or_else(|| (serial_id.clone(), "sold".to_string()));
                    return Err(CoreError::Unavailable { identifier, status }.into());
                }

                let warranty = Warranty::issue(
                    &sale.id,
                    serial_id,
                    warranty_months,
                    today,
                    now,
                    Uuid::new_v4().to_string(),
                );
                insert_warranty(&mut tx, &warranty).await?;
                warranties.push(warranty);
            } else {
                // Guarded decrement: never oversell under concurrency.
                let decremented = sqlx::query(
                    r#"
                    UPDATE products
                    SET quantity = quantity - ?1, updated_at = ?2
                    WHERE id = ?3 AND is_serialized = 0 AND quantity >= ?1
                    "#,
                )
                .bind(planned.quantity)
                .bind(now)
                .bind(&planned.product_id)
                .execute(&mut *tx)
                .await?;

                if decremented.rows_affected() == 0 {
                    let available = fetch_product(&mut tx, &planned.product_id)
                        .await?
                        .map(|p| p.quantity)
                        .unwrap_or(0);
                    return Err(CoreError::InsufficientStock {
                        sku: product.sku.clone(),
                        available,
                        requested: planned.quantity,
                    }
                    .into());
                }
            }

            items.push(item);
        }

        tx.commit().await?;

        info!(
            invoice_no = %sale.invoice_no,
            total = %sale.total_usd,
            lines = items.len(),
            change = %settlement.change_message(),
            "Sale committed"
        );

        Ok(CheckoutOutcome {
            sale,
            items,
            warranties,
            settlement,
        })
    }
}

// =============================================================================
// Transaction-scoped loads/writes
// =============================================================================

pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Product>, DbError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

pub(crate) async fn fetch_serial(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<SerialItem>, DbError> {
    let unit = sqlx::query_as::<_, SerialItem>(&format!(
        "SELECT {SERIAL_COLUMNS} FROM serial_items WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(unit)
}

async fn insert_warranty(conn: &mut SqliteConnection, warranty: &Warranty) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO warranties (
            id, sale_id, serial_item_id, months, start_date, end_date,
            status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&warranty.id)
    .bind(&warranty.sale_id)
    .bind(&warranty.serial_item_id)
    .bind(warranty.months)
    .bind(warranty.start_date)
    .bind(warranty.end_date)
    .bind(warranty.status)
    .bind(warranty.created_at)
    .bind(warranty.updated_at)
    .execute(conn)
    .await?;

    Ok(())
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
    use bayon_core::{KhrPerUsd, Riel, SerialStatus, WarrantyStatus};

    #[tokio::test]
    async fn test_checkout_commits_bulk_and_serial_lines() {
        let store = TestStore::new().await;
        let phone_unit = store.phone_units[0].clone();

        // $349 phone + 2x $2.50 espresso = $354.00
        let req = cash_request(
            vec![
                serial_line(&store.phone.id, &phone_unit),
                bulk_line(&store.espresso.id, 2),
            ],
            Usd::from_cents(354_00),
            Riel::zero(),
        );

        let outcome = store.ledger().checkout(&FixedRate(RATE), req).await.unwrap();

        // Totals: sum of line totals == subtotal; total = subtotal - discount
        let line_sum: i64 = outcome.items.iter().map(|i| i.line_total.cents()).sum();
        assert_eq!(line_sum, outcome.sale.subtotal_usd.cents());
        assert_eq!(
            outcome.sale.total_usd,
            outcome.sale.subtotal_usd - outcome.sale.discount_usd
        );
        assert_eq!(outcome.sale.total_usd, Usd::from_cents(354_00));
        assert_eq!(outcome.sale.status, SaleStatus::Completed);
        assert!(outcome.settlement.is_exact);

        // Serial unit flipped to sold, stamped and linked
        let unit = store
            .db
            .serial_items()
            .get_by_id(&phone_unit)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unit.status, SerialStatus::Sold);
        assert_eq!(unit.sale_id.as_deref(), Some(outcome.sale.id.as_str()));
        assert!(unit.sold_at.is_some());

        // One warranty per serialized line, active, 12 months by default
        assert_eq!(outcome.warranties.len(), 1);
        let warranty = &outcome.warranties[0];
        assert_eq!(warranty.status, WarrantyStatus::Active);
        assert_eq!(warranty.months, 12);
        assert_eq!(warranty.serial_item_id, phone_unit);

        // Bulk stock decremented
        let espresso = store
            .db
            .products()
            .get_by_id(&store.espresso.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(espresso.quantity, store.espresso.quantity - 2);

        // Persisted view matches the outcome
        let details = store
            .db
            .sales()
            .get_with_details(&outcome.sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.items.len(), 2);
        assert_eq!(details.warranties.len(), 1);
    }

    #[tokio::test]
    async fn test_invoice_numbers_are_date_scoped_and_sequential() {
        let store = TestStore::new().await;

        let prefix = bayon_core::checkout::invoice_prefix(Utc::now().date_naive());

        for expected_seq in 1..=3 {
            let req = cash_request(
                vec![bulk_line(&store.espresso.id, 1)],
                Usd::from_cents(2_50),
                Riel::zero(),
            );
            let outcome = store.ledger().checkout(&FixedRate(RATE), req).await.unwrap();
            assert_eq!(
                outcome.sale.invoice_no,
                format!("{prefix}{expected_seq:04}")
            );
        }
    }

    #[tokio::test]
    async fn test_insufficient_payment_commits_nothing() {
        let store = TestStore::new().await;

        let req = cash_request(
            vec![bulk_line(&store.espresso.id, 2)],
            Usd::from_cents(2_00), // $5.00 due
            Riel::zero(),
        );

        let err = store
            .ledger()
            .checkout(&FixedRate(RATE), req)
            .await
            .unwrap_err();
        match err {
            LedgerError::Domain(CoreError::PaymentInsufficient {
                remaining_usd,
                remaining_khr,
            }) => {
                assert_eq!(remaining_usd, Usd::from_cents(3_00));
                assert_eq!(remaining_khr, Riel::new(12_300));
            }
            other => panic!("expected PaymentInsufficient, got {other:?}"),
        }

        // Full rollback: no sale, stock untouched
        assert_eq!(store.sale_count().await, 0);
        let espresso = store
            .db
            .products()
            .get_by_id(&store.espresso.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(espresso.quantity, store.espresso.quantity);
    }

    #[tokio::test]
    async fn test_any_bad_line_aborts_the_whole_batch() {
        let store = TestStore::new().await;

        // First line is fine; second asks for more than exists
        let req = cash_request(
            vec![
                bulk_line(&store.espresso.id, 1),
                bulk_line(&store.croissant.id, 1_000),
            ],
            Usd::from_cents(999_00),
            Riel::zero(),
        );

        let err = store
            .ledger()
            .checkout(&FixedRate(RATE), req)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::InsufficientStock { .. })
        ));

        // Nothing committed, including the valid first line
        assert_eq!(store.sale_count().await, 0);
        let espresso = store
            .db
            .products()
            .get_by_id(&store.espresso.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(espresso.quantity, store.espresso.quantity);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let store = TestStore::new().await;

        let req = cash_request(
            vec![bulk_line("no-such-product", 1)],
            Usd::from_cents(10_00),
            Riel::zero(),
        );

        let err = store
            .ledger()
            .checkout(&FixedRate(RATE), req)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sold_unit_is_unavailable_to_the_next_sale() {
        let store = TestStore::new().await;
        let unit = store.phone_units[0].clone();

        let first = cash_request(
            vec![serial_line(&store.phone.id, &unit)],
            Usd::from_cents(349_00),
            Riel::zero(),
        );
        store.ledger().checkout(&FixedRate(RATE), first).await.unwrap();

        let second = cash_request(
            vec![serial_line(&store.phone.id, &unit)],
            Usd::from_cents(349_00),
            Riel::zero(),
        );
        let err = store
            .ledger()
            .checkout(&FixedRate(RATE), second)
            .await
            .unwrap_err();
        match err {
            LedgerError::Domain(CoreError::Unavailable { status, .. }) => {
                assert_eq!(status, "sold");
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }

        // Loser left nothing behind
        assert_eq!(store.sale_count().await, 1);
        assert_eq!(store.warranty_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_one_unit_exactly_one_wins() {
        let store = TestStore::new().await;
        let unit = store.phone_units[0].clone();

        let ledger_a = store.ledger();
        let ledger_b = store.ledger();
        let make_req = || {
            cash_request(
                vec![serial_line(&store.phone.id, &unit)],
                Usd::from_cents(349_00),
                Riel::zero(),
            )
        };

        let (a, b) = tokio::join!(
            ledger_a.checkout(&FixedRate(RATE), make_req()),
            ledger_b.checkout(&FixedRate(RATE), make_req())
        );

        let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "exactly one checkout must win the unit");

        let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(
            loser,
            LedgerError::Domain(CoreError::Unavailable { .. })
        ));

        // One sale, one warranty - nothing for the loser
        assert_eq!(store.sale_count().await, 1);
        assert_eq!(store.warranty_count().await, 1);
    }

    #[tokio::test]
    async fn test_khr_only_tender_settles() {
        let store = TestStore::new().await;

        // 2x espresso = $5.00 = ៛20,500 at 4100
        let req = cash_request(
            vec![bulk_line(&store.espresso.id, 2)],
            Usd::zero(),
            Riel::new(20_500),
        );

        let outcome = store.ledger().checkout(&FixedRate(RATE), req).await.unwrap();
        assert!(outcome.settlement.is_exact);
        assert_eq!(outcome.sale.paid_khr, Riel::new(20_500));
        assert_eq!(outcome.sale.exchange_rate, RATE);
    }

    #[tokio::test]
    async fn test_warranty_months_override() {
        let store = TestStore::new().await;
        let unit = store.phone_units[0].clone();

        let mut req = cash_request(
            vec![serial_line(&store.phone.id, &unit)],
            Usd::from_cents(349_00),
            Riel::zero(),
        );
        req.warranty_months = Some(24);

        let outcome = store.ledger().checkout(&FixedRate(RATE), req).await.unwrap();
        let warranty = &outcome.warranties[0];
        assert_eq!(warranty.months, 24);

        let expected_end = warranty
            .start_date
            .checked_add_months(chrono::Months::new(24))
            .unwrap();
        assert_eq!(warranty.end_date, expected_end);
    }

    #[tokio::test]
    async fn test_sale_discount_reduces_total() {
        let store = TestStore::new().await;

        // 4x espresso = $10.00, minus $1.00 sale discount = $9.00
        let mut req = cash_request(
            vec![bulk_line(&store.espresso.id, 4)],
            Usd::from_cents(9_00),
            Riel::zero(),
        );
        req.discount_usd = Usd::from_cents(1_00);

        let outcome = store.ledger().checkout(&FixedRate(RATE), req).await.unwrap();
        assert_eq!(outcome.sale.subtotal_usd, Usd::from_cents(10_00));
        assert_eq!(outcome.sale.total_usd, Usd::from_cents(9_00));
        assert!(outcome.settlement.is_exact);
    }

    #[tokio::test]
    async fn test_rate_provider_is_injected_not_ambient() {
        let store = TestStore::new().await;

        // Same request settles differently under a different provider:
        // ៛20,000 covers $5.00 at 4000, but not at 4100.
        let req = || {
            cash_request(
                vec![bulk_line(&store.espresso.id, 2)],
                Usd::zero(),
                Riel::new(20_000),
            )
        };

        let at_4000 = store
            .ledger()
            .checkout(&FixedRate(KhrPerUsd::new(4000)), req())
            .await;
        assert!(at_4000.is_ok());

        let at_4100 = store
            .ledger()
            .checkout(&FixedRate(KhrPerUsd::new(4100)), req())
            .await;
        assert!(matches!(
            at_4100.unwrap_err(),
            LedgerError::Domain(CoreError::PaymentInsufficient { .. })
        ));
    }
}
