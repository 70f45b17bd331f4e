//! # Payment Settlement
//!
//! The dual-currency payment calculator. Pure arithmetic: currency
//! conversion, payment sufficiency, and the change-denomination policy.
//!
//! ## The Change-Denomination Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Customer overpays by `difference`                                      │
//! │                                                                         │
//! │  difference < $20.00          difference >= $20.00                      │
//! │  ──────────────────           ─────────────────────                     │
//! │  All change in riel           Whole dollars in USD notes,               │
//! │                               sub-dollar remainder in riel              │
//! │                                                                         │
//! │  overpay $5.00 @ 4100         overpay $25.00 @ 4100                     │
//! │    → ៛20,500                    → $25 + ៛0                              │
//! │                               overpay $20.50 @ 4100                     │
//! │                                 → $20 + ៛2,050                          │
//! │                                                                         │
//! │  Small change is paid in riel because small USD coinage does not        │
//! │  circulate at the till.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `settle` is the single source of truth for every checkout path
//! (single-register and café variants alike): deterministic, no I/O, same
//! inputs always produce the same result.

use serde::{Deserialize, Serialize};

use crate::money::{KhrPerUsd, Riel, Usd};

/// One-cent tolerance on payment sufficiency.
///
/// A sale short by exactly one cent is accepted with no remaining balance;
/// an overpayment of exactly one cent yields no change. This is the integer
/// translation of the 0.01 epsilon the registers have always used.
pub const PAYMENT_EPSILON_CENTS: i64 = 1;

/// Overpayments below this are returned entirely in riel.
pub const CHANGE_ALL_KHR_BELOW: Usd = Usd::from_cents(20_00);

// =============================================================================
// Settlement
// =============================================================================

/// Result of settling a payment against a total.
///
/// Carries everything a receipt or register display needs: what was paid,
/// what (if anything) remains due, what change to hand back and in which
/// denominations, and the rate every conversion used.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Settlement {
    /// Exchange rate used for every conversion in this settlement.
    pub rate: KhrPerUsd,
    /// USD tendered.
    pub paid_usd: Usd,
    /// KHR tendered.
    pub paid_khr: Riel,
    /// The KHR tender expressed in USD cents.
    pub paid_khr_in_usd: Usd,
    /// Total tendered, USD-equivalent.
    pub total_paid_usd: Usd,
    /// `total_paid_usd - total` (negative when short).
    pub difference: Usd,
    /// Whether the tender covers the total (within the one-cent epsilon).
    pub is_paid: bool,
    /// Whether the tender matches the total exactly.
    pub is_exact: bool,
    /// Balance still due in USD (zero unless underpaid).
    pub remaining_usd: Usd,
    /// Balance still due in KHR (zero unless underpaid).
    pub remaining_khr: Riel,
    /// Change due in USD notes (zero unless overpaid by >= $20).
    pub change_usd: Usd,
    /// Change due in KHR notes.
    pub change_khr: Riel,
}

impl Settlement {
    /// Human-readable change line for the register display / receipt.
    ///
    /// ## Examples
    /// - `"Exact amount"`
    /// - `"Change: ៛20,500"`
    /// - `"Change: $25.00"`
    /// - `"Change: $20.00 + ៛2,050"`
    /// - `"Due: $5.00 (៛20,500)"` when underpaid
    pub fn change_message(&self) -> String {
        if !self.is_paid {
            return format!("Due: {} ({})", self.remaining_usd, self.remaining_khr);
        }
        if self.change_usd.is_zero() && self.change_khr.is_zero() {
            return "Exact amount".to_string();
        }
        match (self.change_usd.is_zero(), self.change_khr.is_zero()) {
            (false, false) => format!("Change: {} + {}", self.change_usd, self.change_khr),
            (false, true) => format!("Change: {}", self.change_usd),
            _ => format!("Change: {}", self.change_khr),
        }
    }
}

// =============================================================================
// settle()
// =============================================================================

/// Settles a dual-currency tender against a USD total.
///
/// ## How It Works
/// 1. Convert the KHR tender to USD cents at `rate`
/// 2. `difference = paid_usd + paid_khr_in_usd - total`
/// 3. Within one cent either way → paid, nothing back
/// 4. Short by more than a cent → not paid; remaining reported in both
///    currencies
/// 5. Over by more than a cent → change per the denomination policy
///    (all-riel under $20, whole USD notes + riel remainder otherwise)
///
/// ## Example
/// ```rust
/// use bayon_core::money::{KhrPerUsd, Riel, Usd};
/// use bayon_core::payment::settle;
///
/// let rate = KhrPerUsd::new(4100);
/// let s = settle(Usd::from_cents(10_00), Usd::from_cents(15_00), Riel::zero(), rate);
///
/// assert!(s.is_paid);
/// assert_eq!(s.change_khr, Riel::new(20_500)); // $5.00 overpay, all in riel
/// assert_eq!(s.change_message(), "Change: ៛20,500");
/// ```
pub fn settle(total: Usd, paid_usd: Usd, paid_khr: Riel, rate: KhrPerUsd) -> Settlement {
    let paid_khr_in_usd = rate.riel_to_usd(paid_khr);
    let total_paid_usd = paid_usd + paid_khr_in_usd;
    let difference = total_paid_usd - total;

    let is_paid = difference.cents() >= -PAYMENT_EPSILON_CENTS;
    let is_exact = difference.is_zero();

    let mut remaining_usd = Usd::zero();
    let mut remaining_khr = Riel::zero();
    let mut change_usd = Usd::zero();
    let mut change_khr = Riel::zero();

    if difference.cents() < -PAYMENT_EPSILON_CENTS {
        // Underpaid: report what is still due, in both currencies.
        remaining_usd = difference.abs();
        remaining_khr = rate.usd_to_riel(remaining_usd);
    } else if difference.cents() > PAYMENT_EPSILON_CENTS {
        if difference < CHANGE_ALL_KHR_BELOW {
            // Small change is all riel.
            change_khr = rate.usd_to_riel(difference);
        } else {
            // Whole dollars back in USD notes, remainder in riel.
            change_usd = difference.floor_dollars();
            let remainder = difference - change_usd;
            change_khr = rate.usd_to_riel(remainder);
        }
    }

    Settlement {
        rate,
        paid_usd,
        paid_khr,
        paid_khr_in_usd,
        total_paid_usd,
        difference,
        is_paid,
        is_exact,
        remaining_usd,
        remaining_khr,
        change_usd,
        change_khr,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: KhrPerUsd = KhrPerUsd::new(4100);

    fn usd(cents: i64) -> Usd {
        Usd::from_cents(cents)
    }

    #[test]
    fn test_exact_payment() {
        // total=10.00, paidUsd=10.00, paidKhr=0
        let s = settle(usd(10_00), usd(10_00), Riel::zero(), RATE);

        assert!(s.is_paid);
        assert!(s.is_exact);
        assert_eq!(s.change_usd, Usd::zero());
        assert_eq!(s.change_khr, Riel::zero());
        assert_eq!(s.remaining_usd, Usd::zero());
        assert_eq!(s.change_message(), "Exact amount");
    }

    #[test]
    fn test_small_overpay_all_change_in_khr() {
        // total=10.00, paidUsd=15.00 → overpay 5.00 (< 20) → all riel
        let s = settle(usd(10_00), usd(15_00), Riel::zero(), RATE);

        assert!(s.is_paid);
        assert!(!s.is_exact);
        assert_eq!(s.change_usd, Usd::zero());
        assert_eq!(s.change_khr, Riel::new(20_500));
        assert_eq!(s.change_message(), "Change: ៛20,500");
    }

    #[test]
    fn test_large_overpay_whole_dollars_back() {
        // total=10.00, paidUsd=35.00 → overpay 25.00 (>= 20) → $25, no riel
        let s = settle(usd(10_00), usd(35_00), Riel::zero(), RATE);

        assert!(s.is_paid);
        assert_eq!(s.change_usd, usd(25_00));
        assert_eq!(s.change_khr, Riel::zero());
        assert_eq!(s.change_message(), "Change: $25.00");
    }

    #[test]
    fn test_large_overpay_with_sub_dollar_remainder() {
        // overpay 20.50 → $20 in notes + 0.50 in riel
        let s = settle(usd(10_00), usd(30_50), Riel::zero(), RATE);

        assert!(s.is_paid);
        assert_eq!(s.change_usd, usd(20_00));
        assert_eq!(s.change_khr, Riel::new(2_050));
        assert_eq!(s.change_message(), "Change: $20.00 + ៛2,050");
    }

    #[test]
    fn test_underpaid_reports_both_currencies() {
        // total=10.00, paidUsd=5.00 → remaining 5.00 / ៛20,500
        let s = settle(usd(10_00), usd(5_00), Riel::zero(), RATE);

        assert!(!s.is_paid);
        assert!(!s.is_exact);
        assert_eq!(s.remaining_usd, usd(5_00));
        assert_eq!(s.remaining_khr, Riel::new(20_500));
        assert_eq!(s.change_usd, Usd::zero());
        assert_eq!(s.change_khr, Riel::zero());
        assert_eq!(s.change_message(), "Due: $5.00 (៛20,500)");
    }

    #[test]
    fn test_khr_only_tender() {
        // total=10.00 paid entirely in riel: ៛41,000 = $10.00 exact
        let s = settle(usd(10_00), Usd::zero(), Riel::new(41_000), RATE);

        assert!(s.is_paid);
        assert!(s.is_exact);
        assert_eq!(s.paid_khr_in_usd, usd(10_00));
    }

    #[test]
    fn test_mixed_tender() {
        // total=25.00, $20 cash + ៛24,600 (= $6.00) → overpay $1.00 → riel
        let s = settle(usd(25_00), usd(20_00), Riel::new(24_600), RATE);

        assert!(s.is_paid);
        assert_eq!(s.total_paid_usd, usd(26_00));
        assert_eq!(s.change_usd, Usd::zero());
        assert_eq!(s.change_khr, Riel::new(4_100));
    }

    #[test]
    fn test_epsilon_one_cent_short_counts_as_paid() {
        let s = settle(usd(10_00), usd(9_99), Riel::zero(), RATE);

        assert!(s.is_paid);
        assert!(!s.is_exact);
        // within tolerance: nothing due, nothing back
        assert_eq!(s.remaining_usd, Usd::zero());
        assert_eq!(s.change_khr, Riel::zero());
    }

    #[test]
    fn test_epsilon_one_cent_over_yields_no_change() {
        let s = settle(usd(10_00), usd(10_01), Riel::zero(), RATE);

        assert!(s.is_paid);
        assert!(!s.is_exact);
        assert_eq!(s.change_usd, Usd::zero());
        assert_eq!(s.change_khr, Riel::zero());
        assert_eq!(s.change_message(), "Exact amount");
    }

    #[test]
    fn test_two_cents_short_is_not_paid() {
        let s = settle(usd(10_00), usd(9_98), Riel::zero(), RATE);

        assert!(!s.is_paid);
        assert_eq!(s.remaining_usd, usd(2));
        assert_eq!(s.remaining_khr, Riel::new(82));
    }

    #[test]
    fn test_boundary_exactly_twenty_dollars_change() {
        // overpay exactly $20.00 → policy flips to whole-dollar notes
        let s = settle(usd(10_00), usd(30_00), Riel::zero(), RATE);

        assert_eq!(s.change_usd, usd(20_00));
        assert_eq!(s.change_khr, Riel::zero());
    }

    #[test]
    fn test_just_under_twenty_dollars_change_stays_khr() {
        // overpay $19.99 → still all riel
        let s = settle(usd(10_00), usd(29_99), Riel::zero(), RATE);

        assert_eq!(s.change_usd, Usd::zero());
        assert_eq!(s.change_khr, Riel::new(81_959));
    }

    #[test]
    fn test_deterministic_for_identical_inputs() {
        let a = settle(usd(12_34), usd(10_00), Riel::new(15_000), RATE);
        let b = settle(usd(12_34), usd(10_00), Riel::new(15_000), RATE);

        assert_eq!(a.total_paid_usd, b.total_paid_usd);
        assert_eq!(a.difference, b.difference);
        assert_eq!(a.change_usd, b.change_usd);
        assert_eq!(a.change_khr, b.change_khr);
    }
}
