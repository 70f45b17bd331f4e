//! # Money Module
//!
//! Dual-currency money types for the USD/KHR till.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Smallest-Unit Integers                                   │
//! │    USD → cents (i64)     $10.99  = Usd(1099)                            │
//! │    KHR → riel  (i64)     ៛20,500 = Riel(20500)                          │
//! │                                                                         │
//! │  The riel has no circulating subunit, so whole riel IS the smallest     │
//! │  unit. Rates are quoted in whole riel per dollar (e.g. 4100).           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bayon_core::money::{KhrPerUsd, Riel, Usd};
//!
//! let rate = KhrPerUsd::new(4100);
//! let five_dollars = Usd::from_cents(500);
//!
//! // $5.00 at 4100 → ៛20,500
//! assert_eq!(rate.usd_to_riel(five_dollars), Riel::new(20_500));
//!
//! // ...and back
//! assert_eq!(rate.riel_to_usd(Riel::new(20_500)), Usd::from_cents(500));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// =============================================================================
// USD (integer cents)
// =============================================================================

/// A USD amount in cents (the smallest currency unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for differences and reversals
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Transparent serde**: Serializes as a plain cent count in JSON
///
/// Every USD value in the system (prices, subtotals, tendered cash, change)
/// flows through this type; only the UI converts to dollars for display.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Usd(i64);

impl Usd {
    /// Creates a USD value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use bayon_core::money::Usd;
    ///
    /// let price = Usd::from_cents(1099); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Usd(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion (truncated toward zero).
    ///
    /// ## Example
    /// ```rust
    /// use bayon_core::money::Usd;
    ///
    /// assert_eq!(Usd::from_cents(2550).dollars(), 25);
    /// assert_eq!(Usd::from_cents(-550).dollars(), -5);
    /// ```
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cent portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero dollars.
    #[inline]
    pub const fn zero() -> Self {
        Usd(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Usd(self.0.abs())
    }

    /// Truncates to whole dollars, dropping the cent portion.
    ///
    /// The change-denomination policy hands back whole USD notes and
    /// converts the sub-dollar remainder to riel.
    ///
    /// ## Example
    /// ```rust
    /// use bayon_core::money::Usd;
    ///
    /// assert_eq!(Usd::from_cents(2550).floor_dollars(), Usd::from_cents(2500));
    /// ```
    #[inline]
    pub const fn floor_dollars(&self) -> Self {
        Usd((self.0 / 100) * 100)
    }

    /// Multiplies by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use bayon_core::money::Usd;
    ///
    /// let unit_price = Usd::from_cents(299); // $2.99
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Usd(self.0 * qty)
    }
}

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for receipts and logs. Use frontend formatting for actual UI
/// display to handle localization properly.
impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Add for Usd {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Usd(self.0 + other.0)
    }
}

impl AddAssign for Usd {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Usd {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Usd(self.0 - other.0)
    }
}

impl SubAssign for Usd {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Usd {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Usd(self.0 * qty)
    }
}

impl Neg for Usd {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Usd(-self.0)
    }
}

// =============================================================================
// KHR (integer riel)
// =============================================================================

/// A KHR amount in whole riel.
///
/// The riel has no circulating subunit, so one riel is already the
/// smallest denomination the till handles.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Riel(i64);

impl Riel {
    /// Creates a KHR value from whole riel.
    #[inline]
    pub const fn new(riel: i64) -> Self {
        Riel(riel)
    }

    /// Returns the value in whole riel.
    #[inline]
    pub const fn riel(&self) -> i64 {
        self.0
    }

    /// Zero riel.
    #[inline]
    pub const fn zero() -> Self {
        Riel(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

/// Display shows the riel sign with thousands grouping: `៛20,500`.
impl fmt::Display for Riel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}៛{}", sign, group_thousands(self.0.abs()))
    }
}

impl Add for Riel {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Riel(self.0 + other.0)
    }
}

impl AddAssign for Riel {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Riel {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Riel(self.0 - other.0)
    }
}

/// Groups a non-negative number with comma separators (20500 → "20,500").
fn group_thousands(mut n: i64) -> String {
    let mut parts: Vec<String> = Vec::new();
    loop {
        let chunk = n % 1000;
        n /= 1000;
        if n == 0 {
            parts.push(chunk.to_string());
            break;
        }
        parts.push(format!("{:03}", chunk));
    }
    parts.reverse();
    parts.join(",")
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Exchange rate in whole riel per US dollar.
///
/// ## Why Whole Riel?
/// Cambodian retail rates are quoted in whole riel (4100, 4050, ...), the
/// same way tax rates elsewhere are quoted in basis points. Keeping the
/// rate integral keeps every conversion in integer math.
///
/// ## Rounding
/// Conversions round half away from zero using the half-divisor idiom:
/// `(n * scale + divisor/2) / divisor`, computed in i128 to avoid overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct KhrPerUsd(i64);

impl KhrPerUsd {
    /// Creates a rate from whole riel per USD.
    ///
    /// The rate must be positive; a zero or negative rate would make every
    /// conversion meaningless. Callers validate before constructing.
    #[inline]
    pub const fn new(riel_per_usd: i64) -> Self {
        KhrPerUsd(riel_per_usd)
    }

    /// Returns the rate in whole riel per USD.
    #[inline]
    pub const fn riel_per_usd(&self) -> i64 {
        self.0
    }

    /// Checks the rate is usable (strictly positive).
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 > 0
    }

    /// Converts USD cents to riel, rounding to the nearest whole riel.
    ///
    /// ## Example
    /// ```rust
    /// use bayon_core::money::{KhrPerUsd, Riel, Usd};
    ///
    /// let rate = KhrPerUsd::new(4100);
    /// assert_eq!(rate.usd_to_riel(Usd::from_cents(500)), Riel::new(20_500));
    /// ```
    pub fn usd_to_riel(&self, usd: Usd) -> Riel {
        // riel = round(cents * rate / 100)
        let cents = usd.cents() as i128;
        let rate = self.0 as i128;
        let riel = round_div(cents * rate, 100);
        Riel::new(riel as i64)
    }

    /// Converts riel to USD cents, rounding to the nearest cent.
    ///
    /// ## Example
    /// ```rust
    /// use bayon_core::money::{KhrPerUsd, Riel, Usd};
    ///
    /// let rate = KhrPerUsd::new(4100);
    /// assert_eq!(rate.riel_to_usd(Riel::new(20_500)), Usd::from_cents(500));
    /// ```
    pub fn riel_to_usd(&self, khr: Riel) -> Usd {
        // cents = round(riel * 100 / rate)
        let riel = khr.riel() as i128;
        let rate = self.0 as i128;
        let cents = round_div(riel * 100, rate);
        Usd::from_cents(cents as i64)
    }
}

impl fmt::Display for KhrPerUsd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} KHR/USD", self.0)
    }
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, divisor: i128) -> i128 {
    // divisor is always positive here (rates and unit scales)
    if numerator >= 0 {
        (numerator + divisor / 2) / divisor
    } else {
        (numerator - divisor / 2) / divisor
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
