//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In JavaScript/floating point:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Rupiah                                       │
//! │    Rupiah has no minor unit in practice, so every amount is an      │
//! │    i64 count of whole rupiah. Tax and service charge use integer    │
//! │    basis-point math with one explicit rounding rule.                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use warung_core::money::Money;
//!
//! // Create from rupiah (the only constructor)
//! let price = Money::from_rupiah(15_000);
//!
//! // Arithmetic operations
//! let doubled = price * 2;
//! let total = price + Money::from_rupiah(5_000);
//! assert_eq!(total.rupiah(), 20_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in whole rupiah.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for balances and corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// Every monetary value in the system flows through this type:
/// product prices, line totals, tax, service charge, cash tendered,
/// change, and report balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole rupiah.
    ///
    /// ## Example
    /// ```rust
    /// use warung_core::money::Money;
    ///
    /// let price = Money::from_rupiah(47_500);
    /// assert_eq!(price.rupiah(), 47_500);
    /// ```
    #[inline]
    pub const fn from_rupiah(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the value in rupiah.
    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
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

    /// Calculates a basis-point charge (tax or service) on this amount.
    ///
    /// ## Rounding Rule
    /// Integer math: `(amount * bps + 5000) / 10000` - round half up.
    /// One rule, applied everywhere, so totals reproduce exactly.
    ///
    /// ## Example
    /// ```rust
    /// use warung_core::money::Money;
    /// use warung_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_rupiah(100_000);
    /// let rate = TaxRate::from_bps(1100); // 11% PPN
    ///
    /// // 100,000 × 11% = 11,000 exactly
    /// assert_eq!(subtotal.calculate_charge(rate).rupiah(), 11_000);
    /// ```
    pub fn calculate_charge(&self, rate: TaxRate) -> Money {
        // i128 intermediate to prevent overflow on large amounts
        let charge = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_rupiah(charge as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use warung_core::money::Money;
    ///
    /// let unit_price = Money::from_rupiah(12_000);
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.rupiah(), 36_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns this amount minus `other`, floored at zero.
    ///
    /// Used for change: `tendered.saturating_sub_floor_zero(grand_total)`.
    #[inline]
    pub const fn saturating_sub_floor_zero(&self, other: Money) -> Money {
        let diff = self.0 - other.0;
        if diff > 0 {
            Money(diff)
        } else {
            Money(0)
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Use frontend formatting for actual UI
/// display to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp{}", sign, group_thousands(self.0.unsigned_abs()))
    }
}

/// Formats an amount with dot thousand separators (Indonesian convention).
fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        let group = n % 1000;
        n /= 1000;
        if n == 0 {
            groups.push(group.to_string());
            break;
        }
        groups.push(format!("{:03}", group));
    }
    groups.reverse();
    groups.join(".")
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
