//! # Money Module
//!
//! Provides the `Money` type for monetary values in minor currency units.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order total 10.00, discount 10%                                        │
//! │                                                                         │
//! │  Float:   10.0 * 0.1        = 1.0000000000000002                        │
//! │  Integer: 1000 * 10 / 100 = 100 minor units, exactly                   │
//! │                                                                         │
//! │  Percentages are whole points (10 = 10%), so the whole discount        │
//! │  pipeline stays in i64.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tavola_core::money::Money;
//!
//! let total = Money::from_cents(1000);
//! let off = total.percentage(10);        // 10%
//! assert_eq!((total - off).cents(), 900);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use ts_rs::TS;

use crate::MAX_PERCENTAGE;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Signed so that intermediate arithmetic can dip below zero; the discount
/// calculator clamps results back to `[0, base]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use tavola_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Clamps negative values to zero.
    #[inline]
    pub const fn non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Computes `percent` percent of this amount, rounding half up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * percent + 50) / 100`. The +50 is the
    /// half-unit that turns truncation into round-half-up. i128 keeps large
    /// totals from overflowing.
    ///
    /// ```rust
    /// use tavola_core::money::Money;
    ///
    /// // 15% of 0.15 = 0.0225 → 2 minor units
    /// assert_eq!(Money::from_cents(15).percentage(15).cents(), 2);
    /// // 50% of 0.05 = 0.025 → 3
    /// assert_eq!(Money::from_cents(5).percentage(50).cents(), 3);
    /// ```
    pub fn percentage(&self, percent: i64) -> Money {
        let scale = MAX_PERCENTAGE as i128;
        let scaled = (self.0 as i128 * percent as i128 + scale / 2) / scale;
        Money::from_cents(scaled as i64)
    }

    /// Line total for `qty` units at this price.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as `major.minor` without a currency symbol; the network spans
/// currencies and the front-end localizes.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.multiply_quantity(3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percentage_exact() {
        assert_eq!(Money::from_cents(1000).percentage(10).cents(), 100);
        assert_eq!(Money::from_cents(1000).percentage(100).cents(), 1000);
        assert_eq!(Money::from_cents(1000).percentage(0).cents(), 0);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 15% of 0.17 = 0.0255 → 0.03
        assert_eq!(Money::from_cents(17).percentage(15).cents(), 3);
        // 5% of 0.10 = 0.005 → 0.01
        assert_eq!(Money::from_cents(10).percentage(5).cents(), 1);
        // 4% of 0.10 = 0.004 → 0.00
        assert_eq!(Money::from_cents(10).percentage(4).cents(), 0);
    }

    #[test]
    fn test_percentage_large_amount_does_not_overflow() {
        let big = Money::from_cents(i64::MAX / 2);
        assert_eq!(big.percentage(100), big);
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::from_cents(-5).non_negative(), Money::zero());
        assert_eq!(Money::from_cents(5).non_negative().cents(), 5);
    }
}
