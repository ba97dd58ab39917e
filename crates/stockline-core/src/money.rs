//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A sale total computed as price * qty * 1.18 in floats drifts by a     │
//! │  fraction of a paisa on every line.                                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    subtotal = Σ unit_price_cents × qty       (exact)                   │
//! │    tax      = round_half_up(subtotal × bps)  (one rounding step)       │
//! │    total    = subtotal + tax                 (exact)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockline_core::money::Money;
//!
//! let price = Money::from_cents(10000); // 100.00
//! let line = price * 3;                 // 300.00
//! assert_eq!(line.to_string(), "300.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::types::TaxRate;

/// Represents a monetary value in the smallest currency unit.
///
/// The database, the API and every calculation use minor units; only CSV
/// export formats values as `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use stockline_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use stockline_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(100, 0).cents(), 10000);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax on this amount, rounding half up to the minor unit.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. The +5000 is the
    /// half-unit that turns truncation into rounding. `i128` keeps large
    /// subtotals from overflowing.
    ///
    /// ## Example
    /// ```rust
    /// use stockline_core::money::Money;
    /// use stockline_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(30000); // 300.00
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(1800));
    /// assert_eq!(tax.cents(), 5400); // 54.00
    ///
    /// // 0.25 × 18% = 0.045 → 0.05
    /// assert_eq!(Money::from_cents(25).calculate_tax(TaxRate::from_bps(1800)).cents(), 5);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity, returning `None` on overflow.
    ///
    /// ## User Workflow
    /// ```text
    /// Item: Notebook 100.00
    /// Quantity: 3
    ///      │
    ///      ▼
    /// checked_multiply_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Total: 300.00
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

/// Formats as `major.minor` without a currency symbol (`354.00`).
///
/// This is the form used in CSV exports; the JSON API carries raw minor
/// units.
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

/// Unchecked. Totals built from client input go through [`Money::checked_add`].
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GST_RATE;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(35400).to_string(), "354.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_gst_on_whole_amount() {
        let subtotal = Money::from_major_minor(300, 0);
        let tax = subtotal.calculate_tax(GST_RATE);
        assert_eq!(tax, Money::from_major_minor(54, 0));
        assert_eq!(subtotal + tax, Money::from_major_minor(354, 0));
    }

    #[test]
    fn test_gst_rounds_half_up() {
        // 0.01 × 18% = 0.0018 → 0.00
        assert_eq!(Money::from_cents(1).calculate_tax(GST_RATE).cents(), 0);
        // 0.03 × 18% = 0.0054 → 0.01
        assert_eq!(Money::from_cents(3).calculate_tax(GST_RATE).cents(), 1);
        // 19.99 × 18% = 3.5982 → 3.60
        assert_eq!(Money::from_cents(1999).calculate_tax(GST_RATE).cents(), 360);
    }

    #[test]
    fn test_checked_multiply_quantity() {
        let unit = Money::from_cents(299);
        assert_eq!(unit.checked_multiply_quantity(3), Some(Money::from_cents(897)));
        assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 5].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 355);
    }
}
