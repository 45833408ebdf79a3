//! # Money
//!
//! Amounts are whole paise held in an `i64`. Nothing in the sale path
//! touches floating point; the only `f64` inputs are tax percentages,
//! which become basis points before any arithmetic.
//!
//! ```text
//!   sell 100.00 × 3  ──►  10000 × 3 = 30000 paise
//!   tax at 9%        ──►  (30000 × 900 + 5000) / 10000 = 2700 paise
//!   on the wire      ──►  {"subtotal": 30000, "gstAmount": 2700}
//! ```
//!
//! ```rust
//! use shopdesk_core::money::Money;
//!
//! let rice = Money::from_minor(10000);
//! let line = rice * 3 - Money::from_minor(1000);
//! assert_eq!(line.minor(), 29000);
//! assert_eq!(line.to_string(), "Rs 290.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Paise. Serializes as a bare integer.
///
/// Arithmetic saturates at the `i64` bounds instead of wrapping or
/// panicking; request validation keeps real amounts far below them.
///
/// ```text
///   InventoryItem.sell_price ─► SaleItem.unit_price ─► SaleItem.total
///   Σ totals ─► subtotal ─► minus discounts ─► plus GST/CGST ─► total_amount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Whole rupees, truncated toward zero.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Paise past the last whole rupee, 0..=99 regardless of sign.
    #[inline]
    pub const fn paise(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Negative amounts become zero.
    ///
    /// ```rust
    /// use shopdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(-40).floor_zero(), Money::zero());
    /// assert_eq!(Money::from_minor(40).floor_zero().minor(), 40);
    /// ```
    #[inline]
    pub const fn floor_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Tax at `rate`, rounded half up to the paisa.
    ///
    /// ```rust
    /// use shopdesk_core::money::Money;
    /// use shopdesk_core::types::TaxRate;
    ///
    /// // 999 × 2.5% = 24.975
    /// assert_eq!(Money::from_minor(999).calculate_tax(TaxRate::from_bps(250)).minor(), 25);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // widened so bulk invoices cannot overflow
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_minor(tax as i64)
    }

    /// Line total for `qty` units at this price.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

/// Human-readable rupee format, used on rendered invoices and in logs.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rs {}.{:02}", sign, self.rupees().abs(), self.paise())
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}
