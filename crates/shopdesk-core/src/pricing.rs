//! # Pricing Calculator
//!
//! Turns priced sale lines plus request adjustments into invoice totals.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  lines ──► Σ unit_price × qty ──► subtotal                              │
//! │        └─► Σ mrp × qty        ──► mrp_total                             │
//! │                                                                         │
//! │  discount + extra_discount    ──► total_discount                        │
//! │                                                                         │
//! │  max(0, subtotal − total_discount) ──► final_amount (taxable)           │
//! │                                                                         │
//! │  final_amount × gst, × cgst   ──► gst_amount, cgst_amount               │
//! │                                                                         │
//! │  final_amount + total_tax     ──► total_amount (payable)                │
//! │                                                                         │
//! │  max(0, mrp_total − total_amount) ──► savings                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line totals are always recomputed here; whatever `total_price` a line
//! carries is ignored.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{SaleItem, TaxRate};

/// Amounts a line contributes to pricing.
pub trait PricedLine {
    fn unit_price(&self) -> Money;
    fn mrp(&self) -> Money;
    fn quantity(&self) -> i64;
}

impl PricedLine for SaleItem {
    fn unit_price(&self) -> Money {
        self.unit_price
    }

    fn mrp(&self) -> Money {
        self.mrp
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// A bare priced line, for callers without a `SaleItem` at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePrice {
    pub unit_price: Money,
    pub mrp: Money,
    pub quantity: i64,
}

impl PricedLine for LinePrice {
    fn unit_price(&self) -> Money {
        self.unit_price
    }

    fn mrp(&self) -> Money {
        self.mrp
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// Sale-level discounts and tax rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceAdjustments {
    pub discount: Money,
    pub extra_discount: Money,
    pub gst: TaxRate,
    pub cgst: TaxRate,
}

/// Invoice totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    /// Per-line unit_price × quantity, in input order.
    pub line_totals: Vec<Money>,
    pub subtotal: Money,
    pub mrp_total: Money,
    pub total_discount: Money,
    /// max(0, subtotal − total_discount), before tax.
    pub final_amount: Money,
    pub gst_amount: Money,
    pub cgst_amount: Money,
    pub total_tax: Money,
    /// final_amount + total_tax.
    pub total_amount: Money,
    pub savings: Money,
}

/// Computes the totals of a sale.
///
/// ## Example
/// ```rust
/// use shopdesk_core::money::Money;
/// use shopdesk_core::pricing::{calculate_pricing, LinePrice, PriceAdjustments};
///
/// let lines = [LinePrice {
///     unit_price: Money::from_minor(10000),
///     mrp: Money::from_minor(12000),
///     quantity: 3,
/// }];
/// let adjustments = PriceAdjustments {
///     discount: Money::from_minor(1000),
///     ..Default::default()
/// };
///
/// let result = calculate_pricing(&lines, &adjustments);
/// assert_eq!(result.subtotal.minor(), 30000);
/// assert_eq!(result.final_amount.minor(), 29000);
/// assert_eq!(result.savings.minor(), 7000);
/// ```
pub fn calculate_pricing<L: PricedLine>(lines: &[L], adjustments: &PriceAdjustments) -> PricingResult {
    let line_totals: Vec<Money> = lines
        .iter()
        .map(|l| l.unit_price().multiply_quantity(l.quantity()))
        .collect();

    let subtotal: Money = line_totals.iter().copied().sum();
    let mrp_total: Money = lines
        .iter()
        .map(|l| l.mrp().multiply_quantity(l.quantity()))
        .sum();

    let total_discount = adjustments.discount + adjustments.extra_discount;
    let final_amount = (subtotal - total_discount).floor_zero();

    let gst_amount = final_amount.calculate_tax(adjustments.gst);
    let cgst_amount = final_amount.calculate_tax(adjustments.cgst);
    let total_tax = gst_amount + cgst_amount;
    let total_amount = final_amount + total_tax;

    let savings = (mrp_total - total_amount).floor_zero();

    PricingResult {
        line_totals,
        subtotal,
        mrp_total,
        total_discount,
        final_amount,
        gst_amount,
        cgst_amount,
        total_tax,
        total_amount,
        savings,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
