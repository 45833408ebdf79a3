//! # Records
//!
//! Rows the billing engine reads and writes, shared by the database layer
//! and the HTTP surface. All serialize camelCase and export TypeScript
//! bindings for the counter UI.
//!
//! ```text
//!   Store ─┬─ StaffMember (role, optional home store)
//!          └─ InventoryItem ──(copied at sale time)──► SaleItem ─┐
//!                                                                 ▼
//!   Customer ─────────────(name, phone, email copied)──────────► Sale
//!                                                                 │
//!                        AuditEntry, SaleNotification ◄──────────┘
//! ```
//!
//! `SaleItem` and `Sale` hold copies, not references: renaming or repricing
//! an item, or editing a customer, leaves past invoices as they were.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Rate in hundredths of a percent: 900 is 9%, one half of the 18% slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// `9.0` → 900. The request carries percentages.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Back to a percentage, for printing.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    #[default]
    Cash,
    Upi,
    /// Store credit (khata), settled later.
    Credit,
    Card,
}

impl PaymentMode {
    /// Every accepted mode, in wire form.
    pub const ALLOWED: [&'static str; 4] = ["cash", "upi", "credit", "card"];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
            PaymentMode::Credit => "credit",
            PaymentMode::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "upi" => Ok(PaymentMode::Upi),
            "credit" => Ok(PaymentMode::Credit),
            "card" => Ok(PaymentMode::Card),
            other => Err(format!("unknown payment mode '{}'", other)),
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a recorded sale.
///
/// ## Transitions
/// ```text
///  Completed ──► PartialRefund ──► FullRefund
///      │              │  ▲
///      │              └──┘ (further partial refunds)
///      ├──────────────────────────► FullRefund
///      └──────────────────────────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[default]
    Completed,
    PartialRefund,
    FullRefund,
    Cancelled,
}

impl SaleStatus {
    /// Every status, in wire form.
    pub const ALLOWED: [&'static str; 4] = ["completed", "partial_refund", "full_refund", "cancelled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::PartialRefund => "partial_refund",
            SaleStatus::FullRefund => "full_refund",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a sale in this status may move to `next`.
    pub fn can_transition_to(&self, next: SaleStatus) -> bool {
        matches!(
            (self, next),
            (SaleStatus::Completed, SaleStatus::PartialRefund)
                | (SaleStatus::Completed, SaleStatus::FullRefund)
                | (SaleStatus::Completed, SaleStatus::Cancelled)
                | (SaleStatus::PartialRefund, SaleStatus::PartialRefund)
                | (SaleStatus::PartialRefund, SaleStatus::FullRefund)
        )
    }

    /// Full refunds and cancellations close the sale for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::FullRefund | SaleStatus::Cancelled)
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "completed" => Ok(SaleStatus::Completed),
            "partial_refund" => Ok(SaleStatus::PartialRefund),
            "full_refund" => Ok(SaleStatus::FullRefund),
            "cancelled" => Ok(SaleStatus::Cancelled),
            other => Err(format!("unknown sale status '{}'", other)),
        }
    }
}

// =============================================================================
// Staff
// =============================================================================

/// Role of a staff member handling sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Manager,
    Cashier,
}

impl StaffRole {
    /// Roles allowed to bill against any store when they have no assignment.
    pub fn may_use_any_store(&self) -> bool {
        matches!(self, StaffRole::Admin | StaffRole::Manager)
    }
}

/// A staff member (the caller of billing operations).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub role: StaffRole,
    /// Store this staff member is assigned to.
    pub store_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Store
// =============================================================================

/// A shop location. Invoices print its header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// GST identification number printed on invoices.
    pub gstin: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory Item
// =============================================================================

/// A stocked item. Owned by the inventory subsystem; sales only decrement
/// `stock_qty`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub brand: Option<String>,
    pub sku: Option<String>,
    /// Selling price per unit.
    pub sell_price: Money,
    /// Maximum retail price per unit.
    pub mrp_price: Money,
    pub stock_qty: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Checks if the requested quantity can be sold from current stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock_qty >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale.
/// Uses snapshot pattern to freeze item data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Inventory item this line was sold from.
    pub item_id: String,
    /// Position in the request, preserved on read.
    pub line_no: i64,
    /// Item name at time of sale (frozen).
    pub name_snapshot: String,
    /// Brand at time of sale (frozen).
    pub brand_snapshot: Option<String>,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: Option<String>,
    pub quantity: i64,
    /// Selling price per unit at time of sale (frozen).
    pub unit_price: Money,
    /// MRP per unit at time of sale (frozen).
    pub mrp: Money,
    /// unit_price × quantity, always computed server side.
    pub total_price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Freezes an inventory item into a sale line.
    pub fn snapshot(
        id: String,
        sale_id: &str,
        line_no: i64,
        item: &InventoryItem,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Self {
        SaleItem {
            id,
            sale_id: sale_id.to_string(),
            item_id: item.id.clone(),
            line_no,
            name_snapshot: item.name.clone(),
            brand_snapshot: item.brand.clone(),
            sku_snapshot: item.sku.clone(),
            quantity,
            unit_price: item.sell_price,
            mrp: item.mrp_price,
            total_price: item.sell_price.multiply_quantity(quantity),
            created_at: now,
        }
    }

    /// MRP × quantity.
    #[inline]
    pub fn total_mrp(&self) -> Money {
        self.mrp.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale (invoice).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// `INV-<year>-<NNNNNN>`, unique and immutable.
    pub invoice_number: String,
    /// `None` for walk-in sales.
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleItem>,
    pub payment_mode: PaymentMode,
    pub subtotal: Money,
    pub mrp_total: Money,
    pub discount: Money,
    pub extra_discount: Money,
    pub total_discount: Money,
    pub gst_rate: TaxRate,
    pub gst_amount: Money,
    pub cgst_rate: TaxRate,
    pub cgst_amount: Money,
    pub total_tax: Money,
    /// max(0, subtotal − total_discount) + total_tax.
    pub total_amount: Money,
    /// max(0, mrp_total − total_amount).
    pub savings: Money,
    pub store_id: String,
    /// Staff member who recorded the sale.
    pub staff_id: String,
    pub status: SaleStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_walk_in(&self) -> bool {
        self.customer_id.is_none()
    }
}

// =============================================================================
// Audit Log
// =============================================================================

/// An append-only record of a billing action.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    /// "SALE" for every entry written by the billing engine.
    pub entity_type: String,
    pub entity_id: String,
    /// "SALE_RECORDED", "SALE_STATUS_CHANGED"
    pub action: String,
    pub actor_id: String,
    /// JSON details of the action.
    pub payload: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Notification Bookkeeping
// =============================================================================

/// Outcome of one notification channel for one sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Delivered to the transport.
    Sent,
    /// Transport rejected or timed out.
    Failed,
    /// Channel switched off in configuration.
    Disabled,
    /// No recipient for this channel.
    Skipped,
}

impl NotificationStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, NotificationStatus::Failed)
    }
}

/// Stored result of a notification attempt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub sale_id: String,
    pub channel: String,
    pub status: NotificationStatus,
    pub detail: Option<String>,
    #[ts(as = "String")]
    pub attempted_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rice() -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: "item-1".to_string(),
            store_id: "store-1".to_string(),
            name: "Basmati Rice 5kg".to_string(),
            brand: Some("India Gate".to_string()),
            sku: Some("RICE-5KG".to_string()),
            sell_price: Money::from_minor(10000),
            mrp_price: Money::from_minor(12000),
            stock_qty: 10,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(9.0).bps(), 900);
        assert_eq!(TaxRate::from_percentage(2.5).bps(), 250);
        assert!((TaxRate::from_bps(1800).percentage() - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_payment_mode_parsing() {
        assert_eq!("UPI".parse::<PaymentMode>().unwrap(), PaymentMode::Upi);
        assert_eq!(" card ".parse::<PaymentMode>().unwrap(), PaymentMode::Card);
        assert!("cheque".parse::<PaymentMode>().is_err());
        assert_eq!(PaymentMode::default(), PaymentMode::Cash);
    }

    #[test]
    fn test_sale_status_transitions() {
        use SaleStatus::*;

        assert!(Completed.can_transition_to(PartialRefund));
        assert!(Completed.can_transition_to(Cancelled));
        assert!(PartialRefund.can_transition_to(FullRefund));
        assert!(!Cancelled.can_transition_to(Completed));
        assert!(!FullRefund.can_transition_to(PartialRefund));
        assert!(!Completed.can_transition_to(Completed));
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn test_sale_status_wire_names() {
        let json = serde_json::to_string(&SaleStatus::PartialRefund).unwrap();
        assert_eq!(json, "\"partial_refund\"");
        assert_eq!(
            "FULL_REFUND".parse::<SaleStatus>().unwrap(),
            SaleStatus::FullRefund
        );
        assert!("refunded".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn test_sale_item_snapshot() {
        let item = rice();
        let line = SaleItem::snapshot("line-1".into(), "sale-1", 0, &item, 3, Utc::now());

        assert_eq!(line.name_snapshot, "Basmati Rice 5kg");
        assert_eq!(line.brand_snapshot.as_deref(), Some("India Gate"));
        assert_eq!(line.total_price.minor(), 30000);
        assert_eq!(line.total_mrp().minor(), 36000);
    }

    #[test]
    fn test_staff_role_store_fallback() {
        assert!(StaffRole::Admin.may_use_any_store());
        assert!(StaffRole::Manager.may_use_any_store());
        assert!(!StaffRole::Cashier.may_use_any_store());
    }
}
