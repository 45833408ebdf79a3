//! # shopdesk-core
//!
//! The decisions a sale needs that do not depend on I/O: checking the
//! request, pricing it, planning stock decrements and formatting invoice
//! numbers. `shopdesk-db` stores the results and `billing-api` drives the
//! sequence.
//!
//! ```text
//!   SaleRequest ──validate_sale_request──► ValidatedSale
//!                                              │
//!        InventoryItem rows ──plan_reservation─┤──► Reservation
//!                                              │     (decrements + snapshots)
//!                                              ▼
//!                               calculate_pricing ──► PricingResult
//!                                                       (subtotal, tax, total,
//!                                                        savings)
//!   (year, last sequence) ──next_invoice_number──► INV-2025-000042
//! ```
//!
//! The `sqlx` feature adds database derives; without it this crate has no
//! database dependency at all.
//!
//! ```rust
//! use shopdesk_core::money::Money;
//! use shopdesk_core::types::TaxRate;
//!
//! let cgst = Money::from_minor(10000).calculate_tax(TaxRate::from_percentage(9.0));
//! assert_eq!(cgst.minor(), 900);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod money;
pub mod pricing;
pub mod reservation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use invoice::{next_invoice_number, InvoiceNumber, InvoiceParseError};
pub use money::Money;
pub use pricing::{calculate_pricing, PriceAdjustments, PricingResult};
pub use reservation::{plan_reservation, RequestedItem, Reservation, StockDecrement};
pub use types::*;
pub use validation::{validate_sale_request, SaleLineRequest, SaleRequest, ValidatedSale};

// =============================================================================
// Limits
// =============================================================================

pub const MAX_SALE_LINES: usize = 100;

/// Per line. Catches 10000 keyed instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 1000;

/// Ceiling for a request amount (discounts), in paise: Rs 1000 crore.
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000;

/// Printed when a sale has neither a customer record nor a name.
pub const WALK_IN_CUSTOMER_NAME: &str = "Walk-in Customer";
