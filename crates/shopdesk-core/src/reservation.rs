//! # Stock Reservation
//!
//! Checks requested quantities against the stock read inside the sale
//! transaction and plans what to write.
//!
//! ## All-or-Nothing
//! ```text
//! requested ──┐
//!             ├──► every id found? ──no──► ItemNotFound
//! found ──────┘          │
//!                        ▼
//!              every line in stock? ──no──► InsufficientStock (first short line)
//!                        │
//!                        ▼
//!          Reservation { sale item snapshots, stock decrements }
//! ```
//!
//! Nothing here writes. The decrements are applied by shopdesk-db in the
//! same transaction as the sale insert.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{InventoryItem, SaleItem};

/// One requested sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItem {
    pub item_id: String,
    pub quantity: i64,
}

/// A planned `stock_qty -= quantity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub item_id: String,
    pub name: String,
    pub quantity: i64,
    /// Stock seen when the plan was made.
    pub available: i64,
}

/// The outcome of a successful stock check.
#[derive(Debug, Clone)]
pub struct Reservation {
    /// Snapshots in request order.
    pub items: Vec<SaleItem>,
    pub decrements: Vec<StockDecrement>,
}

impl Reservation {
    pub fn total_quantity(&self) -> i64 {
        self.decrements.iter().map(|d| d.quantity).sum()
    }
}

/// Validates requested lines against fetched inventory and builds the plan.
///
/// `line_ids` supplies one fresh id per requested line.
pub fn plan_reservation(
    sale_id: &str,
    requested: &[RequestedItem],
    found: &[InventoryItem],
    mut line_ids: impl FnMut() -> String,
    now: DateTime<Utc>,
) -> CoreResult<Reservation> {
    let by_id: HashMap<&str, &InventoryItem> =
        found.iter().map(|item| (item.id.as_str(), item)).collect();

    if by_id.len() != requested.len() {
        let missing: Vec<String> = requested
            .iter()
            .filter(|r| !by_id.contains_key(r.item_id.as_str()))
            .map(|r| r.item_id.clone())
            .collect();
        return Err(CoreError::ItemNotFound { missing });
    }

    let mut items = Vec::with_capacity(requested.len());
    let mut decrements = Vec::with_capacity(requested.len());

    for (line_no, req) in requested.iter().enumerate() {
        let inventory = by_id
            .get(req.item_id.as_str())
            .ok_or_else(|| CoreError::ItemNotFound {
                missing: vec![req.item_id.clone()],
            })?;

        if !inventory.can_sell(req.quantity) {
            return Err(CoreError::InsufficientStock {
                item_id: inventory.id.clone(),
                name: inventory.name.clone(),
                available: inventory.stock_qty,
                requested: req.quantity,
            });
        }

        items.push(SaleItem::snapshot(
            line_ids(),
            sale_id,
            line_no as i64,
            inventory,
            req.quantity,
            now,
        ));
        decrements.push(StockDecrement {
            item_id: inventory.id.clone(),
            name: inventory.name.clone(),
            quantity: req.quantity,
            available: inventory.stock_qty,
        });
    }

    Ok(Reservation { items, decrements })
}

// =============================================================================
// Unit Tests
// =============================================================================
