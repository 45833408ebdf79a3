//! Single-table access, one repository per table group. Each holds a pool
//! clone and runs every call on whatever connection is free.
//!
//! Writes that must land together (a sale, its items, the stock and its
//! audit row) belong to [`crate::SaleTransaction`] instead.

pub mod audit;
pub mod customer;
pub mod inventory;
pub mod notification;
pub mod sale;
pub mod store;
