//! # HTTP Routes
//!
//! ```text
//! POST  /billing/record-sale                          → 201 { sale, notifications? }
//! GET   /billing/invoices/{invoice_number}            → 200 Sale | 404
//! PATCH /billing/invoices/{invoice_number}/status     → 200 Sale | 409
//! GET   /health                                       → 200 | 503
//! ```
//!
//! Billing routes require the `x-staff-id` header.

pub mod billing;
pub mod health;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/billing/record-sale", post(billing::record_sale))
        .route(
            "/billing/invoices/{invoice_number}",
            get(billing::get_invoice),
        )
        .route(
            "/billing/invoices/{invoice_number}/status",
            patch(billing::change_status),
        )
        .route("/health", get(health::health))
        .with_state(state)
}
