//! # Shopdesk Billing API
//!
//! HTTP service that records sales for the back-office counter.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billing API                                      │
//! │                                                                         │
//! │  Counter ───► axum (8080) ───► SaleService ───► SQLite                 │
//! │                  │                  │                                   │
//! │            Caller (x-staff-id)      ▼                                   │
//! │                          NotificationDispatcher ───► mail relay         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod caller;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

use shopdesk_db::Database;

use crate::config::BillingConfig;
use crate::services::notification::NotificationDispatcher;
use crate::services::sale_service::SaleService;

pub use routes::router;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<BillingConfig>,
    pub sales: Arc<SaleService>,
}

impl AppState {
    /// Wires services from configuration.
    pub fn new(db: Database, config: BillingConfig, dispatcher: NotificationDispatcher) -> Self {
        let sales = SaleService::new(db.clone(), dispatcher, config.sales.clone());
        AppState {
            db,
            config: Arc::new(config),
            sales: Arc::new(sales),
        }
    }
}
