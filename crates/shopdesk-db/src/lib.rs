//! # shopdesk-db
//!
//! SQLite persistence for the billing engine through sqlx. Queries are
//! checked at runtime, so building needs no live database.
//!
//! ```text
//!   Database (pool.rs)
//!     ├── stores() staff() inventory() customers()   plain repositories
//!     ├── sales() audit_log() notifications()        reads, status changes
//!     └── begin_sale() ──► SaleTransaction (sale_tx.rs)
//!                            one BEGIN..COMMIT per sale attempt:
//!                            invoice sequence, guarded stock decrements,
//!                            sale + items, audit row
//! ```
//!
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("shopdesk.db")).await?;
//!
//! let mut tx = db.begin_sale().await?;
//! let number = tx.next_invoice_number(2025).await?;
//! // decrement_stock, insert_sale, record_audit
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sale_tx;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use sale_tx::SaleTransaction;

pub use repository::audit::AuditLogRepository;
pub use repository::customer::CustomerRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::notification::NotificationRepository;
pub use repository::sale::SaleRepository;
pub use repository::store::{StaffRepository, StoreRepository};
