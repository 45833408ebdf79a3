//! # Connection Pool
//!
//! Opens the SQLite file behind the billing service and hands out
//! repositories and sale transactions that share one pool.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopdesk SQLite Pool                             │
//! │                                                                         │
//! │  startup:  DbConfig::new("shopdesk.db") ──► Database::new(..)          │
//! │                                              │  pragmas, pool, migrate │
//! │                                              ▼                          │
//! │            ┌──────────────── SqlitePool (max_connections) ───────────┐ │
//! │            │                                                          │ │
//! │  GET  /billing/invoices/..  ──► db.sales()        borrows, returns   │ │
//! │  POST /billing/record-sale  ──► db.begin_sale()   holds until COMMIT │ │
//! │  PATCH .../status           ──► db.sales().update_status()           │ │
//! │            └──────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Writers
//! Journal mode is WAL: readers never wait on the writer, writers queue on
//! `busy_timeout`. A writer whose snapshot went stale gets SQLITE_BUSY
//! straight away, which surfaces as [`DbError::Conflict`] and is retried
//! by the caller.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::audit::AuditLogRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::notification::NotificationRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::store::{StaffRepository, StoreRepository};
use crate::sale_tx::SaleTransaction;

// =============================================================================
// Settings
// =============================================================================

/// Pool and SQLite settings.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/shopdesk/shopdesk.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first use. `:memory:` for tests.
    pub database_path: PathBuf,

    /// Upper bound on open connections (default 5).
    pub max_connections: u32,

    /// Connections kept open while idle (default 1).
    pub min_connections: u32,

    /// How long `acquire` waits for a free connection (default 30s).
    pub connect_timeout: Duration,

    /// Idle connections above `min_connections` close after this (default 10m).
    pub idle_timeout: Duration,

    /// How long a statement waits on a locked database before SQLITE_BUSY
    /// (default 5s).
    pub busy_timeout: Duration,

    /// Apply embedded migrations in `Database::new` (default on).
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Private in-memory database for tests.
    ///
    /// A single connection: every connection to `:memory:` would otherwise
    /// see its own empty database. Concurrent callers queue on the pool, so
    /// transactions run one after another.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the billing database.
///
/// Cheap to clone; every clone shares the same pool. Held in the axum
/// application state.
///
/// ```rust,ignore
/// async fn get_invoice(
///     State(state): State<AppState>,
///     Path(invoice_number): Path<String>,
/// ) -> Result<Json<Sale>, ApiError> {
///     let sale = state.db.sales().get_by_invoice_number(&invoice_number).await?;
///     ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, migrates the schema.
    ///
    /// Pragmas set on every connection: WAL journal, NORMAL synchronous,
    /// foreign keys on, and the configured busy timeout.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening billing database");

        let url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        info!("Schema up to date");
        Ok(())
    }

    /// `(embedded, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// Store registry.
    pub fn stores(&self) -> StoreRepository {
        StoreRepository::new(self.pool.clone())
    }

    pub fn staff(&self) -> StaffRepository {
        StaffRepository::new(self.pool.clone())
    }

    /// Committed sales: reads and status changes.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    pub fn audit_log(&self) -> AuditLogRepository {
        AuditLogRepository::new(self.pool.clone())
    }

    /// Per-channel notification results.
    pub fn notifications(&self) -> NotificationRepository {
        NotificationRepository::new(self.pool.clone())
    }

    /// Opens the unit of work that records one sale.
    ///
    /// Dropping the returned value without `commit()` rolls back.
    pub async fn begin_sale(&self) -> DbResult<SaleTransaction> {
        let tx = self.pool.begin().await?;
        Ok(SaleTransaction::new(tx))
    }

    pub async fn close(&self) {
        info!("Closing billing database");
        self.pool.close().await;
    }

    /// `SELECT 1` succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);

        let (total, applied) = db.migration_status().await.unwrap();
        assert_eq!(total, applied);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[test]
    fn test_settings_builder() {
        let config = DbConfig::new("/tmp/shopdesk-test.db")
            .max_connections(8)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250))
            .run_migrations(false);

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.run_migrations);
    }

    #[tokio::test]
    async fn test_file_database_reopens_with_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billing.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let mut tx = db.begin_sale().await.unwrap();
        tx.next_invoice_number(2025).await.unwrap();
        tx.commit().await.unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        let mut tx = reopened.begin_sale().await.unwrap();
        assert_eq!(tx.next_invoice_number(2025).await.unwrap().sequence(), 2);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
