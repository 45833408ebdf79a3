//! # Schema Migrations
//!
//! SQL files under the workspace `migrations/sqlite/` directory are compiled
//! into the binary and applied by [`crate::Database::new`].
//!
//! ```text
//!   migrations/sqlite/
//!     001_initial_schema.sql   stores, staff, inventory_items, customers,
//!                              sales, sale_items, invoice_sequences,
//!                              audit_log, sale_notifications
//!
//!   applied ones are tracked in _sqlx_migrations; only new files run
//! ```
//!
//! Schema changes go in a new `NNN_description.sql`. Files already shipped
//! are never edited: sqlx checksums them and refuses to start on mismatch.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not run yet, one transaction per file.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(embedded = MIGRATOR.migrations.len(), "Migrations applied");
    Ok(())
}

/// `(embedded, applied)`; equal once the schema is current.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
