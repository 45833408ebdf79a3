//! # Audit Log Repository
//!
//! Append-only record of billing actions.
//!
//! ## Written Together With the Change
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION                                    │
//! │                                                                         │
//! │  record sale:                                                          │
//! │    1. UPDATE inventory_items ... (decrements)                          │
//! │    2. INSERT INTO sales / sale_items                                   │
//! │    3. INSERT INTO audit_log ('SALE', id, 'SALE_RECORDED', payload)     │
//! │                                                                         │
//! │  change status:                                                        │
//! │    1. UPDATE sales SET status = ? WHERE id = ? AND status = ?          │
//! │    2. INSERT INTO audit_log ('SALE', id, 'SALE_STATUS_CHANGED', ...)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//!       │
//!       ▼
//! COMMIT ← the change and its audit entry land together or not at all
//! ```

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use shopdesk_core::AuditEntry;

/// Entity type of every sale entry.
pub const ENTITY_SALE: &str = "SALE";

/// A sale was committed.
pub const ACTION_SALE_RECORDED: &str = "SALE_RECORDED";

/// A sale moved to another status.
pub const ACTION_SALE_STATUS_CHANGED: &str = "SALE_STATUS_CHANGED";

/// Builds a sale audit entry with a fresh id.
pub fn sale_entry(sale_id: &str, action: &str, actor_id: &str, payload: &serde_json::Value) -> AuditEntry {
    AuditEntry {
        id: Uuid::new_v4().to_string(),
        entity_type: ENTITY_SALE.to_string(),
        entity_id: sale_id.to_string(),
        action: action.to_string(),
        actor_id: actor_id.to_string(),
        payload: payload.to_string(),
        created_at: Utc::now(),
    }
}

/// Inserts an entry on any executor (pool or open transaction).
pub(crate) async fn insert_entry<'e, E>(executor: E, entry: &AuditEntry) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(
        entity_id = %entry.entity_id,
        action = %entry.action,
        "Appending audit entry"
    );

    sqlx::query(
        r#"
        INSERT INTO audit_log (id, entity_type, entity_id, action, actor_id, payload, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.entity_type)
    .bind(&entry.entity_id)
    .bind(&entry.action)
    .bind(&entry.actor_id)
    .bind(&entry.payload)
    .bind(entry.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Repository for reading (and appending outside a sale) audit entries.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: SqlitePool,
}

impl AuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditLogRepository { pool }
    }

    /// Appends an entry in its own statement.
    pub async fn append(&self, entry: &AuditEntry) -> DbResult<()> {
        insert_entry(&self.pool, entry).await
    }

    /// Entries for one entity, oldest first.
    pub async fn list_for_entity(&self, entity_type: &str, entity_id: &str) -> DbResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT id, entity_type, entity_id, action, actor_id, payload, created_at
            FROM audit_log
            WHERE entity_type = ?1 AND entity_id = ?2
            ORDER BY created_at, rowid
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Total number of entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
