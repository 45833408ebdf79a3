//! # Notification Results
//!
//! One row per channel per dispatch, written after the sale committed.

use sqlx::SqlitePool;

use crate::error::DbResult;
use shopdesk_core::NotificationRecord;

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Stores every result of one dispatch in a single transaction.
    pub async fn record_all(&self, records: &[NotificationRecord]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO sale_notifications (id, sale_id, channel, status, detail, attempted_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&record.id)
            .bind(&record.sale_id)
            .bind(&record.channel)
            .bind(record.status)
            .bind(&record.detail)
            .bind(record.attempted_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<NotificationRecord>> {
        let records = sqlx::query_as::<_, NotificationRecord>(
            r#"
            SELECT id, sale_id, channel, status, detail, attempted_at
            FROM sale_notifications
            WHERE sale_id = ?1
            ORDER BY attempted_at, rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
