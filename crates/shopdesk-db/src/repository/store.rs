//! # Store Registry
//!
//! Stores and the staff assigned to them.
//!
//! ## Store Resolution Inputs
//! ```text
//! explicit storeId ──► StoreRepository::get_by_id
//! caller.store_id  ──► StoreRepository::get_by_id
//! admin / manager  ──► StoreRepository::first
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shopdesk_core::{StaffMember, Store};

pub(crate) const STORE_COLUMNS: &str = "id, name, address, phone, gstin, created_at";

const STAFF_COLUMNS: &str = "id, name, role, store_id, created_at";

// =============================================================================
// Stores
// =============================================================================

/// Repository for store records.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Store>> {
        let sql = format!("SELECT {} FROM stores WHERE id = ?1", STORE_COLUMNS);

        let store = sqlx::query_as::<_, Store>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(store)
    }

    /// The oldest store. Fallback for roles that may bill anywhere.
    pub async fn first(&self) -> DbResult<Option<Store>> {
        let sql = format!(
            "SELECT {} FROM stores ORDER BY created_at, id LIMIT 1",
            STORE_COLUMNS
        );

        let store = sqlx::query_as::<_, Store>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(store)
    }

    pub async fn insert(&self, store: &Store) -> DbResult<()> {
        debug!(id = %store.id, name = %store.name, "Inserting store");

        sqlx::query(
            r#"
            INSERT INTO stores (id, name, address, phone, gstin, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&store.id)
        .bind(&store.name)
        .bind(&store.address)
        .bind(&store.phone)
        .bind(&store.gstin)
        .bind(store.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Staff
// =============================================================================

/// Repository for staff members (billing callers).
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StaffMember>> {
        let sql = format!("SELECT {} FROM staff WHERE id = ?1", STAFF_COLUMNS);

        let member = sqlx::query_as::<_, StaffMember>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(member)
    }

    pub async fn insert(&self, member: &StaffMember) -> DbResult<()> {
        debug!(id = %member.id, role = ?member.role, "Inserting staff member");

        sqlx::query(
            r#"
            INSERT INTO staff (id, name, role, store_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(member.role)
        .bind(&member.store_id)
        .bind(member.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
