//! # Inventory Repository
//!
//! Reads and maintains stocked items.
//!
//! Stock is only ever *decremented* by the sale transaction
//! ([`crate::sale_tx::SaleTransaction::decrement_stock`]); this repository
//! covers catalog upkeep and read access.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shopdesk_core::InventoryItem;

pub(crate) const INVENTORY_COLUMNS: &str = "id, store_id, name, brand, sku, sell_price, mrp_price, \
     stock_qty, created_at, updated_at";

/// Repository for inventory item operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let sql = format!("SELECT {} FROM inventory_items WHERE id = ?1", INVENTORY_COLUMNS);

        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Lists a store's items by name.
    pub async fn list_by_store(&self, store_id: &str) -> DbResult<Vec<InventoryItem>> {
        let sql = format!(
            "SELECT {} FROM inventory_items WHERE store_id = ?1 ORDER BY name",
            INVENTORY_COLUMNS
        );

        let items = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Inserts a new item.
    pub async fn insert(&self, item: &InventoryItem) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting inventory item");

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, store_id, name, brand, sku,
                sell_price, mrp_price, stock_qty,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.store_id)
        .bind(&item.name)
        .bind(&item.brand)
        .bind(&item.sku)
        .bind(item.sell_price)
        .bind(item.mrp_price)
        .bind(item.stock_qty)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Edits catalog fields. Sale lines recorded earlier keep their snapshot.
    pub async fn update_details(&self, item: &InventoryItem) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = ?2, brand = ?3, sku = ?4, sell_price = ?5, mrp_price = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.brand)
        .bind(&item.sku)
        .bind(item.sell_price)
        .bind(item.mrp_price)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sum of stock across all items; used to check conservation in tests.
    pub async fn total_stock(&self) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar("SELECT SUM(stock_qty) FROM inventory_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(total.unwrap_or(0))
    }

    /// Counts items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
