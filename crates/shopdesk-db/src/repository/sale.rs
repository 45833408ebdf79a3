//! # Sale Repository
//!
//! Database operations for recorded sales and their lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. RECORD (SaleTransaction, one unit of work)                         │
//! │     └── insert_sale() → Sale { status: Completed } + sale_items        │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     └── get_by_invoice_number() → Sale with items in line order        │
//! │                                                                         │
//! │  3. (OPTIONAL) STATUS CHANGE                                           │
//! │     └── update_status() → PartialRefund / FullRefund / Cancelled       │
//! │         guarded on the status the caller saw, audited in the same tx   │
//! │                                                                         │
//! │  Sale items are never updated after insert.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::audit;
use shopdesk_core::{AuditEntry, Sale, SaleItem, SaleStatus};

pub(crate) const SALE_COLUMNS: &str = "id, invoice_number, customer_id, customer_name, \
     customer_phone, customer_email, payment_mode, subtotal, mrp_total, discount, \
     extra_discount, total_discount, gst_rate, gst_amount, cgst_rate, cgst_amount, total_tax, \
     total_amount, savings, store_id, staff_id, status, notes, sale_date, created_at, updated_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, item_id, line_no, name_snapshot, brand_snapshot, \
     sku_snapshot, quantity, unit_price, mrp, total_price, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale (with items) by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        self.with_items(sale).await
    }

    /// Gets a sale (with items) by its invoice number.
    pub async fn get_by_invoice_number(&self, invoice_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE invoice_number = ?1", SALE_COLUMNS);

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(invoice_number)
            .fetch_optional(&self.pool)
            .await?;

        self.with_items(sale).await
    }

    async fn with_items(&self, sale: Option<Sale>) -> DbResult<Option<Sale>> {
        match sale {
            Some(mut sale) => {
                sale.items = self.get_items(&sale.id).await?;
                Ok(Some(sale))
            }
            None => Ok(None),
        }
    }

    /// Gets the lines of a sale in request order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!(
            "SELECT {} FROM sale_items WHERE sale_id = ?1 ORDER BY line_no",
            SALE_ITEM_COLUMNS
        );

        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Moves a sale from `from` to `to` and audits the change.
    ///
    /// ## Returns
    /// * `Ok(true)` - Status changed
    /// * `Ok(false)` - The sale was no longer in `from`; nothing written
    pub async fn update_status(
        &self,
        sale_id: &str,
        from: SaleStatus,
        to: SaleStatus,
        audit_entry: &AuditEntry,
    ) -> DbResult<bool> {
        debug!(sale_id = %sale_id, from = %from, to = %to, "Updating sale status");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND status = ?4
            "#,
        )
        .bind(to)
        .bind(Utc::now())
        .bind(sale_id)
        .bind(from)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        audit::insert_entry(&mut *tx, audit_entry).await?;
        tx.commit().await?;

        Ok(true)
    }

    /// Counts recorded sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Writes used by the sale transaction
// =============================================================================

/// Inserts a sale row and all of its lines on one connection.
pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, invoice_number = %sale.invoice_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, invoice_number, customer_id, customer_name, customer_phone, customer_email,
            payment_mode, subtotal, mrp_total, discount, extra_discount, total_discount,
            gst_rate, gst_amount, cgst_rate, cgst_amount, total_tax, total_amount, savings,
            store_id, staff_id, status, notes, sale_date, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16, ?17, ?18, ?19,
            ?20, ?21, ?22, ?23, ?24, ?25, ?26
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.invoice_number)
    .bind(&sale.customer_id)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(&sale.customer_email)
    .bind(sale.payment_mode)
    .bind(sale.subtotal)
    .bind(sale.mrp_total)
    .bind(sale.discount)
    .bind(sale.extra_discount)
    .bind(sale.total_discount)
    .bind(sale.gst_rate)
    .bind(sale.gst_amount)
    .bind(sale.cgst_rate)
    .bind(sale.cgst_amount)
    .bind(sale.total_tax)
    .bind(sale.total_amount)
    .bind(sale.savings)
    .bind(&sale.store_id)
    .bind(&sale.staff_id)
    .bind(sale.status)
    .bind(&sale.notes)
    .bind(sale.sale_date)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    for item in &sale.items {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, item_id, line_no, name_snapshot, brand_snapshot, sku_snapshot,
                quantity, unit_price, mrp, total_price, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.item_id)
        .bind(item.line_no)
        .bind(&item.name_snapshot)
        .bind(&item.brand_snapshot)
        .bind(&item.sku_snapshot)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.mrp)
        .bind(item.total_price)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
