//! # Sale Unit of Work
//!
//! Every read and write of one sale attempt, on one SQLite transaction.
//!
//! ## Order of Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.begin_sale()                                BEGIN                   │
//! │       │                                                                 │
//! │       ├── find_store / first_store              SELECT stores           │
//! │       ├── find_inventory_items(ids)             SELECT ... WHERE id IN  │
//! │       ├── find_customer(id)                     SELECT customers        │
//! │       ├── next_invoice_number(year)             UPSERT invoice_sequences│
//! │       ├── decrement_stock(d)  × n               guarded UPDATE          │
//! │       ├── insert_sale(sale)                     INSERT sales, sale_items│
//! │       ├── record_audit(entry)                   INSERT audit_log        │
//! │       ▼                                                                 │
//! │  commit()                                       COMMIT                  │
//! │                                                                         │
//! │  Any error, or dropping the value early          ROLLBACK               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invoice Counter
//! `invoice_sequences` holds one row per year. The first sale of a year seeds
//! it from the highest invoice number already in `sales`; later sales bump it
//! with a single upsert. The UNIQUE index on `sales.invoice_number` catches
//! anything that slips past, and surfaces as a retryable conflict.

use sqlx::{QueryBuilder, Sqlite, Transaction};
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::repository::audit;
use crate::repository::customer::CUSTOMER_COLUMNS;
use crate::repository::inventory::INVENTORY_COLUMNS;
use crate::repository::sale;
use crate::repository::store::STORE_COLUMNS;
use shopdesk_core::invoice::next_invoice_number;
use shopdesk_core::reservation::StockDecrement;
use shopdesk_core::{AuditEntry, Customer, InventoryItem, InvoiceNumber, Sale, Store};

/// An open sale transaction.
pub struct SaleTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl std::fmt::Debug for SaleTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaleTransaction").finish_non_exhaustive()
    }
}

impl SaleTransaction {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        SaleTransaction { tx }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn find_store(&mut self, id: &str) -> DbResult<Option<Store>> {
        let sql = format!("SELECT {} FROM stores WHERE id = ?1", STORE_COLUMNS);

        let store = sqlx::query_as::<_, Store>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(store)
    }

    /// The oldest store, for callers allowed to bill anywhere.
    pub async fn first_store(&mut self) -> DbResult<Option<Store>> {
        let sql = format!(
            "SELECT {} FROM stores ORDER BY created_at, id LIMIT 1",
            STORE_COLUMNS
        );

        let store = sqlx::query_as::<_, Store>(&sql)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(store)
    }

    /// Fetches all requested items in one query. Unknown ids are simply absent.
    pub async fn find_inventory_items(&mut self, ids: &[String]) -> DbResult<Vec<InventoryItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM inventory_items WHERE id IN (",
            INVENTORY_COLUMNS
        ));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let items = query
            .build_query_as::<InventoryItem>()
            .fetch_all(&mut *self.tx)
            .await?;

        debug!(requested = ids.len(), found = items.len(), "Fetched inventory items");
        Ok(items)
    }

    /// Current stock of one item, read after a guarded update missed.
    ///
    /// `None` when the row is gone.
    pub async fn current_stock(&mut self, item_id: &str) -> DbResult<Option<i64>> {
        let stock: Option<i64> =
            sqlx::query_scalar("SELECT stock_qty FROM inventory_items WHERE id = ?1")
                .bind(item_id)
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(stock)
    }

    pub async fn find_customer(&mut self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(customer)
    }

    // =========================================================================
    // Invoice numbering
    // =========================================================================

    /// Allocates the next invoice number of `year`.
    ///
    /// The counter never hands out a number at or below the highest one
    /// already stored in `sales`, so rows written past the counter (imports,
    /// manual fixes) are stepped over instead of colliding on every retry.
    pub async fn next_invoice_number(&mut self, year: i32) -> DbResult<InvoiceNumber> {
        let highest = self.highest_invoice_number(year).await?;
        let floor = next_invoice_number(year, highest).sequence() as i64;

        let last_seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoice_sequences (year, last_seq) VALUES (?1, ?2)
            ON CONFLICT(year) DO UPDATE
                SET last_seq = MAX(invoice_sequences.last_seq + 1, excluded.last_seq)
            RETURNING last_seq
            "#,
        )
        .bind(year)
        .bind(floor)
        .fetch_one(&mut *self.tx)
        .await?;

        let number = InvoiceNumber::new(year, last_seq as u64);
        debug!(invoice_number = %number, "Allocated invoice number");
        Ok(number)
    }

    /// Highest invoice number of `year` already stored in `sales`.
    async fn highest_invoice_number(&mut self, year: i32) -> DbResult<Option<InvoiceNumber>> {
        let prefix = InvoiceNumber::year_prefix(year);

        let highest: Option<String> = sqlx::query_scalar(
            r#"
            SELECT invoice_number FROM sales
            WHERE substr(invoice_number, 1, length(?1)) = ?1
            ORDER BY CAST(substr(invoice_number, length(?1) + 1) AS INTEGER) DESC
            LIMIT 1
            "#,
        )
        .bind(&prefix)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(highest.and_then(|raw| match raw.parse::<InvoiceNumber>() {
            Ok(number) => Some(number),
            Err(e) => {
                warn!(invoice_number = %raw, error = %e, "Ignoring malformed invoice number");
                None
            }
        }))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Applies one decrement, only if enough stock is left.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock decremented
    /// * `Ok(false)` - Guard missed; stock changed since it was read
    pub async fn decrement_stock(&mut self, decrement: &StockDecrement) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET stock_qty = stock_qty - ?1, updated_at = ?2
            WHERE id = ?3 AND stock_qty >= ?1
            "#,
        )
        .bind(decrement.quantity)
        .bind(chrono::Utc::now())
        .bind(&decrement.item_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Inserts the sale and its lines.
    pub async fn insert_sale(&mut self, sale: &Sale) -> DbResult<()> {
        sale::insert_sale(&mut *self.tx, sale).await
    }

    pub async fn record_audit(&mut self, entry: &AuditEntry) -> DbResult<()> {
        audit::insert_entry(&mut *self.tx, entry).await
    }

    // =========================================================================
    // Completion
    // =========================================================================

    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{TimeZone, Utc};
    use shopdesk_core::{Money, PaymentMode, SaleItem, SaleStatus, TaxRate};
    use uuid::Uuid;

    async fn setup() -> (Database, Store, InventoryItem) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        let store = Store {
            id: Uuid::new_v4().to_string(),
            name: "Main Street".into(),
            address: None,
            phone: None,
            gstin: None,
            created_at: now,
        };
        db.stores().insert(&store).await.unwrap();

        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            store_id: store.id.clone(),
            name: "Basmati Rice 5kg".into(),
            brand: None,
            sku: None,
            sell_price: Money::from_minor(10000),
            mrp_price: Money::from_minor(12000),
            stock_qty: 10,
            created_at: now,
            updated_at: now,
        };
        db.inventory().insert(&item).await.unwrap();

        (db, store, item)
    }

    fn sale(store: &Store, item: &InventoryItem, invoice: InvoiceNumber) -> Sale {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let line = SaleItem::snapshot(Uuid::new_v4().to_string(), &id, 0, item, 1, now);
        Sale {
            id,
            invoice_number: invoice.to_string(),
            customer_id: None,
            customer_name: "Walk-in Customer".into(),
            customer_phone: None,
            customer_email: None,
            items: vec![line],
            payment_mode: PaymentMode::Cash,
            subtotal: Money::from_minor(10000),
            mrp_total: Money::from_minor(12000),
            discount: Money::zero(),
            extra_discount: Money::zero(),
            total_discount: Money::zero(),
            gst_rate: TaxRate::zero(),
            gst_amount: Money::zero(),
            cgst_rate: TaxRate::zero(),
            cgst_amount: Money::zero(),
            total_tax: Money::zero(),
            total_amount: Money::from_minor(10000),
            savings: Money::from_minor(2000),
            store_id: store.id.clone(),
            staff_id: "staff".into(),
            status: SaleStatus::Completed,
            notes: None,
            sale_date: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_invoice_numbers_start_at_one_and_increase() {
        let (db, _, _) = setup().await;

        let mut tx = db.begin_sale().await.unwrap();
        assert_eq!(tx.next_invoice_number(2025).await.unwrap(), InvoiceNumber::new(2025, 1));
        assert_eq!(tx.next_invoice_number(2025).await.unwrap(), InvoiceNumber::new(2025, 2));
        assert_eq!(tx.next_invoice_number(2026).await.unwrap(), InvoiceNumber::new(2026, 1));
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_counter_seeded_from_existing_sales() {
        let (db, store, item) = setup().await;

        // A sale recorded before the counter existed
        let mut tx = db.begin_sale().await.unwrap();
        tx.insert_sale(&sale(&store, &item, InvoiceNumber::new(2025, 41)))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin_sale().await.unwrap();
        let next = tx.next_invoice_number(2025).await.unwrap();
        assert_eq!(next.to_string(), "INV-2025-000042");
    }

    #[tokio::test]
    async fn test_counter_steps_over_numbers_stored_past_it() {
        let (db, store, item) = setup().await;

        let mut tx = db.begin_sale().await.unwrap();
        assert_eq!(tx.next_invoice_number(2025).await.unwrap().sequence(), 1);
        tx.commit().await.unwrap();

        // Written without going through the counter
        let mut tx = db.begin_sale().await.unwrap();
        tx.insert_sale(&sale(&store, &item, InvoiceNumber::new(2025, 2)))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin_sale().await.unwrap();
        assert_eq!(tx.next_invoice_number(2025).await.unwrap().to_string(), "INV-2025-000003");
        assert_eq!(tx.next_invoice_number(2025).await.unwrap().sequence(), 4);
    }

    #[tokio::test]
    async fn test_rolled_back_number_is_reissued() {
        let (db, _, _) = setup().await;

        let mut tx = db.begin_sale().await.unwrap();
        tx.next_invoice_number(2025).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = db.begin_sale().await.unwrap();
        assert_eq!(tx.next_invoice_number(2025).await.unwrap().sequence(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_invoice_number_is_conflict() {
        let (db, store, item) = setup().await;
        let number = InvoiceNumber::new(2025, 7);

        let mut tx = db.begin_sale().await.unwrap();
        tx.insert_sale(&sale(&store, &item, number)).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin_sale().await.unwrap();
        let err = tx.insert_sale(&sale(&store, &item, number)).await.unwrap_err();
        assert!(err.is_conflict(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_guarded_decrement() {
        let (db, _, item) = setup().await;
        let decrement = |qty| StockDecrement {
            item_id: item.id.clone(),
            name: item.name.clone(),
            quantity: qty,
            available: 10,
        };

        let mut tx = db.begin_sale().await.unwrap();
        assert!(tx.decrement_stock(&decrement(6)).await.unwrap());
        assert!(!tx.decrement_stock(&decrement(6)).await.unwrap());
        assert_eq!(tx.current_stock(&item.id).await.unwrap(), Some(4));
        assert_eq!(tx.current_stock("gone").await.unwrap(), None);
        tx.commit().await.unwrap();

        assert_eq!(db.inventory().total_stock().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_find_inventory_items_skips_unknown_ids() {
        let (db, _, item) = setup().await;

        let mut tx = db.begin_sale().await.unwrap();
        let found = tx
            .find_inventory_items(&[item.id.clone(), Uuid::new_v4().to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sell_price, Money::from_minor(10000));
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let (db, store, item) = setup().await;

        {
            let mut tx = db.begin_sale().await.unwrap();
            tx.insert_sale(&sale(&store, &item, InvoiceNumber::new(2025, 1)))
                .await
                .unwrap();
        }

        assert_eq!(db.sales().count().await.unwrap(), 0);
    }
}
