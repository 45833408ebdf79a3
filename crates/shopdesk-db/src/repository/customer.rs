//! # Customer Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shopdesk_core::Customer;

pub(crate) const CUSTOMER_COLUMNS: &str = "id, name, phone, email, created_at, updated_at";

/// Repository for customer records.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, email, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
