//! Shared fixtures for billing integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use billing_api::config::{BillingConfig, SaleSettings};
use billing_api::services::notification::{
    InvoiceMessage, NotificationChannel, NotificationDispatcher, NotificationError,
};
use billing_api::services::sale_service::SaleService;
use billing_api::AppState;
use chrono::Utc;
use shopdesk_core::{
    Customer, InventoryItem, Money, SaleLineRequest, SaleRequest, StaffMember, StaffRole, Store,
};
use shopdesk_db::{Database, DbConfig};
use std::time::Duration;
use uuid::Uuid;

pub struct Shop {
    pub db: Database,
    pub store: Store,
    pub cashier: StaffMember,
    pub admin: StaffMember,
}

impl Shop {
    pub async fn in_memory() -> Self {
        Self::with_db(Database::new(DbConfig::in_memory()).await.unwrap()).await
    }

    /// File-backed database with several connections, for real write races.
    pub async fn on_disk(dir: &tempfile::TempDir) -> Self {
        let config = DbConfig::new(dir.path().join("shopdesk.db"))
            .max_connections(4)
            .busy_timeout(Duration::from_secs(5));
        Self::with_db(Database::new(config).await.unwrap()).await
    }

    async fn with_db(db: Database) -> Self {
        let now = Utc::now();

        let store = Store {
            id: Uuid::new_v4().to_string(),
            name: "Shopdesk Main Street".into(),
            address: Some("12 Main Street, Pune".into()),
            phone: None,
            gstin: Some("27ABCDE1234F1Z5".into()),
            created_at: now,
        };
        db.stores().insert(&store).await.unwrap();

        let cashier = staff(StaffRole::Cashier, Some(&store.id));
        db.staff().insert(&cashier).await.unwrap();
        let admin = staff(StaffRole::Admin, None);
        db.staff().insert(&admin).await.unwrap();

        Shop {
            db,
            store,
            cashier,
            admin,
        }
    }

    /// Stocks an item priced in paise.
    pub async fn stock(&self, name: &str, sell: i64, mrp: i64, qty: i64) -> InventoryItem {
        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            store_id: self.store.id.clone(),
            name: name.to_string(),
            brand: Some("Shopdesk Select".into()),
            sku: Some(format!("SKU-{}", &Uuid::new_v4().to_string()[..8])),
            sell_price: Money::from_minor(sell),
            mrp_price: Money::from_minor(mrp),
            stock_qty: qty,
            created_at: now,
            updated_at: now,
        };
        self.db.inventory().insert(&item).await.unwrap();
        item
    }

    pub async fn customer(&self, name: &str, email: Option<&str>) -> Customer {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: None,
            email: email.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.db.customers().insert(&customer).await.unwrap();
        customer
    }

    pub async fn stock_of(&self, item: &InventoryItem) -> i64 {
        self.db
            .inventory()
            .get_by_id(&item.id)
            .await
            .unwrap()
            .unwrap()
            .stock_qty
    }

    pub fn service(&self, dispatcher: NotificationDispatcher) -> SaleService {
        SaleService::new(self.db.clone(), dispatcher, fast_retries())
    }

    pub fn state(&self, dispatcher: NotificationDispatcher) -> AppState {
        let mut config = BillingConfig::default();
        config.sales = fast_retries();
        AppState::new(self.db.clone(), config, dispatcher)
    }
}

fn staff(role: StaffRole, store_id: Option<&str>) -> StaffMember {
    StaffMember {
        id: Uuid::new_v4().to_string(),
        name: format!("{:?}", role),
        role,
        store_id: store_id.map(str::to_string),
        created_at: Utc::now(),
    }
}

/// Generous attempts with short waits, so racing tests settle quickly.
pub fn fast_retries() -> SaleSettings {
    SaleSettings {
        max_commit_attempts: 50,
        retry_initial_backoff_ms: 2,
        retry_max_backoff_ms: 40,
    }
}

pub fn sale_of(lines: &[(&InventoryItem, i64)]) -> SaleRequest {
    SaleRequest {
        items: lines
            .iter()
            .map(|(item, quantity)| SaleLineRequest {
                item_id: item.id.clone(),
                quantity: *quantity,
            })
            .collect(),
        ..Default::default()
    }
}

/// A channel that always fails.
pub struct BrokenChannel;

#[async_trait]
impl NotificationChannel for BrokenChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, _message: &InvoiceMessage) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("relay unreachable".into()))
    }
}

pub fn broken_dispatcher() -> NotificationDispatcher {
    NotificationDispatcher::new(vec![Arc::new(BrokenChannel)], Duration::from_secs(1))
}
