//! # Sale Service
//!
//! Records a sale end to end: validation, store resolution, stock
//! reservation, pricing, customer snapshot, invoice numbering, the atomic
//! commit and the notifications that follow it.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record_sale(caller, request)                         │
//! │                                                                         │
//! │  Validating            no I/O, every violation collected               │
//! │       │                                                                 │
//! │       │   ┌───────────────── one attempt, one transaction ───────────┐ │
//! │       ▼   │                                                           │ │
//! │  (store, reservation)  find_store / find_inventory_items              │ │
//! │       ▼                                                               │ │
//! │  PricingComputed       calculate_pricing over the snapshots           │ │
//! │       ▼                                                               │ │
//! │  CustomerResolved      find_customer or walk-in                       │ │
//! │       ▼                                                               │ │
//! │  InvoiceNumbered       invoice_sequences upsert                       │ │
//! │       ▼                                                               │ │
//! │  Persisted             decrements + sale + items + audit, COMMIT      │ │
//! │       │   └──────── conflict? ──► backoff, next attempt ─────────────┘ │
//! │       ▼                                                                 │
//! │  NotificationsDispatched  (only when sendEmail, never fails the sale)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conflicts are SQLite busy/locked errors and invoice number collisions.
//! They discard the whole attempt; nothing from a failed attempt survives.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::json;
use shopdesk_core::validation::{sanitize_text, MAX_NOTES_LEN};
use shopdesk_core::{
    calculate_pricing, plan_reservation, validate_sale_request, CoreError, Customer,
    PricingResult, Reservation, Sale, SaleRequest, SaleStatus, StaffMember, StockDecrement,
    Store, ValidatedSale, ValidationError, ValidationErrors, WALK_IN_CUSTOMER_NAME,
};
use shopdesk_db::repository::audit::{sale_entry, ACTION_SALE_RECORDED, ACTION_SALE_STATUS_CHANGED};
use shopdesk_db::{Database, DbError, SaleTransaction};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SaleSettings;
use crate::services::document::DocumentRenderer;
use crate::services::notification::{InvoiceMessage, NotificationDispatcher, NotificationSummary};

/// Errors of the sale workflow.
#[derive(Debug, Error)]
pub enum SaleError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    /// Every attempt lost to a concurrent writer.
    #[error("Sale could not be committed after {attempts} attempts")]
    PersistenceConflict { attempts: u32 },
}

impl From<ValidationErrors> for SaleError {
    fn from(errors: ValidationErrors) -> Self {
        SaleError::Core(CoreError::Validation(errors))
    }
}

pub type SaleResult<T> = Result<T, SaleError>;

/// Progress of one sale, logged at every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleState {
    Validating,
    PricingComputed,
    CustomerResolved,
    InvoiceNumbered,
    Persisted,
    NotificationsDispatched,
}

impl fmt::Display for SaleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaleState::Validating => "validating",
            SaleState::PricingComputed => "pricing_computed",
            SaleState::CustomerResolved => "customer_resolved",
            SaleState::InvoiceNumbered => "invoice_numbered",
            SaleState::Persisted => "persisted",
            SaleState::NotificationsDispatched => "notifications_dispatched",
        };
        f.write_str(name)
    }
}

/// A committed sale plus what happened to its notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedSale {
    pub sale: Sale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationSummary>,
}

/// Customer details frozen onto the sale.
struct CustomerSnapshot {
    id: Option<String>,
    name: String,
    phone: Option<String>,
    email: Option<String>,
}

/// Orchestrates sale recording and status changes.
#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
    dispatcher: NotificationDispatcher,
    renderer: DocumentRenderer,
    settings: SaleSettings,
}

impl SaleService {
    pub fn new(db: Database, dispatcher: NotificationDispatcher, settings: SaleSettings) -> Self {
        SaleService {
            db,
            dispatcher,
            renderer: DocumentRenderer::new(),
            settings,
        }
    }

    // =========================================================================
    // Record
    // =========================================================================

    /// Records a sale for `caller`.
    pub async fn record_sale(
        &self,
        caller: &StaffMember,
        request: &SaleRequest,
    ) -> SaleResult<RecordedSale> {
        debug!(state = %SaleState::Validating, staff_id = %caller.id, lines = request.items.len());
        let validated = validate_sale_request(request)?;

        let (sale, store) = self.commit_with_retry(caller, &validated).await?;

        let notifications = if validated.send_email {
            Some(self.notify(&sale, &store).await)
        } else {
            None
        };

        Ok(RecordedSale {
            sale,
            notifications,
        })
    }

    /// Reruns the whole attempt on write conflicts, up to
    /// `max_commit_attempts`.
    async fn commit_with_retry(
        &self,
        caller: &StaffMember,
        validated: &ValidatedSale,
    ) -> SaleResult<(Sale, Store)> {
        let mut backoff = self.create_backoff();
        let max_attempts = self.settings.max_commit_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.attempt_sale(caller, validated, attempt).await {
                Ok(done) => return Ok(done),
                Err(SaleError::Db(e)) if e.is_conflict() => {
                    if attempt >= max_attempts {
                        warn!(attempts = attempt, error = %e, "Sale conflicted on every attempt");
                        return Err(SaleError::PersistenceConflict { attempts: attempt });
                    }

                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| self.settings.max_backoff());
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Sale conflicted, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.settings.initial_backoff(),
            max_interval: self.settings.max_backoff(),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };
        backoff.reset();
        backoff
    }

    /// One attempt inside one transaction. Any early return drops the
    /// transaction, which rolls it back.
    async fn attempt_sale(
        &self,
        caller: &StaffMember,
        validated: &ValidatedSale,
        attempt: u32,
    ) -> SaleResult<(Sale, Store)> {
        let mut tx = self.db.begin_sale().await?;
        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        let store = resolve_store(&mut tx, caller, validated.store_id.as_deref()).await?;

        let ids: Vec<String> = validated.items.iter().map(|i| i.item_id.clone()).collect();
        let found = tx.find_inventory_items(&ids).await?;
        let reservation = plan_reservation(
            &sale_id,
            &validated.items,
            &found,
            || Uuid::new_v4().to_string(),
            now,
        )?;

        let pricing = calculate_pricing(&reservation.items, &validated.adjustments);
        debug!(
            state = %SaleState::PricingComputed,
            attempt,
            subtotal = %pricing.subtotal,
            total = %pricing.total_amount
        );

        let customer = resolve_customer(&mut tx, validated).await?;
        debug!(
            state = %SaleState::CustomerResolved,
            attempt,
            walk_in = customer.id.is_none()
        );

        let invoice_number = tx.next_invoice_number(now.year()).await?;
        debug!(state = %SaleState::InvoiceNumbered, attempt, invoice_number = %invoice_number);

        for decrement in &reservation.decrements {
            if !tx.decrement_stock(decrement).await? {
                let current = tx.current_stock(&decrement.item_id).await?;
                tx.rollback().await?;
                return Err(missed_decrement(decrement, current).into());
            }
        }

        let total_quantity = reservation.total_quantity();
        let sale = build_sale(
            sale_id,
            invoice_number.to_string(),
            caller,
            &store,
            validated,
            customer,
            reservation,
            &pricing,
            now,
        );
        tx.insert_sale(&sale).await?;

        let entry = sale_entry(
            &sale.id,
            ACTION_SALE_RECORDED,
            &caller.id,
            &json!({
                "invoiceNumber": sale.invoice_number,
                "storeId": sale.store_id,
                "lines": sale.items.len(),
                "totalQuantity": total_quantity,
                "totalAmount": sale.total_amount.minor(),
                "paymentMode": sale.payment_mode.as_str(),
                "attempt": attempt,
            }),
        );
        tx.record_audit(&entry).await?;

        tx.commit().await?;

        debug!(state = %SaleState::Persisted, attempt, sale_id = %sale.id);
        info!(
            invoice_number = %sale.invoice_number,
            total = %sale.total_amount,
            lines = sale.items.len(),
            store_id = %sale.store_id,
            "Sale recorded"
        );

        Ok((sale, store))
    }

    /// Sends the invoice and stores the per-channel results.
    async fn notify(&self, sale: &Sale, store: &Store) -> NotificationSummary {
        let message = InvoiceMessage {
            sale_id: sale.id.clone(),
            invoice_number: sale.invoice_number.clone(),
            customer_name: sale.customer_name.clone(),
            email: sale.customer_email.clone(),
            phone: sale.customer_phone.clone(),
            subject: format!("Your invoice {} from {}", sale.invoice_number, store.name),
            document: self.renderer.render_text(sale, Some(store)),
            document_name: self.renderer.file_name(sale),
        };

        let summary = self.dispatcher.dispatch(&message).await;

        if let Err(e) = self
            .db
            .notifications()
            .record_all(&summary.to_records(&sale.id))
            .await
        {
            warn!(invoice_number = %sale.invoice_number, error = %e, "Failed to store notification results");
        }

        debug!(
            state = %SaleState::NotificationsDispatched,
            invoice_number = %sale.invoice_number,
            partial_failure = summary.partial_failure
        );

        summary
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Looks up a committed sale by invoice number.
    pub async fn get_invoice(&self, invoice_number: &str) -> SaleResult<Sale> {
        self.db
            .sales()
            .get_by_invoice_number(invoice_number.trim())
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(invoice_number.to_string()).into())
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Moves a sale to another status (refund, cancellation) and audits it.
    pub async fn change_status(
        &self,
        caller: &StaffMember,
        invoice_number: &str,
        status: &str,
        reason: Option<&str>,
    ) -> SaleResult<Sale> {
        let (to, reason) = validate_status_change(status, reason)?;
        let sale = self.get_invoice(invoice_number).await?;

        if !sale.status.can_transition_to(to) {
            return Err(invalid_transition(&sale, to).into());
        }

        let entry = sale_entry(
            &sale.id,
            ACTION_SALE_STATUS_CHANGED,
            &caller.id,
            &json!({
                "invoiceNumber": sale.invoice_number,
                "from": sale.status.as_str(),
                "to": to.as_str(),
                "reason": reason,
            }),
        );

        if !self
            .db
            .sales()
            .update_status(&sale.id, sale.status, to, &entry)
            .await?
        {
            // Someone else changed it first
            let current = self.get_invoice(invoice_number).await?;
            return Err(invalid_transition(&current, to).into());
        }

        info!(
            invoice_number = %sale.invoice_number,
            from = %sale.status,
            to = %to,
            staff_id = %caller.id,
            "Sale status changed"
        );

        self.get_invoice(invoice_number).await
    }
}

// =============================================================================
// Steps
// =============================================================================

/// Explicit store, else the caller's store, else any store for roles that
/// may bill anywhere.
async fn resolve_store(
    tx: &mut SaleTransaction,
    caller: &StaffMember,
    requested: Option<&str>,
) -> SaleResult<Store> {
    if let Some(id) = requested {
        return tx
            .find_store(id)
            .await?
            .ok_or_else(|| CoreError::StoreNotFound(id.to_string()).into());
    }

    if let Some(id) = &caller.store_id {
        match tx.find_store(id).await? {
            Some(store) => return Ok(store),
            None => warn!(staff_id = %caller.id, store_id = %id, "Assigned store does not exist"),
        }
    }

    if caller.role.may_use_any_store() {
        if let Some(store) = tx.first_store().await? {
            debug!(staff_id = %caller.id, store_id = %store.id, "Using fallback store");
            return Ok(store);
        }
    }

    Err(CoreError::StoreRequired.into())
}

/// The customer record wins; request values only fill its gaps.
async fn resolve_customer(
    tx: &mut SaleTransaction,
    validated: &ValidatedSale,
) -> SaleResult<CustomerSnapshot> {
    match &validated.customer_id {
        Some(id) => {
            let customer: Customer = tx
                .find_customer(id)
                .await?
                .ok_or_else(|| CoreError::CustomerNotFound(id.clone()))?;

            Ok(CustomerSnapshot {
                id: Some(customer.id),
                name: customer.name,
                phone: customer.phone.or_else(|| validated.customer_phone.clone()),
                email: customer.email.or_else(|| validated.customer_email.clone()),
            })
        }
        None => Ok(CustomerSnapshot {
            id: None,
            name: validated
                .customer_name
                .clone()
                .unwrap_or_else(|| WALK_IN_CUSTOMER_NAME.to_string()),
            phone: validated.customer_phone.clone(),
            email: validated.customer_email.clone(),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_sale(
    id: String,
    invoice_number: String,
    caller: &StaffMember,
    store: &Store,
    validated: &ValidatedSale,
    customer: CustomerSnapshot,
    reservation: Reservation,
    pricing: &PricingResult,
    now: chrono::DateTime<Utc>,
) -> Sale {
    let adjustments = &validated.adjustments;
    Sale {
        id,
        invoice_number,
        customer_id: customer.id,
        customer_name: customer.name,
        customer_phone: customer.phone,
        customer_email: customer.email,
        items: reservation.items,
        payment_mode: validated.payment_mode,
        subtotal: pricing.subtotal,
        mrp_total: pricing.mrp_total,
        discount: adjustments.discount,
        extra_discount: adjustments.extra_discount,
        total_discount: pricing.total_discount,
        gst_rate: adjustments.gst,
        gst_amount: pricing.gst_amount,
        cgst_rate: adjustments.cgst,
        cgst_amount: pricing.cgst_amount,
        total_tax: pricing.total_tax,
        total_amount: pricing.total_amount,
        savings: pricing.savings,
        store_id: store.id.clone(),
        staff_id: caller.id.clone(),
        status: SaleStatus::Completed,
        notes: validated.notes.clone(),
        sale_date: now,
        created_at: now,
        updated_at: now,
    }
}

fn validate_status_change(
    status: &str,
    reason: Option<&str>,
) -> Result<(SaleStatus, Option<String>), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let to = match status.parse::<SaleStatus>() {
        Ok(s) => Some(s),
        Err(_) => {
            errors.push(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: SaleStatus::ALLOWED.iter().map(|s| s.to_string()).collect(),
            });
            None
        }
    };

    let reason = match reason {
        Some(raw) => match sanitize_text("reason", raw, MAX_NOTES_LEN) {
            Ok(clean) => Some(clean).filter(|s| !s.is_empty()),
            Err(e) => {
                errors.push(e);
                None
            }
        },
        None => None,
    };

    match to {
        Some(to) if errors.is_empty() => Ok((to, reason)),
        _ => Err(errors),
    }
}

/// Error for a guarded decrement that matched no row. `current` is the
/// stock re-read afterwards, `None` when the item was deleted meanwhile.
fn missed_decrement(decrement: &StockDecrement, current: Option<i64>) -> CoreError {
    match current {
        Some(available) => CoreError::InsufficientStock {
            item_id: decrement.item_id.clone(),
            name: decrement.name.clone(),
            available,
            requested: decrement.quantity,
        },
        None => CoreError::ItemNotFound {
            missing: vec![decrement.item_id.clone()],
        },
    }
}

fn invalid_transition(sale: &Sale, to: SaleStatus) -> CoreError {
    CoreError::InvalidStatusTransition {
        invoice_number: sale.invoice_number.clone(),
        from: sale.status.to_string(),
        to: to.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shopdesk_core::{InventoryItem, Money, SaleLineRequest, StaffRole};
    use shopdesk_db::DbConfig;

    struct Fixture {
        service: SaleService,
        db: Database,
        cashier: StaffMember,
        item: InventoryItem,
    }

    async fn fixture() -> Fixture {
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

        let cashier = StaffMember {
            id: Uuid::new_v4().to_string(),
            name: "Cashier".into(),
            role: StaffRole::Cashier,
            store_id: Some(store.id.clone()),
            created_at: now,
        };
        db.staff().insert(&cashier).await.unwrap();

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

        let service = SaleService::new(
            db.clone(),
            NotificationDispatcher::disabled(),
            SaleSettings::default(),
        );

        Fixture {
            service,
            db,
            cashier,
            item,
        }
    }

    fn request(item_id: &str, quantity: i64) -> SaleRequest {
        SaleRequest {
            items: vec![SaleLineRequest {
                item_id: item_id.to_string(),
                quantity,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SaleState::InvoiceNumbered.to_string(), "invoice_numbered");
        assert_eq!(
            SaleState::NotificationsDispatched.to_string(),
            "notifications_dispatched"
        );
    }

    #[test]
    fn test_validate_status_change() {
        let (to, reason) = validate_status_change("cancelled", Some("  wrong item  ")).unwrap();
        assert_eq!(to, SaleStatus::Cancelled);
        assert_eq!(reason.as_deref(), Some("wrong item"));

        let errors = validate_status_change("refunded", None).unwrap_err();
        assert_eq!(errors.iter().next().unwrap().field(), "status");
    }

    #[test]
    fn test_missed_decrement_reports_what_is_left() {
        let decrement = StockDecrement {
            item_id: "rice".into(),
            name: "Basmati Rice 5kg".into(),
            quantity: 6,
            available: 10,
        };

        match missed_decrement(&decrement, Some(4)) {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => assert_eq!((available, requested), (4, 6)),
            other => panic!("unexpected error: {other:?}"),
        }

        match missed_decrement(&decrement, None) {
            CoreError::ItemNotFound { missing } => assert_eq!(missing, vec!["rice".to_string()]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_record_sale_uses_assigned_store() {
        let f = fixture().await;

        let recorded = f
            .service
            .record_sale(&f.cashier, &request(&f.item.id, 2))
            .await
            .unwrap();

        assert_eq!(Some(&recorded.sale.store_id), f.cashier.store_id.as_ref());
        assert_eq!(recorded.sale.customer_name, WALK_IN_CUSTOMER_NAME);
        assert_eq!(recorded.sale.total_amount, Money::from_minor(20000));
        assert!(recorded.notifications.is_none());
        assert_eq!(f.db.inventory().total_stock().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_cashier_without_store_is_rejected() {
        let f = fixture().await;
        let mut drifter = f.cashier.clone();
        drifter.store_id = None;

        let err = f
            .service
            .record_sale(&drifter, &request(&f.item.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::Core(CoreError::StoreRequired)));
    }

    #[tokio::test]
    async fn test_manager_falls_back_to_any_store() {
        let f = fixture().await;
        let mut manager = f.cashier.clone();
        manager.store_id = None;
        manager.role = StaffRole::Manager;

        let recorded = f
            .service
            .record_sale(&manager, &request(&f.item.id, 1))
            .await
            .unwrap();
        assert_eq!(recorded.sale.store_id, f.item.store_id);
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let f = fixture().await;
        let mut req = request(&f.item.id, 1);
        req.customer_id = Some(Uuid::new_v4().to_string());

        let err = f.service.record_sale(&f.cashier, &req).await.unwrap_err();
        assert!(matches!(err, SaleError::Core(CoreError::CustomerNotFound(_))));
        assert_eq!(f.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_customer_record_supplies_contact_details() {
        let f = fixture().await;
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: "Asha Verma".into(),
            phone: None,
            email: Some("asha@example.in".into()),
            created_at: now,
            updated_at: now,
        };
        f.db.customers().insert(&customer).await.unwrap();

        let mut req = request(&f.item.id, 1);
        req.customer_id = Some(customer.id.clone());
        req.customer_name = Some("Someone Else".into());
        req.customer_phone = Some("+919876543210".into());
        req.customer_email = Some("other@example.in".into());

        let sale = f.service.record_sale(&f.cashier, &req).await.unwrap().sale;
        assert_eq!(sale.customer_name, "Asha Verma");
        assert_eq!(sale.customer_email.as_deref(), Some("asha@example.in"));
        assert_eq!(sale.customer_phone.as_deref(), Some("+919876543210"));
        assert!(!sale.is_walk_in());
    }

    #[tokio::test]
    async fn test_audit_entry_written_with_sale() {
        let f = fixture().await;

        let sale = f
            .service
            .record_sale(&f.cashier, &request(&f.item.id, 1))
            .await
            .unwrap()
            .sale;

        let entries = f
            .db
            .audit_log()
            .list_for_entity("SALE", &sale.id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, ACTION_SALE_RECORDED);
        assert_eq!(entries[0].actor_id, f.cashier.id);
    }

    #[tokio::test]
    async fn test_status_change_and_invalid_transition() {
        let f = fixture().await;
        let sale = f
            .service
            .record_sale(&f.cashier, &request(&f.item.id, 1))
            .await
            .unwrap()
            .sale;

        let updated = f
            .service
            .change_status(&f.cashier, &sale.invoice_number, "cancelled", Some("duplicate"))
            .await
            .unwrap();
        assert_eq!(updated.status, SaleStatus::Cancelled);

        let err = f
            .service
            .change_status(&f.cashier, &sale.invoice_number, "partial_refund", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SaleError::Core(CoreError::InvalidStatusTransition { .. })
        ));

        let entries = f
            .db
            .audit_log()
            .list_for_entity("SALE", &sale.id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_get_unknown_invoice() {
        let f = fixture().await;
        let err = f.service.get_invoice("INV-2025-999999").await.unwrap_err();
        assert!(matches!(err, SaleError::Core(CoreError::SaleNotFound(_))));
    }
}
