//! # Invoice Document
//!
//! Renders a committed sale into the plain-text invoice attached to
//! notifications.
//!
//! ## Layout
//! ```text
//! ========================================
//!           Shopdesk Main Street
//!          12 Main Street, Pune
//!    Phone: +912012345678  GSTIN: 27AB...
//! ========================================
//! Invoice: INV-2025-000042
//! Date:    01-03-2025 10:00
//! Customer: Asha Verma
//! Payment: upi
//! ----------------------------------------
//! Item                  Qty        Amount
//! Basmati Rice 5kg        3     Rs 300.00
//! ----------------------------------------
//! Subtotal                      Rs 300.00
//! Discount                      Rs  10.00
//! GST (9%)                      Rs  26.10
//! TOTAL                         Rs 316.10
//! You saved                     Rs  43.90
//! ========================================
//! ```

use shopdesk_core::{Money, Sale, Store};
use std::fmt::Write;

const WIDTH: usize = 40;

/// Renders invoice documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer;

impl DocumentRenderer {
    pub fn new() -> Self {
        DocumentRenderer
    }

    /// Plain-text invoice for `sale`, headed with `store` when known.
    pub fn render_text(&self, sale: &Sale, store: Option<&Store>) -> String {
        let mut out = String::new();
        let rule = "=".repeat(WIDTH);
        let thin = "-".repeat(WIDTH);

        // Writing into a String cannot fail
        let _ = writeln!(out, "{}", rule);
        if let Some(store) = store {
            let _ = writeln!(out, "{}", center(&store.name));
            if let Some(address) = &store.address {
                let _ = writeln!(out, "{}", center(address));
            }
            let mut contact = Vec::new();
            if let Some(phone) = &store.phone {
                contact.push(format!("Phone: {}", phone));
            }
            if let Some(gstin) = &store.gstin {
                contact.push(format!("GSTIN: {}", gstin));
            }
            if !contact.is_empty() {
                let _ = writeln!(out, "{}", center(&contact.join("  ")));
            }
            let _ = writeln!(out, "{}", rule);
        }

        let _ = writeln!(out, "Invoice: {}", sale.invoice_number);
        let _ = writeln!(out, "Date:    {}", sale.sale_date.format("%d-%m-%Y %H:%M"));
        let _ = writeln!(out, "Customer: {}", sale.customer_name);
        let _ = writeln!(out, "Payment: {}", sale.payment_mode);
        let _ = writeln!(out, "{}", thin);

        let _ = writeln!(out, "{:<22}{:>4}{:>14}", "Item", "Qty", "Amount");
        for line in &sale.items {
            let _ = writeln!(
                out,
                "{:<22}{:>4}{:>14}",
                truncate(&line.name_snapshot, 21),
                line.quantity,
                line.total_price.to_string()
            );
        }
        let _ = writeln!(out, "{}", thin);

        amount_row(&mut out, "Subtotal", sale.subtotal);
        if !sale.total_discount.is_zero() {
            amount_row(&mut out, "Discount", sale.total_discount);
        }
        if !sale.gst_rate.is_zero() {
            amount_row(
                &mut out,
                &format!("GST ({}%)", sale.gst_rate.percentage()),
                sale.gst_amount,
            );
        }
        if !sale.cgst_rate.is_zero() {
            amount_row(
                &mut out,
                &format!("CGST ({}%)", sale.cgst_rate.percentage()),
                sale.cgst_amount,
            );
        }
        amount_row(&mut out, "TOTAL", sale.total_amount);
        if !sale.savings.is_zero() {
            amount_row(&mut out, "You saved", sale.savings);
        }
        let _ = writeln!(out, "{}", rule);

        out
    }

    /// File name of the attachment.
    pub fn file_name(&self, sale: &Sale) -> String {
        format!("{}.txt", sale.invoice_number)
    }
}

fn amount_row(out: &mut String, label: &str, amount: Money) {
    let _ = writeln!(out, "{:<26}{:>14}", label, amount.to_string());
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= WIDTH {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((WIDTH - len) / 2), text)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shopdesk_core::{InventoryItem, PaymentMode, SaleItem, SaleStatus, TaxRate};

    fn sale() -> Sale {
        let now = Utc::now();
        let item = InventoryItem {
            id: "item-1".into(),
            store_id: "store-1".into(),
            name: "Basmati Rice 5kg".into(),
            brand: None,
            sku: None,
            sell_price: Money::from_minor(10000),
            mrp_price: Money::from_minor(12000),
            stock_qty: 10,
            created_at: now,
            updated_at: now,
        };
        Sale {
            id: "sale-1".into(),
            invoice_number: "INV-2025-000042".into(),
            customer_id: None,
            customer_name: "Walk-in Customer".into(),
            customer_phone: None,
            customer_email: None,
            items: vec![SaleItem::snapshot("l1".into(), "sale-1", 0, &item, 3, now)],
            payment_mode: PaymentMode::Upi,
            subtotal: Money::from_minor(30000),
            mrp_total: Money::from_minor(36000),
            discount: Money::from_minor(1000),
            extra_discount: Money::zero(),
            total_discount: Money::from_minor(1000),
            gst_rate: TaxRate::from_bps(900),
            gst_amount: Money::from_minor(2610),
            cgst_rate: TaxRate::zero(),
            cgst_amount: Money::zero(),
            total_tax: Money::from_minor(2610),
            total_amount: Money::from_minor(31610),
            savings: Money::from_minor(4390),
            store_id: "store-1".into(),
            staff_id: "staff-1".into(),
            status: SaleStatus::Completed,
            notes: None,
            sale_date: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_render_contains_totals() {
        let text = DocumentRenderer::new().render_text(&sale(), None);

        assert!(text.contains("Invoice: INV-2025-000042"));
        assert!(text.contains("Basmati Rice 5kg"));
        assert!(text.contains("GST (9%)"));
        assert!(text.contains("Rs 316.10"));
        assert!(text.contains("You saved"));
        assert!(!text.contains("CGST"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            DocumentRenderer::new().file_name(&sale()),
            "INV-2025-000042.txt"
        );
    }
}
