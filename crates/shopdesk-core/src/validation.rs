//! # Validation Module
//!
//! Input validation and sanitization for sale requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: axum extractor                                               │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules (ranges, formats, allowed values)                     │
//! │  ├── Sanitization (trim, control characters, length caps)              │
//! │  └── Every violation collected, not just the first                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE invoice_number                                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopdesk_core::validation::{validate_quantity, validate_uuid};
//!
//! validate_quantity("items[0].quantity", 5).unwrap();
//! validate_uuid("storeId", "550e8400-e29b-41d4-a716-446655440000").unwrap();
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationErrors};
use crate::money::Money;
use crate::pricing::PriceAdjustments;
use crate::reservation::RequestedItem;
use crate::types::{PaymentMode, TaxRate};
use crate::{MAX_AMOUNT_MINOR, MAX_ITEM_QUANTITY, MAX_SALE_LINES};

/// Result type for single-field validators.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted customer name, after trimming.
pub const MAX_NAME_LEN: usize = 100;

/// Longest accepted sale note, after trimming.
pub const MAX_NOTES_LEN: usize = 500;

const MAX_EMAIL_LEN: usize = 254;

// =============================================================================
// Request Types
// =============================================================================

/// One line of a record-sale request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleLineRequest {
    pub item_id: String,
    pub quantity: i64,
}

/// The record-sale request body, as sent by the counter.
///
/// Money is in minor units; `gst` and `cgst` are percentages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleRequest {
    pub items: Vec<SaleLineRequest>,
    pub payment_mode: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub discount: i64,
    pub extra_discount: i64,
    pub store_id: Option<String>,
    pub gst: Option<f64>,
    pub cgst: Option<f64>,
    pub notes: Option<String>,
    pub send_email: bool,
}

/// A request that passed every rule, with text already sanitized.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSale {
    pub items: Vec<RequestedItem>,
    pub payment_mode: PaymentMode,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub adjustments: PriceAdjustments,
    pub store_id: Option<String>,
    pub notes: Option<String>,
    pub send_email: bool,
}

// =============================================================================
// Request Validation
// =============================================================================

/// Validates a whole sale request.
///
/// ## Flow
/// ```text
/// SaleRequest
///      │
///      ├── items: non-empty, ≤ 100 lines, UUID ids, no duplicates, qty 1..=1000
///      ├── paymentMode: cash | upi | credit | card (absent → cash)
///      ├── customerId / storeId: UUID when present
///      ├── customerName / notes: sanitized, length-capped
///      ├── customerPhone / customerEmail: format checked
///      ├── discount / extraDiscount: 0..=MAX_AMOUNT_MINOR
///      └── gst / cgst: 0..=100 percent
///      │
///      ▼
/// Ok(ValidatedSale) or Err(every violation)
/// ```
pub fn validate_sale_request(req: &SaleRequest) -> Result<ValidatedSale, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    // Items
    if req.items.is_empty() {
        errors.push(ValidationError::Required {
            field: "items".to_string(),
        });
    } else if req.items.len() > MAX_SALE_LINES {
        errors.push(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(req.items.len());
    for (i, line) in req.items.iter().enumerate() {
        let id_field = format!("items[{}].itemId", i);
        let item_id = line.item_id.trim().to_string();

        match validate_uuid(&id_field, &item_id) {
            Ok(()) => {
                if !seen.insert(item_id.to_lowercase()) {
                    errors.push(ValidationError::Duplicate {
                        field: id_field,
                        value: item_id.clone(),
                    });
                }
            }
            Err(e) => errors.push(e),
        }

        errors.check(validate_quantity(
            &format!("items[{}].quantity", i),
            line.quantity,
        ));

        items.push(RequestedItem {
            item_id,
            quantity: line.quantity,
        });
    }

    // Payment mode
    let payment_mode = match req.payment_mode.as_deref().map(str::trim) {
        None | Some("") => PaymentMode::default(),
        Some(raw) => match raw.parse::<PaymentMode>() {
            Ok(mode) => mode,
            Err(_) => {
                errors.push(ValidationError::NotAllowed {
                    field: "paymentMode".to_string(),
                    allowed: PaymentMode::ALLOWED.iter().map(|s| s.to_string()).collect(),
                });
                PaymentMode::default()
            }
        },
    };

    // References
    let customer_id = non_blank(req.customer_id.as_deref());
    if let Some(id) = &customer_id {
        errors.check(validate_uuid("customerId", id));
    }
    let store_id = non_blank(req.store_id.as_deref());
    if let Some(id) = &store_id {
        errors.check(validate_uuid("storeId", id));
    }

    // Free text
    let customer_name = match req.customer_name.as_deref() {
        Some(raw) => match sanitize_text("customerName", raw, MAX_NAME_LEN) {
            Ok(clean) => Some(clean).filter(|s| !s.is_empty()),
            Err(e) => {
                errors.push(e);
                None
            }
        },
        None => None,
    };
    let notes = match req.notes.as_deref() {
        Some(raw) => match sanitize_text("notes", raw, MAX_NOTES_LEN) {
            Ok(clean) => Some(clean).filter(|s| !s.is_empty()),
            Err(e) => {
                errors.push(e);
                None
            }
        },
        None => None,
    };

    let customer_phone = non_blank(req.customer_phone.as_deref());
    if let Some(phone) = &customer_phone {
        errors.check(validate_phone("customerPhone", phone));
    }
    let customer_email = non_blank(req.customer_email.as_deref());
    if let Some(email) = &customer_email {
        errors.check(validate_email("customerEmail", email));
    }

    // Amounts
    errors.check(validate_non_negative_money("discount", req.discount));
    errors.check(validate_non_negative_money("extraDiscount", req.extra_discount));

    let gst = tax_rate("gst", req.gst, &mut errors);
    let cgst = tax_rate("cgst", req.cgst, &mut errors);

    errors.into_result(ValidatedSale {
        items,
        payment_mode,
        customer_id,
        customer_name,
        customer_phone,
        customer_email,
        adjustments: PriceAdjustments {
            discount: Money::from_minor(req.discount),
            extra_discount: Money::from_minor(req.extra_discount),
            gst,
            cgst,
        },
        store_id,
        notes,
        send_email: req.send_email,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn tax_rate(field: &str, pct: Option<f64>, errors: &mut ValidationErrors) -> TaxRate {
    match pct {
        None => TaxRate::zero(),
        Some(pct) => match validate_tax_percentage(field, pct) {
            Ok(()) => TaxRate::from_percentage(pct),
            Err(e) => {
                errors.push(e);
                TaxRate::zero()
            }
        },
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Trims, drops control characters and enforces a length cap.
///
/// ## Example
/// ```rust
/// use shopdesk_core::validation::sanitize_text;
///
/// assert_eq!(sanitize_text("notes", "  paid\u{0007} in full ", 500).unwrap(), "paid in full");
/// assert!(sanitize_text("notes", &"x".repeat(501), 500).is_err());
/// ```
pub fn sanitize_text(field: &str, raw: &str, max: usize) -> ValidationResult<String> {
    let clean: String = raw.chars().filter(|c| !c.is_control()).collect();
    let clean = clean.trim().to_string();

    if clean.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(clean)
}

/// Validates a phone number: 7 to 15 digits, optionally prefixed with `+`.
///
/// Spaces and hyphens are tolerated as separators.
pub fn validate_phone(field: &str, phone: &str) -> ValidationResult<()> {
    let body = phone.trim().strip_prefix('+').unwrap_or(phone.trim());
    let digits: String = body.chars().filter(|c| *c != ' ' && *c != '-').collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) || !(7..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be 7 to 15 digits, optionally starting with +".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address loosely: `local@domain.tld`, no whitespace.
///
/// ## Example
/// ```rust
/// use shopdesk_core::validation::validate_email;
///
/// assert!(validate_email("customerEmail", "asha@example.in").is_ok());
/// assert!(validate_email("customerEmail", "asha@localhost").is_err());
/// ```
pub fn validate_email(field: &str, email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid email address".to_string(),
    };

    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_ITEM_QUANTITY (1000)
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount in minor units: zero up to [`MAX_AMOUNT_MINOR`].
pub fn validate_non_negative_money(field: &str, minor: i64) -> ValidationResult<()> {
    if minor < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if minor > MAX_AMOUNT_MINOR {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_MINOR,
        });
    }

    Ok(())
}

/// Validates a tax rate given as a percentage (0 to 100).
pub fn validate_tax_percentage(field: &str, pct: f64) -> ValidationResult<()> {
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use shopdesk_core::validation::validate_uuid;
///
/// assert!(validate_uuid("storeId", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("storeId", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RICE: &str = "550e8400-e29b-41d4-a716-446655440000";
    const DAL: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";

    fn line(id: &str, qty: i64) -> SaleLineRequest {
        SaleLineRequest {
            item_id: id.to_string(),
            quantity: qty,
        }
    }

    fn request() -> SaleRequest {
        SaleRequest {
            items: vec![line(RICE, 3)],
            discount: 1000,
            ..Default::default()
        }
    }

    fn fields(errors: &ValidationErrors) -> Vec<String> {
        errors.iter().map(|e| e.field().to_string()).collect()
    }

    #[test]
    fn test_minimal_request_defaults() {
        let validated = validate_sale_request(&request()).unwrap();

        assert_eq!(validated.payment_mode, PaymentMode::Cash);
        assert_eq!(validated.items, vec![RequestedItem { item_id: RICE.into(), quantity: 3 }]);
        assert_eq!(validated.adjustments.discount.minor(), 1000);
        assert!(validated.adjustments.gst.is_zero());
        assert!(validated.customer_id.is_none());
        assert!(!validated.send_email);
    }

    #[test]
    fn test_deserializes_camel_case_body() {
        let body = r#"{
            "items": [{"itemId": "550e8400-e29b-41d4-a716-446655440000", "quantity": 2}],
            "paymentMode": "upi",
            "extraDiscount": 500,
            "gst": 9,
            "cgst": 9,
            "sendEmail": true
        }"#;
        let req: SaleRequest = serde_json::from_str(body).unwrap();
        let validated = validate_sale_request(&req).unwrap();

        assert_eq!(validated.payment_mode, PaymentMode::Upi);
        assert_eq!(validated.adjustments.extra_discount.minor(), 500);
        assert_eq!(validated.adjustments.gst.bps(), 900);
        assert_eq!(validated.adjustments.cgst.bps(), 900);
        assert!(validated.send_email);
    }

    #[test]
    fn test_empty_items_rejected() {
        let req = SaleRequest::default();
        let errors = validate_sale_request(&req).unwrap_err();
        assert_eq!(fields(&errors), vec!["items"]);
    }

    #[test]
    fn test_too_many_lines_rejected() {
        let req = SaleRequest {
            items: (0..=MAX_SALE_LINES)
                .map(|_| line(&uuid::Uuid::new_v4().to_string(), 1))
                .collect(),
            ..Default::default()
        };
        let errors = validate_sale_request(&req).unwrap_err();
        assert_eq!(fields(&errors), vec!["items"]);
    }

    #[test]
    fn test_collects_every_violation() {
        let req = SaleRequest {
            items: vec![line("nope", 0), line(DAL, 1001)],
            payment_mode: Some("cheque".into()),
            customer_email: Some("not-an-email".into()),
            discount: -1,
            gst: Some(120.0),
            ..Default::default()
        };
        let errors = validate_sale_request(&req).unwrap_err();

        assert_eq!(
            fields(&errors),
            vec![
                "items[0].itemId",
                "items[0].quantity",
                "items[1].quantity",
                "paymentMode",
                "customerEmail",
                "discount",
                "gst",
            ]
        );
    }

    #[test]
    fn test_discounts_are_capped() {
        let req = SaleRequest {
            items: vec![line(RICE, 1)],
            discount: i64::MAX,
            extra_discount: MAX_AMOUNT_MINOR + 1,
            ..Default::default()
        };
        let errors = validate_sale_request(&req).unwrap_err();
        assert_eq!(fields(&errors), vec!["discount", "extraDiscount"]);

        let req = SaleRequest {
            discount: MAX_AMOUNT_MINOR,
            ..req
        };
        let errors = validate_sale_request(&req).unwrap_err();
        assert_eq!(fields(&errors), vec!["extraDiscount"]);
    }

    #[test]
    fn test_duplicate_item_ids_rejected() {
        let req = SaleRequest {
            items: vec![line(RICE, 1), line(&RICE.to_uppercase(), 2)],
            ..Default::default()
        };
        let errors = validate_sale_request(&req).unwrap_err();

        assert!(matches!(
            errors.iter().next(),
            Some(ValidationError::Duplicate { field, .. }) if field == "items[1].itemId"
        ));
    }

    #[test]
    fn test_text_is_sanitized() {
        let req = SaleRequest {
            customer_name: Some("  Asha\u{0000} Verma ".into()),
            notes: Some("   ".into()),
            customer_phone: Some(" ".into()),
            ..request()
        };
        let validated = validate_sale_request(&req).unwrap();

        assert_eq!(validated.customer_name.as_deref(), Some("Asha Verma"));
        assert!(validated.notes.is_none());
        assert!(validated.customer_phone.is_none());
    }

    #[test]
    fn test_long_name_rejected() {
        let req = SaleRequest {
            customer_name: Some("A".repeat(MAX_NAME_LEN + 1)),
            ..request()
        };
        let errors = validate_sale_request(&req).unwrap_err();
        assert_eq!(fields(&errors), vec!["customerName"]);
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("p", "9876543210").is_ok());
        assert!(validate_phone("p", "+91 98765-43210").is_ok());
        assert!(validate_phone("p", "12345").is_err());
        assert!(validate_phone("p", "98765abc10").is_err());
        assert!(validate_phone("p", "+1234567890123456").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("e", "asha@example.in").is_ok());
        assert!(validate_email("e", "a.b+c@shop.co.in").is_ok());
        assert!(validate_email("e", "@example.in").is_err());
        assert!(validate_email("e", "asha@").is_err());
        assert!(validate_email("e", "asha@@example.in").is_err());
        assert!(validate_email("e", "asha verma@example.in").is_err());
        assert!(validate_email("e", "asha@example.").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("q", 1).is_ok());
        assert!(validate_quantity("q", 1000).is_ok());
        assert!(validate_quantity("q", 0).is_err());
        assert!(validate_quantity("q", -3).is_err());
        assert!(validate_quantity("q", 1001).is_err());
    }

    #[test]
    fn test_validate_tax_percentage() {
        assert!(validate_tax_percentage("gst", 0.0).is_ok());
        assert!(validate_tax_percentage("gst", 100.0).is_ok());
        assert!(validate_tax_percentage("gst", -0.5).is_err());
        assert!(validate_tax_percentage("gst", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", RICE).is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }
}
