//! # Error Types
//!
//! Domain-specific error types for shopdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopdesk-core errors (this file)                                      │
//! │  ├── CoreError         - Business rule violations                      │
//! │  ├── ValidationError   - One malformed field                           │
//! │  └── ValidationErrors  - Every malformed field of a request            │
//! │                                                                         │
//! │  shopdesk-db errors (separate crate)                                   │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  billing-api errors (in app)                                           │
//! │  └── ApiError          - What HTTP callers see                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SaleError → ApiError → Caller     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Each variant carries enough detail for the caller to correct the
/// request (which item, how much stock is left).
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more requested inventory items do not exist.
    #[error("Inventory items not found: {}", missing.join(", "))]
    ItemNotFound { missing: Vec<String> },

    /// Insufficient stock to complete the sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Record sale (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Basmati Rice 5kg", available: 2, requested: 5 }
    ///      │
    ///      ▼
    /// Counter shows: "Only 2 Basmati Rice 5kg in stock"
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// A customer reference did not resolve to a customer record.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// An explicit store reference did not resolve to a store.
    #[error("Store not found: {0}")]
    StoreNotFound(String),

    /// No store could be determined for the sale.
    #[error("A store is required to record a sale")]
    StoreRequired,

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Sale is not in a state that allows the requested status change.
    #[error("Sale {invoice_number} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        invoice_number: String,
        from: String,
        to: String,
    },

    /// Request validation failed.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Every variant names the offending field using the request's wire name
/// (`items[2].quantity`, `customerEmail`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {}", allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },

    /// The same value appears more than once.
    #[error("{field} '{value}' is listed more than once")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Returns the wire name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Duplicate { field, .. } => field,
        }
    }
}

/// All validation failures of one request, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        ValidationErrors(Vec::new())
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Records the error of a validator result, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.0.push(e);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        ValidationErrors(vec![error])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item_id: "a".to_string(),
            name: "Basmati Rice 5kg".to_string(),
            available: 2,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Basmati Rice 5kg: available 2, requested 5"
        );

        let err = CoreError::ItemNotFound {
            missing: vec!["x".to_string(), "y".to_string()],
        };
        assert_eq!(err.to_string(), "Inventory items not found: x, y");
    }

    #[test]
    fn test_validation_error_field() {
        let err = ValidationError::OutOfRange {
            field: "items[0].quantity".to_string(),
            min: 1,
            max: 1000,
        };
        assert_eq!(err.field(), "items[0].quantity");
        assert_eq!(err.to_string(), "items[0].quantity must be between 1 and 1000");
    }

    #[test]
    fn test_validation_errors_collects() {
        let mut errors = ValidationErrors::new();
        errors.check(Ok(()));
        errors.check(Err(ValidationError::Required {
            field: "items".to_string(),
        }));
        errors.push(ValidationError::Negative {
            field: "discount".to_string(),
        });

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "items is required; discount must not be negative"
        );
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let errors: ValidationErrors = ValidationError::Required {
            field: "items".to_string(),
        }
        .into();
        let core_err: CoreError = errors.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
