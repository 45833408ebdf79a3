//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shopdesk Billing                       │
//! │                                                                         │
//! │  Counter UI                  Rust Backend                               │
//! │  ──────────                  ────────────                               │
//! │                                                                         │
//! │  POST /billing/record-sale                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::QueryFailed("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Domain Error? ─── CoreError::InsufficientStock ── ApiError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Retries spent? ─── SaleError::PersistenceConflict ─────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄──── (status, { code, message, errors[] })                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged in full and answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shopdesk_core::{CoreError, ValidationErrors};
use shopdesk_db::DbError;

use crate::services::sale_service::SaleError;

/// Error returned from every handler.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for Basmati Rice 5kg: available 2, requested 5",
///   "errors": [{ "field": "items", "message": "..." }]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Per-field details; empty unless the request itself was wrong.
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// No store could be determined for the sale (400)
    StoreRequired,

    /// Explicit store id does not exist (400)
    StoreNotFound,

    /// Requested inventory items do not exist (400)
    ItemNotFound,

    /// Insufficient stock (400)
    InsufficientStock,

    /// Customer id does not resolve (400)
    CustomerNotFound,

    /// Missing caller identity (401)
    Unauthenticated,

    /// Sale or invoice not found (404)
    SaleNotFound,

    /// Concurrent writers kept winning (409)
    PersistenceConflict,

    /// Status change not allowed from the current status (409)
    InvalidStatusTransition,

    /// Internal server error (500)
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::StoreRequired
            | ErrorCode::StoreNotFound
            | ErrorCode::ItemNotFound
            | ErrorCode::InsufficientStock
            | ErrorCode::CustomerNotFound => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::SaleNotFound => StatusCode::NOT_FOUND,
            ErrorCode::PersistenceConflict | ErrorCode::InvalidStatusTransition => {
                StatusCode::CONFLICT
            }
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Adds one field-level detail.
    pub fn with_error(mut self, field: Option<&str>, message: impl Into<String>) -> Self {
        self.errors.push(FieldError {
            field: field.map(str::to_string),
            message: message.into(),
        });
        self
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthenticated, message)
    }

    /// Generic 500. The caller logs the cause.
    pub fn internal() -> Self {
        ApiError::new(ErrorCode::InternalError, "An internal error occurred")
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut api = ApiError::new(ErrorCode::ValidationError, "Request validation failed");
        for e in errors.iter() {
            api = api.with_error(Some(e.field()), e.to_string());
        }
        api
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Validation(errors) => errors.into(),
            CoreError::StoreRequired => ApiError::new(ErrorCode::StoreRequired, message)
                .with_error(Some("storeId"), "Provide storeId or assign the caller to a store"),
            CoreError::StoreNotFound(_) => ApiError::new(ErrorCode::StoreNotFound, message)
                .with_error(Some("storeId"), "Store does not exist"),
            CoreError::ItemNotFound { missing } => {
                let mut api = ApiError::new(ErrorCode::ItemNotFound, message);
                for id in missing {
                    api = api.with_error(Some("items"), format!("Item not found: {}", id));
                }
                api
            }
            CoreError::InsufficientStock {
                name,
                available,
                requested,
                ..
            } => ApiError::new(ErrorCode::InsufficientStock, message).with_error(
                Some("items"),
                format!(
                    "Only {} of {} in stock, {} requested",
                    available, name, requested
                ),
            ),
            CoreError::CustomerNotFound(_) => ApiError::new(ErrorCode::CustomerNotFound, message)
                .with_error(Some("customerId"), "Customer does not exist"),
            CoreError::SaleNotFound(_) => ApiError::new(ErrorCode::SaleNotFound, message),
            CoreError::InvalidStatusTransition { .. } => {
                ApiError::new(ErrorCode::InvalidStatusTransition, message)
                    .with_error(Some("status"), "Transition not allowed")
            }
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } if entity == "Sale" => {
                ApiError::new(ErrorCode::SaleNotFound, format!("Sale not found: {}", id))
            }
            e if e.is_conflict() => {
                tracing::warn!(error = %e, "Write conflict reached the API layer");
                ApiError::new(
                    ErrorCode::PersistenceConflict,
                    "The sale conflicted with concurrent activity, please retry",
                )
            }
            e => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, "Database operation failed");
                ApiError::internal()
            }
        }
    }
}

impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        match err {
            SaleError::Core(e) => e.into(),
            SaleError::Db(e) => e.into(),
            SaleError::PersistenceConflict { attempts } => ApiError::new(
                ErrorCode::PersistenceConflict,
                format!(
                    "The sale could not be committed after {} attempts, please retry",
                    attempts
                ),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
