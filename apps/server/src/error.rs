//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  CoreError (expected business outcome)                                  │
//! │       │            ▲                                                    │
//! │       │            │ LedgerError                                        │
//! │       │     DbError (infrastructure)                                    │
//! │       ▼            ▼                                                    │
//! │  ApiError { code, message } ── IntoResponse ──► 4xx/5xx JSON body       │
//! │                                                                         │
//! │  400  validation / stock / payment failures                             │
//! │  404  missing product / serial unit / sale                              │
//! │  409  already voided, invoice-number collision (retryable)              │
//! │  502  KHQR gateway unreachable                                          │
//! │  500  anything unexpected - detail is logged, never returned            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use bayon_core::CoreError;
use bayon_db::{DbError, LedgerError};

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for ESP-DBL: available 3, requested 5"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Serial unit not in stock - including lost allocation races (400)
    Unavailable,

    /// Bulk quantity too low (400)
    InsufficientStock,

    /// Tender does not cover the total, or the gateway rejected it (400)
    PaymentError,

    /// Void/commit conflicts: already voided, invoice collision (409)
    Conflict,

    /// KHQR gateway unreachable (502)
    GatewayError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError
            | ErrorCode::Unavailable
            | ErrorCode::InsufficientStock
            | ErrorCode::PaymentError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::GatewayError => StatusCode::BAD_GATEWAY,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a payment error.
    pub fn payment(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::PaymentError, message)
    }

    /// Creates an opaque internal error; the detail goes to the log only.
    pub fn internal() -> Self {
        ApiError::new(ErrorCode::Internal, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts engine errors to API errors.
///
/// Expected business outcomes keep their descriptive messages; anything
/// unexpected is logged and returned as an opaque 500.
impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Domain(core) => ApiError::from(core),
            err if err.is_invoice_collision() => ApiError::new(
                ErrorCode::Conflict,
                "Invoice number collision, please retry the sale",
            ),
            LedgerError::Db(db) => ApiError::from(db),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_)
            | CoreError::SerialUnitNotFound(_)
            | CoreError::SaleNotFound(_) => ErrorCode::NotFound,
            CoreError::Unavailable { .. } => ErrorCode::Unavailable,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::PaymentInsufficient { .. } => ErrorCode::PaymentError,
            CoreError::AlreadyVoided(_) => ErrorCode::Conflict,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            other => {
                error!(%other, "Database error");
                ApiError::internal()
            }
        }
    }
}

impl From<bayon_core::ValidationError> for ApiError {
    fn from(err: bayon_core::ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
