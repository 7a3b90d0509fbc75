//! Error handling for the supply restock service
//!
//! Per-item soft failures (unknown SKU, insufficient stock) never reach this
//! type; they are reported inside batch results. Everything here is a
//! structural failure surfaced to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::TransitionError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Stock item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource belongs to a different owner")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// True for the storage-failure kind
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, AppError::StorageError(_) | AppError::DatabaseError(_))
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NonPositiveQuantity(_) => {
                AppError::validation("ordered_quantity", err.to_string())
            }
            TransitionError::NotAllowed { .. } => AppError::InvalidTransition(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "Invalid value".to_string());
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("input".to_string(), "Invalid input".to_string()));
        AppError::Validation { field, message }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::ItemNotFound(sku) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("ITEM_NOT_FOUND", format!("Stock item {} not found", sku)),
            ),
            AppError::InvalidTransition(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("INVALID_TRANSITION", msg.clone()),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_INPUT".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::Unauthorized => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new("UNAUTHORIZED", "Resource belongs to a different owner"),
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", msg.clone()),
            ),
            AppError::StorageError(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new("STORAGE_FAILURE", format!("Storage error: {}", msg)),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new("STORAGE_FAILURE", "A database error occurred"),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("CONFIGURATION_ERROR", format!("Configuration error: {}", msg)),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for services and handlers
pub type AppResult<T> = Result<T, AppError>;
