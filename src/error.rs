use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bigdecimal::BigDecimal;
use serde_json::json;
use thiserror::Error;

use crate::ports::RepositoryError;
use crate::validation::ValidationError;

/// Failures of the ledger core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: BigDecimal,
        requested: BigDecimal,
    },

    #[error("Balance limit exceeded: balance {balance}, requested {requested}, limit {limit}")]
    BalanceLimitExceeded {
        balance: BigDecimal,
        requested: BigDecimal,
        limit: BigDecimal,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl From<RepositoryError> for LedgerError {
    fn from(err: RepositoryError) -> Self {
        LedgerError::StorageUnavailable(err.to_string())
    }
}

impl LedgerError {
    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::StorageUnavailable(_))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InsufficientFunds(String),

    #[error("{0}")]
    LimitExceeded(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    Unprocessable(String),

    #[error("Internal server error")]
    Storage(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InsufficientFunds(_)
            | AppError::LimitExceeded(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { .. } => AppError::InsufficientFunds(err.to_string()),
            LedgerError::BalanceLimitExceeded { .. } => AppError::LimitExceeded(err.to_string()),
            LedgerError::StorageUnavailable(detail) => AppError::Storage(detail),
            LedgerError::InvalidAmount(_) => AppError::Unprocessable(err.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Storage(detail) | AppError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
            }
            _ => {}
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
