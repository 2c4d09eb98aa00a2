use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{OperationType, Transaction, TransactionStatus};

/// Body of `POST /api/v1/wallets/{wallet_id}/operation`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OperationRequest {
    /// `DEPOSIT` or `WITHDRAW`.
    #[schema(example = "DEPOSIT")]
    pub operation_type: String,
    /// Positive amount with at most two decimal places.
    #[schema(value_type = String, example = "1000.00")]
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(value_type = String, example = "150.75")]
    pub balance: BigDecimal,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub operation_type: OperationType,
    #[schema(value_type = String, example = "40.00")]
    pub amount: BigDecimal,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            wallet_id: tx.wallet_id,
            operation_type: tx.operation_type,
            amount: tx.amount,
            status: tx.status,
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}
