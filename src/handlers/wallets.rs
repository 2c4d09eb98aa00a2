use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use crate::domain::Operation;
use crate::error::AppError;
use crate::schemas::{BalanceResponse, OperationRequest, Pagination, TransactionResponse};
use crate::use_cases::{ExecuteOperation, GetBalance, ListWalletTransactions};
use crate::validation::{self, ValidationError};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/wallets/{wallet_id}",
    params(("wallet_id" = String, Path, description = "Wallet UUID")),
    responses(
        (status = 200, description = "Current balance, 0 for unknown wallets", body = BalanceResponse),
        (status = 400, description = "Malformed wallet id", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "Wallets"
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let wallet_id = validation::parse_wallet_id(&wallet_id)?;

    let balance = GetBalance::new(state.store.clone())
        .execute(wallet_id)
        .await?;

    Ok(Json(BalanceResponse { balance }))
}

#[utoipa::path(
    post,
    path = "/api/v1/wallets/{wallet_id}/operation",
    params(("wallet_id" = String, Path, description = "Wallet UUID")),
    request_body = OperationRequest,
    responses(
        (status = 200, description = "Operation applied, new balance", body = BalanceResponse),
        (status = 400, description = "Malformed wallet id, insufficient funds or balance limit", body = ErrorResponse),
        (status = 422, description = "Invalid operation body", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "Wallets"
)]
pub async fn wallet_operation(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
    payload: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let wallet_id = validation::parse_wallet_id(&wallet_id)?;

    let Json(request) = payload.map_err(|e| AppError::Unprocessable(e.body_text()))?;
    let operation = parse_operation(request).map_err(|e| AppError::Unprocessable(e.to_string()))?;

    let outcome = ExecuteOperation::new(state.store.clone())
        .execute(wallet_id, operation)
        .await?;

    Ok(Json(BalanceResponse {
        balance: outcome.wallet.balance,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/wallets/{wallet_id}/transactions",
    params(("wallet_id" = String, Path, description = "Wallet UUID"), Pagination),
    responses(
        (status = 200, description = "Transactions of the wallet, newest first", body = [TransactionResponse]),
        (status = 400, description = "Malformed wallet id or pagination", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "Wallets"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let wallet_id = validation::parse_wallet_id(&wallet_id)?;
    let Query(pagination) = pagination.map_err(|e| AppError::Validation(e.body_text()))?;

    if matches!(pagination.limit, Some(limit) if limit < 1) {
        return Err(ValidationError::new("limit", "must be at least 1").into());
    }
    if matches!(pagination.offset, Some(offset) if offset < 0) {
        return Err(ValidationError::new("offset", "must not be negative").into());
    }

    let transactions = ListWalletTransactions::new(state.store.clone())
        .execute(wallet_id, pagination.limit, pagination.offset)
        .await?;

    Ok(Json(
        transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
    ))
}

fn parse_operation(request: OperationRequest) -> Result<Operation, ValidationError> {
    let operation_type = validation::parse_operation_type(&request.operation_type)?;
    validation::validate_operation_amount(&request.amount)?;
    Ok(Operation::new(operation_type, request.amount))
}
