use utoipa::OpenApi;

use crate::domain::{OperationType, TransactionStatus};
use crate::handlers;
use crate::health::{DependencyStatus, HealthResponse};
use crate::schemas::{BalanceResponse, ErrorResponse, OperationRequest, TransactionResponse};

#[derive(OpenApi)]
#[openapi(
    info(title = "Wallet API", description = "Wallet balances and auditable deposit/withdraw operations"),
    paths(
        handlers::wallets::get_balance,
        handlers::wallets::wallet_operation,
        handlers::wallets::list_transactions,
        handlers::health,
    ),
    components(schemas(
        OperationRequest,
        BalanceResponse,
        TransactionResponse,
        ErrorResponse,
        OperationType,
        TransactionStatus,
        HealthResponse,
        DependencyStatus,
    )),
    tags(
        (name = "Wallets", description = "Balance queries and operations"),
        (name = "Health", description = "Storage connectivity probe")
    )
)]
pub struct ApiDoc;
