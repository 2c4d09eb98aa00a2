//! Execute operation use case.
//! Applies a deposit or withdrawal to a wallet as one unit of work.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    max_balance, to_money, Operation, OperationType, Transaction, TransactionStatus, Wallet,
};
use crate::error::LedgerError;
use crate::ports::{LedgerStore, LedgerUnit};
use crate::validation;

/// Committed state after a successful operation.
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    pub wallet: Wallet,
    pub transaction: Transaction,
}

/// Result of the in-lock part of an operation, decided before commit.
enum Decision {
    Applied(OperationOutcome),
    Rejected(LedgerError),
}

pub struct ExecuteOperation {
    store: Arc<dyn LedgerStore>,
}

impl ExecuteOperation {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Locks the wallet (creating it at zero if unknown), records a PENDING
    /// transaction, then either applies the mutation or marks the record
    /// FAILED on overdraft or when the balance cap would be passed. Both paths
    /// commit; only storage failures roll back.
    pub async fn execute(
        &self,
        wallet_id: Uuid,
        operation: Operation,
    ) -> Result<OperationOutcome, LedgerError> {
        let operation = checked(operation)?;

        let mut unit = self.store.begin().await?;

        let decision = match apply(unit.as_mut(), wallet_id, &operation).await {
            Ok(decision) => decision,
            Err(err) => {
                if let Err(rollback_err) = unit.rollback().await {
                    tracing::warn!(%wallet_id, error = %rollback_err, "rollback failed");
                }
                tracing::error!(%wallet_id, error = %err, "operation rolled back");
                return Err(err);
            }
        };

        unit.commit().await.map_err(|e| {
            tracing::error!(%wallet_id, error = %e, "commit failed, operation rolled back");
            LedgerError::from(e)
        })?;

        match decision {
            Decision::Applied(outcome) => {
                tracing::info!(
                    %wallet_id,
                    transaction_id = %outcome.transaction.id,
                    operation_type = %operation.operation_type,
                    amount = %operation.amount,
                    balance = %outcome.wallet.balance,
                    "operation completed"
                );
                Ok(outcome)
            }
            Decision::Rejected(err) => {
                tracing::info!(
                    %wallet_id,
                    operation_type = %operation.operation_type,
                    amount = %operation.amount,
                    reason = %err,
                    "operation rejected"
                );
                Err(err)
            }
        }
    }
}

async fn apply(
    unit: &mut dyn LedgerUnit,
    wallet_id: Uuid,
    operation: &Operation,
) -> Result<Decision, LedgerError> {
    let wallet = match unit.lock_wallet(wallet_id).await? {
        Some(wallet) => wallet,
        None => {
            tracing::debug!(%wallet_id, "opening wallet on first operation");
            unit.create_wallet(wallet_id).await?
        }
    };

    let pending = unit
        .insert_transaction(&Transaction::pending(wallet_id, operation))
        .await?;

    if let Some(reason) = rejection(&wallet, operation) {
        unit.set_transaction_status(pending.id, TransactionStatus::Failed)
            .await?;
        return Ok(Decision::Rejected(reason));
    }

    let balance = wallet.balance_after(operation.operation_type, &operation.amount);
    let wallet = unit.update_balance(wallet_id, &balance).await?;
    let transaction = unit
        .set_transaction_status(pending.id, TransactionStatus::Completed)
        .await?;

    Ok(Decision::Applied(OperationOutcome { wallet, transaction }))
}

/// Amount must be positive, within the per-operation limit and exact at
/// the money scale. Normalizes it to that scale.
fn checked(operation: Operation) -> Result<Operation, LedgerError> {
    validation::validate_operation_amount(&operation.amount)
        .map_err(|e| LedgerError::InvalidAmount(e.to_string()))?;

    Ok(Operation {
        amount: to_money(operation.amount),
        ..operation
    })
}

fn rejection(wallet: &Wallet, operation: &Operation) -> Option<LedgerError> {
    match operation.operation_type {
        OperationType::Withdraw if !wallet.can_cover(&operation.amount) => {
            Some(LedgerError::InsufficientFunds {
                available: wallet.balance.clone(),
                requested: operation.amount.clone(),
            })
        }
        OperationType::Deposit if !wallet.can_accept(&operation.amount) => {
            Some(LedgerError::BalanceLimitExceeded {
                balance: wallet.balance.clone(),
                requested: operation.amount.clone(),
                limit: max_balance(),
            })
        }
        _ => None,
    }
}
