//! Transaction domain entity.
//! One record per attempted operation against a wallet.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    Deposit,
    Withdraw,
}

impl OperationType {
    pub const ALL: &'static [&'static str] = &["DEPOSIT", "WITHDRAW"];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "DEPOSIT",
            OperationType::Withdraw => "WITHDRAW",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(OperationType::Deposit),
            "WITHDRAW" => Ok(OperationType::Withdraw),
            other => Err(format!("unknown operation type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "COMPLETED" => Ok(TransactionStatus::Completed),
            "FAILED" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

/// A requested balance change. The amount is kept exactly as given;
/// `ExecuteOperation` rejects anything it cannot store without rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operation_type: OperationType,
    pub amount: BigDecimal,
}

impl Operation {
    pub fn new(operation_type: OperationType, amount: BigDecimal) -> Self {
        Self {
            operation_type,
            amount,
        }
    }

    pub fn deposit(amount: BigDecimal) -> Self {
        Self::new(OperationType::Deposit, amount)
    }

    pub fn withdraw(amount: BigDecimal) -> Self {
        Self::new(OperationType::Withdraw, amount)
    }
}

/// Domain entity representing a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub operation_type: OperationType,
    pub amount: BigDecimal,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// A new PENDING record for `operation` against `wallet_id`.
    pub fn pending(wallet_id: Uuid, operation: &Operation) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            operation_type: operation.operation_type,
            amount: operation.amount.clone(),
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_type_parses_upper_case_only() {
        assert_eq!("DEPOSIT".parse::<OperationType>(), Ok(OperationType::Deposit));
        assert_eq!("WITHDRAW".parse::<OperationType>(), Ok(OperationType::Withdraw));
        assert!("deposit".parse::<OperationType>().is_err());
        assert!("INVALID".parse::<OperationType>().is_err());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Completed,
            TransactionStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(status));
        }
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
    }

    #[test]
    fn operation_type_serializes_upper_case() {
        let json = serde_json::to_string(&OperationType::Withdraw).unwrap();
        assert_eq!(json, "\"WITHDRAW\"");
    }

    #[test]
    fn operation_keeps_requested_digits() {
        let op = Operation::withdraw(BigDecimal::from_str("1.239").unwrap());
        assert_eq!(op.amount.to_string(), "1.239");
    }

    #[test]
    fn pending_transaction_copies_operation() {
        let wallet_id = Uuid::new_v4();
        let op = Operation::deposit(BigDecimal::from(5));
        let tx = Transaction::pending(wallet_id, &op);

        assert_eq!(tx.wallet_id, wallet_id);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.amount, op.amount);
        assert_eq!(tx.created_at, tx.updated_at);
    }
}
