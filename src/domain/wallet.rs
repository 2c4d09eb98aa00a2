use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{max_balance, to_money, zero_balance, OperationType};

/// Domain entity representing a wallet and its current balance.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub id: Uuid,
    pub balance: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// A freshly opened wallet with a zero balance.
    pub fn open(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            balance: zero_balance(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_cover(&self, amount: &BigDecimal) -> bool {
        &self.balance >= amount
    }

    /// Whether depositing `amount` keeps the balance within `max_balance()`.
    pub fn can_accept(&self, amount: &BigDecimal) -> bool {
        &self.balance + amount <= max_balance()
    }

    /// Balance after applying `amount` in the direction of `operation_type`.
    /// Does not check for overdraft.
    pub fn balance_after(&self, operation_type: OperationType, amount: &BigDecimal) -> BigDecimal {
        let next = match operation_type {
            OperationType::Deposit => &self.balance + amount,
            OperationType::Withdraw => &self.balance - amount,
        };
        to_money(next)
    }
}
