//! Framework-agnostic ledger entities.

pub mod transaction;
pub mod wallet;

use bigdecimal::BigDecimal;

pub use transaction::{Operation, OperationType, Transaction, TransactionStatus};
pub use wallet::Wallet;

/// Number of fractional digits stored for balances and amounts.
pub const MONEY_SCALE: i64 = 2;

/// Normalizes a decimal to the storage scale.
pub fn to_money(value: BigDecimal) -> BigDecimal {
    value.with_scale(MONEY_SCALE)
}

/// The balance of a wallet that has never been written.
pub fn zero_balance() -> BigDecimal {
    to_money(BigDecimal::from(0))
}

/// Largest balance a wallet may hold, the ceiling of a `NUMERIC(15,2)` column.
pub fn max_balance() -> BigDecimal {
    BigDecimal::new(999_999_999_999_999i64.into(), MONEY_SCALE)
}
