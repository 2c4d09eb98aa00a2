pub mod execute_operation;
pub mod get_balance;
pub mod list_wallet_transactions;

pub use execute_operation::{ExecuteOperation, OperationOutcome};
pub use get_balance::GetBalance;
pub use list_wallet_transactions::ListWalletTransactions;
