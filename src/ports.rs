//! Storage ports the ledger core depends on.
//! Adapters live in `crate::adapters`.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Transaction, TransactionStatus, Wallet};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("timed out waiting for lock on wallet {0}")]
    LockTimeout(Uuid),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row not found".to_string()),
            other => RepositoryError::Unavailable(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Durable, transactional storage of wallets and their transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a unit of work. Everything written through the returned unit
    /// becomes visible atomically on `commit`.
    async fn begin(&self) -> RepositoryResult<Box<dyn LedgerUnit>>;

    /// Committed balance of a wallet, `None` if it was never written.
    async fn balance(&self, wallet_id: Uuid) -> RepositoryResult<Option<BigDecimal>>;

    /// Committed transactions of a wallet, newest first.
    async fn list_transactions(
        &self,
        wallet_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Transaction>>;

    /// Connectivity probe.
    async fn ping(&self) -> RepositoryResult<()>;
}

/// A single unit of work against the ledger.
///
/// Dropping a unit without calling `commit` discards its writes and releases
/// any wallet lock it holds.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Takes the exclusive lock on a wallet and returns its current row.
    /// Returns `None` if the wallet does not exist yet.
    async fn lock_wallet(&mut self, wallet_id: Uuid) -> RepositoryResult<Option<Wallet>>;

    /// Creates a zero-balance wallet and returns it, locked by this unit.
    async fn create_wallet(&mut self, wallet_id: Uuid) -> RepositoryResult<Wallet>;

    async fn update_balance(
        &mut self,
        wallet_id: Uuid,
        balance: &BigDecimal,
    ) -> RepositoryResult<Wallet>;

    async fn insert_transaction(&mut self, tx: &Transaction) -> RepositoryResult<Transaction>;

    async fn set_transaction_status(
        &mut self,
        transaction_id: Uuid,
        status: TransactionStatus,
    ) -> RepositoryResult<Transaction>;

    async fn commit(self: Box<Self>) -> RepositoryResult<()>;

    async fn rollback(self: Box<Self>) -> RepositoryResult<()>;
}
