//! Postgres implementation of LedgerStore.
//! Wallet rows are serialized with `SELECT ... FOR UPDATE`; lock waits are
//! bounded by a transaction-local `lock_timeout`.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{Transaction, TransactionStatus, Wallet};
use crate::ports::{LedgerStore, LedgerUnit, RepositoryError, RepositoryResult};

/// SQLSTATE raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Postgres-backed ledger store.
#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn begin(&self) -> RepositoryResult<Box<dyn LedgerUnit>> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        // SET does not take bind parameters; the value is an integer we format ourselves.
        let set_timeout = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout.as_millis());
        sqlx::query(&set_timeout)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

        Ok(Box::new(PostgresLedgerUnit { tx }))
    }

    async fn balance(&self, wallet_id: Uuid) -> RepositoryResult<Option<BigDecimal>> {
        sqlx::query_scalar::<_, BigDecimal>("SELECT balance FROM wallets WHERE id = $1")
            .bind(wallet_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)
    }

    async fn list_transactions(
        &self,
        wallet_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, wallet_id, operation_type, amount, status, created_at, updated_at
            FROM transactions
            WHERE wallet_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(wallet_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

/// One database transaction. Dropping it without commit rolls back.
pub struct PostgresLedgerUnit {
    tx: SqlxTransaction<'static, Postgres>,
}

#[async_trait]
impl LedgerUnit for PostgresLedgerUnit {
    async fn lock_wallet(&mut self, wallet_id: Uuid) -> RepositoryResult<Option<Wallet>> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT id, balance, created_at, updated_at FROM wallets WHERE id = $1 FOR UPDATE",
        )
        .bind(wallet_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| lock_error(wallet_id, e))?;

        Ok(row.map(WalletRow::into_domain))
    }

    async fn create_wallet(&mut self, wallet_id: Uuid) -> RepositoryResult<Wallet> {
        // A concurrent first write may insert the same id; DO NOTHING waits for it
        // and the re-read below then queues on its row lock.
        sqlx::query(
            r#"
            INSERT INTO wallets (id, balance, created_at, updated_at)
            VALUES ($1, 0, NOW(), NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(wallet_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| lock_error(wallet_id, e))?;

        self.lock_wallet(wallet_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("wallet {}", wallet_id)))
    }

    async fn update_balance(
        &mut self,
        wallet_id: Uuid,
        balance: &BigDecimal,
    ) -> RepositoryResult<Wallet> {
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            UPDATE wallets SET balance = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, balance, created_at, updated_at
            "#,
        )
        .bind(wallet_id)
        .bind(balance)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(RepositoryError::from)?;

        row.map(WalletRow::into_domain)
            .ok_or_else(|| RepositoryError::NotFound(format!("wallet {}", wallet_id)))
    }

    async fn insert_transaction(&mut self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                id, wallet_id, operation_type, amount, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, wallet_id, operation_type, amount, status, created_at, updated_at
            "#,
        )
        .bind(tx.id)
        .bind(tx.wallet_id)
        .bind(tx.operation_type.as_str())
        .bind(&tx.amount)
        .bind(tx.status.as_str())
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(RepositoryError::from)?;

        row.into_domain()
    }

    async fn set_transaction_status(
        &mut self,
        transaction_id: Uuid,
        status: TransactionStatus,
    ) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE transactions SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING id, wallet_id, operation_type, amount, status, created_at, updated_at
            "#,
        )
        .bind(transaction_id)
        .bind(status.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(RepositoryError::from)?;

        row.ok_or_else(|| {
            RepositoryError::NotFound(format!("pending transaction {}", transaction_id))
        })?
        .into_domain()
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        self.tx.commit().await.map_err(RepositoryError::from)
    }

    async fn rollback(self: Box<Self>) -> RepositoryResult<()> {
        self.tx.rollback().await.map_err(RepositoryError::from)
    }
}

fn lock_error(wallet_id: Uuid, err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(LOCK_NOT_AVAILABLE) => {
            RepositoryError::LockTimeout(wallet_id)
        }
        _ => RepositoryError::from(err),
    }
}

/// Internal row types for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    balance: BigDecimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WalletRow {
    fn into_domain(self) -> Wallet {
        Wallet {
            id: self.id,
            balance: self.balance,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    wallet_id: Uuid,
    operation_type: String,
    amount: BigDecimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        Ok(Transaction {
            id: self.id,
            wallet_id: self.wallet_id,
            operation_type: self.operation_type.parse().map_err(RepositoryError::Unavailable)?,
            amount: self.amount,
            status: self.status.parse().map_err(RepositoryError::Unavailable)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
