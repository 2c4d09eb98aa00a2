//! Runs the ledger against a real Postgres. Skipped unless DATABASE_URL is set.

use bigdecimal::BigDecimal;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wallet_ledger::adapters::PostgresLedgerStore;
use wallet_ledger::domain::{Operation, TransactionStatus};
use wallet_ledger::error::LedgerError;
use wallet_ledger::ports::LedgerStore;
use wallet_ledger::use_cases::{ExecuteOperation, GetBalance};

fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

async fn setup_store(lock_timeout: Duration) -> Option<PostgresLedgerStore> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            println!("Skipping Postgres ledger test: DATABASE_URL not set");
            return None;
        }
    };

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    wallet_ledger::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations on test DB");

    Some(PostgresLedgerStore::new(pool, lock_timeout))
}

#[tokio::test]
async fn test_scenarios_against_postgres() {
    let Some(store) = setup_store(Duration::from_secs(5)).await else {
        return;
    };
    let store: Arc<dyn LedgerStore> = Arc::new(store);
    let engine = ExecuteOperation::new(store.clone());
    let wallet_id = Uuid::new_v4();

    let balance = GetBalance::new(store.clone()).execute(wallet_id).await.unwrap();
    assert_eq!(balance.to_string(), "0.00");

    let outcome = engine
        .execute(wallet_id, Operation::deposit(dec("100.00")))
        .await
        .unwrap();
    assert_eq!(outcome.wallet.balance, dec("100.00"));
    assert_eq!(outcome.transaction.status, TransactionStatus::Completed);

    let err = engine
        .execute(wallet_id, Operation::withdraw(dec("150.00")))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InsufficientFunds {
            available: dec("100.00"),
            requested: dec("150.00"),
        }
    );

    let outcome = engine
        .execute(wallet_id, Operation::withdraw(dec("40.00")))
        .await
        .unwrap();
    assert_eq!(outcome.wallet.balance, dec("60.00"));

    let history = store.list_transactions(wallet_id, 10, 0).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|tx| tx.status.is_terminal()));
    assert_eq!(
        history
            .iter()
            .filter(|tx| tx.status == TransactionStatus::Failed)
            .count(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_deposits_against_postgres() {
    let Some(store) = setup_store(Duration::from_secs(5)).await else {
        return;
    };
    let store: Arc<dyn LedgerStore> = Arc::new(store);
    let engine = Arc::new(ExecuteOperation::new(store.clone()));
    let wallet_id = Uuid::new_v4();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.execute(wallet_id, Operation::deposit(dec("10.00"))).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.balance(wallet_id).await.unwrap(), Some(dec("100.00")));
}

#[tokio::test]
async fn test_lock_timeout_against_postgres() {
    let Some(store) = setup_store(Duration::from_millis(200)).await else {
        return;
    };
    let engine = ExecuteOperation::new(Arc::new(store.clone()));
    let wallet_id = Uuid::new_v4();
    engine
        .execute(wallet_id, Operation::deposit(dec("1.00")))
        .await
        .unwrap();

    let mut blocker = store.begin().await.unwrap();
    blocker.lock_wallet(wallet_id).await.unwrap();

    let err = engine
        .execute(wallet_id, Operation::deposit(dec("1.00")))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::StorageUnavailable(_)));

    blocker.rollback().await.unwrap();
    assert_eq!(store.balance(wallet_id).await.unwrap(), Some(dec("1.00")));
    assert_eq!(store.list_transactions(wallet_id, 10, 0).await.unwrap().len(), 1);
}
