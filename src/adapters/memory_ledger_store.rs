//! In-process implementation of LedgerStore.
//!
//! Each wallet id maps to its own `tokio::sync::Mutex`; a unit of work holds
//! the guard from `lock_wallet` until it commits or is dropped, so the whole
//! read-validate-write-commit sequence runs under the lock. Writes are staged
//! inside the unit and applied to the shared state in one step on commit.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{Transaction, TransactionStatus, Wallet};
use crate::ports::{LedgerStore, LedgerUnit, RepositoryError, RepositoryResult};

#[derive(Default)]
struct LedgerState {
    wallets: HashMap<Uuid, Wallet>,
    transactions: Vec<Transaction>,
}

struct Inner {
    state: Mutex<LedgerState>,
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
    lock_timeout: Duration,
    fail_next_commit: AtomicBool,
    unavailable: AtomicBool,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wallet_lock(&self, wallet_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(wallet_id).or_default().clone()
    }

    /// Forgets the locks of wallets that were never committed and that no
    /// other unit holds or waits on.
    fn prune_locks(&self, wallet_ids: &[Uuid]) {
        let state = self.state();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        for wallet_id in wallet_ids {
            if state.wallets.contains_key(wallet_id) {
                continue;
            }
            if locks
                .get(wallet_id)
                .is_some_and(|lock| Arc::strong_count(lock) == 1)
            {
                locks.remove(wallet_id);
            }
        }
    }

    fn check_available(&self) -> RepositoryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

/// Ledger store kept in process memory.
#[derive(Clone)]
pub struct InMemoryLedgerStore {
    inner: Arc<Inner>,
}

impl InMemoryLedgerStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(LedgerState::default()),
                locks: Mutex::new(HashMap::new()),
                lock_timeout,
                fail_next_commit: AtomicBool::new(false),
                unavailable: AtomicBool::new(false),
            }),
        }
    }

    /// Makes the next `commit` fail as if the connection dropped.
    pub fn fail_next_commit(&self) {
        self.inner.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Simulates loss of connectivity for every subsequent call.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All committed transactions, oldest first.
    pub fn all_transactions(&self) -> Vec<Transaction> {
        self.inner.state().transactions.clone()
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> RepositoryResult<Box<dyn LedgerUnit>> {
        self.inner.check_available()?;
        Ok(Box::new(InMemoryLedgerUnit {
            inner: self.inner.clone(),
            guards: HashMap::new(),
            wallets: HashMap::new(),
            transactions: Vec::new(),
        }))
    }

    async fn balance(&self, wallet_id: Uuid) -> RepositoryResult<Option<BigDecimal>> {
        self.inner.check_available()?;
        Ok(self
            .inner
            .state()
            .wallets
            .get(&wallet_id)
            .map(|w| w.balance.clone()))
    }

    async fn list_transactions(
        &self,
        wallet_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Transaction>> {
        self.inner.check_available()?;
        let state = self.inner.state();
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.wallet_id == wallet_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.inner.check_available()
    }
}

pub struct InMemoryLedgerUnit {
    inner: Arc<Inner>,
    guards: HashMap<Uuid, OwnedMutexGuard<()>>,
    wallets: HashMap<Uuid, Wallet>,
    transactions: Vec<Transaction>,
}

impl InMemoryLedgerUnit {
    fn current_wallet(&self, wallet_id: Uuid) -> Option<Wallet> {
        self.wallets
            .get(&wallet_id)
            .cloned()
            .or_else(|| self.inner.state().wallets.get(&wallet_id).cloned())
    }

    fn ensure_locked(&self, wallet_id: Uuid) -> RepositoryResult<()> {
        if self.guards.contains_key(&wallet_id) {
            Ok(())
        } else {
            Err(RepositoryError::Unavailable(format!(
                "wallet {} written without holding its lock",
                wallet_id
            )))
        }
    }
}

#[async_trait]
impl LedgerUnit for InMemoryLedgerUnit {
    async fn lock_wallet(&mut self, wallet_id: Uuid) -> RepositoryResult<Option<Wallet>> {
        self.inner.check_available()?;
        if !self.guards.contains_key(&wallet_id) {
            let lock = self.inner.wallet_lock(wallet_id);
            let guard = tokio::time::timeout(self.inner.lock_timeout, lock.lock_owned())
                .await
                .map_err(|_| RepositoryError::LockTimeout(wallet_id))?;
            self.guards.insert(wallet_id, guard);
        }
        Ok(self.current_wallet(wallet_id))
    }

    async fn create_wallet(&mut self, wallet_id: Uuid) -> RepositoryResult<Wallet> {
        if let Some(existing) = self.lock_wallet(wallet_id).await? {
            return Ok(existing);
        }
        let wallet = Wallet::open(wallet_id);
        self.wallets.insert(wallet_id, wallet.clone());
        Ok(wallet)
    }

    async fn update_balance(
        &mut self,
        wallet_id: Uuid,
        balance: &BigDecimal,
    ) -> RepositoryResult<Wallet> {
        self.ensure_locked(wallet_id)?;
        let mut wallet = self
            .current_wallet(wallet_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("wallet {}", wallet_id)))?;
        wallet.balance = balance.clone();
        wallet.updated_at = Utc::now();
        self.wallets.insert(wallet_id, wallet.clone());
        Ok(wallet)
    }

    async fn insert_transaction(&mut self, tx: &Transaction) -> RepositoryResult<Transaction> {
        if self.current_wallet(tx.wallet_id).is_none() {
            return Err(RepositoryError::NotFound(format!("wallet {}", tx.wallet_id)));
        }
        if tx.amount <= BigDecimal::from(0) {
            return Err(RepositoryError::Unavailable(
                "transactions.amount must be positive".to_string(),
            ));
        }
        self.transactions.push(tx.clone());
        Ok(tx.clone())
    }

    async fn set_transaction_status(
        &mut self,
        transaction_id: Uuid,
        status: TransactionStatus,
    ) -> RepositoryResult<Transaction> {
        let tx = self
            .transactions
            .iter_mut()
            .find(|tx| tx.id == transaction_id && tx.status == TransactionStatus::Pending)
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("pending transaction {}", transaction_id))
            })?;
        tx.status = status;
        tx.updated_at = Utc::now();
        Ok(tx.clone())
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        self.inner.check_available()?;
        if self.inner.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "connection lost during commit".to_string(),
            ));
        }

        let mut this = *self;
        {
            let mut state = this.inner.state();
            state.wallets.extend(std::mem::take(&mut this.wallets));
            state.transactions.extend(std::mem::take(&mut this.transactions));
        }
        // Guards drop with `this`, after the writes are visible.
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepositoryResult<()> {
        Ok(())
    }
}

impl Drop for InMemoryLedgerUnit {
    fn drop(&mut self) {
        let wallet_ids: Vec<Uuid> = self.guards.keys().copied().collect();
        self.guards.clear();
        self.inner.prune_locks(&wallet_ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Operation;

    fn store() -> InMemoryLedgerStore {
        InMemoryLedgerStore::new(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let store = store();
        let id = Uuid::new_v4();

        let mut unit = store.begin().await.unwrap();
        unit.create_wallet(id).await.unwrap();
        unit.update_balance(id, &BigDecimal::from(7)).await.unwrap();
        assert_eq!(store.balance(id).await.unwrap(), None);

        unit.commit().await.unwrap();
        assert_eq!(store.balance(id).await.unwrap(), Some(BigDecimal::from(7)));
    }

    #[tokio::test]
    async fn dropped_unit_discards_writes_and_releases_lock() {
        let store = store();
        let id = Uuid::new_v4();

        {
            let mut unit = store.begin().await.unwrap();
            unit.create_wallet(id).await.unwrap();
        }
        assert_eq!(store.balance(id).await.unwrap(), None);

        let mut unit = store.begin().await.unwrap();
        assert!(unit.lock_wallet(id).await.unwrap().is_none());
    }

    fn tracked_locks(store: &InMemoryLedgerStore) -> usize {
        store.inner.locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn abandoned_wallet_creation_forgets_its_lock() {
        let store = store();
        let id = Uuid::new_v4();

        let mut unit = store.begin().await.unwrap();
        unit.create_wallet(id).await.unwrap();
        assert_eq!(tracked_locks(&store), 1);
        unit.rollback().await.unwrap();
        assert_eq!(tracked_locks(&store), 0);

        {
            let mut unit = store.begin().await.unwrap();
            unit.lock_wallet(id).await.unwrap();
        }
        assert_eq!(tracked_locks(&store), 0);

        let mut unit = store.begin().await.unwrap();
        unit.create_wallet(id).await.unwrap();
        unit.commit().await.unwrap();
        assert_eq!(tracked_locks(&store), 1);
    }

    #[tokio::test]
    async fn waiting_unit_keeps_lock_entry_alive() {
        let store = store();
        let id = Uuid::new_v4();

        let mut holder = store.begin().await.unwrap();
        holder.create_wallet(id).await.unwrap();

        let waiter = tokio::spawn({
            let store = store.clone();
            async move {
                let mut unit = store.begin().await.unwrap();
                unit.lock_wallet(id).await.map(|_| unit)
            }
        });
        tokio::task::yield_now().await;
        holder.rollback().await.unwrap();

        let unit = waiter.await.unwrap().unwrap();
        assert_eq!(tracked_locks(&store), 1);
        drop(unit);
        assert_eq!(tracked_locks(&store), 0);
    }

    #[tokio::test]
    async fn second_locker_times_out_while_lock_is_held() {
        let store = store();
        let id = Uuid::new_v4();

        let mut first = store.begin().await.unwrap();
        first.create_wallet(id).await.unwrap();

        let mut second = store.begin().await.unwrap();
        let err = second.lock_wallet(id).await.unwrap_err();
        assert_eq!(err, RepositoryError::LockTimeout(id));
    }

    #[tokio::test]
    async fn different_wallets_do_not_contend() {
        let store = store();

        let mut first = store.begin().await.unwrap();
        first.create_wallet(Uuid::new_v4()).await.unwrap();

        let mut second = store.begin().await.unwrap();
        assert!(second.create_wallet(Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn failed_commit_persists_nothing() {
        let store = store();
        let id = Uuid::new_v4();
        store.fail_next_commit();

        let mut unit = store.begin().await.unwrap();
        unit.create_wallet(id).await.unwrap();
        let tx = Transaction::pending(id, &Operation::deposit(BigDecimal::from(1)));
        unit.insert_transaction(&tx).await.unwrap();

        assert!(unit.commit().await.is_err());
        assert_eq!(store.balance(id).await.unwrap(), None);
        assert!(store.all_transactions().is_empty());
    }

    #[tokio::test]
    async fn transaction_requires_existing_wallet() {
        let store = store();
        let mut unit = store.begin().await.unwrap();
        let tx = Transaction::pending(Uuid::new_v4(), &Operation::deposit(BigDecimal::from(1)));

        assert!(matches!(
            unit.insert_transaction(&tx).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn status_transitions_only_from_pending() {
        let store = store();
        let id = Uuid::new_v4();
        let mut unit = store.begin().await.unwrap();
        unit.create_wallet(id).await.unwrap();
        let tx = Transaction::pending(id, &Operation::deposit(BigDecimal::from(1)));
        unit.insert_transaction(&tx).await.unwrap();

        let done = unit
            .set_transaction_status(tx.id, TransactionStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, TransactionStatus::Completed);
        assert!(unit
            .set_transaction_status(tx.id, TransactionStatus::Failed)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn unavailable_store_rejects_calls() {
        let store = store();
        store.set_unavailable(true);

        assert!(store.ping().await.is_err());
        assert!(store.begin().await.is_err());
        assert!(store.balance(Uuid::new_v4()).await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
