use std::sync::Arc;
use uuid::Uuid;

use crate::domain::Transaction;
use crate::error::LedgerError;
use crate::ports::LedgerStore;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Audit trail of a wallet, newest first.
pub struct ListWalletTransactions {
    store: Arc<dyn LedgerStore>,
}

impl ListWalletTransactions {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        wallet_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);
        Ok(self.store.list_transactions(wallet_id, limit, offset).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedgerStore;
    use crate::domain::{Operation, TransactionStatus};
    use crate::use_cases::ExecuteOperation;
    use bigdecimal::BigDecimal;

    #[tokio::test]
    async fn pages_newest_first() {
        let store: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::default());
        let engine = ExecuteOperation::new(store.clone());
        let id = Uuid::new_v4();
        for amount in 1..=5 {
            engine
                .execute(id, Operation::deposit(BigDecimal::from(amount)))
                .await
                .unwrap();
        }

        let history = ListWalletTransactions::new(store);
        let first = history.execute(id, Some(2), None).await.unwrap();
        let second = history.execute(id, Some(2), Some(2)).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].amount, BigDecimal::from(5));
        assert_eq!(second[0].amount, BigDecimal::from(3));
        assert!(first
            .iter()
            .all(|tx| tx.status == TransactionStatus::Completed));
    }

    #[tokio::test]
    async fn unknown_wallet_has_empty_history() {
        let history = ListWalletTransactions::new(Arc::new(InMemoryLedgerStore::default()));
        let page = history.execute(Uuid::new_v4(), None, None).await.unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn oversized_limit_is_clamped() {
        let store: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::default());
        let engine = ExecuteOperation::new(store.clone());
        let id = Uuid::new_v4();
        for _ in 0..(MAX_PAGE_SIZE + 5) {
            engine
                .execute(id, Operation::deposit(BigDecimal::from(1)))
                .await
                .unwrap();
        }

        let page = ListWalletTransactions::new(store)
            .execute(id, Some(10_000), None)
            .await
            .unwrap();
        assert_eq!(page.len() as i64, MAX_PAGE_SIZE);
    }
}
