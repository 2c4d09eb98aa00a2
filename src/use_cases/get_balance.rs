use bigdecimal::BigDecimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{to_money, zero_balance};
use crate::error::LedgerError;
use crate::ports::LedgerStore;

/// Reads the committed balance of a wallet. Unknown wallets read as zero and
/// are not created.
pub struct GetBalance {
    store: Arc<dyn LedgerStore>,
}

impl GetBalance {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, wallet_id: Uuid) -> Result<BigDecimal, LedgerError> {
        let balance = self.store.balance(wallet_id).await?;
        Ok(balance.map(to_money).unwrap_or_else(zero_balance))
    }
}
