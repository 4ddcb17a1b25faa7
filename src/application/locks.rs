use crate::domain::account::AccountId;
use crate::error::{Result, WalletError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// How long a mutation waits for an account lock before giving up.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// Guard serializing all mutations of one account's balance.
pub type AccountGuard = OwnedMutexGuard<()>;

/// Registry of per-account mutexes.
///
/// Every balance mutation holds the lock of each account it touches for the
/// duration of the operation. Transfers lock both accounts in ascending id
/// order, so two simultaneous opposite-direction transfers cannot deadlock.
/// Acquisition is bounded: a caller that cannot get the lock within
/// `ACQUIRE_TIMEOUT` gets `Contended` instead of hanging.
#[derive(Default)]
pub struct AccountLocks {
    registry: Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: AccountId) -> Arc<AsyncMutex<()>> {
        let mut registry = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        registry.entry(id).or_default().clone()
    }

    /// Acquires one account's lock.
    pub async fn acquire(&self, id: AccountId) -> Result<AccountGuard> {
        let lock = self.lock_for(id);
        tokio::time::timeout(ACQUIRE_TIMEOUT, lock.lock_owned())
            .await
            .map_err(|_| WalletError::Contended)
    }

    /// Acquires the locks of two distinct accounts in ascending id order.
    pub async fn acquire_pair(
        &self,
        a: AccountId,
        b: AccountId,
    ) -> Result<(AccountGuard, AccountGuard)> {
        debug_assert_ne!(a, b);
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.acquire(first).await?;
        let second_guard = self.acquire(second).await?;
        Ok((first_guard, second_guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_released_on_drop() {
        let locks = AccountLocks::new();
        {
            let _guard = locks.acquire(1).await.unwrap();
        }
        // Re-acquiring after drop must not time out.
        let _guard = locks.acquire(1).await.unwrap();
    }

    #[tokio::test]
    async fn test_acquire_pair_opposite_orders() {
        let locks = Arc::new(AccountLocks::new());

        let a = Arc::clone(&locks);
        let b = Arc::clone(&locks);
        let forward = tokio::spawn(async move { a.acquire_pair(1, 2).await.map(drop) });
        let backward = tokio::spawn(async move { b.acquire_pair(2, 1).await.map(drop) });

        forward.await.unwrap().unwrap();
        backward.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_contended_lock_times_out() {
        let locks = Arc::new(AccountLocks::new());
        let _held = locks.acquire(7).await.unwrap();

        let result = locks.acquire(7).await;
        assert!(matches!(result, Err(WalletError::Contended)));
    }
}
