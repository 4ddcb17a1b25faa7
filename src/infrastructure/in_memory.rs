use crate::domain::account::{Account, AccountId, Amount, Balance};
use crate::domain::entry::{EntryId, EntryKind, TransactionEntry};
use crate::domain::ports::{AccountStore, TransactionLog};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct AccountsInner {
    next_id: AccountId,
    by_id: HashMap<AccountId, Account>,
    by_email: HashMap<String, AccountId>,
    wallets: HashMap<AccountId, Balance>,
}

/// A thread-safe in-memory account store.
///
/// All account state lives behind a single `RwLock`, so `create` checks the
/// email index and inserts the profile in one critical section. Ideal for
/// testing or ephemeral sessions where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    inner: Arc<RwLock<AccountsInner>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create(&self, name: &str, email: &str, credential: &str) -> Result<Account> {
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(email) {
            return Err(WalletError::DuplicateEmail(email.to_string()));
        }
        inner.next_id += 1;
        let account = Account {
            id: inner.next_id,
            name: name.to_string(),
            email: email.to_string(),
            credential: credential.to_string(),
        };
        inner.by_email.insert(account.email.clone(), account.id);
        inner.by_id.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_email
            .get(email)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.by_id.get(&id).cloned())
    }

    async fn balance_of(&self, id: AccountId) -> Result<Balance> {
        let inner = self.inner.read().await;
        Ok(inner.wallets.get(&id).copied().unwrap_or(Balance::ZERO))
    }

    async fn set_balance(&self, id: AccountId, balance: Balance) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.wallets.insert(id, balance);
        Ok(())
    }
}

#[derive(Default)]
struct LogInner {
    next_id: EntryId,
    by_account: HashMap<AccountId, Vec<TransactionEntry>>,
}

/// A thread-safe in-memory transaction log.
///
/// Append-only: entries are pushed in id order and never mutated or
/// removed, so each account's vector is its chronological history.
#[derive(Default, Clone)]
pub struct InMemoryTransactionLog {
    inner: Arc<RwLock<LogInner>>,
}

impl InMemoryTransactionLog {
    /// Creates a new, empty in-memory transaction log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn append(
        &self,
        account_id: AccountId,
        amount: Amount,
        kind: EntryKind,
        counterpart: Option<&str>,
    ) -> Result<EntryId> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        let entry = TransactionEntry {
            id,
            account_id,
            amount,
            kind,
            counterpart: counterpart.map(str::to_string),
        };
        inner.by_account.entry(account_id).or_default().push(entry);
        Ok(id)
    }

    async fn entries_for(&self, account_id: AccountId) -> Result<Vec<TransactionEntry>> {
        let inner = self.inner.read().await;
        Ok(inner.by_account.get(&account_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = InMemoryAccountStore::new();
        let account = store.create("Alice", "a@x.com", "p").await.unwrap();
        assert_eq!(account.id, 1);

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email, account);
        let by_id = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(by_id, account);

        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = InMemoryAccountStore::new();
        store.create("Alice", "a@x.com", "p").await.unwrap();

        let result = store.create("Mallory", "a@x.com", "q").await;
        assert!(matches!(result, Err(WalletError::DuplicateEmail(_))));

        // No second account was created.
        assert!(store.find_by_id(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let store = InMemoryAccountStore::new();
        let first = store.create("A", "a@x.com", "p").await.unwrap();
        let second = store.create("B", "b@x.com", "p").await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_balance_defaults_to_zero() {
        let store = InMemoryAccountStore::new();
        let account = store.create("Alice", "a@x.com", "p").await.unwrap();
        assert_eq!(store.balance_of(account.id).await.unwrap(), Balance::ZERO);

        let balance = Balance::new(dec!(42.50)).unwrap();
        store.set_balance(account.id, balance).await.unwrap();
        assert_eq!(store.balance_of(account.id).await.unwrap(), balance);
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let log = InMemoryTransactionLog::new();
        let first = log
            .append(1, dec!(10).try_into().unwrap(), EntryKind::Deposit, None)
            .await
            .unwrap();
        let second = log
            .append(
                1,
                dec!(4).try_into().unwrap(),
                EntryKind::TransferOut,
                Some("b@x.com"),
            )
            .await
            .unwrap();
        assert!(second > first);

        let entries = log.entries_for(1).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, first);
        assert_eq!(entries[1].id, second);
        assert_eq!(entries[1].counterpart.as_deref(), Some("b@x.com"));

        assert!(log.entries_for(2).await.unwrap().is_empty());
    }
}
