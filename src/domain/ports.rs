use super::account::{Account, AccountId, Amount, Balance};
use super::entry::{EntryId, EntryKind, TransactionEntry};
use crate::error::Result;
use async_trait::async_trait;

/// Durable mapping from user identity to profile and wallet balance.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Registers a new account, failing with `DuplicateEmail` if the email
    /// is taken. Uniqueness is enforced atomically inside the store, never
    /// by a caller's read-then-write.
    async fn create(&self, name: &str, email: &str, credential: &str) -> Result<Account>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>>;
    /// Zero for an account that has no wallet record yet.
    async fn balance_of(&self, id: AccountId) -> Result<Balance>;
    async fn set_balance(&self, id: AccountId, balance: Balance) -> Result<()>;
}

/// Durable append-only sequence of ledger entries keyed by account.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Appends one entry and returns its id. Ids increase monotonically.
    async fn append(
        &self,
        account_id: AccountId,
        amount: Amount,
        kind: EntryKind,
        counterpart: Option<&str>,
    ) -> Result<EntryId>;
    /// All entries for one account, oldest first.
    async fn entries_for(&self, account_id: AccountId) -> Result<Vec<TransactionEntry>>;
}

pub type AccountStoreBox = Box<dyn AccountStore>;
pub type TransactionLogBox = Box<dyn TransactionLog>;
