use crate::domain::account::{Account, AccountId, Amount, Balance};
use crate::domain::entry::{EntryId, EntryKind, TransactionEntry};
use crate::domain::ports::{AccountStore, TransactionLog};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Column family for account profiles, keyed by account id.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column family acting as the unique email index (email -> account id).
pub const CF_EMAILS: &str = "emails";
/// Column family for wallet balances, keyed by account id. An account with
/// no record here has a zero balance.
pub const CF_WALLETS: &str = "wallets";
/// Column family for ledger entries, keyed by account id + entry id so a
/// prefix scan yields one account's history in chronological order.
pub const CF_ENTRIES: &str = "entries";
/// Column family for the id counters.
pub const CF_META: &str = "meta";

const KEY_NEXT_ACCOUNT_ID: &[u8] = b"next_account_id";
const KEY_NEXT_ENTRY_ID: &[u8] = b"next_entry_id";

/// A persistent store implementation using RocksDB.
///
/// Implements both the account store and the transaction log over separate
/// column families. Multi-record writes (`create`, `append`) go through a
/// `WriteBatch`, so the profile + email index + counter (or entry + counter)
/// land atomically.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    // Serializes id allocation and the unique-email check against the
    // batched write that follows it. Never held across an await.
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_ACCOUNTS, CF_EMAILS, CF_WALLETS, CF_ENTRIES, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| WalletError::StoreUnavailable(format!("missing column family: {name}")))
    }

    fn counter(&self, key: &[u8]) -> Result<u64> {
        let meta = self.cf(CF_META)?;
        match self.db.get_cf(meta, key)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    WalletError::StoreUnavailable("corrupt id counter".to_string())
                })?;
                Ok(u64::from_be_bytes(bytes))
            }
            None => Ok(0),
        }
    }

    fn entry_key(account_id: AccountId, entry_id: EntryId) -> [u8; 16] {
        let mut key = [0u8; 16];
        key[..8].copy_from_slice(&account_id.to_be_bytes());
        key[8..].copy_from_slice(&entry_id.to_be_bytes());
        key
    }
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn create(&self, name: &str, email: &str, credential: &str) -> Result<Account> {
        let accounts = self.cf(CF_ACCOUNTS)?;
        let emails = self.cf(CF_EMAILS)?;
        let meta = self.cf(CF_META)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.db.get_cf(emails, email.as_bytes())?.is_some() {
            return Err(WalletError::DuplicateEmail(email.to_string()));
        }

        let id = self.counter(KEY_NEXT_ACCOUNT_ID)? + 1;
        let account = Account {
            id,
            name: name.to_string(),
            email: email.to_string(),
            credential: credential.to_string(),
        };

        let mut batch = WriteBatch::default();
        batch.put_cf(accounts, id.to_be_bytes(), serde_json::to_vec(&account)?);
        batch.put_cf(emails, email.as_bytes(), id.to_be_bytes());
        batch.put_cf(meta, KEY_NEXT_ACCOUNT_ID, id.to_be_bytes());
        self.db.write(batch)?;

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let emails = self.cf(CF_EMAILS)?;
        match self.db.get_cf(emails, email.as_bytes())? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    WalletError::StoreUnavailable("corrupt email index".to_string())
                })?;
                self.find_by_id(u64::from_be_bytes(bytes)).await
            }
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let accounts = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(accounts, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn balance_of(&self, id: AccountId) -> Result<Balance> {
        let wallets = self.cf(CF_WALLETS)?;
        match self.db.get_cf(wallets, id.to_be_bytes())? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Balance::ZERO),
        }
    }

    async fn set_balance(&self, id: AccountId, balance: Balance) -> Result<()> {
        let wallets = self.cf(CF_WALLETS)?;
        self.db
            .put_cf(wallets, id.to_be_bytes(), serde_json::to_vec(&balance)?)?;
        Ok(())
    }
}

#[async_trait]
impl TransactionLog for RocksDbStore {
    async fn append(
        &self,
        account_id: AccountId,
        amount: Amount,
        kind: EntryKind,
        counterpart: Option<&str>,
    ) -> Result<EntryId> {
        let entries = self.cf(CF_ENTRIES)?;
        let meta = self.cf(CF_META)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let id = self.counter(KEY_NEXT_ENTRY_ID)? + 1;
        let entry = TransactionEntry {
            id,
            account_id,
            amount,
            kind,
            counterpart: counterpart.map(str::to_string),
        };

        let mut batch = WriteBatch::default();
        batch.put_cf(
            entries,
            Self::entry_key(account_id, id),
            serde_json::to_vec(&entry)?,
        );
        batch.put_cf(meta, KEY_NEXT_ENTRY_ID, id.to_be_bytes());
        self.db.write(batch)?;

        Ok(id)
    }

    async fn entries_for(&self, account_id: AccountId) -> Result<Vec<TransactionEntry>> {
        let cf = self.cf(CF_ENTRIES)?;
        let prefix = account_id.to_be_bytes();

        let mut result = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if key[..8] != prefix[..] {
                break;
            }
            result.push(serde_json::from_slice(&value)?);
        }
        Ok(result)
    }
}
