use crate::domain::account::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("insufficient funds ({available} available)")]
    InsufficientFunds { available: Decimal },
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
    #[error("recipient not found: {0}")]
    RecipientNotFound(String),
    #[error("cannot transfer to your own account")]
    SelfTransfer,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("not logged in")]
    NotAuthenticated,
    #[error("no such account: {0}")]
    AccountNotFound(AccountId),
    #[error("account is busy, try again")]
    Contended,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
}
