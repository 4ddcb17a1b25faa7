use super::account::{AccountId, Amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier for a ledger entry, assigned by the transaction log in
/// monotonically increasing order.
pub type EntryId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

impl EntryKind {
    /// Sign applied to the entry amount when reconciling a balance against
    /// the account's history.
    pub fn sign(&self) -> Decimal {
        match self {
            EntryKind::Deposit | EntryKind::TransferIn => Decimal::ONE,
            EntryKind::Withdrawal | EntryKind::TransferOut => Decimal::NEGATIVE_ONE,
        }
    }
}

/// One immutable ledger entry. The log is append-only; entries are never
/// updated or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub amount: Amount,
    pub kind: EntryKind,
    /// Free-text description of the other side of a transfer
    /// (recipient or sender email).
    pub counterpart: Option<String>,
}

/// Signed sum of a sequence of entries: the value an account's stored
/// balance must reconcile against.
pub fn signed_total<'a>(entries: impl IntoIterator<Item = &'a TransactionEntry>) -> Decimal {
    entries
        .into_iter()
        .map(|entry| entry.kind.sign() * entry.amount.value())
        .sum()
}
