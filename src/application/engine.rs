use super::locks::AccountLocks;
use crate::domain::account::{Account, AccountId, Amount, Balance};
use crate::domain::entry::{EntryKind, TransactionEntry};
use crate::domain::ports::{AccountStoreBox, TransactionLogBox};
use crate::error::{Result, WalletError};
use tracing::{debug, error};

/// How many times a log append is retried before the operation is unwound.
const APPEND_RETRIES: usize = 3;

/// The ledger consistency engine.
///
/// Every public operation is a short-lived transaction over the account
/// store and the transaction log: either the balance write(s) and the
/// matching log entr(ies) all apply, or none do. Balances are written first
/// and appends second; a failed append rolls the balances back to their
/// pre-operation values.
///
/// Mutations hold the per-account lock of every account they touch, so
/// concurrent callers against the same account serialize. Reads take no
/// locks. Transfers read both balances from a post-lock snapshot before the
/// first write.
pub struct LedgerEngine {
    accounts: AccountStoreBox,
    log: TransactionLogBox,
    locks: AccountLocks,
}

impl LedgerEngine {
    /// Creates a new `LedgerEngine` over the given stores.
    pub fn new(accounts: AccountStoreBox, log: TransactionLogBox) -> Self {
        Self {
            accounts,
            log,
            locks: AccountLocks::new(),
        }
    }

    /// Registers a new account. New accounts start with a zero balance; no
    /// wallet record is written until the first deposit or credit.
    pub async fn register(&self, name: &str, email: &str, credential: &str) -> Result<Account> {
        let account = self.accounts.create(name, email, credential).await?;
        debug!(account = account.id, "registered");
        Ok(account)
    }

    /// Resolves an email/credential pair to an account. Unknown email and
    /// wrong credential are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, credential: &str) -> Result<Account> {
        match self.accounts.find_by_email(email).await? {
            Some(account) if account.credential == credential => Ok(account),
            _ => Err(WalletError::InvalidCredentials),
        }
    }

    /// Credits `amount` to the account and appends one `Deposit` entry.
    /// Returns the new balance.
    pub async fn deposit(&self, id: AccountId, amount: Amount) -> Result<Balance> {
        self.require_account(id).await?;
        let _guard = self.locks.acquire(id).await?;

        let balance = self.accounts.balance_of(id).await?;
        let updated = balance.credit(amount)?;
        self.accounts.set_balance(id, updated).await?;
        if let Err(err) = self
            .append_with_retry(id, amount, EntryKind::Deposit, None)
            .await
        {
            self.restore_balances(&[(id, balance)]).await;
            return Err(err);
        }

        debug!(account = id, %amount, %updated, "deposit");
        Ok(updated)
    }

    /// Debits `amount` from the account and appends one `Withdrawal` entry.
    /// Returns the new balance.
    pub async fn withdraw(&self, id: AccountId, amount: Amount) -> Result<Balance> {
        self.require_account(id).await?;
        let _guard = self.locks.acquire(id).await?;

        let balance = self.accounts.balance_of(id).await?;
        let updated = balance.debit(amount)?;
        self.accounts.set_balance(id, updated).await?;
        if let Err(err) = self
            .append_with_retry(id, amount, EntryKind::Withdrawal, None)
            .await
        {
            self.restore_balances(&[(id, balance)]).await;
            return Err(err);
        }

        debug!(account = id, %amount, %updated, "withdrawal");
        Ok(updated)
    }

    /// Moves `amount` from the sender to the account registered under
    /// `recipient_email`, appending one `TransferOut` entry for the sender
    /// and one `TransferIn` entry for the recipient. Returns the sender's
    /// new balance.
    pub async fn transfer(
        &self,
        sender_id: AccountId,
        recipient_email: &str,
        amount: Amount,
    ) -> Result<Balance> {
        let sender = self.require_account(sender_id).await?;
        let recipient = self
            .accounts
            .find_by_email(recipient_email)
            .await?
            .ok_or_else(|| WalletError::RecipientNotFound(recipient_email.to_string()))?;
        if recipient.id == sender.id {
            return Err(WalletError::SelfTransfer);
        }

        let _guards = self.locks.acquire_pair(sender.id, recipient.id).await?;

        // Both balances come from a post-lock snapshot, before any write.
        let sender_balance = self.accounts.balance_of(sender.id).await?;
        let recipient_balance = self.accounts.balance_of(recipient.id).await?;
        let sender_updated = sender_balance.debit(amount)?;
        let recipient_updated = recipient_balance.credit(amount)?;

        self.accounts.set_balance(sender.id, sender_updated).await?;
        if let Err(err) = self
            .accounts
            .set_balance(recipient.id, recipient_updated)
            .await
        {
            self.restore_balances(&[(sender.id, sender_balance)]).await;
            return Err(err);
        }

        let prior = [
            (sender.id, sender_balance),
            (recipient.id, recipient_balance),
        ];
        if let Err(err) = self
            .append_with_retry(sender.id, amount, EntryKind::TransferOut, Some(recipient_email))
            .await
        {
            self.restore_balances(&prior).await;
            return Err(err);
        }
        if let Err(err) = self
            .append_with_retry(recipient.id, amount, EntryKind::TransferIn, Some(&sender.email))
            .await
        {
            // The sender's entry is already durable and the log is
            // append-only, so this half-applied transfer cannot be unwound
            // without diverging the sender's history.
            error!(
                sender = sender.id,
                recipient = recipient.id,
                %amount,
                "transfer half-logged, manual reconciliation required"
            );
            return Err(err);
        }

        debug!(
            sender = sender.id,
            recipient = recipient.id,
            %amount,
            %sender_updated,
            "transfer"
        );
        Ok(sender_updated)
    }

    /// Current balance. Pure read, no side effects.
    pub async fn balance_of(&self, id: AccountId) -> Result<Balance> {
        self.accounts.balance_of(id).await
    }

    /// The account's ledger entries, oldest first. Pure read.
    pub async fn history(&self, id: AccountId) -> Result<Vec<TransactionEntry>> {
        self.log.entries_for(id).await
    }

    async fn require_account(&self, id: AccountId) -> Result<Account> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or(WalletError::AccountNotFound(id))
    }

    async fn append_with_retry(
        &self,
        id: AccountId,
        amount: Amount,
        kind: EntryKind,
        counterpart: Option<&str>,
    ) -> Result<()> {
        let mut last_err = None;
        for _ in 0..APPEND_RETRIES {
            match self.log.append(id, amount, kind, counterpart).await {
                Ok(_) => return Ok(()),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            WalletError::StoreUnavailable("transaction log rejected append".to_string())
        }))
    }

    /// Compensation path: restores pre-operation balances after a failed
    /// append. A failure here leaves the ledger inconsistent and is logged
    /// for manual reconciliation.
    async fn restore_balances(&self, prior: &[(AccountId, Balance)]) {
        for (id, balance) in prior {
            if let Err(err) = self.accounts.set_balance(*id, *balance).await {
                error!(
                    account = *id,
                    error = %err,
                    "balance rollback failed, manual reconciliation required"
                );
            }
        }
    }
}
