use crate::error::WalletError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for an account, assigned by the account store.
/// Unique and immutable once assigned.
pub type AccountId = u64;

/// Upper bound for any single amount and for a stored balance.
pub fn limit() -> Decimal {
    // 999_999_999_999.99
    Decimal::new(99_999_999_999_999, 2)
}

/// A strictly positive monetary amount.
///
/// Direction (credit vs debit) is carried by the entry kind, never by the
/// sign of the amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, WalletError> {
        if value <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }
        if value > limit() {
            return Err(WalletError::InvalidAmount(format!(
                "amount exceeds the {} limit",
                limit()
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A wallet balance. Never negative, never above `limit()`.
///
/// The only ways to produce a `Balance` are `ZERO`, a validated `new`, or
/// `credit`/`debit` on an existing one, so a store handed a `Balance` cannot
/// be handed a negative write.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, WalletError> {
        if value < Decimal::ZERO || value > limit() {
            return Err(WalletError::InvalidAmount(format!(
                "balance out of range: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Fails when the result would exceed the balance limit.
    pub fn credit(self, amount: Amount) -> Result<Self, WalletError> {
        let next = self.0 + amount.value();
        if next > limit() {
            return Err(WalletError::InvalidAmount(format!(
                "balance would exceed the {} limit",
                limit()
            )));
        }
        Ok(Self(next))
    }

    /// Fails with `InsufficientFunds` when the amount exceeds the balance.
    pub fn debit(self, amount: Amount) -> Result<Self, WalletError> {
        if amount.value() > self.0 {
            return Err(WalletError::InsufficientFunds { available: self.0 });
        }
        Ok(Self(self.0 - amount.value()))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A registered user's profile.
///
/// The balance is not part of the profile: it lives in a separate wallet
/// record keyed by the account id, and an account with no wallet record has
/// a zero balance. Only the ledger engine mutates balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub credential: String,
}
