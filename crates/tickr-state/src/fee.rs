use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use tickr_core::types::{AccountId, Balance};
use tracing::debug;

/// Why the fee token refused a pull.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeeError {
    #[error("allowance too low: need {need}, approved {have}")]
    InsufficientAllowance { need: Balance, have: Balance },

    #[error("balance too low: need {need}, have {have}")]
    InsufficientBalance { need: Balance, have: Balance },

    #[error("fee token unavailable: {0}")]
    Unavailable(String),
}

/// Pull-based transfer port onto the fee token.
///
/// `transfer_from` must move exactly `amount` from `from` to `to` out of the
/// allowance `from` granted to the registry, or move nothing and fail.
/// `refund` reverses a pull that already succeeded: `amount` goes back from
/// `to` to `from` and the consumed allowance is restored.
pub trait FeeTransfer: Send + Sync {
    fn transfer_from(&self, from: &AccountId, to: &AccountId, amount: Balance) -> Result<(), FeeError>;

    fn refund(&self, from: &AccountId, to: &AccountId, amount: Balance) -> Result<(), FeeError>;
}

#[derive(Default)]
struct Ledger {
    balances: HashMap<AccountId, Balance>,
    /// Amount each owner has approved the registry to pull.
    allowances: HashMap<AccountId, Balance>,
}

/// In-memory balances and allowances behind the `FeeTransfer` port.
///
/// Stands in for the real fee token in tests and in development nodes.
#[derive(Default)]
pub struct AllowanceLedger {
    inner: Mutex<Ledger>,
}

impl AllowanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self) -> std::sync::MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn credit(&self, account: &AccountId, amount: Balance) {
        let mut l = self.ledger();
        let bal = l.balances.entry(account.clone()).or_insert(0);
        *bal = bal.saturating_add(amount);
    }

    /// Replace the allowance `owner` grants the registry.
    pub fn approve(&self, owner: &AccountId, amount: Balance) {
        self.ledger().allowances.insert(owner.clone(), amount);
    }

    pub fn balance_of(&self, account: &AccountId) -> Balance {
        self.ledger().balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance_of(&self, owner: &AccountId) -> Balance {
        self.ledger().allowances.get(owner).copied().unwrap_or(0)
    }
}

impl FeeTransfer for AllowanceLedger {
    fn transfer_from(&self, from: &AccountId, to: &AccountId, amount: Balance) -> Result<(), FeeError> {
        let mut l = self.ledger();
        let allowance = l.allowances.get(from).copied().unwrap_or(0);
        if allowance < amount {
            return Err(FeeError::InsufficientAllowance { need: amount, have: allowance });
        }
        let balance = l.balances.get(from).copied().unwrap_or(0);
        if balance < amount {
            return Err(FeeError::InsufficientBalance { need: amount, have: balance });
        }

        l.allowances.insert(from.clone(), allowance - amount);
        l.balances.insert(from.clone(), balance - amount);
        let dest = l.balances.entry(to.clone()).or_insert(0);
        *dest = dest.saturating_add(amount);
        debug!(%from, %to, amount = %amount, "fee pulled");
        Ok(())
    }

    fn refund(&self, from: &AccountId, to: &AccountId, amount: Balance) -> Result<(), FeeError> {
        let mut l = self.ledger();
        let held = l.balances.get(to).copied().unwrap_or(0);
        if held < amount {
            return Err(FeeError::InsufficientBalance { need: amount, have: held });
        }

        l.balances.insert(to.clone(), held - amount);
        let bal = l.balances.entry(from.clone()).or_insert(0);
        *bal = bal.saturating_add(amount);
        let allowance = l.allowances.entry(from.clone()).or_insert(0);
        *allowance = allowance.saturating_add(amount);
        debug!(%from, %to, amount = %amount, "fee refunded");
        Ok(())
    }
}
