//! Value-transfer collaborator.
//!
//! The ledger never holds raw balances itself; deposits and disbursements
//! go through a [`ValueTransfer`] backend as a single all-or-nothing batch
//! per operation. The shipped backend is [`MemoryBank`], an in-memory
//! account book used by the service and by tests.

use peerlend_types::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient funds for {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: AccountId,
        needed: Amount,
        available: Amount,
    },

    #[error("balance overflow for {account}")]
    BalanceOverflow { account: AccountId },
}

/// One balance movement within a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Movement {
    /// Take `amount` from `account` (a deposit accompanying a call).
    Debit { account: AccountId, amount: Amount },
    /// Pay `amount` out to `account`.
    Credit { account: AccountId, amount: Amount },
}

impl Movement {
    pub fn debit(account: AccountId, amount: Amount) -> Self {
        Movement::Debit { account, amount }
    }

    pub fn credit(account: AccountId, amount: Amount) -> Self {
        Movement::Credit { account, amount }
    }
}

/// A facility that can move value between accounts.
///
/// `apply` is atomic per call: either every movement in the batch takes
/// effect or none does. The ledger relies on this to keep its records
/// consistent with actual custody.
pub trait ValueTransfer {
    fn apply(&mut self, moves: &[Movement]) -> Result<(), TransferError>;
}

/// In-memory account book.
///
/// Accounts are created implicitly on first credit; a missing account has
/// zero balance.
#[derive(Clone, Debug, Default)]
pub struct MemoryBank {
    balances: HashMap<AccountId, Amount>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with an opening balance (dev deployments, tests).
    pub fn deposit(&mut self, account: AccountId, amount: Amount) {
        let entry = self.balances.entry(account).or_insert(Amount::ZERO);
        *entry = entry.saturating_add(amount);
    }

    /// Current balance of an account; zero if unknown.
    pub fn balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    /// Sum of all account balances.
    pub fn total(&self) -> Amount {
        self.balances
            .values()
            .fold(Amount::ZERO, |acc, b| acc.checked_add(*b).unwrap_or(acc))
    }
}

impl ValueTransfer for MemoryBank {
    fn apply(&mut self, moves: &[Movement]) -> Result<(), TransferError> {
        // Stage every movement against a scratch view first, so a failure
        // partway through the batch leaves real balances untouched.
        let mut staged: HashMap<&AccountId, Amount> = HashMap::new();

        for movement in moves {
            match movement {
                Movement::Debit { account, amount } => {
                    let current = staged
                        .get(account)
                        .copied()
                        .unwrap_or_else(|| self.balance(account));
                    let next = current.checked_sub(*amount).ok_or_else(|| {
                        TransferError::InsufficientFunds {
                            account: account.clone(),
                            needed: *amount,
                            available: current,
                        }
                    })?;
                    staged.insert(account, next);
                }
                Movement::Credit { account, amount } => {
                    let current = staged
                        .get(account)
                        .copied()
                        .unwrap_or_else(|| self.balance(account));
                    let next = current.checked_add(*amount).ok_or_else(|| {
                        TransferError::BalanceOverflow {
                            account: account.clone(),
                        }
                    })?;
                    staged.insert(account, next);
                }
            }
        }

        let committed: Vec<(AccountId, Amount)> = staged
            .into_iter()
            .map(|(account, balance)| (account.clone(), balance))
            .collect();
        for (account, balance) in committed {
            self.balances.insert(account, balance);
        }
        Ok(())
    }
}
