//! The external fungible-token system the ledger settles through.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient funds in account {account}: needs {required}, has {available}")]
    InsufficientFunds {
        account: AccountId,
        required: Amount,
        available: Amount,
    },
    #[error("insufficient allowance from {account}: needs {required}, approved {available}")]
    InsufficientAllowance {
        account: AccountId,
        required: Amount,
        available: Amount,
    },
}

impl TokenError {
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::InsufficientFunds { .. } => "InsufficientFunds",
            TokenError::InsufficientAllowance { .. } => "InsufficientAllowance",
        }
    }
}

/// Operations the ledger needs from the token system.
pub trait TokenLedger {
    /// Pull `amount` from `payer` into `custody`, spending `payer`'s allowance
    /// for `custody`.
    fn transfer_from(
        &mut self,
        payer: &AccountId,
        custody: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Pay `amount` out of `custody` to `recipient`.
    fn transfer(
        &mut self,
        custody: &AccountId,
        recipient: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError>;

    fn balance_of(&self, account: &AccountId) -> Amount;
}

/// Balance book with ERC-20 style allowances.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InMemoryToken {
    balances: BTreeMap<AccountId, Amount>,
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
}

impl InMemoryToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, account: &AccountId, amount: Amount) {
        let balance = self.balances.entry(account.clone()).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Set (not add to) the amount `spender` may pull from `owner`.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all balances.
    pub fn supply(&self) -> Amount {
        self.balances.values().fold(0, |acc, b| acc.saturating_add(*b))
    }

    fn debit(&mut self, account: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(TokenError::InsufficientFunds {
                account: account.clone(),
                required: amount,
                available,
            });
        }
        self.balances.insert(account.clone(), available - amount);
        Ok(())
    }
}

impl TokenLedger for InMemoryToken {
    fn transfer_from(
        &mut self,
        payer: &AccountId,
        custody: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let approved = self.allowance(payer, custody);
        if approved < amount {
            return Err(TokenError::InsufficientAllowance {
                account: payer.clone(),
                required: amount,
                available: approved,
            });
        }
        self.debit(payer, amount)?;
        self.approve(payer, custody, approved - amount);
        self.mint(custody, amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        custody: &AccountId,
        recipient: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.debit(custody, amount)?;
        self.mint(recipient, amount);
        Ok(())
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }
}
