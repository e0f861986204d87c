//! Keyed store of account records. Records are created on first touch and
//! never removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::{AccountId, Amount, Timestamp};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Staked amount currently earning yield.
    pub principal: Amount,
    /// Earnings withheld at the last withdrawal, released by a qualifying
    /// reinvestment.
    pub debt: Amount,
    pub total_withdrawn: Amount,
    /// Last time yield was realised into `principal` or `debt`.
    pub checkpoint: Timestamp,
    pub has_invested: bool,
    /// Commissions credited to this account as a referrer.
    pub referral_rewards: Amount,
    /// Accounts bound to this one as their referrer.
    pub referral_count: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRegistry {
    accounts: BTreeMap<AccountId, Account>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Stored record, or a zero-valued one for an identity never seen.
    /// Does not create anything.
    pub fn load(&self, id: &AccountId) -> Account {
        self.accounts.get(id).cloned().unwrap_or_default()
    }

    pub fn get_or_create(&mut self, id: &AccountId) -> &mut Account {
        self.accounts.entry(id.clone()).or_default()
    }

    /// Check that replacing `id`'s record with `updated` keeps the
    /// per-account invariants.
    pub fn validate(&self, id: &AccountId, updated: &Account) -> Result<(), LedgerError> {
        let Some(current) = self.accounts.get(id) else {
            return Ok(());
        };
        if updated.checkpoint < current.checkpoint {
            return Err(LedgerError::InvalidTime {
                checkpoint: current.checkpoint,
                now: updated.checkpoint,
            });
        }
        debug_assert!(updated.total_withdrawn >= current.total_withdrawn);
        Ok(())
    }

    /// Replace a record previously accepted by [`AccountRegistry::validate`].
    pub fn commit(&mut self, id: &AccountId, updated: Account) {
        self.accounts.insert(id.clone(), updated);
    }

    /// Referral total `referrer` would hold after being credited `amount`.
    pub fn check_referral_reward(
        &self,
        referrer: &AccountId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        self.accounts
            .get(referrer)
            .map_or(0, |a| a.referral_rewards)
            .checked_add(amount)
            .ok_or(LedgerError::MathOverflow)
    }

    pub fn credit_referral_reward(
        &mut self,
        referrer: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let total = self.check_referral_reward(referrer, amount)?;
        self.get_or_create(referrer).referral_rewards = total;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &Account)> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn total_principal(&self) -> Amount {
        self.accounts
            .values()
            .fold(0, |acc, a| acc.saturating_add(a.principal))
    }

    pub fn total_debt(&self) -> Amount {
        self.accounts.values().fold(0, |acc, a| acc.saturating_add(a.debt))
    }
}
