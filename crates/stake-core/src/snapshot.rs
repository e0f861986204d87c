//! Read models and the state digest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::accrual;
use crate::error::LedgerError;
use crate::math::Ratio;
use crate::referral::ReferralGraph;
use crate::registry::{Account, AccountRegistry};
use crate::{AccountId, Amount, Timestamp};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub account: AccountId,
    pub principal: Amount,
    pub debt: Amount,
    pub total_withdrawn: Amount,
    pub pending_interest: Amount,
    pub checkpoint: Timestamp,
    pub has_invested: bool,
    pub referrer: Option<AccountId>,
    pub referral_rewards: Amount,
    pub referral_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub at: Timestamp,
    pub accounts: Vec<AccountSnapshot>,
    pub referrals: BTreeMap<AccountId, AccountId>,
    #[serde(with = "hex32")]
    pub state_root: [u8; 32],
}

impl LedgerSnapshot {
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }
}

pub fn account_snapshot(
    id: &AccountId,
    account: &Account,
    referrer: Option<&AccountId>,
    now: Timestamp,
    daily_rate: Ratio,
) -> Result<AccountSnapshot, LedgerError> {
    Ok(AccountSnapshot {
        account: id.clone(),
        principal: account.principal,
        debt: account.debt,
        total_withdrawn: account.total_withdrawn,
        pending_interest: accrual::pending_interest(account, now, daily_rate)?,
        checkpoint: account.checkpoint,
        has_invested: account.has_invested,
        referrer: referrer.cloned(),
        referral_rewards: account.referral_rewards,
        referral_count: account.referral_count,
    })
}

pub fn ledger_snapshot(
    registry: &AccountRegistry,
    referrals: &ReferralGraph,
    now: Timestamp,
    daily_rate: Ratio,
) -> Result<LedgerSnapshot, LedgerError> {
    let accounts = registry
        .iter()
        .map(|(id, account)| {
            account_snapshot(id, account, referrals.referrer_of(id), now, daily_rate)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LedgerSnapshot {
        at: now,
        accounts,
        referrals: referrals
            .links()
            .map(|(referred, referrer)| (referred.clone(), referrer.clone()))
            .collect(),
        state_root: state_root(registry, referrals),
    })
}

/// SHA-256 root over every stored account and referral link.
pub fn state_root(registry: &AccountRegistry, referrals: &ReferralGraph) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::with_capacity(registry.len() + referrals.len());
    for (id, account) in registry.iter() {
        let mut hasher = Sha256::new();
        hasher.update(b"acct");
        hasher.update((id.len() as u64).to_le_bytes());
        hasher.update(id.as_bytes());
        hasher.update(account.principal.to_le_bytes());
        hasher.update(account.debt.to_le_bytes());
        hasher.update(account.total_withdrawn.to_le_bytes());
        hasher.update(account.checkpoint.to_le_bytes());
        hasher.update([account.has_invested as u8]);
        hasher.update(account.referral_rewards.to_le_bytes());
        hasher.update(account.referral_count.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }
    for (referred, referrer) in referrals.links() {
        let mut hasher = Sha256::new();
        hasher.update(b"link");
        hasher.update((referred.len() as u64).to_le_bytes());
        hasher.update(referred.as_bytes());
        hasher.update(referrer.as_bytes());
        leaves.push(hasher.finalize().into());
    }
    fold_leaves(leaves)
}

fn fold_leaves(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"stake-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for pair in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(pair[0]);
            hasher.update(pair.get(1).unwrap_or(&pair[0]));
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}

mod hex32 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(&encoded).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("state root must be 32 bytes"))
    }
}
