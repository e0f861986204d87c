//! One-level referral links. A link is written once and never changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::AccountId;

/// Result of [`ReferralGraph::record`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    /// A link already existed and was left as it was.
    AlreadyBound,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralGraph {
    referrers: BTreeMap<AccountId, AccountId>,
}

impl ReferralGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `referred` to `referrer` unless `referred` is already bound.
    pub fn record(
        &mut self,
        referred: &AccountId,
        referrer: &AccountId,
    ) -> Result<LinkOutcome, LedgerError> {
        if referred == referrer {
            return Err(LedgerError::SelfReferral);
        }
        if self.referrers.contains_key(referred) {
            return Ok(LinkOutcome::AlreadyBound);
        }
        self.referrers.insert(referred.clone(), referrer.clone());
        Ok(LinkOutcome::Created)
    }

    pub fn referrer_of(&self, referred: &AccountId) -> Option<&AccountId> {
        self.referrers.get(referred)
    }

    pub fn links(&self) -> impl Iterator<Item = (&AccountId, &AccountId)> {
        self.referrers.iter()
    }

    pub fn len(&self) -> usize {
        self.referrers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.referrers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writer_wins() {
        let mut graph = ReferralGraph::new();
        let (a, b, c) = ("a".to_string(), "b".to_string(), "c".to_string());
        assert_eq!(graph.record(&a, &b).unwrap(), LinkOutcome::Created);
        assert_eq!(graph.record(&a, &b).unwrap(), LinkOutcome::AlreadyBound);
        assert_eq!(graph.record(&a, &c).unwrap(), LinkOutcome::AlreadyBound);
        assert_eq!(graph.referrer_of(&a), Some(&b));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn self_referral_is_rejected() {
        let mut graph = ReferralGraph::new();
        let a = "a".to_string();
        assert_eq!(graph.record(&a, &a).unwrap_err(), LedgerError::SelfReferral);
        assert!(graph.is_empty());
    }

    #[test]
    fn depth_is_one_level() {
        let mut graph = ReferralGraph::new();
        graph.record(&"carol".into(), &"bob".into()).unwrap();
        graph.record(&"bob".into(), &"root".into()).unwrap();
        assert_eq!(graph.referrer_of(&"carol".into()).map(String::as_str), Some("bob"));
        assert_eq!(graph.referrer_of(&"root".into()), None);
    }
}
