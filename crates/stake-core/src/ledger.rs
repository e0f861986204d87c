use serde::{Deserialize, Serialize};

use crate::accrual;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::invest::{self, InvestReceipt};
use crate::referral::{LinkOutcome, ReferralGraph};
use crate::registry::{Account, AccountRegistry};
use crate::snapshot::{self, AccountSnapshot, LedgerSnapshot};
use crate::token::TokenLedger;
use crate::withdraw::{self, WithdrawReceipt};
use crate::{AccountId, Amount, Timestamp};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutKind {
    Fee,
    Commission,
    DebtRelease,
    Withdrawal,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payout {
    pub to: AccountId,
    pub amount: Amount,
    pub kind: PayoutKind,
}

/// Token movements of one operation: an optional pull into custody followed
/// by payouts out of it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettlementPlan {
    pub pull: Option<(AccountId, Amount)>,
    pub payouts: Vec<Payout>,
}

impl SettlementPlan {
    pub fn pull(payer: AccountId, amount: Amount) -> Self {
        Self {
            pull: Some((payer, amount)),
            payouts: Vec::new(),
        }
    }

    /// Queue a payout; zero amounts are dropped.
    pub fn pay(&mut self, to: &AccountId, amount: Amount, kind: PayoutKind) {
        if amount == 0 {
            return;
        }
        self.payouts.push(Payout {
            to: to.clone(),
            amount,
            kind,
        });
    }

    pub fn total_in(&self) -> Amount {
        self.pull.as_ref().map(|(_, amount)| *amount).unwrap_or(0)
    }

    pub fn total_out(&self) -> Result<Amount, LedgerError> {
        self.payouts
            .iter()
            .try_fold(0u128, |acc, p| acc.checked_add(p.amount))
            .ok_or(LedgerError::MathOverflow)
    }
}

/// The staking ledger: account registry, referral graph and the token
/// system it settles through.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakeLedger<T> {
    config: LedgerConfig,
    registry: AccountRegistry,
    referrals: ReferralGraph,
    token: T,
}

impl<T: TokenLedger> StakeLedger<T> {
    pub fn new(config: LedgerConfig, token: T) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self {
            config,
            registry: AccountRegistry::new(),
            referrals: ReferralGraph::new(),
            token,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    /// Direct access to the token system, for hosts that simulate it.
    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    /// Tokens currently held in the ledger's custody.
    pub fn custody_balance(&self) -> Amount {
        self.token.balance_of(&self.config.custody)
    }

    /// Bind `referred` to `referrer`. Re-binding an account that already has
    /// a referrer succeeds without changing anything.
    pub fn record_referral(
        &mut self,
        referred: &AccountId,
        referrer: &AccountId,
    ) -> Result<LinkOutcome, LedgerError> {
        let outcome = self.referrals.record(referred, referrer).map_err(|err| {
            log::warn!("referral {referred} -> {referrer} rejected: {}", err.code());
            err
        })?;
        self.registry.get_or_create(referred);
        if outcome == LinkOutcome::Created {
            let account = self.registry.get_or_create(referrer);
            account.referral_count += 1;
            log::info!("referral bound: {referred} -> {referrer}");
        } else {
            log::debug!("referral for {referred} already bound, ignoring {referrer}");
        }
        Ok(outcome)
    }

    pub fn invest(
        &mut self,
        investor: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<InvestReceipt, LedgerError> {
        let result = self.try_invest(investor, amount, now);
        if let Err(err) = &result {
            log::warn!("invest by {investor} of {amount} rejected: {}", err.code());
        }
        result
    }

    fn try_invest(
        &mut self,
        investor: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<InvestReceipt, LedgerError> {
        let account = self.registry.load(investor);
        let referrer = self.referrals.referrer_of(investor).cloned();
        let plan = invest::plan(&self.config, investor, &account, referrer.as_ref(), amount, now)?;
        log::debug!(
            "invest plan for {investor}: fee={} commission={} credited={} released={}",
            plan.receipt.fee,
            plan.receipt.commission,
            plan.receipt.credited,
            plan.receipt.released_debt
        );

        self.registry.validate(investor, &plan.updated)?;
        if let Some(referrer) = &plan.receipt.referrer {
            self.registry
                .check_referral_reward(referrer, plan.receipt.commission)?;
        }
        self.settle(&plan.settlement)?;

        self.registry.commit(investor, plan.updated);
        if let Some(referrer) = &plan.receipt.referrer {
            self.registry
                .credit_referral_reward(referrer, plan.receipt.commission)?;
        }
        log::info!(
            "{investor} invested {amount} (fee {}, commission {}, released {})",
            plan.receipt.fee,
            plan.receipt.commission,
            plan.receipt.released_debt
        );
        Ok(plan.receipt)
    }

    pub fn withdraw(
        &mut self,
        holder: &AccountId,
        now: Timestamp,
    ) -> Result<WithdrawReceipt, LedgerError> {
        let result = self.try_withdraw(holder, now);
        if let Err(err) = &result {
            log::warn!("withdraw by {holder} rejected: {}", err.code());
        }
        result
    }

    fn try_withdraw(
        &mut self,
        holder: &AccountId,
        now: Timestamp,
    ) -> Result<WithdrawReceipt, LedgerError> {
        let account = self.registry.load(holder);
        let plan = withdraw::plan(&self.config, holder, &account, now)?;
        log::debug!(
            "withdraw plan for {holder}: total={} payout={} locked={}",
            plan.receipt.total,
            plan.receipt.payout,
            plan.receipt.locked
        );

        self.registry.validate(holder, &plan.updated)?;
        self.settle(&plan.settlement)?;

        self.registry.commit(holder, plan.updated);
        log::info!(
            "{holder} withdrew {} ({} locked)",
            plan.receipt.payout,
            plan.receipt.locked
        );
        Ok(plan.receipt)
    }

    /// Move the tokens of a plan. Custody coverage is checked before anything
    /// moves, so a failed pull is the only token error that can occur and it
    /// happens before any payout.
    fn settle(&mut self, plan: &SettlementPlan) -> Result<(), LedgerError> {
        let required = plan.total_out()?;
        let available = self
            .custody_balance()
            .checked_add(plan.total_in())
            .ok_or(LedgerError::MathOverflow)?;
        if required > available {
            return Err(LedgerError::InsufficientCustody {
                required,
                available,
            });
        }
        let custody = &self.config.custody;
        if let Some((payer, amount)) = &plan.pull {
            self.token.transfer_from(payer, custody, *amount)?;
        }
        for payout in &plan.payouts {
            self.token.transfer(custody, &payout.to, payout.amount)?;
        }
        Ok(())
    }

    pub fn pending_interest(
        &self,
        id: &AccountId,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        accrual::pending_interest(&self.registry.load(id), now, self.config.daily_rate)
    }

    /// Stored fields plus pending interest, read at one instant.
    pub fn account_snapshot(
        &self,
        id: &AccountId,
        now: Timestamp,
    ) -> Result<AccountSnapshot, LedgerError> {
        let account = self.registry.load(id);
        snapshot::account_snapshot(
            id,
            &account,
            self.referrals.referrer_of(id),
            now,
            self.config.daily_rate,
        )
    }

    pub fn referrer_of(&self, id: &AccountId) -> Option<&AccountId> {
        self.referrals.referrer_of(id)
    }

    /// Cumulative commissions credited to `id` as a referrer.
    pub fn pending_referral_rewards_of(&self, id: &AccountId) -> Amount {
        self.registry.get(id).map(|a| a.referral_rewards).unwrap_or(0)
    }

    pub fn referral_count_of(&self, id: &AccountId) -> u64 {
        self.registry.get(id).map(|a| a.referral_count).unwrap_or(0)
    }

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.registry.get(id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Account)> {
        self.registry.iter()
    }

    pub fn total_principal(&self) -> Amount {
        self.registry.total_principal()
    }

    pub fn total_debt(&self) -> Amount {
        self.registry.total_debt()
    }

    /// Every account with its pending interest at `now`, plus the state root.
    pub fn snapshot(&self, now: Timestamp) -> Result<LedgerSnapshot, LedgerError> {
        snapshot::ledger_snapshot(&self.registry, &self.referrals, now, self.config.daily_rate)
    }

    pub fn state_root(&self) -> [u8; 32] {
        snapshot::state_root(&self.registry, &self.referrals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{SECONDS_PER_DAY, TOKEN_SCALE};
    use crate::token::InMemoryToken;

    fn funded_ledger() -> StakeLedger<InMemoryToken> {
        let config = LedgerConfig::default();
        let mut token = InMemoryToken::new();
        token.mint(&config.custody, 1_000_000 * TOKEN_SCALE);
        for user in ["bob", "carol"] {
            let user = user.to_string();
            token.mint(&user, 10_000 * TOKEN_SCALE);
            token.approve(&user, &config.custody, u128::MAX);
        }
        StakeLedger::new(config, token).unwrap()
    }

    #[test]
    fn failed_pull_changes_nothing() {
        let mut ledger = funded_ledger();
        let dave = "dave".to_string();
        let root = ledger.state_root();
        let custody = ledger.custody_balance();

        let err = ledger.invest(&dave, 700 * TOKEN_SCALE, 0).unwrap_err();
        assert_eq!(err.code(), "InsufficientAllowance");
        assert_eq!(ledger.state_root(), root);
        assert_eq!(ledger.custody_balance(), custody);
        assert!(ledger.account(&dave).is_none());
    }

    #[test]
    fn referral_reward_overflow_rejects_before_tokens_move() {
        let mut ledger = funded_ledger();
        let (bob, carol) = ("bob".to_string(), "carol".to_string());
        ledger.record_referral(&bob, &carol).unwrap();
        ledger.registry.get_or_create(&carol).referral_rewards = u128::MAX;
        let root = ledger.state_root();
        let custody = ledger.custody_balance();
        let balance = ledger.token().balance_of(&bob);

        let err = ledger.invest(&bob, 700 * TOKEN_SCALE, 0).unwrap_err();
        assert_eq!(err, LedgerError::MathOverflow);
        assert_eq!(ledger.state_root(), root);
        assert_eq!(ledger.custody_balance(), custody);
        assert_eq!(ledger.token().balance_of(&bob), balance);
        assert!(!ledger.account(&bob).unwrap().has_invested);
    }

    #[test]
    fn withdraw_refuses_when_custody_cannot_cover() {
        let config = LedgerConfig::default();
        let bob = "bob".to_string();
        let mut token = InMemoryToken::new();
        token.mint(&bob, 1_000 * TOKEN_SCALE);
        token.approve(&bob, &config.custody, u128::MAX);
        let mut ledger = StakeLedger::new(config, token).unwrap();

        ledger.invest(&bob, 700 * TOKEN_SCALE, 0).unwrap();
        // custody holds exactly the 695 net; a long wait accrues more than it holds
        let before = ledger.account(&bob).cloned();
        let err = ledger.withdraw(&bob, 100 * SECONDS_PER_DAY).unwrap_err();
        assert_eq!(err.code(), "InsufficientCustody");
        assert_eq!(ledger.account(&bob).cloned(), before);
    }

    #[test]
    fn referral_updates_counts_once() {
        let mut ledger = funded_ledger();
        let (bob, carol, dave) = ("bob".to_string(), "carol".to_string(), "dave".to_string());
        assert_eq!(ledger.record_referral(&bob, &carol).unwrap(), LinkOutcome::Created);
        assert_eq!(
            ledger.record_referral(&bob, &dave).unwrap(),
            LinkOutcome::AlreadyBound
        );
        assert_eq!(ledger.referral_count_of(&carol), 1);
        assert_eq!(ledger.referral_count_of(&dave), 0);
        assert_eq!(ledger.referrer_of(&bob), Some(&carol));
        assert!(ledger.account(&bob).is_some());
    }

    #[test]
    fn withdraw_without_stake_fails() {
        let mut ledger = funded_ledger();
        let err = ledger.withdraw(&"bob".into(), 10).unwrap_err();
        assert_eq!(err, LedgerError::NothingToWithdraw);
    }

    #[test]
    fn snapshot_reports_pending_without_realizing_it() {
        let mut ledger = funded_ledger();
        let bob = "bob".to_string();
        ledger.invest(&bob, 700 * TOKEN_SCALE, 0).unwrap();
        let snap = ledger.account_snapshot(&bob, SECONDS_PER_DAY).unwrap();
        assert_eq!(snap.principal, 695 * TOKEN_SCALE);
        assert_eq!(snap.pending_interest, 2085 * TOKEN_SCALE / 100);
        assert_eq!(ledger.account(&bob).unwrap().principal, 695 * TOKEN_SCALE);
    }
}
