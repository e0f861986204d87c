//! Withdrawals: realise yield, pay out the unlocked share, re-base the lock.

use serde::{Deserialize, Serialize};

use crate::accrual;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::ledger::{PayoutKind, SettlementPlan};
use crate::registry::Account;
use crate::{AccountId, Amount, Timestamp};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub interest_realized: Amount,
    pub total: Amount,
    pub payout: Amount,
    pub locked: Amount,
    /// Debt from an earlier withdrawal replaced by `locked`.
    pub forfeited_debt: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawPlan {
    pub receipt: WithdrawReceipt,
    pub updated: Account,
    pub settlement: SettlementPlan,
}

pub fn plan(
    config: &LedgerConfig,
    holder: &AccountId,
    account: &Account,
    now: Timestamp,
) -> Result<WithdrawPlan, LedgerError> {
    let interest = accrual::pending_interest(account, now, config.daily_rate)?;
    let total = account
        .principal
        .checked_add(interest)
        .ok_or(LedgerError::MathOverflow)?;
    if total == 0 {
        return Err(LedgerError::NothingToWithdraw);
    }
    let locked = config.withdraw_lock.apply(total)?;
    let payout = total - locked;
    let total_withdrawn = account
        .total_withdrawn
        .checked_add(payout)
        .ok_or(LedgerError::MathOverflow)?;

    let updated = Account {
        principal: 0,
        debt: locked,
        checkpoint: now,
        total_withdrawn,
        ..account.clone()
    };
    let mut settlement = SettlementPlan::default();
    settlement.pay(holder, payout, PayoutKind::Withdrawal);

    Ok(WithdrawPlan {
        receipt: WithdrawReceipt {
            interest_realized: interest,
            total,
            payout,
            locked,
            forfeited_debt: account.debt,
        },
        updated,
        settlement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{SECONDS_PER_DAY, TOKEN_SCALE};

    #[test]
    fn lock_rebases_on_current_total() {
        let config = LedgerConfig::default();
        let account = Account {
            principal: 695 * TOKEN_SCALE,
            debt: 1_000 * TOKEN_SCALE,
            has_invested: true,
            ..Account::default()
        };
        let plan = plan(&config, &"bob".into(), &account, SECONDS_PER_DAY).unwrap();
        let total = 695 * TOKEN_SCALE + 2085 * TOKEN_SCALE / 100;
        assert_eq!(plan.receipt.total, total);
        assert_eq!(plan.updated.debt, total * 30 / 100);
        assert_eq!(plan.receipt.payout, total - total * 30 / 100);
        assert_eq!(plan.receipt.forfeited_debt, 1_000 * TOKEN_SCALE);
        assert_eq!(plan.updated.principal, 0);
        assert_eq!(plan.updated.total_withdrawn, plan.receipt.payout);
    }

    #[test]
    fn debt_alone_is_not_withdrawable() {
        let config = LedgerConfig::default();
        let account = Account {
            debt: 10,
            has_invested: true,
            ..Account::default()
        };
        let err = plan(&config, &"bob".into(), &account, 100).unwrap_err();
        assert_eq!(err, LedgerError::NothingToWithdraw);
    }
}
