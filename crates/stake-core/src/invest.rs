//! Deposits: fee split, one-time referral commission, debt release.

use serde::{Deserialize, Serialize};

use crate::accrual;
use crate::config::{CommissionSource, LedgerConfig};
use crate::error::LedgerError;
use crate::ledger::{PayoutKind, SettlementPlan};
use crate::registry::Account;
use crate::{AccountId, Amount, Timestamp};

/// What a committed deposit did.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvestReceipt {
    pub amount: Amount,
    pub interest_realized: Amount,
    pub fee: Amount,
    pub referrer: Option<AccountId>,
    pub commission: Amount,
    /// Added to principal after fee and commission.
    pub credited: Amount,
    pub released_debt: Amount,
}

/// A deposit fully worked out but not yet applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvestPlan {
    pub receipt: InvestReceipt,
    pub updated: Account,
    pub settlement: SettlementPlan,
}

/// Check the deposit preconditions and compute every effect of investing
/// `amount` for `investor` at `now`. Pure: nothing is mutated.
pub fn plan(
    config: &LedgerConfig,
    investor: &AccountId,
    account: &Account,
    referrer: Option<&AccountId>,
    amount: Amount,
    now: Timestamp,
) -> Result<InvestPlan, LedgerError> {
    if amount == 0 {
        return Err(LedgerError::ZeroAmount);
    }
    if account.has_invested && amount < config.min_compound {
        return Err(LedgerError::BelowMinimumCompound {
            amount,
            minimum: config.min_compound,
        });
    }
    if account.debt > 0 {
        let required = config.min_reinvest.apply_ceil(account.debt)?;
        if amount < required {
            return Err(LedgerError::InsufficientReinvestment { amount, required });
        }
    }

    let interest = accrual::pending_interest(account, now, config.daily_rate)?;
    let fee = config.fee_rate.apply(amount)?;
    let net = amount - fee;

    // Commission is paid on the first deposit only.
    let referrer = referrer.filter(|_| !account.has_invested);
    let commission = match referrer {
        Some(_) => config.referral_rate.apply(net)?,
        None => 0,
    };
    let credited = match config.commission_source {
        CommissionSource::Principal => net - commission,
        CommissionSource::Reserve => net,
    };
    let released_debt = account.debt;

    let principal = account
        .principal
        .checked_add(interest)
        .and_then(|p| p.checked_add(credited))
        .ok_or(LedgerError::MathOverflow)?;
    let updated = Account {
        principal,
        debt: 0,
        checkpoint: now,
        has_invested: true,
        ..account.clone()
    };

    let mut settlement = SettlementPlan::pull(investor.clone(), amount);
    settlement.pay(&config.admin, fee, PayoutKind::Fee);
    if let Some(referrer) = referrer {
        settlement.pay(referrer, commission, PayoutKind::Commission);
    }
    settlement.pay(investor, released_debt, PayoutKind::DebtRelease);

    Ok(InvestPlan {
        receipt: InvestReceipt {
            amount,
            interest_realized: interest,
            fee,
            referrer: referrer.cloned(),
            commission,
            credited,
            released_debt,
        },
        updated,
        settlement,
    })
}
