use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::math::{Ratio, TOKEN_SCALE};
use crate::{AccountId, Amount};

/// Who bears the referral commission on a first deposit.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommissionSource {
    /// Deducted from the depositor's net before it is credited to principal.
    #[default]
    Principal,
    /// Paid from the ledger's reserve; the full net is credited.
    Reserve,
}

/// Parameters fixed when the ledger is created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Reference to the single token the ledger accepts.
    pub token: String,
    /// The ledger's own identity in the token system.
    pub custody: AccountId,
    /// Fee recipient.
    pub admin: AccountId,
    #[serde(default)]
    pub commission_source: CommissionSource,
    /// Floor for every deposit after the first.
    #[serde(with = "crate::math::amount_string")]
    pub min_compound: Amount,
    /// Taken from every deposit and paid to `admin`.
    pub fee_rate: Ratio,
    /// Share of the first net deposit paid to the depositor's referrer.
    pub referral_rate: Ratio,
    /// Yield per full day on staked principal.
    pub daily_rate: Ratio,
    /// Share of the withdrawable total held back as debt.
    pub withdraw_lock: Ratio,
    /// Share of the outstanding debt a deposit must reach to release it.
    pub min_reinvest: Ratio,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            token: "BUSD".into(),
            custody: "ledger".into(),
            admin: "admin".into(),
            commission_source: CommissionSource::Principal,
            min_compound: 20 * TOKEN_SCALE,
            fee_rate: Ratio::new(5, 700),
            referral_rate: Ratio::percent(10),
            daily_rate: Ratio::percent(3),
            withdraw_lock: Ratio::percent(30),
            min_reinvest: Ratio::percent(50),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), LedgerError> {
        let rates = [
            ("fee_rate", self.fee_rate, true),
            ("referral_rate", self.referral_rate, true),
            ("daily_rate", self.daily_rate, false),
            ("withdraw_lock", self.withdraw_lock, true),
            ("min_reinvest", self.min_reinvest, true),
        ];
        for (name, rate, must_be_fraction) in rates {
            if rate.denominator == 0 {
                return Err(LedgerError::InvalidConfig(format!(
                    "{name} has a zero denominator"
                )));
            }
            if must_be_fraction && !rate.is_fraction() {
                return Err(LedgerError::InvalidConfig(format!("{name} exceeds 1")));
            }
        }
        if self.custody.is_empty() || self.admin.is_empty() {
            return Err(LedgerError::InvalidConfig(
                "custody and admin identities must be set".into(),
            ));
        }
        if self.admin == self.custody {
            return Err(LedgerError::InvalidConfig(
                "admin must differ from the custody account".into(),
            ));
        }
        Ok(())
    }
}
