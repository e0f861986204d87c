use crate::error::LedgerError;
use crate::math::{self, Ratio};
use crate::registry::Account;
use crate::{Amount, Timestamp};

/// Yield accrued on `account.principal` since its checkpoint. Realises
/// nothing; both handlers and every read path go through here so the
/// rounding is identical everywhere.
pub fn pending_interest(
    account: &Account,
    now: Timestamp,
    daily_rate: Ratio,
) -> Result<Amount, LedgerError> {
    math::accrued(account.principal, account.checkpoint, now, daily_rate)
}

/// `principal + pending_interest`, the value a withdrawal would settle.
pub fn total_value(
    account: &Account,
    now: Timestamp,
    daily_rate: Ratio,
) -> Result<Amount, LedgerError> {
    account
        .principal
        .checked_add(pending_interest(account, now, daily_rate)?)
        .ok_or(LedgerError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{SECONDS_PER_DAY, TOKEN_SCALE};

    #[test]
    fn pending_grows_with_time_and_ignores_debt() {
        let account = Account {
            principal: 100 * TOKEN_SCALE,
            debt: 40 * TOKEN_SCALE,
            checkpoint: 1_000,
            ..Account::default()
        };
        let rate = Ratio::percent(3);
        assert_eq!(pending_interest(&account, 1_000, rate).unwrap(), 0);
        assert_eq!(
            pending_interest(&account, 1_000 + SECONDS_PER_DAY, rate).unwrap(),
            3 * TOKEN_SCALE
        );
        assert_eq!(
            total_value(&account, 1_000 + 2 * SECONDS_PER_DAY, rate).unwrap(),
            106 * TOKEN_SCALE
        );
    }

    #[test]
    fn regression_before_checkpoint_fails() {
        let account = Account {
            checkpoint: 10,
            ..Account::default()
        };
        assert_eq!(
            pending_interest(&account, 9, Ratio::percent(3)).unwrap_err().code(),
            "InvalidTime"
        );
    }
}
