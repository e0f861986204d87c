use thiserror::Error;

use crate::token::TokenError;
use crate::{Amount, Timestamp};

/// Every way a ledger operation can be rejected.
///
/// A rejected operation leaves the ledger and the token system untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("minimum compounding is {minimum}, got {amount}")]
    BelowMinimumCompound { amount: Amount, minimum: Amount },

    #[error("reinvest at least {required} to release locked earnings, got {amount}")]
    InsufficientReinvestment { amount: Amount, required: Amount },

    #[error("an account cannot refer itself")]
    SelfReferral,

    #[error("nothing to withdraw")]
    NothingToWithdraw,

    #[error("timestamp {now} precedes checkpoint {checkpoint}")]
    InvalidTime { checkpoint: Timestamp, now: Timestamp },

    #[error("arithmetic overflow")]
    MathOverflow,

    #[error("custody holds {available}, operation needs {required}")]
    InsufficientCustody { required: Amount, available: Amount },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl LedgerError {
    /// Stable identifier for the rejection cause.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::ZeroAmount => "ZeroAmount",
            LedgerError::BelowMinimumCompound { .. } => "BelowMinimumCompound",
            LedgerError::InsufficientReinvestment { .. } => "InsufficientReinvestment",
            LedgerError::SelfReferral => "SelfReferral",
            LedgerError::NothingToWithdraw => "NothingToWithdraw",
            LedgerError::InvalidTime { .. } => "InvalidTime",
            LedgerError::MathOverflow => "MathOverflow",
            LedgerError::InsufficientCustody { .. } => "InsufficientCustody",
            LedgerError::InvalidConfig(_) => "InvalidConfig",
            LedgerError::Token(err) => err.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_keep_their_own_code() {
        let err: LedgerError = TokenError::InsufficientAllowance {
            account: "bob".into(),
            required: 10,
            available: 0,
        }
        .into();
        assert_eq!(err.code(), "InsufficientAllowance");
        assert_eq!(LedgerError::NothingToWithdraw.code(), "NothingToWithdraw");
    }
}
