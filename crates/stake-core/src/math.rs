//! Integer fixed-point helpers. Every division floors, so rounding always
//! stays with the ledger.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::{Amount, Timestamp};

pub const SECONDS_PER_DAY: u64 = 86_400;
/// Base units per whole token (18 decimals).
pub const TOKEN_SCALE: Amount = 1_000_000_000_000_000_000;

/// A non-negative rational rate such as `3/100`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ratio {
    pub numerator: u64,
    pub denominator: u64,
}

impl Ratio {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0, 1)
    }

    /// Percent shorthand, `Ratio::percent(30)` is 30/100.
    pub const fn percent(value: u64) -> Self {
        Self::new(value, 100)
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// True when the ratio is at most one.
    pub fn is_fraction(&self) -> bool {
        self.numerator <= self.denominator
    }

    /// `floor(amount * numerator / denominator)`.
    pub fn apply(&self, amount: Amount) -> Result<Amount, LedgerError> {
        if self.denominator == 0 {
            return Err(LedgerError::InvalidConfig("ratio denominator is zero".into()));
        }
        amount
            .checked_mul(self.numerator as u128)
            .map(|scaled| scaled / self.denominator as u128)
            .ok_or(LedgerError::MathOverflow)
    }

    /// `ceil(amount * numerator / denominator)`, for thresholds the caller
    /// must meet in full.
    pub fn apply_ceil(&self, amount: Amount) -> Result<Amount, LedgerError> {
        if self.denominator == 0 {
            return Err(LedgerError::InvalidConfig("ratio denominator is zero".into()));
        }
        let scaled = amount
            .checked_mul(self.numerator as u128)
            .ok_or(LedgerError::MathOverflow)?;
        let denominator = self.denominator as u128;
        Ok(scaled / denominator + u128::from(scaled % denominator != 0))
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("empty amount")]
    Empty,
    #[error("invalid digit in amount {0:?}")]
    InvalidDigit(String),
    #[error("more than 18 fractional digits in {0:?}")]
    TooPrecise(String),
    #[error("amount {0:?} does not fit")]
    Overflow(String),
}

/// Parse a decimal token amount such as `"695.5"` into base units.
pub fn parse_tokens(input: &str) -> Result<Amount, AmountParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountParseError::Empty);
    }
    let (whole, frac) = input.split_once('.').unwrap_or((input, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountParseError::InvalidDigit(input.to_string()));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(AmountParseError::InvalidDigit(input.to_string()));
    }
    let frac = frac.trim_end_matches('0');
    if frac.len() > 18 {
        return Err(AmountParseError::TooPrecise(input.to_string()));
    }
    let overflow = || AmountParseError::Overflow(input.to_string());
    let whole: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let frac_units: Amount = if frac.is_empty() {
        0
    } else {
        let digits: Amount = frac.parse().map_err(|_| overflow())?;
        digits * 10u128.pow(18 - frac.len() as u32)
    };
    whole
        .checked_mul(TOKEN_SCALE)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(overflow)
}

/// Render base units as a decimal token amount without trailing zeros.
pub fn format_tokens(amount: Amount) -> String {
    let whole = amount / TOKEN_SCALE;
    let frac = amount % TOKEN_SCALE;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Serde adapter writing an [`Amount`] as a decimal string of base units;
/// TOML has no 128-bit integers.
pub mod amount_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::Amount;

    pub fn serialize<S>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        encoded.trim().parse().map_err(D::Error::custom)
    }
}

/// Seconds between `checkpoint` and `now`; a clock that runs backwards is
/// rejected instead of producing negative time.
pub fn elapsed(checkpoint: Timestamp, now: Timestamp) -> Result<u64, LedgerError> {
    now.checked_sub(checkpoint)
        .ok_or(LedgerError::InvalidTime { checkpoint, now })
}

/// Yield on `principal` for `elapsed_secs` at `daily_rate` per full day.
///
/// Computed as `principal * num * elapsed / (SECONDS_PER_DAY * den)` with a
/// single truncating division at the end.
pub fn interest(
    principal: Amount,
    elapsed_secs: u64,
    daily_rate: Ratio,
) -> Result<Amount, LedgerError> {
    if principal == 0 || elapsed_secs == 0 || daily_rate.is_zero() {
        return Ok(0);
    }
    if daily_rate.denominator == 0 {
        return Err(LedgerError::InvalidConfig("daily rate denominator is zero".into()));
    }
    let numerator = principal
        .checked_mul(daily_rate.numerator as u128)
        .and_then(|v| v.checked_mul(elapsed_secs as u128))
        .ok_or(LedgerError::MathOverflow)?;
    let denominator = (SECONDS_PER_DAY as u128) * (daily_rate.denominator as u128);
    Ok(numerator / denominator)
}

/// Accrued yield between `checkpoint` and `now`.
pub fn accrued(
    principal: Amount,
    checkpoint: Timestamp,
    now: Timestamp,
    daily_rate: Ratio,
) -> Result<Amount, LedgerError> {
    interest(principal, elapsed(checkpoint, now)?, daily_rate)
}
