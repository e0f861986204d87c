//! Accounting core for the stake ledger.
//!
//! The crate is split along the same lines as the state transitions it
//! implements:
//!
//! * [`math`]: integer time-proportional yield and [`Ratio`] helpers.
//! * [`referral`]: one-level, write-once referral links.
//! * [`registry`]: the keyed store of per-account records.
//! * [`accrual`]: pending (unrealised) interest as of a timestamp.
//! * [`invest`] / [`withdraw`]: the two mutating handlers, each planned in
//!   full before any token moves.
//! * [`token`]: the contract of the external fungible-token system plus an
//!   in-memory implementation.
//!
//! [`StakeLedger`] ties these together and is the only type most callers need.
//! Nothing here performs I/O; timestamps are supplied by the caller.

pub mod accrual;
pub mod config;
pub mod invest;
pub mod ledger;
pub mod math;
pub mod referral;
pub mod registry;
pub mod snapshot;
pub mod token;
pub mod withdraw;

mod error;

pub use config::{CommissionSource, LedgerConfig};
pub use error::LedgerError;
pub use invest::InvestReceipt;
pub use ledger::StakeLedger;
pub use math::{format_tokens, parse_tokens, Ratio, SECONDS_PER_DAY, TOKEN_SCALE};
pub use snapshot::{AccountSnapshot, LedgerSnapshot};
pub use token::{InMemoryToken, TokenError, TokenLedger};
pub use withdraw::WithdrawReceipt;

/// Identity of a participant in both the ledger and the token system.
pub type AccountId = String;
/// Token amount in base units.
pub type Amount = u128;
/// Seconds since an arbitrary epoch chosen by the host.
pub type Timestamp = u64;
