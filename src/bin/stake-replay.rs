//! Replays a JSON-lines scenario against a fresh in-memory ledger.
//!
//! Each line is one step, e.g.
//! `{"op":"invest","account":"bob","amount":"700","now":0}`. Mutating steps
//! may carry `"expect_error":"<code>"`; `expect` steps compare an account
//! snapshot against the given token amounts.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use stake_core::{
    format_tokens, parse_tokens, AccountId, Amount, InMemoryToken, InvestReceipt, LedgerConfig,
    LedgerError, StakeLedger, Timestamp, TokenLedger, WithdrawReceipt,
};

#[derive(Parser)]
#[command(name = "stake-replay", about = "Replay a ledger scenario")]
struct Args {
    /// Scenario file, one JSON step per line
    scenario: PathBuf,
    /// Ledger configuration (TOML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Mint {
        account: AccountId,
        amount: String,
    },
    /// Approve the ledger's custody account
    Approve {
        account: AccountId,
        amount: String,
    },
    Refer {
        referred: AccountId,
        referrer: AccountId,
        expect_error: Option<String>,
    },
    Invest {
        account: AccountId,
        amount: String,
        now: Timestamp,
        expect_error: Option<String>,
    },
    Withdraw {
        account: AccountId,
        now: Timestamp,
        expect_error: Option<String>,
    },
    Expect {
        account: AccountId,
        now: Timestamp,
        principal: Option<String>,
        debt: Option<String>,
        pending_interest: Option<String>,
        total_withdrawn: Option<String>,
        referral_rewards: Option<String>,
        balance: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
enum Receipt {
    Invest(InvestReceipt),
    Withdraw(WithdrawReceipt),
}

#[derive(Serialize)]
struct Outcome {
    line: usize,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt: Option<Receipt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    mismatches: Vec<String>,
}

impl Outcome {
    fn new(line: usize) -> Self {
        Self {
            line,
            ok: true,
            code: None,
            receipt: None,
            mismatches: Vec::new(),
        }
    }
}

fn amount(s: &str) -> Result<Amount> {
    parse_tokens(s).with_context(|| format!("bad amount {s:?}"))
}

/// Compare a ledger result with the error code the step expects, if any.
fn judge<T>(
    outcome: &mut Outcome,
    result: Result<T, LedgerError>,
    expect_error: Option<String>,
) -> Option<T> {
    match (result, expect_error) {
        (Ok(value), None) => Some(value),
        (Ok(value), Some(code)) => {
            outcome.ok = false;
            outcome.mismatches.push(format!("expected {code}, operation succeeded"));
            Some(value)
        }
        (Err(err), expected) => {
            outcome.code = Some(err.code());
            if expected.as_deref() != Some(err.code()) {
                outcome.ok = false;
            }
            None
        }
    }
}

fn check(
    outcome: &mut Outcome,
    field: &str,
    expected: Option<String>,
    actual: Amount,
) -> Result<()> {
    if let Some(expected) = expected {
        if amount(&expected)? != actual {
            outcome.ok = false;
            outcome.mismatches.push(format!(
                "{field}: expected {expected}, got {}",
                format_tokens(actual)
            ));
        }
    }
    Ok(())
}

fn apply(
    ledger: &mut StakeLedger<InMemoryToken>,
    step: Step,
    outcome: &mut Outcome,
) -> Result<()> {
    match step {
        Step::Mint { account, amount: value } => {
            ledger.token_mut().mint(&account, amount(&value)?);
        }
        Step::Approve { account, amount: value } => {
            let custody = ledger.config().custody.clone();
            ledger.token_mut().approve(&account, &custody, amount(&value)?);
        }
        Step::Refer {
            referred,
            referrer,
            expect_error,
        } => {
            let result = ledger.record_referral(&referred, &referrer);
            judge(outcome, result, expect_error);
        }
        Step::Invest {
            account,
            amount: value,
            now,
            expect_error,
        } => {
            let result = ledger.invest(&account, amount(&value)?, now);
            let receipt = judge(outcome, result, expect_error);
            outcome.receipt = receipt.map(Receipt::Invest);
        }
        Step::Withdraw {
            account,
            now,
            expect_error,
        } => {
            let result = ledger.withdraw(&account, now);
            let receipt = judge(outcome, result, expect_error);
            outcome.receipt = receipt.map(Receipt::Withdraw);
        }
        Step::Expect {
            account,
            now,
            principal,
            debt,
            pending_interest,
            total_withdrawn,
            referral_rewards,
            balance,
        } => {
            let snap = ledger.account_snapshot(&account, now)?;
            check(outcome, "principal", principal, snap.principal)?;
            check(outcome, "debt", debt, snap.debt)?;
            check(outcome, "pending_interest", pending_interest, snap.pending_interest)?;
            check(outcome, "total_withdrawn", total_withdrawn, snap.total_withdrawn)?;
            check(outcome, "referral_rewards", referral_rewards, snap.referral_rewards)?;
            check(outcome, "balance", balance, ledger.token().balance_of(&account))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config: LedgerConfig = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&text).context("Failed to parse config TOML")?
        }
        None => LedgerConfig::default(),
    };
    let mut ledger = StakeLedger::new(config, InMemoryToken::new())?;

    let file = File::open(&args.scenario)
        .with_context(|| format!("Failed to open {}", args.scenario.display()))?;
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("Failed to read scenario")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step: Step = serde_json::from_str(line)
            .with_context(|| format!("line {}: invalid step", idx + 1))?;
        let mut outcome = Outcome::new(idx + 1);
        apply(&mut ledger, step, &mut outcome)?;
        println!("{}", serde_json::to_string(&outcome)?);
        if !outcome.ok {
            bail!("scenario failed at line {}", idx + 1);
        }
    }
    log::info!("state root {}", hex::encode(ledger.state_root()));
    Ok(())
}
