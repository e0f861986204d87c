use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stake_core::{format_tokens, parse_tokens, AccountId, Amount, Timestamp, TokenLedger};

mod config;
mod state;

#[derive(Parser)]
#[command(name = "stake-ledger", version, about = "Staking and referral ledger")]
struct Cli {
    /// Ledger configuration (TOML); falls back to $STAKE_LEDGER_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Persisted ledger state (JSON)
    #[arg(long, global = true, default_value = "stake-ledger.state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default configuration
    ConfigTemplate { path: PathBuf },
    /// Create a fresh state file from the configuration
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Credit tokens to an account in the simulated token system
    Mint {
        #[arg(long)]
        account: AccountId,
        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
    },
    /// Set how much the ledger may pull from an account
    Approve {
        #[arg(long)]
        account: AccountId,
        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
    },
    /// Bind a referred account to its referrer
    Refer {
        #[arg(long)]
        referred: AccountId,
        #[arg(long)]
        referrer: AccountId,
    },
    Invest {
        #[arg(long)]
        account: AccountId,
        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
        #[arg(long)]
        now: Timestamp,
    },
    Withdraw {
        #[arg(long)]
        account: AccountId,
        #[arg(long)]
        now: Timestamp,
    },
    /// Print an account snapshot as JSON
    Status {
        #[arg(long)]
        account: AccountId,
        #[arg(long)]
        now: Timestamp,
    },
    /// Print the state root
    Root,
}

fn parse_amount(s: &str) -> Result<Amount, String> {
    parse_tokens(s).map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct StatusView {
    account: AccountId,
    principal: String,
    debt: String,
    total_withdrawn: String,
    pending_interest: String,
    referral_rewards: String,
    referral_count: u64,
    referrer: Option<AccountId>,
    checkpoint: Timestamp,
    wallet_balance: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to encode output")?
    );
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::ConfigTemplate { path } => config::write_default(&path),
        Command::Init { force } => {
            let config_path = config::resolve_path(cli.config);
            let config = config::load(&config_path)?;
            let ledger = state::create(&cli.state, config, force)?;
            log::info!(
                "initialised {} for token {}",
                cli.state.display(),
                ledger.config().token
            );
            Ok(())
        }
        Command::Mint { account, amount } => {
            let mut ledger = state::load(&cli.state)?;
            ledger.token_mut().mint(&account, amount);
            state::save(&cli.state, &ledger)?;
            println!("minted {} to {account}", format_tokens(amount));
            Ok(())
        }
        Command::Approve { account, amount } => {
            let mut ledger = state::load(&cli.state)?;
            let custody = ledger.config().custody.clone();
            ledger.token_mut().approve(&account, &custody, amount);
            state::save(&cli.state, &ledger)?;
            println!("{account} approved {}", format_tokens(amount));
            Ok(())
        }
        Command::Refer { referred, referrer } => {
            let mut ledger = state::load(&cli.state)?;
            let outcome = ledger.record_referral(&referred, &referrer)?;
            state::save(&cli.state, &ledger)?;
            println!("{referred} -> {referrer}: {outcome:?}");
            Ok(())
        }
        Command::Invest {
            account,
            amount,
            now,
        } => {
            let mut ledger = state::load(&cli.state)?;
            let receipt = ledger.invest(&account, amount, now)?;
            state::save(&cli.state, &ledger)?;
            print_json(&receipt)
        }
        Command::Withdraw { account, now } => {
            let mut ledger = state::load(&cli.state)?;
            let receipt = ledger.withdraw(&account, now)?;
            state::save(&cli.state, &ledger)?;
            print_json(&receipt)
        }
        Command::Status { account, now } => {
            let ledger = state::load(&cli.state)?;
            let snap = ledger.account_snapshot(&account, now)?;
            print_json(&StatusView {
                principal: format_tokens(snap.principal),
                debt: format_tokens(snap.debt),
                total_withdrawn: format_tokens(snap.total_withdrawn),
                pending_interest: format_tokens(snap.pending_interest),
                referral_rewards: format_tokens(snap.referral_rewards),
                referral_count: snap.referral_count,
                referrer: snap.referrer,
                checkpoint: snap.checkpoint,
                wallet_balance: format_tokens(ledger.token().balance_of(&account)),
                account: snap.account,
            })
        }
        Command::Root => {
            let ledger = state::load(&cli.state)?;
            println!("{}", hex::encode(ledger.state_root()));
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()) {
        // surface the ledger's stable code when the failure came from it
        match err.downcast_ref::<stake_core::LedgerError>() {
            Some(ledger_err) => eprintln!("error [{}]: {err:#}", ledger_err.code()),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
