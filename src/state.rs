//! JSON state file holding the ledger together with its simulated token book.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use stake_core::{InMemoryToken, LedgerConfig, StakeLedger};

pub type Ledger = StakeLedger<InMemoryToken>;

pub fn create(path: &Path, config: LedgerConfig, force: bool) -> Result<Ledger> {
    if path.exists() && !force {
        bail!(
            "state file {} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let ledger = StakeLedger::new(config, InMemoryToken::new())?;
    save(path, &ledger)?;
    Ok(ledger)
}

pub fn load(path: &Path) -> Result<Ledger> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;
    let ledger: Ledger = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
    ledger.config().validate()?;
    Ok(ledger)
}

/// Write to a sibling temp file, then rename over the target.
pub fn save(path: &Path, ledger: &Ledger) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(ledger).context("Failed to encode state")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stake_core::{parse_tokens, SECONDS_PER_DAY};

    #[test]
    fn state_survives_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "stake-ledger-{}.state.json",
            rand::random::<u64>()
        ));
        let mut ledger = create(&path, LedgerConfig::default(), false).unwrap();
        let bob = "bob".to_string();
        let custody = ledger.config().custody.clone();
        ledger.token_mut().mint(&bob, parse_tokens("1000").unwrap());
        ledger.token_mut().approve(&bob, &custody, u128::MAX);
        ledger.invest(&bob, parse_tokens("700").unwrap(), 0).unwrap();
        save(&path, &ledger).unwrap();

        let loaded = load(&path).unwrap();
        assert!(create(&path, LedgerConfig::default(), false).is_err());
        fs::remove_file(&path).ok();

        assert_eq!(loaded.state_root(), ledger.state_root());
        assert_eq!(
            loaded.account_snapshot(&bob, SECONDS_PER_DAY).unwrap(),
            ledger.account_snapshot(&bob, SECONDS_PER_DAY).unwrap()
        );
        assert_eq!(loaded.custody_balance(), ledger.custody_balance());
    }
}
