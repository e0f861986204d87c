//! Ledger configuration file handling.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stake_core::LedgerConfig;

pub const CONFIG_ENV: &str = "STAKE_LEDGER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "stake-ledger.toml";

/// `--config` if given, else `$STAKE_LEDGER_CONFIG`, else the default path.
pub fn resolve_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load and validate configuration from a TOML file.
pub fn load(path: &Path) -> Result<LedgerConfig> {
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: LedgerConfig =
        toml::from_str(&config_str).context("Failed to parse config TOML")?;
    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

/// Write the default configuration to `path`.
pub fn write_default(path: &Path) -> Result<()> {
    let toml_str = toml::to_string_pretty(&LedgerConfig::default())
        .context("Failed to serialize config")?;
    std::fs::write(path, toml_str)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    log::info!("Created default config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stake_core::{CommissionSource, Ratio};

    #[test]
    fn default_config_round_trips_through_toml() {
        let path = std::env::temp_dir().join(format!(
            "stake-ledger-config-{}.toml",
            rand::random::<u64>()
        ));
        write_default(&path).unwrap();
        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, LedgerConfig::default());
    }

    #[test]
    fn commission_source_defaults_when_omitted() {
        let text = r#"
token = "BUSD"
custody = "ledger"
admin = "admin"
min_compound = "10000000000000000000"
fee_rate = { numerator = 1, denominator = 100 }
referral_rate = { numerator = 10, denominator = 100 }
daily_rate = { numerator = 3, denominator = 100 }
withdraw_lock = { numerator = 30, denominator = 100 }
min_reinvest = { numerator = 50, denominator = 100 }
"#;
        let config: LedgerConfig = toml::from_str(text).unwrap();
        assert_eq!(config.commission_source, CommissionSource::Principal);
        assert_eq!(config.fee_rate, Ratio::percent(1));
        assert_eq!(config.min_compound, 10 * stake_core::TOKEN_SCALE);
    }

    #[test]
    fn flag_wins_over_default() {
        let path = resolve_path(Some(PathBuf::from("custom.toml")));
        assert_eq!(path, PathBuf::from("custom.toml"));
    }
}
