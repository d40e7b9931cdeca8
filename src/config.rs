use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) const DB_ENV: &str = "MONEYWISE_DB";
pub(crate) const LOG_ENV: &str = "MONEYWISE_LOG";
pub(crate) const CURRENCY_ENV: &str = "MONEYWISE_CURRENCY";

const DEFAULT_LOG_FILTER: &str = "warn";
const DEFAULT_CURRENCY: &str = "$";

/// Runtime settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub db_path: PathBuf,
    pub log_filter: String,
    pub currency_symbol: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = match get(DB_ENV) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        Ok(Self {
            db_path,
            log_filter: get(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
            currency_symbol: get(CURRENCY_ENV).unwrap_or_else(|| DEFAULT_CURRENCY.into()),
        })
    }
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "moneywise", "MoneyWise")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("moneywise.db"))
}
