use anyhow::{anyhow, bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

use crate::driver::NameMatch;

const DEFAULT_TABLE_NAME: &str = "Customers";

/// Which store the demo runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    DynamoDb,
    Memory,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dynamodb" | "aws" => Ok(Backend::DynamoDb),
            "memory" => Ok(Backend::Memory),
            other => Err(anyhow!("unknown backend '{other}' (expected dynamodb or memory)")),
        }
    }
}

/// Runtime settings of the demo, read from `CUSTOMERS_*` environment variables.
///
/// Credentials, region and endpoint are not part of it: the AWS SDK resolves
/// those through its own provider chain.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub table_name: String,
    pub backend: Backend,
    pub name_match: NameMatch,
    pub wait_for_active: bool,
    pub poll_interval: Duration,
    pub max_polls: usize,
    /// Halt at the first failed step and exit with an error.
    pub strict: bool,
    pub pause_on_exit: bool,
    pub log_level: Level,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            backend: Backend::DynamoDb,
            name_match: NameMatch::Exact,
            wait_for_active: true,
            poll_interval: Duration::from_millis(1000),
            max_polls: 10,
            strict: false,
            pause_on_exit: true,
            log_level: Level::INFO,
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let max_polls = parse(&get, "CUSTOMERS_MAX_POLLS")?.unwrap_or(defaults.max_polls);
        if max_polls == 0 {
            bail!("invalid value '0' for CUSTOMERS_MAX_POLLS, expected at least 1");
        }

        Ok(Self {
            table_name: get("CUSTOMERS_TABLE").unwrap_or(defaults.table_name),
            backend: parse(&get, "CUSTOMERS_BACKEND")?.unwrap_or(defaults.backend),
            name_match: parse(&get, "CUSTOMERS_NAME_MATCH")?.unwrap_or(defaults.name_match),
            wait_for_active: parse_flag(&get, "CUSTOMERS_WAIT_FOR_ACTIVE")?
                .unwrap_or(defaults.wait_for_active),
            poll_interval: parse::<u64, _>(&get, "CUSTOMERS_POLL_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            max_polls,
            strict: parse_flag(&get, "CUSTOMERS_STRICT")?.unwrap_or(defaults.strict),
            pause_on_exit: parse_flag(&get, "CUSTOMERS_PAUSE_ON_EXIT")?
                .unwrap_or(defaults.pause_on_exit),
            log_level: parse(&get, "CUSTOMERS_LOG_LEVEL")?.unwrap_or(defaults.log_level),
        })
    }
}

fn parse<T, F>(get: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow!("{e}"))
                .with_context(|| format!("invalid value '{raw}' for {key}"))
        })
        .transpose()
}

fn parse_flag<F>(get: &F, key: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow!("invalid value '{raw}' for {key}, expected true or false")),
        })
        .transpose()
}
