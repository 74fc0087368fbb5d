//! Engine configuration.

use anyhow::{Context, bail};
use serde::Deserialize;

use leasehold_observability::{LogConfig, LogFormat};

pub const LOG_FILTER_VAR: &str = "LEASEHOLD_LOG_FILTER";
pub const LOG_FORMAT_VAR: &str = "LEASEHOLD_LOG_FORMAT";
pub const STRICT_SIGNATURE_TYPE_VAR: &str = "LEASEHOLD_STRICT_SIGNATURE_TYPE";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub log: LogConfig,
    /// Reject SIGN requests carrying more than one legacy signature flag.
    pub strict_signature_type: bool,
}

impl EngineConfig {
    /// Load from `LEASEHOLD_*` environment variables; unset variables keep defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(filter) = lookup(LOG_FILTER_VAR).filter(|v| !v.trim().is_empty()) {
            config.log.filter = filter;
        }
        if let Some(format) = lookup(LOG_FORMAT_VAR) {
            config.log.format = format
                .parse::<LogFormat>()
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?;
        }
        if let Some(strict) = lookup(STRICT_SIGNATURE_TYPE_VAR) {
            config.strict_signature_type =
                parse_bool(&strict).with_context(|| format!("invalid {STRICT_SIGNATURE_TYPE_VAR}"))?;
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
    }
}
