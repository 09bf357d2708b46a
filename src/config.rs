//! Deployment configuration, loadable from TOML
//!
//! Every field has a default so a partial file (or none at all) yields a
//! usable configuration.

use crate::error::{CompetitionError, Result};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_stake_threshold() -> u64 {
    1_000_000
}

fn default_rewards_threshold() -> u64 {
    0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionConfig {
    /// Minimum stake a participant must hold to submit or back others
    #[serde(default = "default_stake_threshold")]
    pub stake_threshold: u64,
    /// Pool funding required before a new challenge may open
    #[serde(default = "default_rewards_threshold")]
    pub rewards_threshold: u64,
    /// Initial vault address, if any
    #[serde(default)]
    pub vault: Option<Address>,
    /// Initial burn recipient, if any
    #[serde(default)]
    pub burn_recipient: Option<Address>,
    /// Operator-facing status line
    #[serde(default)]
    pub message: String,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        CompetitionConfig {
            stake_threshold: default_stake_threshold(),
            rewards_threshold: default_rewards_threshold(),
            vault: None,
            burn_recipient: None,
            message: String::new(),
        }
    }
}

impl CompetitionConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|e| CompetitionError::StateInvariant(format!("invalid configuration: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CompetitionError::StateInvariant(format!(
                "cannot read configuration {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config = CompetitionConfig::from_toml_str("stake_threshold = 50").unwrap();
        assert_eq!(config.stake_threshold, 50);
        assert_eq!(config.rewards_threshold, 0);
        assert!(config.vault.is_none());
    }

    #[test]
    fn empty_input_yields_defaults() {
        let config = CompetitionConfig::from_toml_str("").unwrap();
        assert_eq!(config.stake_threshold, 1_000_000);
        assert!(config.message.is_empty());
    }

    #[test]
    fn addresses_parse_from_hex() {
        let config = CompetitionConfig::from_toml_str(
            "vault = \"0x00000000000000000000000000000000000000aa\"",
        )
        .unwrap();
        assert_eq!(config.vault, Some(Address::from_low_u64(0xaa)));
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(CompetitionConfig::from_toml_str("stake_threshold = ").is_err());
    }
}
