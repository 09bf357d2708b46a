//! Registry of competitions authorized as staking targets
//!
//! Names and addresses are both unique keys. Entries are never removed;
//! deactivation keeps the history while blocking further staking.

use crate::error::{CompetitionError, Result};
use crate::types::Address;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub address: Address,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct CompetitionRegistry {
    entries: RwLock<HashMap<Address, RegistryEntry>>,
}

impl CompetitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a competition under a unique name; newly registered
    /// competitions start active
    pub fn register(&self, name: &str, address: Address) -> Result<()> {
        if address.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "cannot register the zero address".to_string(),
            ));
        }
        let mut entries = self.entries.write();
        if entries.contains_key(&address) || entries.values().any(|e| e.name == name) {
            return Err(CompetitionError::StateInvariant(format!(
                "competition {name} already registered"
            )));
        }
        let now = Utc::now();
        entries.insert(
            address,
            RegistryEntry {
                name: name.to_string(),
                address,
                active: true,
                registered_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    pub fn set_active(&self, address: Address, active: bool) -> Result<()> {
        let mut entries = self.entries.write();
        match entries.get_mut(&address) {
            Some(entry) => {
                entry.active = active;
                entry.updated_at = Utc::now();
                Ok(())
            }
            None => Err(CompetitionError::StateInvariant(format!(
                "competition {address} is not registered"
            ))),
        }
    }

    pub fn is_active(&self, address: Address) -> bool {
        self.entries
            .read()
            .get(&address)
            .map(|e| e.active)
            .unwrap_or(false)
    }

    pub fn lookup(&self, name: &str) -> Option<Address> {
        self.entries
            .read()
            .values()
            .find(|e| e.name == name)
            .map(|e| e.address)
    }

    pub fn entries(&self) -> Vec<RegistryEntry> {
        let mut all: Vec<RegistryEntry> = self.entries.read().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}
