//! Two-tier capability checks
//!
//! Every mutating ledger operation is gated by one of two roles:
//! - `MainAdmin`: can grant and revoke both roles
//! - `ChildAdmin`: operational actions (phase transitions, recording,
//!   rewards, migration)
//!
//! Checks are explicit capability lookups taking (caller, role) rather than
//! anything inheritance-shaped. Granting a role an account already holds,
//! or revoking one it does not, is a silent no-op.

use crate::error::{CompetitionError, Result};
use crate::types::Address;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Administrative roles recognised by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Can manage role membership and perform all operational actions
    MainAdmin,
    /// Operational actions only
    ChildAdmin,
}

impl Role {
    fn identifier(&self) -> &'static str {
        match self {
            Role::MainAdmin => "COMPETITION_MAIN_ADMIN",
            Role::ChildAdmin => "COMPETITION_CHILD_ADMIN",
        }
    }

    /// Stable 32-byte role hash, exposed so integrators can reference roles
    /// by hash rather than by name
    pub fn hash(&self) -> [u8; 32] {
        let digest = Sha256::digest(self.identifier().as_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// Role membership store
#[derive(Debug)]
pub struct AccessControl {
    members: RwLock<HashMap<Role, HashSet<Address>>>,
}

impl AccessControl {
    /// Create the store, granting both roles to the deploying admin
    pub fn new(admin: Address) -> Self {
        let mut members: HashMap<Role, HashSet<Address>> = HashMap::new();
        members.entry(Role::MainAdmin).or_default().insert(admin);
        members.entry(Role::ChildAdmin).or_default().insert(admin);
        Self {
            members: RwLock::new(members),
        }
    }

    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.members
            .read()
            .get(&role)
            .map(|set| set.contains(&account))
            .unwrap_or(false)
    }

    /// True if the account may perform operational actions
    pub fn is_admin(&self, account: Address) -> bool {
        self.has_role(Role::ChildAdmin, account) || self.has_role(Role::MainAdmin, account)
    }

    /// Operational capability check used by every admin-gated entry point
    pub fn require_admin(&self, caller: Address) -> Result<()> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(CompetitionError::AccessDenied(format!(
                "{caller} is not an admin"
            )))
        }
    }

    pub fn require_main_admin(&self, caller: Address) -> Result<()> {
        if self.has_role(Role::MainAdmin, caller) {
            Ok(())
        } else {
            Err(CompetitionError::AccessDenied(format!(
                "{caller} does not hold {}",
                Role::MainAdmin
            )))
        }
    }

    /// Grant `role` to `account`; caller must hold MainAdmin
    pub fn grant_role(&self, caller: Address, role: Role, account: Address) -> Result<()> {
        self.require_main_admin(caller)?;
        let inserted = self
            .members
            .write()
            .entry(role)
            .or_default()
            .insert(account);
        if inserted {
            info!("role {} granted to {}", role, account);
        }
        Ok(())
    }

    /// Revoke `role` from `account`; caller must hold MainAdmin
    pub fn revoke_role(&self, caller: Address, role: Role, account: Address) -> Result<()> {
        self.require_main_admin(caller)?;
        let removed = self
            .members
            .write()
            .get_mut(&role)
            .map(|set| set.remove(&account))
            .unwrap_or(false);
        if removed {
            info!("role {} revoked from {}", role, account);
        }
        Ok(())
    }

    /// Renounce `role`; only the holding account itself may renounce
    pub fn renounce_role(&self, caller: Address, role: Role, account: Address) -> Result<()> {
        if caller != account {
            return Err(CompetitionError::AccessDenied(
                "can only renounce roles for self".to_string(),
            ));
        }
        let removed = self
            .members
            .write()
            .get_mut(&role)
            .map(|set| set.remove(&account))
            .unwrap_or(false);
        if removed {
            info!("role {} renounced by {}", role, account);
        }
        Ok(())
    }
}
