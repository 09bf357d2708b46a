//! Staking-and-prediction competition ledger
//!
//! A library implementation of a recurring forecasting competition: a
//! token component holds balances and stakes, a competition core drives a
//! four-phase challenge lifecycle (open, recording, results, settled), and
//! participants stake, submit prediction commitments, and back each other
//! between rounds.
//!
//! ## Module Structure
//!
//! - `types`: address and 32-byte hash primitives
//! - `error`: the crate-wide error taxonomy
//! - `access`: role-based admin control
//! - `challenge`: per-challenge records, phases, snapshots, rewards
//! - `state`: the mutable ledger state behind the competition lock
//! - `competition`: the competition core and its public operations
//! - `rewards`: payouts, burns, sponsorship, pool recycling
//! - `migration`: bulk import of a parent deployment's history
//! - `token`: balances plus competition-aware staking
//! - `registry`: authorized staking targets
//! - `config`: TOML-loadable deployment configuration

/// Address and hash primitives
pub mod types;

/// Error taxonomy and crate-wide `Result`
pub mod error;

/// Role-based access control
pub mod access;

/// Challenge records and the phase machine
pub mod challenge;

/// Mutable ledger state
pub mod state;

/// Competition core operations
pub mod competition;

/// Rewards, burns, and treasury moves
pub mod rewards;

/// Fork-migration import path
pub mod migration;

/// Token component
pub mod token;

/// Registry of authorized competitions
pub mod registry;

/// Deployment configuration
pub mod config;

pub use access::Role;
pub use challenge::{ChallengeRecord, Phase, RewardRecord};
pub use competition::Competition;
pub use config::CompetitionConfig;
pub use error::{CompetitionError, Result};
pub use registry::{CompetitionRegistry, RegistryEntry};
pub use state::ParticipantState;
pub use token::TokenLedger;
pub use types::{Address, Hash32};
