//! Ledger-wide error taxonomy
//!
//! Every public operation either commits fully or returns one of these
//! variants with no partial effect. Integrators branch on the variant, so
//! each failure class stays distinguishable:
//! - `AccessDenied`: wrong role or wrong caller
//! - `PhaseViolation`: operation invalid for the current phase
//! - `ThresholdViolation`: amount below a required minimum
//! - `StateInvariant`: illegal state-machine edge
//! - `Range`: pagination bounds or batch array-length mismatch
//! - `MigrationGate`: migration ordering / completion gating

use crate::challenge::Phase;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompetitionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompetitionError {
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("operation `{operation}` not allowed in phase {actual}")]
    PhaseViolation {
        operation: &'static str,
        actual: Phase,
    },

    #[error("amount {amount} below required threshold {required}")]
    ThresholdViolation { amount: u64, required: u64 },

    #[error("state invariant violated: {0}")]
    StateInvariant(String),

    #[error("range error: {0}")]
    Range(String),

    #[error("migration gate: {0}")]
    MigrationGate(String),

    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("ledger not initialized")]
    NotInitialized,

    #[error("ledger already initialized")]
    AlreadyInitialized,

    #[error("unknown challenge {0}")]
    UnknownChallenge(u32),
}

impl CompetitionError {
    /// Array-length mismatch in a batch call
    pub fn length_mismatch(left: usize, right: usize) -> Self {
        CompetitionError::Range(format!("array length mismatch: {left} != {right}"))
    }
}
