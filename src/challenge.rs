//! Per-challenge records and the 4-phase lifecycle
//!
//! Each challenge moves strictly forward through four phases:
//! 1. `Open` - staking, backing and submissions accepted
//! 2. `Recording` - submissions closed, stake snapshot recorded
//! 3. `Results` - results published, rewards and burns applied
//! 4. `Settled` - idle until the next challenge opens
//!
//! Challenge 0 is a synthetic settled round that exists before the first
//! real challenge so "latest challenge is settled" holds from genesis.

use crate::error::{CompetitionError, Result};
use crate::types::{Address, Hash32};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle phase of a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Staking and submission window
    Open = 1,
    /// Submissions closed, historical stakes being recorded
    Recording = 2,
    /// Results disclosed, rewards and burns applied
    Results = 3,
    /// Round settled, waiting for the next challenge
    Settled = 4,
}

impl Phase {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn from_u8(value: u8) -> Option<Phase> {
        match value {
            1 => Some(Phase::Open),
            2 => Some(Phase::Recording),
            3 => Some(Phase::Results),
            4 => Some(Phase::Settled),
            _ => None,
        }
    }

    /// The only legal successor phase, if any
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Open => Some(Phase::Recording),
            Phase::Recording => Some(Phase::Results),
            Phase::Results => Some(Phase::Settled),
            Phase::Settled => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Settled
    }
}

/// Per-participant payout record for one challenge
///
/// Each field is written by its own admin operation and is individually
/// queryable afterwards. Repeated burns accumulate; rewards are written
/// once per participant per challenge under normal flow.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RewardRecord {
    pub staking_reward: u64,
    pub challenge_reward: u64,
    pub tournament_reward: u64,
    pub burned_amount: u64,
    pub challenge_score: u64,
    pub tournament_score: u64,
}

impl RewardRecord {
    /// Sum of all reward components
    pub fn overall_reward(&self) -> u64 {
        self.staking_reward + self.challenge_reward + self.tournament_reward
    }
}

/// Frozen stake snapshot for one challenge, populated chunk by chunk while
/// the challenge is in `Recording`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalSnapshot {
    /// Stakers in recording order; pagination slices this list
    pub stakers: IndexSet<Address>,
    /// Recorded amount per staker
    pub amounts: HashMap<Address, u64>,
    /// Maintained sum of `amounts`
    pub total_staked: u64,
}

impl HistoricalSnapshot {
    /// Record (or idempotently overwrite) one staker's amount
    pub fn record(&mut self, staker: Address, amount: u64) {
        if let Some(previous) = self.amounts.insert(staker, amount) {
            self.total_staked = self.total_staked - previous + amount;
        } else {
            self.stakers.insert(staker);
            self.total_staked += amount;
        }
    }

    pub fn counter(&self) -> usize {
        self.stakers.len()
    }
}

/// Full state of one challenge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub phase: Phase,
    pub dataset_hash: Hash32,
    pub key_hash: Hash32,
    pub results_hash: Hash32,
    pub private_key_hash: Hash32,
    /// Opaque per-slot deadline timestamps, independently settable
    pub deadlines: HashMap<u32, u64>,
    /// Logical block at which phase 1 opened
    pub opened_block: u64,
    /// Logical block at which phase 2 was entered
    pub submission_closed_block: u64,
    /// Commitment hash per participant; absent entry == no submission
    pub submissions: HashMap<Address, Hash32>,
    /// Current submitters, append + swap-with-last-and-pop on withdrawal
    pub submitters: IndexSet<Address>,
    pub snapshot: HistoricalSnapshot,
    pub rewards: HashMap<Address, RewardRecord>,
    /// Generic per-participant information store: item number -> value
    pub information: HashMap<Address, HashMap<u32, u64>>,
}

impl ChallengeRecord {
    /// The synthetic settled challenge 0
    pub fn genesis() -> Self {
        ChallengeRecord::default()
    }

    pub fn opened(dataset_hash: Hash32, key_hash: Hash32, block: u64) -> Self {
        ChallengeRecord {
            phase: Phase::Open,
            dataset_hash,
            key_hash,
            opened_block: block,
            ..Default::default()
        }
    }

    /// A migrated challenge record: settled, block numbers filled in later
    pub fn migrated() -> Self {
        ChallengeRecord::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advance to `target`, enforcing the strict forward order
    pub fn advance(&mut self, target: Phase, operation: &'static str) -> Result<()> {
        let current = self.phase;
        if current.next() != Some(target) {
            return Err(CompetitionError::PhaseViolation {
                operation,
                actual: current,
            });
        }
        self.phase = target;
        Ok(())
    }

    pub fn submission_of(&self, participant: Address) -> Hash32 {
        self.submissions
            .get(&participant)
            .copied()
            .unwrap_or(Hash32::ZERO)
    }

    pub fn has_submission(&self, participant: Address) -> bool {
        self.submissions.contains_key(&participant)
    }

    pub fn reward_record(&self, participant: Address) -> RewardRecord {
        self.rewards.get(&participant).copied().unwrap_or_default()
    }

    pub fn reward_record_mut(&mut self, participant: Address) -> &mut RewardRecord {
        self.rewards.entry(participant).or_default()
    }
}
