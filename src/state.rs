//! The single owned ledger store
//!
//! All mutable competition state lives in one `LedgerState` value guarded by
//! a single lock in `Competition`. Every public operation validates against
//! this store first and mutates it second, so a failed call leaves no
//! partial effect and the aggregate counters can never be observed out of
//! sync with the per-participant records they summarize.

use crate::challenge::ChallengeRecord;
use crate::error::{CompetitionError, Result};
use crate::types::{Address, Hash32};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Externally observable participant state
///
/// The triple is (stake >= threshold, has submission, backing != self).
/// Every reachable combination is one of these five; the constructors and
/// transition checks in `Competition` guarantee no other triple occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantState {
    /// No stake, no submission, self-backed
    Idle = 0,
    /// Staked
    Staked = 1,
    /// Staked with a live submission
    Submitted = 2,
    /// Staked, backing another participant
    Backing = 3,
    /// Staked with a live submission, backing another participant
    SubmittedBacking = 4,
}

/// Tracks which migration steps have run; all must be complete before
/// `completeMigration` is accepted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationProgress {
    /// Set by the first align call; blocks normal admin flow until completed
    pub started: bool,
    /// One-way completion flag
    pub completed: bool,
    /// Logical block at which completion was recorded
    pub completed_block: Option<u64>,
    pub opened_blocks_aligned: bool,
    pub closed_blocks_aligned: bool,
    pub staker_set_aligned: bool,
    /// Challenges whose historical amounts have been aligned
    pub historical_aligned: HashSet<u32>,
    /// Stakers whose backing edge has been forced to the default
    pub backing_aligned: HashSet<Address>,
}

/// All mutable competition state
#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerState {
    pub initialized: bool,
    pub stake_threshold: u64,
    pub rewards_threshold: u64,
    /// Address of the token component; the only legal sender for the
    /// stake-mutation callbacks
    pub token_address: Address,

    /// Challenge records indexed by challenge number; entry 0 is synthetic
    pub challenges: Vec<ChallengeRecord>,
    /// Hashes already used as a dataset or key hash; re-use is rejected
    pub used_hashes: HashSet<Hash32>,

    /// Live stake per participant; absent entry == zero
    pub stakes: HashMap<Address, u64>,
    /// Participants with non-zero stake, in entry order
    pub stakers: IndexSet<Address>,
    /// Maintained sum of all live stakes
    pub current_total_staked: u64,

    /// Outgoing backing edge; absent entry == self
    pub backing: HashMap<Address, Address>,
    /// Reverse image of `backing`
    pub backers: HashMap<Address, IndexSet<Address>>,

    /// Undistributed reward pool
    pub competition_pool: u64,
    /// Accumulated burned stake not yet moved out or back to the pool
    pub total_burned: u64,
    pub vault: Address,
    pub burn_recipient: Address,
    pub message: String,

    /// Logical block counter; advanced on every successful mutating call
    pub block: u64,

    pub migration: MigrationProgress,
}

impl LedgerState {
    pub fn new() -> Self {
        LedgerState {
            initialized: false,
            stake_threshold: 0,
            rewards_threshold: 0,
            token_address: Address::ZERO,
            challenges: vec![ChallengeRecord::genesis()],
            used_hashes: HashSet::new(),
            stakes: HashMap::new(),
            stakers: IndexSet::new(),
            current_total_staked: 0,
            backing: HashMap::new(),
            backers: HashMap::new(),
            competition_pool: 0,
            total_burned: 0,
            vault: Address::ZERO,
            burn_recipient: Address::ZERO,
            message: String::new(),
            block: 0,
            migration: MigrationProgress::default(),
        }
    }

    pub fn latest_challenge_number(&self) -> u32 {
        (self.challenges.len() - 1) as u32
    }

    pub fn challenge(&self, number: u32) -> Result<&ChallengeRecord> {
        self.challenges
            .get(number as usize)
            .ok_or(CompetitionError::UnknownChallenge(number))
    }

    pub fn challenge_mut(&mut self, number: u32) -> Result<&mut ChallengeRecord> {
        self.challenges
            .get_mut(number as usize)
            .ok_or(CompetitionError::UnknownChallenge(number))
    }

    pub fn latest(&self) -> &ChallengeRecord {
        // the vector always holds at least the genesis record
        &self.challenges[self.challenges.len() - 1]
    }

    pub fn latest_mut(&mut self) -> &mut ChallengeRecord {
        let last = self.challenges.len() - 1;
        &mut self.challenges[last]
    }

    pub fn stake_of(&self, participant: Address) -> u64 {
        self.stakes.get(&participant).copied().unwrap_or(0)
    }

    pub fn backed_by(&self, participant: Address) -> Address {
        self.backing.get(&participant).copied().unwrap_or(participant)
    }

    /// Classify a participant against the five-state table
    pub fn participant_state(&self, participant: Address) -> ParticipantState {
        let stake = self.stake_of(participant);
        let staked = stake > 0 && stake >= self.stake_threshold;
        let submitted = self.latest().has_submission(participant);
        let backing_other = self.backed_by(participant) != participant;
        match (staked, submitted, backing_other) {
            (false, false, false) => ParticipantState::Idle,
            (true, false, false) => ParticipantState::Staked,
            (true, true, false) => ParticipantState::Submitted,
            (true, false, true) => ParticipantState::Backing,
            (true, true, true) => ParticipantState::SubmittedBacking,
            // unreachable under the transition rules; kept total for
            // diagnostics
            _ => ParticipantState::Idle,
        }
    }

    /// Add a participant to the live staker set and default their backing
    /// edge to self. No-op when already present.
    pub fn enter_staker_set(&mut self, participant: Address) {
        if self.stakers.insert(participant) {
            self.backing.entry(participant).or_insert(participant);
            self.backers
                .entry(participant)
                .or_default()
                .insert(participant);
        }
    }

    /// Remove a participant whose stake reached zero. Swap-with-last, so
    /// staker-list order is not stable across removals.
    pub fn leave_staker_set(&mut self, participant: Address) {
        self.stakers.swap_remove(&participant);
    }

    /// Move a backing edge and keep the reverse index consistent
    pub fn retarget_backing(&mut self, participant: Address, target: Address) {
        let old = self.backed_by(participant);
        if old == target {
            return;
        }
        if let Some(set) = self.backers.get_mut(&old) {
            set.swap_remove(&participant);
        }
        self.backers.entry(target).or_default().insert(participant);
        self.backing.insert(participant, target);
    }

    /// Credit stake outside the participant-driven path (reward payouts,
    /// migration seeding). Maintains staker-set membership and aggregates
    /// but applies no threshold rule.
    pub fn credit_stake(&mut self, participant: Address, amount: u64) {
        if amount == 0 {
            return;
        }
        let current = self.stake_of(participant);
        self.stakes.insert(participant, current + amount);
        self.current_total_staked += amount;
        self.enter_staker_set(participant);
    }

    /// Debit stake outside the participant-driven path (burns). The caller
    /// checks `amount <= stake` first.
    pub fn debit_stake(&mut self, participant: Address, amount: u64) {
        if amount == 0 {
            return;
        }
        let current = self.stake_of(participant);
        let remaining = current - amount;
        self.current_total_staked -= amount;
        if remaining == 0 {
            self.stakes.remove(&participant);
            self.leave_staker_set(participant);
        } else {
            self.stakes.insert(participant, remaining);
        }
    }

    pub fn bump_block(&mut self) -> u64 {
        self.block += 1;
        self.block
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}
