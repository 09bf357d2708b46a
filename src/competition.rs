//! Competition core: phase machine + stake/backing/submission engine
//!
//! One `Competition` owns the full ledger state behind a single lock. Every
//! public operation runs validate-first, mutate-second inside one write
//! guard, so a returned error never leaves a partial effect and no two
//! operations interleave.
//!
//! Stake mutations are reserved for the token component: the core-side
//! `increase_stake` / `decrease_stake` callbacks reject any sender other
//! than the configured token address. Submissions and backing changes are
//! taken from the participant directly (or from the token acting on their
//! behalf in `stake_and_submit`).
//!
//! The ledger keeps a logical block counter advanced by every successful
//! mutating call; recorded "block numbers" (challenge opened, submission
//! closed, migration completed) refer to it.

use crate::access::{AccessControl, Role};
use crate::challenge::{ChallengeRecord, Phase, RewardRecord};
use crate::config::CompetitionConfig;
use crate::error::{CompetitionError, Result};
use crate::state::{LedgerState, ParticipantState};
use crate::token::TokenLedger;
use crate::types::{Address, Hash32};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Competition {
    address: Address,
    access: AccessControl,
    token: RwLock<Option<Arc<TokenLedger>>>,
    state: RwLock<LedgerState>,
}

impl Competition {
    /// Deploy an uninitialized ledger; `admin` receives both roles
    pub fn new(address: Address, admin: Address) -> Self {
        Competition {
            address,
            access: AccessControl::new(admin),
            token: RwLock::new(None),
            state: RwLock::new(LedgerState::new()),
        }
    }

    /// One-time setup of thresholds and the token collaborator
    pub fn initialize(
        &self,
        caller: Address,
        stake_threshold: u64,
        rewards_threshold: u64,
        token: Arc<TokenLedger>,
    ) -> Result<()> {
        self.access.require_admin(caller)?;
        if token.address().is_zero() {
            return Err(CompetitionError::StateInvariant(
                "token address cannot be zero".to_string(),
            ));
        }
        let mut st = self.state.write();
        if st.initialized {
            return Err(CompetitionError::AlreadyInitialized);
        }
        st.initialized = true;
        st.stake_threshold = stake_threshold;
        st.rewards_threshold = rewards_threshold;
        st.token_address = token.address();
        *self.token.write() = Some(token);
        st.bump_block();
        info!(
            stake_threshold,
            rewards_threshold, "competition ledger initialized"
        );
        Ok(())
    }

    /// `initialize` with parameters taken from a [`CompetitionConfig`]
    pub fn initialize_with_config(
        &self,
        caller: Address,
        config: &CompetitionConfig,
        token: Arc<TokenLedger>,
    ) -> Result<()> {
        self.initialize(
            caller,
            config.stake_threshold,
            config.rewards_threshold,
            token,
        )?;
        if let Some(vault) = config.vault {
            self.update_vault(caller, vault)?;
        }
        if let Some(recipient) = config.burn_recipient {
            self.update_burn_recipient(caller, recipient)?;
        }
        if !config.message.is_empty() {
            self.update_message(caller, config.message.clone())?;
        }
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    // ------------------------------------------------------------------
    // Role surface (delegates to AccessControl)
    // ------------------------------------------------------------------

    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.access.has_role(role, account)
    }

    pub fn grant_role(&self, caller: Address, role: Role, account: Address) -> Result<()> {
        self.access.grant_role(caller, role, account)
    }

    pub fn revoke_role(&self, caller: Address, role: Role, account: Address) -> Result<()> {
        self.access.revoke_role(caller, role, account)
    }

    pub fn renounce_role(&self, caller: Address, role: Role, account: Address) -> Result<()> {
        self.access.renounce_role(caller, role, account)
    }

    // ------------------------------------------------------------------
    // Internal guards
    // ------------------------------------------------------------------

    pub(crate) fn token(&self) -> Result<Arc<TokenLedger>> {
        self.token
            .read()
            .clone()
            .ok_or(CompetitionError::NotInitialized)
    }

    pub(crate) fn ensure_initialized(st: &LedgerState) -> Result<()> {
        if st.initialized {
            Ok(())
        } else {
            Err(CompetitionError::NotInitialized)
        }
    }

    /// Normal-path admin actions are blocked while a migration is underway
    pub(crate) fn ensure_migration_clear(st: &LedgerState) -> Result<()> {
        if st.migration.started && !st.migration.completed {
            Err(CompetitionError::MigrationGate(
                "migration in progress; normal operation resumes after completeMigration"
                    .to_string(),
            ))
        } else {
            Ok(())
        }
    }

    pub(crate) fn ensure_phase(st: &LedgerState, phase: Phase, operation: &'static str) -> Result<()> {
        let actual = st.latest().phase();
        if actual == phase {
            Ok(())
        } else {
            Err(CompetitionError::PhaseViolation { operation, actual })
        }
    }

    fn ensure_token_sender(st: &LedgerState, sender: Address) -> Result<()> {
        if sender == st.token_address && !sender.is_zero() {
            Ok(())
        } else {
            Err(CompetitionError::AccessDenied(
                "stake mutations are driven by the token component only".to_string(),
            ))
        }
    }

    // ------------------------------------------------------------------
    // Phase controller
    // ------------------------------------------------------------------

    /// Open challenge N+1. Requires the latest challenge settled and the
    /// competition pool funded up to the rewards threshold.
    pub fn open_challenge(
        &self,
        caller: Address,
        dataset_hash: Hash32,
        key_hash: Hash32,
        submission_deadline: u64,
        next_challenge_deadline: u64,
    ) -> Result<u32> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Settled, "openChallenge")?;
        if st.competition_pool < st.rewards_threshold {
            return Err(CompetitionError::ThresholdViolation {
                amount: st.competition_pool,
                required: st.rewards_threshold,
            });
        }
        if dataset_hash.is_zero() || key_hash.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "dataset and key hashes must be non-zero".to_string(),
            ));
        }
        if dataset_hash == key_hash
            || st.used_hashes.contains(&dataset_hash)
            || st.used_hashes.contains(&key_hash)
        {
            return Err(CompetitionError::StateInvariant(
                "dataset/key hash already used".to_string(),
            ));
        }

        let block = st.bump_block();
        st.used_hashes.insert(dataset_hash);
        st.used_hashes.insert(key_hash);
        let mut record = ChallengeRecord::opened(dataset_hash, key_hash, block);
        record.deadlines.insert(0, submission_deadline);
        record.deadlines.insert(1, next_challenge_deadline);
        st.challenges.push(record);
        let number = st.latest_challenge_number();
        info!(challenge = number, block, "challenge opened");
        Ok(number)
    }

    /// Phase 1 -> 2; records the submission-closed block
    pub fn close_submission(&self, caller: Address) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        st.latest_mut().advance(Phase::Recording, "closeSubmission")?;
        let block = st.bump_block();
        st.latest_mut().submission_closed_block = block;
        let number = st.latest_challenge_number();
        info!(challenge = number, block, "submissions closed");
        Ok(())
    }

    /// Phase 2 -> 3 or 3 -> 4; no skips, no regressions
    pub fn advance_to_phase(&self, caller: Address, target: u8) -> Result<()> {
        self.access.require_admin(caller)?;
        let target = Phase::from_u8(target)
            .ok_or_else(|| CompetitionError::Range(format!("invalid phase {target}")))?;
        if !matches!(target, Phase::Results | Phase::Settled) {
            return Err(CompetitionError::Range(
                "advanceToPhase only accepts phases 3 and 4".to_string(),
            ));
        }
        let mut st = self.state.write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        st.latest_mut().advance(target, "advanceToPhase")?;
        st.bump_block();
        info!(
            challenge = st.latest_challenge_number(),
            phase = %target,
            "phase advanced"
        );
        Ok(())
    }

    /// Replace the dataset hash while the latest challenge is open; any
    /// previously used hash is rejected
    pub fn update_dataset(&self, caller: Address, new_hash: Hash32) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Open, "updateDataset")?;
        Self::register_fresh_hash(&mut st, new_hash)?;
        st.latest_mut().dataset_hash = new_hash;
        st.bump_block();
        Ok(())
    }

    /// Replace the public key hash while the latest challenge is open
    pub fn update_key(&self, caller: Address, new_hash: Hash32) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Open, "updateKey")?;
        Self::register_fresh_hash(&mut st, new_hash)?;
        st.latest_mut().key_hash = new_hash;
        st.bump_block();
        Ok(())
    }

    fn register_fresh_hash(st: &mut LedgerState, hash: Hash32) -> Result<()> {
        if hash.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "hash must be non-zero".to_string(),
            ));
        }
        if !st.used_hashes.insert(hash) {
            return Err(CompetitionError::StateInvariant(
                "hash already used".to_string(),
            ));
        }
        Ok(())
    }

    /// Publish the results hash, once, while in phase 3
    pub fn submit_results(&self, caller: Address, results_hash: Hash32) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Results, "submitResults")?;
        if results_hash.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "results hash must be non-zero".to_string(),
            ));
        }
        if !st.latest().results_hash.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "results already submitted; use updateResults".to_string(),
            ));
        }
        st.latest_mut().results_hash = results_hash;
        st.bump_block();
        info!(challenge = st.latest_challenge_number(), "results submitted");
        Ok(())
    }

    /// Replace the results hash; `old_hash` is an optimistic-concurrency
    /// token and must match the current value
    pub fn update_results(&self, caller: Address, old_hash: Hash32, new_hash: Hash32) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Results, "updateResults")?;
        let current = st.latest().results_hash;
        if current.is_zero() || current != old_hash {
            return Err(CompetitionError::StateInvariant(
                "stale results hash".to_string(),
            ));
        }
        if new_hash.is_zero() || new_hash == current {
            return Err(CompetitionError::StateInvariant(
                "new results hash must differ and be non-zero".to_string(),
            ));
        }
        st.latest_mut().results_hash = new_hash;
        st.bump_block();
        Ok(())
    }

    /// Disclose the private key hash for a settled challenge
    pub fn update_private_key(
        &self,
        caller: Address,
        challenge: u32,
        private_key_hash: Hash32,
    ) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_migration_clear(&st)?;
        let record = st.challenge(challenge)?;
        if record.phase() != Phase::Settled {
            return Err(CompetitionError::PhaseViolation {
                operation: "updatePrivateKey",
                actual: record.phase(),
            });
        }
        st.challenge_mut(challenge)?.private_key_hash = private_key_hash;
        st.bump_block();
        Ok(())
    }

    /// Set one opaque deadline slot for an existing challenge
    pub fn update_deadlines(
        &self,
        caller: Address,
        challenge: u32,
        slot: u32,
        timestamp: u64,
    ) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        st.challenge_mut(challenge)?.deadlines.insert(slot, timestamp);
        st.bump_block();
        Ok(())
    }

    pub fn update_message(&self, caller: Address, message: String) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        st.message = message;
        st.bump_block();
        Ok(())
    }

    pub fn update_vault(&self, caller: Address, vault: Address) -> Result<()> {
        self.access.require_admin(caller)?;
        if vault.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "vault cannot be the zero address".to_string(),
            ));
        }
        let mut st = self.state.write();
        st.vault = vault;
        st.bump_block();
        Ok(())
    }

    /// Thresholds may only change between rounds
    pub fn update_stake_threshold(&self, caller: Address, threshold: u64) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Settled, "updateStakeThreshold")?;
        st.stake_threshold = threshold;
        st.bump_block();
        info!(threshold, "stake threshold updated");
        Ok(())
    }

    pub fn update_rewards_threshold(&self, caller: Address, threshold: u64) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Settled, "updateRewardsThreshold")?;
        st.rewards_threshold = threshold;
        st.bump_block();
        info!(threshold, "rewards threshold updated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stake callbacks (token component only)
    // ------------------------------------------------------------------

    /// Token-driven stake increase. The resulting stake must reach the
    /// stake threshold. Returns the new stake.
    pub fn increase_stake(&self, sender: Address, participant: Address, amount: u64) -> Result<u64> {
        let mut st = self.state.write();
        Self::ensure_initialized(&st)?;
        Self::ensure_token_sender(&st, sender)?;
        Self::ensure_phase(&st, Phase::Open, "increaseStake")?;
        let current = st.stake_of(participant);
        let new_stake = current
            .checked_add(amount)
            .ok_or_else(|| CompetitionError::Range("stake overflow".to_string()))?;
        if new_stake < st.stake_threshold {
            return Err(CompetitionError::ThresholdViolation {
                amount: new_stake,
                required: st.stake_threshold,
            });
        }
        st.stakes.insert(participant, new_stake);
        st.current_total_staked += amount;
        st.enter_staker_set(participant);
        st.bump_block();
        debug!(%participant, amount, new_stake, "stake increased");
        Ok(new_stake)
    }

    /// Token-driven stake decrease. Leaving a stake below the threshold is
    /// only legal when it zeroes the stake, and zeroing requires no live
    /// submission and a self-directed backing edge. Returns the new stake.
    pub fn decrease_stake(&self, sender: Address, participant: Address, amount: u64) -> Result<u64> {
        let mut st = self.state.write();
        Self::ensure_initialized(&st)?;
        Self::ensure_token_sender(&st, sender)?;
        Self::ensure_phase(&st, Phase::Open, "decreaseStake")?;
        let current = st.stake_of(participant);
        if amount > current {
            return Err(CompetitionError::InsufficientBalance {
                available: current,
                required: amount,
            });
        }
        let new_stake = current - amount;
        if new_stake == 0 {
            if st.latest().has_submission(participant) {
                return Err(CompetitionError::StateInvariant(
                    "cannot zero stake with a live submission".to_string(),
                ));
            }
            if st.backed_by(participant) != participant {
                return Err(CompetitionError::StateInvariant(
                    "cannot zero stake while backing another participant".to_string(),
                ));
            }
            st.stakes.remove(&participant);
            st.leave_staker_set(participant);
        } else {
            if new_stake < st.stake_threshold {
                return Err(CompetitionError::ThresholdViolation {
                    amount: new_stake,
                    required: st.stake_threshold,
                });
            }
            st.stakes.insert(participant, new_stake);
        }
        st.current_total_staked -= amount;
        st.bump_block();
        debug!(%participant, amount, new_stake, "stake decreased");
        Ok(new_stake)
    }

    // ------------------------------------------------------------------
    // Submissions
    // ------------------------------------------------------------------

    /// Pre-flight check for the token's atomic stake-and-submit path:
    /// verifies the submission half would succeed at `final_stake` without
    /// mutating anything.
    pub(crate) fn can_submit(
        &self,
        participant: Address,
        commitment: Hash32,
        final_stake: u64,
    ) -> Result<()> {
        let st = self.state.read();
        Self::ensure_initialized(&st)?;
        Self::ensure_phase(&st, Phase::Open, "submitNewPredictions")?;
        if commitment.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "cannot submit the zero hash".to_string(),
            ));
        }
        if final_stake == 0 || final_stake < st.stake_threshold {
            return Err(CompetitionError::ThresholdViolation {
                amount: final_stake,
                required: st.stake_threshold,
            });
        }
        if st.latest().submission_of(participant) == commitment {
            return Err(CompetitionError::StateInvariant(
                "identical submission already recorded".to_string(),
            ));
        }
        Ok(())
    }

    /// Record a first commitment for the latest challenge
    pub fn submit_new_predictions(&self, participant: Address, commitment: Hash32) -> Result<()> {
        let mut st = self.state.write();
        Self::ensure_initialized(&st)?;
        Self::ensure_phase(&st, Phase::Open, "submitNewPredictions")?;
        if commitment.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "cannot submit the zero hash".to_string(),
            ));
        }
        let stake = st.stake_of(participant);
        if stake == 0 || stake < st.stake_threshold {
            return Err(CompetitionError::ThresholdViolation {
                amount: stake,
                required: st.stake_threshold,
            });
        }
        if st.latest().has_submission(participant) {
            return Err(CompetitionError::StateInvariant(
                "submission already exists; use updateSubmission".to_string(),
            ));
        }
        let latest = st.latest_mut();
        latest.submissions.insert(participant, commitment);
        latest.submitters.insert(participant);
        st.bump_block();
        debug!(%participant, %commitment, "submission recorded");
        Ok(())
    }

    /// Replace or withdraw a commitment. `old_commitment` must match the
    /// stored value (optimistic concurrency); the zero hash withdraws.
    pub fn update_submission(
        &self,
        participant: Address,
        old_commitment: Hash32,
        new_commitment: Hash32,
    ) -> Result<()> {
        let mut st = self.state.write();
        Self::ensure_initialized(&st)?;
        Self::ensure_phase(&st, Phase::Open, "updateSubmission")?;
        if !st.latest().has_submission(participant) {
            return Err(CompetitionError::StateInvariant(
                "no submission to update".to_string(),
            ));
        }
        let current = st.latest().submission_of(participant);
        if current != old_commitment {
            return Err(CompetitionError::StateInvariant(
                "stale submission hash".to_string(),
            ));
        }
        if new_commitment == current {
            return Err(CompetitionError::StateInvariant(
                "identical submission already recorded".to_string(),
            ));
        }
        let latest = st.latest_mut();
        if new_commitment.is_zero() {
            latest.submissions.remove(&participant);
            latest.submitters.swap_remove(&participant);
            st.bump_block();
            debug!(%participant, "submission withdrawn");
        } else {
            latest.submissions.insert(participant, new_commitment);
            st.bump_block();
            debug!(%participant, %new_commitment, "submission updated");
        }
        Ok(())
    }

    /// Withdraw the caller's live submission for the latest challenge
    pub fn withdraw_submission(&self, participant: Address) -> Result<()> {
        let current = {
            let st = self.state.read();
            st.latest().submission_of(participant)
        };
        if current.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "no submission to withdraw".to_string(),
            ));
        }
        self.update_submission(participant, current, Hash32::ZERO)
    }

    // ------------------------------------------------------------------
    // Backing
    // ------------------------------------------------------------------

    /// Point the caller's backing edge at `target`. Self is always legal;
    /// a non-self target needs stake at the threshold and either no live
    /// submission or an edge that already points away from self.
    pub fn update_backed_participant(&self, participant: Address, target: Address) -> Result<()> {
        let mut st = self.state.write();
        Self::ensure_initialized(&st)?;
        Self::ensure_phase(&st, Phase::Open, "updateBackedParticipant")?;
        if target.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "cannot back the zero address".to_string(),
            ));
        }
        let current_target = st.backed_by(participant);
        if target == current_target {
            return Err(CompetitionError::StateInvariant(
                "already backing that participant".to_string(),
            ));
        }
        if target != participant {
            let stake = st.stake_of(participant);
            if stake == 0 || stake < st.stake_threshold {
                return Err(CompetitionError::ThresholdViolation {
                    amount: stake,
                    required: st.stake_threshold,
                });
            }
            // a self-backed submitter must withdraw before backing out;
            // re-targeting an already-non-self edge is allowed
            if current_target == participant && st.latest().has_submission(participant) {
                return Err(CompetitionError::StateInvariant(
                    "cannot back another participant with a live submission".to_string(),
                ));
            }
        }
        st.retarget_backing(participant, target);
        st.bump_block();
        debug!(%participant, %target, "backing updated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Historical stake archive
    // ------------------------------------------------------------------

    /// Record live stakes into the latest challenge's frozen snapshot over
    /// the `[start, end)` range of the live staker list. Admin, phase 2.
    /// Idempotent: re-recording a range overwrites with identical values.
    pub fn record_stakes(&self, caller: Address, start: usize, end: usize) -> Result<()> {
        self.access.require_admin(caller)?;
        let mut st = self.state.write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Recording, "recordStakes")?;
        if start > end || end > st.stakers.len() {
            return Err(CompetitionError::Range(format!(
                "stake recording range [{start}, {end}) out of bounds for {} stakers",
                st.stakers.len()
            )));
        }
        let chunk: Vec<(Address, u64)> = st
            .stakers
            .iter()
            .skip(start)
            .take(end - start)
            .map(|staker| (*staker, st.stake_of(*staker)))
            .collect();
        let latest = st.latest_mut();
        for (staker, amount) in chunk {
            latest.snapshot.record(staker, amount);
        }
        st.bump_block();
        debug!(start, end, "stakes recorded");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Information store and scores
    // ------------------------------------------------------------------

    /// Write one information item for a batch of participants; available
    /// once the target challenge has reached phase 3
    pub fn update_information_batch(
        &self,
        caller: Address,
        challenge: u32,
        participants: &[Address],
        item_number: u32,
        values: &[u64],
    ) -> Result<()> {
        self.access.require_admin(caller)?;
        if participants.len() != values.len() {
            return Err(CompetitionError::length_mismatch(
                participants.len(),
                values.len(),
            ));
        }
        let mut st = self.state.write();
        Self::ensure_migration_clear(&st)?;
        let record = st.challenge(challenge)?;
        if record.phase().as_u8() < Phase::Results.as_u8() {
            return Err(CompetitionError::PhaseViolation {
                operation: "updateInformationBatch",
                actual: record.phase(),
            });
        }
        let record = st.challenge_mut(challenge)?;
        for (participant, value) in participants.iter().zip(values.iter()) {
            record
                .information
                .entry(*participant)
                .or_default()
                .insert(item_number, *value);
        }
        st.bump_block();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get_latest_challenge_number(&self) -> u32 {
        self.state.read().latest_challenge_number()
    }

    pub fn get_phase(&self, challenge: u32) -> Result<Phase> {
        Ok(self.state.read().challenge(challenge)?.phase())
    }

    pub fn get_stake_threshold(&self) -> u64 {
        self.state.read().stake_threshold
    }

    pub fn get_rewards_threshold(&self) -> u64 {
        self.state.read().rewards_threshold
    }

    pub fn get_token_address(&self) -> Address {
        self.state.read().token_address
    }

    pub fn get_stake(&self, participant: Address) -> u64 {
        self.state.read().stake_of(participant)
    }

    pub fn get_current_total_staked(&self) -> u64 {
        self.state.read().current_total_staked
    }

    pub fn get_all_stakers(&self) -> Vec<Address> {
        self.state.read().stakers.iter().copied().collect()
    }

    pub fn get_backed_participant(&self, participant: Address) -> Address {
        self.state.read().backed_by(participant)
    }

    /// Exact reverse image of the backing map for `participant`
    pub fn get_all_backers(&self, participant: Address) -> Vec<Address> {
        self.state
            .read()
            .backers
            .get(&participant)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn get_participant_state(&self, participant: Address) -> ParticipantState {
        self.state.read().participant_state(participant)
    }

    pub fn get_dataset_hash(&self, challenge: u32) -> Result<Hash32> {
        Ok(self.state.read().challenge(challenge)?.dataset_hash)
    }

    pub fn get_key_hash(&self, challenge: u32) -> Result<Hash32> {
        Ok(self.state.read().challenge(challenge)?.key_hash)
    }

    pub fn get_results_hash(&self, challenge: u32) -> Result<Hash32> {
        Ok(self.state.read().challenge(challenge)?.results_hash)
    }

    pub fn get_private_key_hash(&self, challenge: u32) -> Result<Hash32> {
        Ok(self.state.read().challenge(challenge)?.private_key_hash)
    }

    pub fn get_deadlines(&self, challenge: u32, slot: u32) -> Result<u64> {
        Ok(self
            .state
            .read()
            .challenge(challenge)?
            .deadlines
            .get(&slot)
            .copied()
            .unwrap_or(0))
    }

    pub fn get_submission(&self, challenge: u32, participant: Address) -> Result<Hash32> {
        Ok(self.state.read().challenge(challenge)?.submission_of(participant))
    }

    pub fn get_submission_counter(&self, challenge: u32) -> Result<usize> {
        Ok(self.state.read().challenge(challenge)?.submitters.len())
    }

    /// Contiguous `[start, end)` slice of the current submitter list;
    /// slices over the full counter range partition the set exactly once
    pub fn get_submitters(&self, challenge: u32, start: usize, end: usize) -> Result<Vec<Address>> {
        let st = self.state.read();
        let record = st.challenge(challenge)?;
        if start > end || end > record.submitters.len() {
            return Err(CompetitionError::Range(format!(
                "submitter range [{start}, {end}) out of bounds for {} submitters",
                record.submitters.len()
            )));
        }
        Ok(record
            .submitters
            .iter()
            .skip(start)
            .take(end - start)
            .copied()
            .collect())
    }

    pub fn get_historical_stakers_counter(&self, challenge: u32) -> Result<usize> {
        Ok(self.state.read().challenge(challenge)?.snapshot.counter())
    }

    /// Contiguous `[start, end)` slice of the frozen staker snapshot, in
    /// recording order
    pub fn get_historical_stakers_partial(
        &self,
        challenge: u32,
        start: usize,
        end: usize,
    ) -> Result<Vec<Address>> {
        let st = self.state.read();
        let snapshot = &st.challenge(challenge)?.snapshot;
        if start > end || end > snapshot.counter() {
            return Err(CompetitionError::Range(format!(
                "snapshot range [{start}, {end}) out of bounds for {} stakers",
                snapshot.counter()
            )));
        }
        Ok(snapshot
            .stakers
            .iter()
            .skip(start)
            .take(end - start)
            .copied()
            .collect())
    }

    pub fn get_historical_stakers(&self, challenge: u32) -> Result<Vec<Address>> {
        let counter = self.get_historical_stakers_counter(challenge)?;
        self.get_historical_stakers_partial(challenge, 0, counter)
    }

    pub fn get_historical_stake_amounts(
        &self,
        challenge: u32,
        participants: &[Address],
    ) -> Result<Vec<u64>> {
        let st = self.state.read();
        let snapshot = &st.challenge(challenge)?.snapshot;
        Ok(participants
            .iter()
            .map(|p| snapshot.amounts.get(p).copied().unwrap_or(0))
            .collect())
    }

    pub fn get_historical_total_staked(&self, challenge: u32) -> Result<u64> {
        Ok(self.state.read().challenge(challenge)?.snapshot.total_staked)
    }

    pub fn get_information(
        &self,
        challenge: u32,
        participant: Address,
        item_number: u32,
    ) -> Result<u64> {
        Ok(self
            .state
            .read()
            .challenge(challenge)?
            .information
            .get(&participant)
            .and_then(|items| items.get(&item_number))
            .copied()
            .unwrap_or(0))
    }

    pub fn get_reward_record(&self, challenge: u32, participant: Address) -> Result<RewardRecord> {
        Ok(self.state.read().challenge(challenge)?.reward_record(participant))
    }

    pub fn get_message(&self) -> String {
        self.state.read().message.clone()
    }

    pub fn get_vault(&self) -> Address {
        self.state.read().vault
    }

    pub fn challenge_opened_block_number(&self, challenge: u32) -> Result<u64> {
        Ok(self.state.read().challenge(challenge)?.opened_block)
    }

    pub fn submission_closed_block_number(&self, challenge: u32) -> Result<u64> {
        Ok(self.state.read().challenge(challenge)?.submission_closed_block)
    }

    /// Current logical block (position in the sequentially consistent log)
    pub fn block_number(&self) -> u64 {
        self.state.read().block
    }

    // Shared with the rewards and migration halves of the impl
    pub(crate) fn state(&self) -> &RwLock<LedgerState> {
        &self.state
    }
}
