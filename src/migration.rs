//! Fork migration: bulk-import of a parent deployment's history
//!
//! A freshly deployed ledger can be seeded from an existing one through a
//! set of chunkable admin-only alignment operations. The first alignment
//! call flips the ledger into migration mode, which blocks normal-path
//! admin operations until `complete_migration` verifies that every piece
//! of history has been imported and seals the gate permanently.
//!
//! Alignment operations are idempotent so an interrupted import can be
//! re-driven from the start. Challenge records created here materialize
//! directly in the settled phase.

use crate::challenge::ChallengeRecord;
use crate::competition::Competition;
use crate::error::{CompetitionError, Result};
use crate::state::LedgerState;
use crate::types::Address;
use tracing::{debug, info};

impl Competition {
    fn ensure_migration_open(&self, caller: Address, st: &LedgerState) -> Result<()> {
        self.access()
            .require_admin(caller)
            .map_err(|_| CompetitionError::MigrationGate("caller is not an admin".to_string()))?;
        Self::ensure_initialized(st)?;
        if st.migration.completed {
            return Err(CompetitionError::MigrationGate(
                "migration already completed".to_string(),
            ));
        }
        Ok(())
    }

    /// Import opened-block numbers for challenges 1..=N, materializing the
    /// challenge records on first call. Re-aligning overwrites in place but
    /// may not change the challenge count.
    pub fn align_challenge_opened_block_numbers(
        &self,
        caller: Address,
        blocks: &[u64],
    ) -> Result<()> {
        let mut st = self.state().write();
        self.ensure_migration_open(caller, &st)?;
        if blocks.is_empty() {
            return Err(CompetitionError::Range(
                "at least one challenge must be imported".to_string(),
            ));
        }
        if st.challenges.len() == 1 {
            for _ in blocks {
                st.challenges.push(ChallengeRecord::migrated());
            }
        } else if st.challenges.len() != blocks.len() + 1 {
            return Err(CompetitionError::Range(format!(
                "{} opened blocks for {} imported challenges",
                blocks.len(),
                st.challenges.len() - 1
            )));
        }
        for (i, block) in blocks.iter().enumerate() {
            st.challenges[i + 1].opened_block = *block;
        }
        st.migration.started = true;
        st.migration.opened_blocks_aligned = true;
        st.bump_block();
        info!(challenges = blocks.len(), "challenge opened blocks aligned");
        Ok(())
    }

    /// Import submission-closed block numbers for challenges 1..=N
    pub fn align_submission_closed_block_numbers(
        &self,
        caller: Address,
        blocks: &[u64],
    ) -> Result<()> {
        let mut st = self.state().write();
        self.ensure_migration_open(caller, &st)?;
        if blocks.len() != st.latest_challenge_number() as usize {
            return Err(CompetitionError::Range(format!(
                "{} closed blocks for {} imported challenges",
                blocks.len(),
                st.latest_challenge_number()
            )));
        }
        for (i, block) in blocks.iter().enumerate() {
            st.challenges[i + 1].submission_closed_block = *block;
        }
        st.migration.started = true;
        st.migration.closed_blocks_aligned = true;
        st.bump_block();
        debug!(challenges = blocks.len(), "submission closed blocks aligned");
        Ok(())
    }

    /// Rebuild the live staker set: drop `to_remove` entirely, then force
    /// each `(staker, stake)` in `to_add` to the given amount. Chunkable;
    /// repeating a chunk converges to the same state.
    pub fn align_staker_set(
        &self,
        caller: Address,
        to_remove: &[Address],
        to_add: &[(Address, u64)],
    ) -> Result<()> {
        let mut st = self.state().write();
        self.ensure_migration_open(caller, &st)?;
        for staker in to_remove {
            let current = st.stake_of(*staker);
            if current > 0 {
                st.debit_stake(*staker, current);
            }
        }
        for (staker, amount) in to_add {
            let current = st.stake_of(*staker);
            if current > *amount {
                st.debit_stake(*staker, current - amount);
            } else if current < *amount {
                st.credit_stake(*staker, amount - current);
            }
        }
        st.migration.started = true;
        st.migration.staker_set_aligned = true;
        st.bump_block();
        debug!(
            removed = to_remove.len(),
            added = to_add.len(),
            "staker set aligned"
        );
        Ok(())
    }

    /// Import one challenge's frozen stake snapshot, chunk by chunk
    pub fn align_historical_staked_amounts(
        &self,
        caller: Address,
        challenge: u32,
        stakers: &[Address],
        amounts: &[u64],
    ) -> Result<()> {
        if stakers.len() != amounts.len() {
            return Err(CompetitionError::length_mismatch(stakers.len(), amounts.len()));
        }
        let mut st = self.state().write();
        self.ensure_migration_open(caller, &st)?;
        if challenge == 0 || challenge > st.latest_challenge_number() {
            return Err(CompetitionError::UnknownChallenge(challenge));
        }
        let record = st.challenge_mut(challenge)?;
        for (staker, amount) in stakers.iter().zip(amounts.iter()) {
            record.snapshot.record(*staker, *amount);
        }
        st.migration.started = true;
        st.migration.historical_aligned.insert(challenge);
        st.bump_block();
        debug!(challenge, stakers = stakers.len(), "historical stakes aligned");
        Ok(())
    }

    /// Force the backing edge of each imported staker to self and mark it
    /// aligned. Chunkable over the staker set.
    pub fn align_backing(&self, caller: Address, stakers: &[Address]) -> Result<()> {
        let mut st = self.state().write();
        self.ensure_migration_open(caller, &st)?;
        for staker in stakers {
            st.retarget_backing(*staker, *staker);
            st.migration.backing_aligned.insert(*staker);
        }
        st.migration.started = true;
        st.bump_block();
        debug!(stakers = stakers.len(), "backing edges aligned");
        Ok(())
    }

    /// Verify that every piece of history has been imported, record the
    /// completion block, and permanently seal the migration path
    pub fn complete_migration(&self, caller: Address) -> Result<()> {
        let mut st = self.state().write();
        self.ensure_migration_open(caller, &st)?;
        if !st.migration.started {
            return Err(CompetitionError::MigrationGate(
                "no alignment operation has run".to_string(),
            ));
        }
        if !st.migration.opened_blocks_aligned {
            return Err(CompetitionError::MigrationGate(
                "challenge opened blocks not aligned".to_string(),
            ));
        }
        if !st.migration.closed_blocks_aligned {
            return Err(CompetitionError::MigrationGate(
                "submission closed blocks not aligned".to_string(),
            ));
        }
        if !st.migration.staker_set_aligned {
            return Err(CompetitionError::MigrationGate(
                "staker set not aligned".to_string(),
            ));
        }
        for challenge in 1..=st.latest_challenge_number() {
            if !st.migration.historical_aligned.contains(&challenge) {
                return Err(CompetitionError::MigrationGate(format!(
                    "historical stakes for challenge {challenge} not aligned"
                )));
            }
        }
        for staker in st.stakers.iter() {
            if !st.migration.backing_aligned.contains(staker) {
                return Err(CompetitionError::MigrationGate(format!(
                    "backing for staker {staker} not aligned"
                )));
            }
        }
        let block = st.bump_block();
        st.migration.completed = true;
        st.migration.completed_block = Some(block);
        info!(
            challenges = st.latest_challenge_number(),
            stakers = st.stakers.len(),
            block,
            "migration completed"
        );
        Ok(())
    }

    pub fn migration_completed(&self) -> bool {
        self.state().read().migration.completed
    }

    pub fn migration_completed_block_number(&self) -> Option<u64> {
        self.state().read().migration.completed_block
    }
}
