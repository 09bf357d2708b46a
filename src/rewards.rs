//! Treasury half of the competition ledger
//!
//! - reward payout into stake (pool -> staked, never through balances)
//! - punitive burn accounting (staked -> totalBurned)
//! - sponsorship intake and the remainder / burned-pool recycling moves
//! - challenge and tournament score batches
//!
//! Every mutation keeps the token-balance identity: the token balance held
//! at the competition address equals pool + totalStaked + remainder +
//! totalBurned. Payouts and burns shuffle value between those buckets
//! without touching the balance; sponsor and moveBurnedOut are the only
//! operations that move the balance itself.

use crate::challenge::Phase;
use crate::competition::Competition;
use crate::error::{CompetitionError, Result};
use crate::types::Address;
use tracing::{info, warn};

impl Competition {
    /// Pay one batch of winners out of the competition pool. Rewards are
    /// credited directly to stake; a winner below the stake threshold
    /// before payout may end up above it after.
    pub fn pay_rewards(
        &self,
        caller: Address,
        winners: &[Address],
        staking_rewards: &[u64],
        challenge_rewards: &[u64],
        tournament_rewards: &[u64],
    ) -> Result<()> {
        self.access().require_admin(caller)?;
        if winners.len() != staking_rewards.len() {
            return Err(CompetitionError::length_mismatch(
                winners.len(),
                staking_rewards.len(),
            ));
        }
        if winners.len() != challenge_rewards.len() {
            return Err(CompetitionError::length_mismatch(
                winners.len(),
                challenge_rewards.len(),
            ));
        }
        if winners.len() != tournament_rewards.len() {
            return Err(CompetitionError::length_mismatch(
                winners.len(),
                tournament_rewards.len(),
            ));
        }
        let mut st = self.state().write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Results, "payRewards")?;

        let mut total: u64 = 0;
        for i in 0..winners.len() {
            let each = staking_rewards[i]
                .checked_add(challenge_rewards[i])
                .and_then(|v| v.checked_add(tournament_rewards[i]))
                .ok_or_else(|| CompetitionError::Range("reward overflow".to_string()))?;
            total = total
                .checked_add(each)
                .ok_or_else(|| CompetitionError::Range("reward overflow".to_string()))?;
        }
        if total > st.competition_pool {
            return Err(CompetitionError::InsufficientBalance {
                available: st.competition_pool,
                required: total,
            });
        }

        let challenge = st.latest_challenge_number();
        for i in 0..winners.len() {
            let winner = winners[i];
            let amount = staking_rewards[i] + challenge_rewards[i] + tournament_rewards[i];
            st.competition_pool -= amount;
            st.credit_stake(winner, amount);
            let record = st.latest_mut().reward_record_mut(winner);
            record.staking_reward += staking_rewards[i];
            record.challenge_reward += challenge_rewards[i];
            record.tournament_reward += tournament_rewards[i];
        }
        st.bump_block();
        info!(challenge, winners = winners.len(), total, "rewards paid");
        Ok(())
    }

    /// Move stake from each participant into the burned bucket. Validated
    /// batch-first; any short stake rejects the whole call.
    pub fn burn(&self, caller: Address, participants: &[Address], amounts: &[u64]) -> Result<()> {
        self.access().require_admin(caller)?;
        if participants.len() != amounts.len() {
            return Err(CompetitionError::length_mismatch(
                participants.len(),
                amounts.len(),
            ));
        }
        let mut st = self.state().write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Results, "burn")?;

        for (participant, amount) in participants.iter().zip(amounts.iter()) {
            let stake = st.stake_of(*participant);
            if *amount > stake {
                return Err(CompetitionError::InsufficientBalance {
                    available: stake,
                    required: *amount,
                });
            }
        }

        let challenge = st.latest_challenge_number();
        let mut total: u64 = 0;
        for (participant, amount) in participants.iter().zip(amounts.iter()) {
            st.debit_stake(*participant, *amount);
            st.total_burned += amount;
            total += amount;
            st.latest_mut().reward_record_mut(*participant).burned_amount += amount;
        }
        st.bump_block();
        warn!(challenge, burned = total, "stake burned");
        Ok(())
    }

    /// Record challenge and tournament scores once the target challenge
    /// has reached phase 3
    pub fn update_challenge_and_tournament_scores(
        &self,
        caller: Address,
        challenge: u32,
        participants: &[Address],
        challenge_scores: &[u64],
        tournament_scores: &[u64],
    ) -> Result<()> {
        self.access().require_admin(caller)?;
        if participants.len() != challenge_scores.len() {
            return Err(CompetitionError::length_mismatch(
                participants.len(),
                challenge_scores.len(),
            ));
        }
        if participants.len() != tournament_scores.len() {
            return Err(CompetitionError::length_mismatch(
                participants.len(),
                tournament_scores.len(),
            ));
        }
        let mut st = self.state().write();
        Self::ensure_migration_clear(&st)?;
        let record = st.challenge(challenge)?;
        if record.phase().as_u8() < Phase::Results.as_u8() {
            return Err(CompetitionError::PhaseViolation {
                operation: "updateChallengeAndTournamentScores",
                actual: record.phase(),
            });
        }
        let record = st.challenge_mut(challenge)?;
        for i in 0..participants.len() {
            let entry = record.reward_record_mut(participants[i]);
            entry.challenge_score = challenge_scores[i];
            entry.tournament_score = tournament_scores[i];
        }
        st.bump_block();
        Ok(())
    }

    /// Transfer tokens from the caller into the competition pool. Open to
    /// anyone; blocked only during the stake-recording phase, where pool
    /// growth would race the snapshot.
    pub fn sponsor(&self, caller: Address, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(CompetitionError::StateInvariant(
                "sponsorship amount must be positive".to_string(),
            ));
        }
        let token = self.token()?;
        let mut st = self.state().write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        if st.latest().phase() == Phase::Recording {
            return Err(CompetitionError::PhaseViolation {
                operation: "sponsor",
                actual: Phase::Recording,
            });
        }
        token.transfer(caller, self.address(), amount)?;
        st.competition_pool += amount;
        st.bump_block();
        info!(%caller, amount, "sponsorship received");
        Ok(())
    }

    /// Tokens sitting at the competition address outside every tracked
    /// bucket (e.g. sent by a plain transfer)
    pub fn get_remainder(&self) -> Result<u64> {
        let token = self.token()?;
        let st = self.state().read();
        let tracked = st.competition_pool + st.current_total_staked + st.total_burned;
        Ok(token.balance_of(self.address()).saturating_sub(tracked))
    }

    /// Sweep the remainder into the competition pool; between rounds only
    pub fn move_remainder_to_pool(&self, caller: Address) -> Result<()> {
        self.access().require_admin(caller)?;
        let token = self.token()?;
        let mut st = self.state().write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Settled, "moveRemainderToPool")?;
        let tracked = st.competition_pool + st.current_total_staked + st.total_burned;
        let remainder = token.balance_of(self.address()).saturating_sub(tracked);
        if remainder == 0 {
            return Err(CompetitionError::StateInvariant(
                "no remainder to move".to_string(),
            ));
        }
        st.competition_pool += remainder;
        st.bump_block();
        info!(remainder, "remainder moved to pool");
        Ok(())
    }

    /// Recycle part of the burned bucket back into the pool
    pub fn move_burned_to_pool(&self, caller: Address, amount: u64) -> Result<()> {
        self.access().require_admin(caller)?;
        let mut st = self.state().write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Settled, "moveBurnedToPool")?;
        if amount == 0 || amount > st.total_burned {
            return Err(CompetitionError::Range(format!(
                "cannot move {amount} of {} burned tokens",
                st.total_burned
            )));
        }
        st.total_burned -= amount;
        st.competition_pool += amount;
        st.bump_block();
        info!(amount, "burned tokens moved to pool");
        Ok(())
    }

    /// Pay part of the burned bucket out to the configured burn recipient
    pub fn move_burned_out(&self, caller: Address, amount: u64) -> Result<()> {
        self.access().require_admin(caller)?;
        let token = self.token()?;
        let mut st = self.state().write();
        Self::ensure_initialized(&st)?;
        Self::ensure_migration_clear(&st)?;
        Self::ensure_phase(&st, Phase::Settled, "moveBurnedOut")?;
        if st.burn_recipient.is_zero() {
            return Err(CompetitionError::StateInvariant(
                "burn recipient not set".to_string(),
            ));
        }
        if amount == 0 || amount > st.total_burned {
            return Err(CompetitionError::Range(format!(
                "cannot move {amount} of {} burned tokens",
                st.total_burned
            )));
        }
        token.transfer(self.address(), st.burn_recipient, amount)?;
        st.total_burned -= amount;
        st.bump_block();
        info!(amount, recipient = %st.burn_recipient, "burned tokens paid out");
        Ok(())
    }

    /// The competition address itself can never be the burn recipient
    pub fn update_burn_recipient(&self, caller: Address, recipient: Address) -> Result<()> {
        self.access().require_admin(caller)?;
        if recipient == self.address() {
            return Err(CompetitionError::StateInvariant(
                "burn recipient cannot be the competition itself".to_string(),
            ));
        }
        let mut st = self.state().write();
        st.burn_recipient = recipient;
        st.bump_block();
        Ok(())
    }

    pub fn get_burn_recipient(&self) -> Address {
        self.state().read().burn_recipient
    }

    pub fn get_competition_pool(&self) -> u64 {
        self.state().read().competition_pool
    }

    pub fn get_total_burned_amount(&self) -> u64 {
        self.state().read().total_burned
    }

    pub fn get_staking_rewards(&self, challenge: u32, participant: Address) -> Result<u64> {
        Ok(self.get_reward_record(challenge, participant)?.staking_reward)
    }

    pub fn get_challenge_rewards(&self, challenge: u32, participant: Address) -> Result<u64> {
        Ok(self.get_reward_record(challenge, participant)?.challenge_reward)
    }

    pub fn get_tournament_rewards(&self, challenge: u32, participant: Address) -> Result<u64> {
        Ok(self.get_reward_record(challenge, participant)?.tournament_reward)
    }

    pub fn get_overall_rewards(&self, challenge: u32, participant: Address) -> Result<u64> {
        Ok(self.get_reward_record(challenge, participant)?.overall_reward())
    }

    pub fn get_burned_amount(&self, challenge: u32, participant: Address) -> Result<u64> {
        Ok(self.get_reward_record(challenge, participant)?.burned_amount)
    }

    pub fn get_challenge_scores(&self, challenge: u32, participant: Address) -> Result<u64> {
        Ok(self.get_reward_record(challenge, participant)?.challenge_score)
    }

    pub fn get_tournament_scores(&self, challenge: u32, participant: Address) -> Result<u64> {
        Ok(self.get_reward_record(challenge, participant)?.tournament_score)
    }
}
