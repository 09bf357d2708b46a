//! Token component: balances plus competition-aware staking
//!
//! The token keeps its own stake record per (competition, participant)
//! pair and mirrors every stake move into the competition's ledger through
//! the core-side callbacks. Both sides verify the other's resulting record
//! so a drift between the two books surfaces as an error instead of a
//! silent imbalance.
//!
//! Only competitions registered and active in the embedded
//! [`CompetitionRegistry`] may be staked against.
//!
//! Lock order is token-then-nothing: the token never calls into a
//! competition while holding its own lock, and a competition may call
//! `transfer` while holding its ledger lock.

use crate::competition::Competition;
use crate::error::{CompetitionError, Result};
use crate::registry::CompetitionRegistry;
use crate::types::{Address, Hash32};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct TokenState {
    balances: HashMap<Address, u64>,
    /// Stake record per (competition, participant); the token's half of
    /// the double book
    stakes: HashMap<(Address, Address), u64>,
}

pub struct TokenLedger {
    address: Address,
    admin: Address,
    total_supply: u64,
    registry: CompetitionRegistry,
    state: RwLock<TokenState>,
}

impl TokenLedger {
    /// Mint the whole supply to `admin`
    pub fn new(address: Address, admin: Address, total_supply: u64) -> Self {
        let mut balances = HashMap::new();
        balances.insert(admin, total_supply);
        TokenLedger {
            address,
            admin,
            total_supply,
            registry: CompetitionRegistry::new(),
            state: RwLock::new(TokenState {
                balances,
                stakes: HashMap::new(),
            }),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn registry(&self) -> &CompetitionRegistry {
        &self.registry
    }

    pub fn balance_of(&self, account: Address) -> u64 {
        self.state
            .read()
            .balances
            .get(&account)
            .copied()
            .unwrap_or(0)
    }

    /// Token-side stake record for one participant in one competition
    pub fn get_stake(&self, competition: Address, participant: Address) -> u64 {
        self.state
            .read()
            .stakes
            .get(&(competition, participant))
            .copied()
            .unwrap_or(0)
    }

    /// Plain balance move; `from` is supplied by the embedding process,
    /// which is trusted to speak for its callers
    pub fn transfer(&self, from: Address, to: Address, amount: u64) -> Result<()> {
        let mut st = self.state.write();
        let available = st.balances.get(&from).copied().unwrap_or(0);
        if available < amount {
            return Err(CompetitionError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        st.balances.insert(from, available - amount);
        *st.balances.entry(to).or_insert(0) += amount;
        debug!(%from, %to, amount, "transfer");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Competition authorization
    // ------------------------------------------------------------------

    /// Admin-only: allow staking against `competition` under `name`
    pub fn authorize_competition(
        &self,
        caller: Address,
        name: &str,
        competition: Address,
    ) -> Result<()> {
        self.require_admin(caller)?;
        self.registry.register(name, competition)?;
        info!(name, %competition, "competition authorized");
        Ok(())
    }

    /// Admin-only: flip a registered competition's active flag
    pub fn set_competition_active(
        &self,
        caller: Address,
        competition: Address,
        active: bool,
    ) -> Result<()> {
        self.require_admin(caller)?;
        self.registry.set_active(competition, active)
    }

    /// Admin-only import of parent stake records for a migrated
    /// competition. Overwrites the token-side book; the competition's own
    /// records are aligned through its migration operations.
    pub fn align_stakes(
        &self,
        caller: Address,
        competition: Address,
        stakes: &[(Address, u64)],
    ) -> Result<()> {
        self.require_admin(caller)?;
        let mut st = self.state.write();
        for (participant, amount) in stakes {
            let key = (competition, *participant);
            if *amount == 0 {
                st.stakes.remove(&key);
            } else {
                st.stakes.insert(key, *amount);
            }
        }
        info!(%competition, records = stakes.len(), "stake records aligned");
        Ok(())
    }

    fn require_admin(&self, caller: Address) -> Result<()> {
        if caller == self.admin {
            Ok(())
        } else {
            Err(CompetitionError::AccessDenied(
                "token admin required".to_string(),
            ))
        }
    }

    fn ensure_authorized(&self, competition: &Competition) -> Result<()> {
        if self.registry.is_active(competition.address()) {
            Ok(())
        } else {
            Err(CompetitionError::AccessDenied(
                "competition is not an active staking target".to_string(),
            ))
        }
    }

    // ------------------------------------------------------------------
    // Coupled stake operations
    // ------------------------------------------------------------------

    /// Move `amount` from the caller's balance into stake at
    /// `competition`. The core validates phase and thresholds; the balance
    /// and both stake books move only if it accepts.
    pub fn increase_stake(
        &self,
        competition: &Competition,
        caller: Address,
        amount: u64,
    ) -> Result<u64> {
        self.ensure_authorized(competition)?;
        let available = self.balance_of(caller);
        if available < amount {
            return Err(CompetitionError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        let new_stake = competition.increase_stake(self.address, caller, amount)?;
        let recorded = {
            let mut st = self.state.write();
            let from = st.balances.get(&caller).copied().unwrap_or(0);
            st.balances.insert(caller, from - amount);
            *st.balances.entry(competition.address()).or_insert(0) += amount;
            let entry = st.stakes.entry((competition.address(), caller)).or_insert(0);
            *entry += amount;
            *entry
        };
        Self::cross_verify(recorded, new_stake)?;
        Ok(new_stake)
    }

    /// Move `amount` of stake back into the caller's balance
    pub fn decrease_stake(
        &self,
        competition: &Competition,
        caller: Address,
        amount: u64,
    ) -> Result<u64> {
        self.ensure_authorized(competition)?;
        let staked = self.get_stake(competition.address(), caller);
        if staked < amount {
            return Err(CompetitionError::InsufficientBalance {
                available: staked,
                required: amount,
            });
        }
        let new_stake = competition.decrease_stake(self.address, caller, amount)?;
        let recorded = {
            let mut st = self.state.write();
            let comp_balance = st.balances.get(&competition.address()).copied().unwrap_or(0);
            if comp_balance < amount {
                return Err(CompetitionError::StateInvariant(
                    "competition balance below its staked total".to_string(),
                ));
            }
            st.balances.insert(competition.address(), comp_balance - amount);
            *st.balances.entry(caller).or_insert(0) += amount;
            let key = (competition.address(), caller);
            let remaining = staked - amount;
            if remaining == 0 {
                st.stakes.remove(&key);
            } else {
                st.stakes.insert(key, remaining);
            }
            remaining
        };
        Self::cross_verify(recorded, new_stake)?;
        Ok(new_stake)
    }

    /// Drive the caller's stake to exactly `target`; a no-op when already
    /// there
    pub fn set_stake(&self, competition: &Competition, caller: Address, target: u64) -> Result<u64> {
        let current = self.get_stake(competition.address(), caller);
        if target > current {
            self.increase_stake(competition, caller, target - current)
        } else if target < current {
            self.decrease_stake(competition, caller, current - target)
        } else {
            Ok(current)
        }
    }

    /// One-call stake adjustment plus submission change. A zero commitment
    /// withdraws the live submission before moving the stake; otherwise the
    /// stake moves first and the commitment is then recorded or replaced.
    ///
    /// The submission half is pre-checked against the target stake before
    /// anything moves, so a rejection on either half leaves both books
    /// untouched.
    pub fn stake_and_submit(
        &self,
        competition: &Competition,
        caller: Address,
        target_stake: u64,
        commitment: Hash32,
    ) -> Result<()> {
        self.ensure_authorized(competition)?;
        let latest = competition.get_latest_challenge_number();
        let current_submission = competition.get_submission(latest, caller)?;

        if commitment.is_zero() {
            if current_submission.is_zero() {
                return Err(CompetitionError::StateInvariant(
                    "no submission to withdraw".to_string(),
                ));
            }
            if target_stake == 0
                && competition.get_backed_participant(caller) != caller
            {
                return Err(CompetitionError::StateInvariant(
                    "cannot zero stake while backing another participant".to_string(),
                ));
            }
            if target_stake > 0 && target_stake < competition.get_stake_threshold() {
                return Err(CompetitionError::ThresholdViolation {
                    amount: target_stake,
                    required: competition.get_stake_threshold(),
                });
            }
            // the stake half runs after the withdrawal, so its balance
            // requirement must hold before anything mutates
            let current_stake = self.get_stake(competition.address(), caller);
            if target_stake > current_stake {
                let available = self.balance_of(caller);
                let required = target_stake - current_stake;
                if available < required {
                    return Err(CompetitionError::InsufficientBalance {
                        available,
                        required,
                    });
                }
            }
            competition.withdraw_submission(caller)?;
            self.set_stake(competition, caller, target_stake)?;
        } else {
            competition.can_submit(caller, commitment, target_stake)?;
            self.set_stake(competition, caller, target_stake)?;
            if current_submission.is_zero() {
                competition.submit_new_predictions(caller, commitment)?;
            } else {
                competition.update_submission(caller, current_submission, commitment)?;
            }
        }
        Self::cross_verify(
            self.get_stake(competition.address(), caller),
            competition.get_stake(caller),
        )?;
        Ok(())
    }

    fn cross_verify(token_record: u64, core_record: u64) -> Result<()> {
        if token_record == core_record {
            Ok(())
        } else {
            Err(CompetitionError::StateInvariant(format!(
                "stake books diverged: token records {token_record}, core records {core_record}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn token() -> TokenLedger {
        TokenLedger::new(addr(2), addr(1), 1_000)
    }

    #[test]
    fn supply_mints_to_admin() {
        let t = token();
        assert_eq!(t.total_supply(), 1_000);
        assert_eq!(t.balance_of(addr(1)), 1_000);
        assert_eq!(t.balance_of(addr(9)), 0);
    }

    #[test]
    fn transfer_moves_and_checks_balance() {
        let t = token();
        t.transfer(addr(1), addr(5), 300).unwrap();
        assert_eq!(t.balance_of(addr(1)), 700);
        assert_eq!(t.balance_of(addr(5)), 300);
        let err = t.transfer(addr(5), addr(1), 301).unwrap_err();
        assert!(matches!(err, CompetitionError::InsufficientBalance { .. }));
    }

    #[test]
    fn authorization_is_admin_only() {
        let t = token();
        assert!(t.authorize_competition(addr(5), "main", addr(7)).is_err());
        t.authorize_competition(addr(1), "main", addr(7)).unwrap();
        assert!(t.registry().is_active(addr(7)));
        assert!(t.set_competition_active(addr(5), addr(7), false).is_err());
    }

    #[test]
    fn stake_alignment_overwrites_records() {
        let t = token();
        t.align_stakes(addr(1), addr(7), &[(addr(5), 40), (addr(6), 60)])
            .unwrap();
        assert_eq!(t.get_stake(addr(7), addr(5)), 40);
        t.align_stakes(addr(1), addr(7), &[(addr(5), 0)]).unwrap();
        assert_eq!(t.get_stake(addr(7), addr(5)), 0);
        assert_eq!(t.get_stake(addr(7), addr(6)), 60);
        assert!(t.align_stakes(addr(9), addr(7), &[]).is_err());
    }
}
