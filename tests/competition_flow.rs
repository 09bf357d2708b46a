//! End-to-end tests for the competition lifecycle
//!
//! Drives the token and competition pair through full rounds: staking,
//! submissions, backing, stake recording, results, payouts, burns, and the
//! treasury moves between rounds.

use competition_ledger::{
    Address, Competition, CompetitionError, Hash32, ParticipantState, Phase, Role, TokenLedger,
};
use std::sync::Arc;

// ============================================================================
// TEST HELPERS
// ============================================================================

const SUPPLY: u64 = 10_000_000;
const STAKE_THRESHOLD: u64 = 100;

fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

fn hash(n: u8) -> Hash32 {
    Hash32([n; 32])
}

fn admin() -> Address {
    addr(1)
}

/// Deploy a token and an authorized, initialized competition
fn deploy() -> (Arc<TokenLedger>, Competition) {
    deploy_with_thresholds(STAKE_THRESHOLD, 0)
}

fn deploy_with_thresholds(stake: u64, rewards: u64) -> (Arc<TokenLedger>, Competition) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let token = Arc::new(TokenLedger::new(addr(2), admin(), SUPPLY));
    let competition = Competition::new(addr(3), admin());
    competition
        .initialize(admin(), stake, rewards, token.clone())
        .unwrap();
    token
        .authorize_competition(admin(), "main", competition.address())
        .unwrap();
    (token, competition)
}

fn fund(token: &TokenLedger, account: Address, amount: u64) {
    token.transfer(admin(), account, amount).unwrap();
}

/// Open challenge N with nothing staked; seeds distinct dataset/key hashes
/// from `seed`
fn open_round(competition: &Competition, seed: u8) -> u32 {
    competition
        .open_challenge(admin(), hash(seed), hash(seed + 1), 1_000, 2_000)
        .unwrap()
}

/// Drive the latest challenge from Open to Results, recording all stakes
fn to_results(competition: &Competition) {
    competition.close_submission(admin()).unwrap();
    let stakers = competition.get_all_stakers().len();
    competition.record_stakes(admin(), 0, stakers).unwrap();
    competition.advance_to_phase(admin(), 3).unwrap();
}

fn settle(competition: &Competition) {
    competition.advance_to_phase(admin(), 4).unwrap();
}

/// The token balance held at the competition address always splits exactly
/// into pool + staked + remainder + burned
fn assert_balance_identity(token: &TokenLedger, competition: &Competition) {
    let tracked = competition.get_competition_pool()
        + competition.get_current_total_staked()
        + competition.get_total_burned_amount()
        + competition.get_remainder().unwrap();
    assert_eq!(token.balance_of(competition.address()), tracked);
}

// ============================================================================
// INITIALIZATION AND PHASE MACHINE
// ============================================================================

#[test]
fn starts_with_synthetic_settled_challenge() {
    let (_, competition) = deploy();
    assert_eq!(competition.get_latest_challenge_number(), 0);
    assert_eq!(competition.get_phase(0).unwrap(), Phase::Settled);
    assert_eq!(competition.get_stake_threshold(), STAKE_THRESHOLD);
    assert_eq!(competition.get_rewards_threshold(), 0);
}

#[test]
fn reinitialization_is_rejected() {
    let (token, competition) = deploy();
    let err = competition
        .initialize(admin(), 5, 5, token.clone())
        .unwrap_err();
    assert!(matches!(err, CompetitionError::AlreadyInitialized));
}

#[test]
fn zero_token_address_is_rejected() {
    let token = Arc::new(TokenLedger::new(Address::ZERO, admin(), SUPPLY));
    let competition = Competition::new(addr(3), admin());
    assert!(competition
        .initialize(admin(), STAKE_THRESHOLD, 0, token)
        .is_err());
}

#[test]
fn operations_before_initialization_are_rejected() {
    let competition = Competition::new(addr(3), admin());
    let err = competition.submit_new_predictions(addr(5), hash(9)).unwrap_err();
    assert!(matches!(err, CompetitionError::NotInitialized));
    let err = competition.update_deadlines(admin(), 0, 1, 1_000).unwrap_err();
    assert!(matches!(err, CompetitionError::NotInitialized));
}

#[test]
fn phases_move_strictly_forward() {
    let (_, competition) = deploy();
    let challenge = open_round(&competition, 10);
    assert_eq!(competition.get_phase(challenge).unwrap(), Phase::Open);

    // cannot settle an open challenge, cannot re-open, cannot skip to results
    assert!(competition.advance_to_phase(admin(), 4).is_err());
    assert!(competition.advance_to_phase(admin(), 3).is_err());
    assert!(competition
        .open_challenge(admin(), hash(20), hash(21), 0, 0)
        .is_err());

    competition.close_submission(admin()).unwrap();
    assert_eq!(competition.get_phase(challenge).unwrap(), Phase::Recording);
    assert!(competition.close_submission(admin()).is_err());
    assert!(competition.advance_to_phase(admin(), 4).is_err());

    competition.advance_to_phase(admin(), 3).unwrap();
    assert!(competition.advance_to_phase(admin(), 3).is_err());
    competition.advance_to_phase(admin(), 4).unwrap();
    assert_eq!(competition.get_phase(challenge).unwrap(), Phase::Settled);

    // phase numbers outside the controller's range
    assert!(competition.advance_to_phase(admin(), 1).is_err());
    assert!(competition.advance_to_phase(admin(), 5).is_err());
}

#[test]
fn open_challenge_requires_funded_pool_and_fresh_hashes() {
    let (token, competition) = deploy_with_thresholds(STAKE_THRESHOLD, 500);
    let err = competition
        .open_challenge(admin(), hash(10), hash(11), 0, 0)
        .unwrap_err();
    assert!(matches!(err, CompetitionError::ThresholdViolation { .. }));

    fund(&token, addr(9), 500);
    competition.sponsor(addr(9), 500).unwrap();
    let challenge = open_round(&competition, 10);
    assert_eq!(challenge, 1);
    assert_eq!(competition.get_dataset_hash(1).unwrap(), hash(10));
    assert_eq!(competition.get_key_hash(1).unwrap(), hash(11));
    assert_eq!(competition.get_deadlines(1, 0).unwrap(), 1_000);

    // a settled round cannot recycle hashes
    to_results(&competition);
    settle(&competition);
    assert!(competition
        .open_challenge(admin(), hash(10), hash(12), 0, 0)
        .is_err());
    assert!(competition
        .open_challenge(admin(), hash(12), hash(12), 0, 0)
        .is_err());
}

#[test]
fn dataset_and_key_can_rotate_while_open() {
    let (_, competition) = deploy();
    open_round(&competition, 10);
    competition.update_dataset(admin(), hash(30)).unwrap();
    competition.update_key(admin(), hash(31)).unwrap();
    assert_eq!(competition.get_dataset_hash(1).unwrap(), hash(30));
    assert_eq!(competition.get_key_hash(1).unwrap(), hash(31));

    // the retired hash stays burned forever
    assert!(competition.update_dataset(admin(), hash(10)).is_err());
    competition.close_submission(admin()).unwrap();
    assert!(competition.update_dataset(admin(), hash(32)).is_err());
}

#[test]
fn block_counter_advances_with_each_mutation() {
    let (_, competition) = deploy();
    let before = competition.block_number();
    open_round(&competition, 10);
    let opened = competition.challenge_opened_block_number(1).unwrap();
    assert!(opened > before);
    competition.close_submission(admin()).unwrap();
    let closed = competition.submission_closed_block_number(1).unwrap();
    assert!(closed > opened);
    assert_eq!(competition.block_number(), closed);
}

// ============================================================================
// STAKING
// ============================================================================

#[test]
fn staking_moves_balances_and_both_books() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);

    token.increase_stake(&competition, addr(5), 400).unwrap();
    assert_eq!(competition.get_stake(addr(5)), 400);
    assert_eq!(token.get_stake(competition.address(), addr(5)), 400);
    assert_eq!(token.balance_of(addr(5)), 600);
    assert_eq!(token.balance_of(competition.address()), 400);
    assert_eq!(competition.get_current_total_staked(), 400);
    assert_eq!(competition.get_all_stakers(), vec![addr(5)]);

    token.decrease_stake(&competition, addr(5), 150).unwrap();
    assert_eq!(competition.get_stake(addr(5)), 250);
    assert_eq!(token.balance_of(addr(5)), 750);
    assert_balance_identity(&token, &competition);
}

#[test]
fn stake_mutations_are_token_driven_only() {
    let (_, competition) = deploy();
    open_round(&competition, 10);
    let err = competition.increase_stake(addr(5), addr(5), 500).unwrap_err();
    assert!(matches!(err, CompetitionError::AccessDenied(_)));
}

#[test]
fn stake_must_land_at_or_above_the_threshold() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);

    let err = token
        .increase_stake(&competition, addr(5), STAKE_THRESHOLD - 1)
        .unwrap_err();
    assert!(matches!(err, CompetitionError::ThresholdViolation { .. }));

    token.increase_stake(&competition, addr(5), 200).unwrap();
    // dropping into (0, threshold) is illegal; dropping to exactly zero is not
    let err = token.decrease_stake(&competition, addr(5), 150).unwrap_err();
    assert!(matches!(err, CompetitionError::ThresholdViolation { .. }));
    token.decrease_stake(&competition, addr(5), 200).unwrap();
    assert_eq!(competition.get_stake(addr(5)), 0);
    assert!(competition.get_all_stakers().is_empty());
}

#[test]
fn unstaking_more_than_staked_is_rejected() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 200).unwrap();
    let err = token.decrease_stake(&competition, addr(5), 201).unwrap_err();
    assert!(matches!(err, CompetitionError::InsufficientBalance { .. }));
}

#[test]
fn staking_is_open_phase_only() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 200).unwrap();
    competition.close_submission(admin()).unwrap();
    assert!(token.increase_stake(&competition, addr(5), 100).is_err());
    assert!(token.decrease_stake(&competition, addr(5), 100).is_err());
}

#[test]
fn deactivated_competition_cannot_be_staked() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);
    token
        .set_competition_active(admin(), competition.address(), false)
        .unwrap();
    let err = token.increase_stake(&competition, addr(5), 200).unwrap_err();
    assert!(matches!(err, CompetitionError::AccessDenied(_)));
}

// ============================================================================
// SUBMISSIONS
// ============================================================================

#[test]
fn submission_requires_threshold_stake() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);

    let err = competition.submit_new_predictions(addr(5), hash(40)).unwrap_err();
    assert!(matches!(err, CompetitionError::ThresholdViolation { .. }));

    token.increase_stake(&competition, addr(5), 200).unwrap();
    competition.submit_new_predictions(addr(5), hash(40)).unwrap();
    assert_eq!(competition.get_submission(1, addr(5)).unwrap(), hash(40));
    assert_eq!(competition.get_submission_counter(1).unwrap(), 1);
}

#[test]
fn submission_update_is_optimistic_and_withdrawal_swaps_with_last() {
    let (token, competition) = deploy();
    for n in 5..8 {
        fund(&token, addr(n), 1_000);
    }
    open_round(&competition, 10);
    for n in 5..8 {
        token.increase_stake(&competition, addr(n), 200).unwrap();
        competition
            .submit_new_predictions(addr(n), hash(40 + n as u8))
            .unwrap();
    }

    // double submit, zero hash, stale and identical updates all revert
    assert!(competition.submit_new_predictions(addr(5), hash(50)).is_err());
    assert!(competition.submit_new_predictions(addr(6), Hash32::ZERO).is_err());
    assert!(competition
        .update_submission(addr(5), hash(99), hash(50))
        .is_err());
    assert!(competition
        .update_submission(addr(5), hash(45), hash(45))
        .is_err());

    competition.update_submission(addr(5), hash(45), hash(50)).unwrap();
    assert_eq!(competition.get_submission(1, addr(5)).unwrap(), hash(50));

    // withdrawing the first submitter swaps the last into its slot
    competition.withdraw_submission(addr(5)).unwrap();
    assert_eq!(competition.get_submission_counter(1).unwrap(), 2);
    assert_eq!(
        competition.get_submitters(1, 0, 2).unwrap(),
        vec![addr(7), addr(6)]
    );
    assert!(competition.get_submission(1, addr(5)).unwrap().is_zero());
    assert!(competition.withdraw_submission(addr(5)).is_err());
}

#[test]
fn submitter_pagination_bounds_are_enforced() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 200).unwrap();
    competition.submit_new_predictions(addr(5), hash(40)).unwrap();

    assert!(competition.get_submitters(1, 0, 2).is_err());
    assert!(competition.get_submitters(1, 1, 0).is_err());
    assert_eq!(competition.get_submitters(1, 1, 1).unwrap(), Vec::<Address>::new());
}

#[test]
fn zeroing_stake_with_a_live_submission_is_rejected() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 200).unwrap();
    competition.submit_new_predictions(addr(5), hash(40)).unwrap();

    let err = token.decrease_stake(&competition, addr(5), 200).unwrap_err();
    assert!(matches!(err, CompetitionError::StateInvariant(_)));

    competition.withdraw_submission(addr(5)).unwrap();
    token.decrease_stake(&competition, addr(5), 200).unwrap();
}

#[test]
fn stake_and_submit_is_atomic_in_both_directions() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);

    // rejection leaves both books untouched
    let err = token
        .stake_and_submit(&competition, addr(5), STAKE_THRESHOLD - 1, hash(40))
        .unwrap_err();
    assert!(matches!(err, CompetitionError::ThresholdViolation { .. }));
    assert_eq!(competition.get_stake(addr(5)), 0);
    assert_eq!(token.balance_of(addr(5)), 1_000);

    // stake and first submission in one call
    token
        .stake_and_submit(&competition, addr(5), 300, hash(40))
        .unwrap();
    assert_eq!(competition.get_stake(addr(5)), 300);
    assert_eq!(competition.get_submission(1, addr(5)).unwrap(), hash(40));

    // restake and replace
    token
        .stake_and_submit(&competition, addr(5), 500, hash(41))
        .unwrap();
    assert_eq!(competition.get_stake(addr(5)), 500);
    assert_eq!(competition.get_submission(1, addr(5)).unwrap(), hash(41));

    // zero commitment withdraws, then unwinds the stake entirely
    token
        .stake_and_submit(&competition, addr(5), 0, Hash32::ZERO)
        .unwrap();
    assert_eq!(competition.get_stake(addr(5)), 0);
    assert!(competition.get_submission(1, addr(5)).unwrap().is_zero());
    assert_eq!(token.balance_of(addr(5)), 1_000);
    assert_eq!(competition.get_submission_counter(1).unwrap(), 0);
}

// ============================================================================
// BACKING
// ============================================================================

#[test]
fn backing_defaults_to_self_and_follows_the_rules() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    fund(&token, addr(6), 1_000);
    open_round(&competition, 10);

    assert_eq!(competition.get_backed_participant(addr(5)), addr(5));

    // backing needs threshold stake and a non-zero target
    assert!(competition
        .update_backed_participant(addr(5), addr(6))
        .is_err());
    assert!(competition
        .update_backed_participant(addr(5), Address::ZERO)
        .is_err());

    token.increase_stake(&competition, addr(5), 200).unwrap();
    token.increase_stake(&competition, addr(6), 200).unwrap();
    assert_eq!(competition.get_all_backers(addr(5)), vec![addr(5)]);

    competition.update_backed_participant(addr(5), addr(6)).unwrap();
    assert_eq!(competition.get_backed_participant(addr(5)), addr(6));
    assert!(competition.get_all_backers(addr(5)).is_empty());
    assert_eq!(competition.get_all_backers(addr(6)), vec![addr(6), addr(5)]);

    // re-pointing at the current target is an error, pointing home is not
    assert!(competition
        .update_backed_participant(addr(5), addr(6))
        .is_err());
    competition.update_backed_participant(addr(5), addr(5)).unwrap();
    assert_eq!(competition.get_all_backers(addr(5)), vec![addr(5)]);
}

#[test]
fn a_self_backed_submitter_cannot_back_out() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    fund(&token, addr(6), 1_000);
    fund(&token, addr(7), 1_000);
    open_round(&competition, 10);
    for n in 5..8 {
        token.increase_stake(&competition, addr(n), 200).unwrap();
    }

    competition.submit_new_predictions(addr(5), hash(40)).unwrap();
    let err = competition
        .update_backed_participant(addr(5), addr(6))
        .unwrap_err();
    assert!(matches!(err, CompetitionError::StateInvariant(_)));

    // but an edge already pointing away may be re-targeted while submitted
    competition.update_backed_participant(addr(6), addr(5)).unwrap();
    competition.submit_new_predictions(addr(6), hash(41)).unwrap();
    competition.update_backed_participant(addr(6), addr(7)).unwrap();
}

#[test]
fn backing_changes_are_open_phase_only() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 200).unwrap();
    competition.close_submission(admin()).unwrap();
    assert!(competition
        .update_backed_participant(addr(5), addr(6))
        .is_err());
}

#[test]
fn participant_state_classification() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    fund(&token, addr(6), 1_000);
    open_round(&competition, 10);

    assert_eq!(competition.get_participant_state(addr(5)), ParticipantState::Idle);

    token.increase_stake(&competition, addr(5), 200).unwrap();
    token.increase_stake(&competition, addr(6), 200).unwrap();
    assert_eq!(
        competition.get_participant_state(addr(5)),
        ParticipantState::Staked
    );

    competition.submit_new_predictions(addr(5), hash(40)).unwrap();
    assert_eq!(
        competition.get_participant_state(addr(5)),
        ParticipantState::Submitted
    );

    competition.update_backed_participant(addr(6), addr(5)).unwrap();
    assert_eq!(
        competition.get_participant_state(addr(6)),
        ParticipantState::Backing
    );

    competition.submit_new_predictions(addr(6), hash(41)).unwrap();
    assert_eq!(
        competition.get_participant_state(addr(6)),
        ParticipantState::SubmittedBacking
    );
}

// ============================================================================
// STAKE RECORDING AND HISTORY
// ============================================================================

#[test]
fn recorded_stakes_freeze_while_live_stakes_move_on() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    fund(&token, addr(6), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 300).unwrap();
    token.increase_stake(&competition, addr(6), 200).unwrap();

    // recording is a phase-2 operation
    assert!(competition.record_stakes(admin(), 0, 2).is_err());
    competition.close_submission(admin()).unwrap();

    // chunked, idempotent recording
    competition.record_stakes(admin(), 0, 1).unwrap();
    competition.record_stakes(admin(), 1, 2).unwrap();
    competition.record_stakes(admin(), 0, 2).unwrap();
    assert!(competition.record_stakes(admin(), 0, 3).is_err());

    assert_eq!(competition.get_historical_stakers_counter(1).unwrap(), 2);
    assert_eq!(
        competition.get_historical_stakers_partial(1, 0, 2).unwrap(),
        vec![addr(5), addr(6)]
    );
    assert_eq!(
        competition
            .get_historical_stake_amounts(1, &[addr(5), addr(6), addr(7)])
            .unwrap(),
        vec![300, 200, 0]
    );
    assert_eq!(competition.get_historical_total_staked(1).unwrap(), 500);

    // the snapshot survives later stake changes
    competition.advance_to_phase(admin(), 3).unwrap();
    settle(&competition);
    open_round(&competition, 20);
    token.decrease_stake(&competition, addr(5), 300).unwrap();
    assert_eq!(
        competition.get_historical_stake_amounts(1, &[addr(5)]).unwrap(),
        vec![300]
    );
    assert_eq!(competition.get_historical_total_staked(1).unwrap(), 500);
}

// ============================================================================
// RESULTS, SCORES, AND INFORMATION
// ============================================================================

#[test]
fn results_hash_lifecycle() {
    let (_, competition) = deploy();
    open_round(&competition, 10);
    assert!(competition.submit_results(admin(), hash(60)).is_err());
    to_results(&competition);

    competition.submit_results(admin(), hash(60)).unwrap();
    assert_eq!(competition.get_results_hash(1).unwrap(), hash(60));
    assert!(competition.submit_results(admin(), hash(61)).is_err());
    assert!(competition.update_results(admin(), hash(99), hash(61)).is_err());
    assert!(competition.update_results(admin(), hash(60), hash(60)).is_err());
    competition.update_results(admin(), hash(60), hash(61)).unwrap();
    assert_eq!(competition.get_results_hash(1).unwrap(), hash(61));
}

#[test]
fn private_key_discloses_after_settlement_only() {
    let (_, competition) = deploy();
    open_round(&competition, 10);
    to_results(&competition);
    assert!(competition.update_private_key(admin(), 1, hash(70)).is_err());
    settle(&competition);
    competition.update_private_key(admin(), 1, hash(70)).unwrap();
    assert_eq!(competition.get_private_key_hash(1).unwrap(), hash(70));
}

#[test]
fn scores_and_information_require_phase_three() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 200).unwrap();

    assert!(competition
        .update_challenge_and_tournament_scores(admin(), 1, &[addr(5)], &[7], &[9])
        .is_err());
    assert!(competition
        .update_information_batch(admin(), 1, &[addr(5)], 3, &[42])
        .is_err());

    to_results(&competition);
    competition
        .update_challenge_and_tournament_scores(admin(), 1, &[addr(5)], &[7], &[9])
        .unwrap();
    competition
        .update_information_batch(admin(), 1, &[addr(5)], 3, &[42])
        .unwrap();

    let record = competition.get_reward_record(1, addr(5)).unwrap();
    assert_eq!(record.challenge_score, 7);
    assert_eq!(record.tournament_score, 9);
    assert_eq!(competition.get_information(1, addr(5), 3).unwrap(), 42);
    assert_eq!(competition.get_information(1, addr(5), 4).unwrap(), 0);

    // still writable after settlement, length mismatches rejected
    settle(&competition);
    competition
        .update_information_batch(admin(), 1, &[addr(5)], 3, &[43])
        .unwrap();
    assert!(competition
        .update_information_batch(admin(), 1, &[addr(5), addr(6)], 3, &[1])
        .is_err());
    assert!(competition
        .update_challenge_and_tournament_scores(admin(), 1, &[addr(5)], &[1, 2], &[3])
        .is_err());
}

// ============================================================================
// REWARDS AND BURNS
// ============================================================================

#[test]
fn rewards_move_pool_into_stake() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    fund(&token, addr(9), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 200).unwrap();
    competition.sponsor(addr(9), 600).unwrap();
    to_results(&competition);

    competition
        .pay_rewards(admin(), &[addr(5)], &[100], &[30], &[20])
        .unwrap();
    assert_eq!(competition.get_competition_pool(), 450);
    assert_eq!(competition.get_stake(addr(5)), 350);
    assert_eq!(competition.get_current_total_staked(), 350);
    let record = competition.get_reward_record(1, addr(5)).unwrap();
    assert_eq!(record.staking_reward, 100);
    assert_eq!(record.challenge_reward, 30);
    assert_eq!(record.tournament_reward, 20);
    assert_eq!(record.overall_reward(), 150);
    assert_balance_identity(&token, &competition);

    // overdrawing the pool rejects the whole batch
    let err = competition
        .pay_rewards(admin(), &[addr(5)], &[451], &[0], &[0])
        .unwrap_err();
    assert!(matches!(err, CompetitionError::InsufficientBalance { .. }));
    assert_eq!(competition.get_competition_pool(), 450);

    // so do mismatched batch arrays
    let err = competition
        .pay_rewards(admin(), &[addr(5)], &[1, 2], &[0], &[0])
        .unwrap_err();
    assert!(matches!(err, CompetitionError::Range(_)));
}

#[test]
fn rewards_can_lift_a_newcomer_into_the_staker_set() {
    let (token, competition) = deploy();
    fund(&token, addr(9), 1_000);
    open_round(&competition, 10);
    competition.sponsor(addr(9), 600).unwrap();
    to_results(&competition);

    competition
        .pay_rewards(admin(), &[addr(6)], &[150], &[0], &[0])
        .unwrap();
    assert_eq!(competition.get_stake(addr(6)), 150);
    assert_eq!(competition.get_all_stakers(), vec![addr(6)]);
}

#[test]
fn burns_accumulate_and_validate_batch_first() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    fund(&token, addr(6), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 300).unwrap();
    token.increase_stake(&competition, addr(6), 200).unwrap();
    to_results(&competition);

    competition.burn(admin(), &[addr(5)], &[50]).unwrap();
    competition.burn(admin(), &[addr(5)], &[50]).unwrap();
    assert_eq!(competition.get_stake(addr(5)), 200);
    assert_eq!(competition.get_total_burned_amount(), 100);
    assert_eq!(
        competition.get_reward_record(1, addr(5)).unwrap().burned_amount,
        100
    );

    // one short stake rejects the whole batch
    let err = competition
        .burn(admin(), &[addr(6), addr(5)], &[201, 10])
        .unwrap_err();
    assert!(matches!(err, CompetitionError::InsufficientBalance { .. }));
    assert_eq!(competition.get_stake(addr(6)), 200);
    assert_eq!(competition.get_total_burned_amount(), 100);
    assert_balance_identity(&token, &competition);
}

#[test]
fn burns_follow_the_results_phase() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 300).unwrap();
    assert!(competition.burn(admin(), &[addr(5)], &[50]).is_err());
    assert!(competition
        .pay_rewards(admin(), &[addr(5)], &[1], &[0], &[0])
        .is_err());
}

// ============================================================================
// TREASURY MOVES
// ============================================================================

#[test]
fn sponsorship_is_blocked_during_recording() {
    let (token, competition) = deploy();
    fund(&token, addr(9), 1_000);
    open_round(&competition, 10);
    competition.sponsor(addr(9), 100).unwrap();
    competition.close_submission(admin()).unwrap();
    let err = competition.sponsor(addr(9), 100).unwrap_err();
    assert!(matches!(err, CompetitionError::PhaseViolation { .. }));
    competition.record_stakes(admin(), 0, 0).unwrap();
    competition.advance_to_phase(admin(), 3).unwrap();
    competition.sponsor(addr(9), 100).unwrap();
    assert!(competition.sponsor(addr(9), 0).is_err());
    assert!(competition.sponsor(addr(8), 1).is_err());
    assert_eq!(competition.get_competition_pool(), 200);
}

#[test]
fn plain_transfers_surface_as_remainder_and_can_be_swept() {
    let (token, competition) = deploy();
    open_round(&competition, 10);
    token.transfer(admin(), competition.address(), 75).unwrap();
    assert_eq!(competition.get_remainder().unwrap(), 75);
    assert_balance_identity(&token, &competition);

    // sweeping waits for settlement
    assert!(competition.move_remainder_to_pool(admin()).is_err());
    to_results(&competition);
    settle(&competition);
    competition.move_remainder_to_pool(admin()).unwrap();
    assert_eq!(competition.get_remainder().unwrap(), 0);
    assert_eq!(competition.get_competition_pool(), 75);
    assert!(competition.move_remainder_to_pool(admin()).is_err());
}

#[test]
fn burned_stake_recycles_or_leaves() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 300).unwrap();
    to_results(&competition);
    competition.burn(admin(), &[addr(5)], &[200]).unwrap();
    settle(&competition);

    competition.move_burned_to_pool(admin(), 80).unwrap();
    assert_eq!(competition.get_total_burned_amount(), 120);
    assert_eq!(competition.get_competition_pool(), 80);
    assert!(competition.move_burned_to_pool(admin(), 121).is_err());

    // paying out needs a recipient, which may never be the competition
    assert!(competition.move_burned_out(admin(), 50).is_err());
    assert!(competition
        .update_burn_recipient(admin(), competition.address())
        .is_err());
    competition.update_burn_recipient(admin(), addr(8)).unwrap();
    competition.move_burned_out(admin(), 50).unwrap();
    assert_eq!(competition.get_total_burned_amount(), 70);
    assert_eq!(token.balance_of(addr(8)), 50);
    assert_balance_identity(&token, &competition);
}

// ============================================================================
// ADMIN SURFACE
// ============================================================================

#[test]
fn roles_gate_admin_operations() {
    let (_, competition) = deploy();
    let outsider = addr(20);
    let child = addr(21);

    let err = competition
        .open_challenge(outsider, hash(10), hash(11), 0, 0)
        .unwrap_err();
    assert!(matches!(err, CompetitionError::AccessDenied(_)));

    competition
        .grant_role(admin(), Role::ChildAdmin, child)
        .unwrap();
    // granting an already-held role is a silent no-op
    competition
        .grant_role(admin(), Role::ChildAdmin, child)
        .unwrap();
    assert!(competition.has_role(Role::ChildAdmin, child));
    competition.open_challenge(child, hash(10), hash(11), 0, 0).unwrap();

    // only the main admin manages roles; renouncing is self-only
    assert!(competition.grant_role(child, Role::ChildAdmin, addr(22)).is_err());
    assert!(competition.renounce_role(admin(), Role::ChildAdmin, child).is_err());
    competition.renounce_role(child, Role::ChildAdmin, child).unwrap();
    assert!(!competition.has_role(Role::ChildAdmin, child));
    assert!(competition.close_submission(child).is_err());
}

#[test]
fn thresholds_change_between_rounds_only() {
    let (_, competition) = deploy();
    open_round(&competition, 10);
    assert!(competition.update_stake_threshold(admin(), 50).is_err());
    assert!(competition.update_rewards_threshold(admin(), 50).is_err());
    to_results(&competition);
    settle(&competition);
    competition.update_stake_threshold(admin(), 50).unwrap();
    competition.update_rewards_threshold(admin(), 40).unwrap();
    assert_eq!(competition.get_stake_threshold(), 50);
    assert_eq!(competition.get_rewards_threshold(), 40);
}

#[test]
fn vault_and_message_are_freely_updatable() {
    let (_, competition) = deploy();
    assert!(competition.update_vault(admin(), Address::ZERO).is_err());
    competition.update_vault(admin(), addr(30)).unwrap();
    assert_eq!(competition.get_vault(), addr(30));
    competition
        .update_message(admin(), "round 1 delayed".to_string())
        .unwrap();
    assert_eq!(competition.get_message(), "round 1 delayed");
    assert!(competition.update_message(addr(20), "x".to_string()).is_err());
}

#[test]
fn one_token_short_of_a_million_threshold() {
    let (token, competition) = deploy_with_thresholds(1_000_000, 0);
    fund(&token, addr(5), 2_000_000);
    open_round(&competition, 10);

    let err = token
        .increase_stake(&competition, addr(5), 999_999)
        .unwrap_err();
    assert!(matches!(err, CompetitionError::ThresholdViolation { .. }));
    assert_eq!(competition.get_stake(addr(5)), 0);

    token.increase_stake(&competition, addr(5), 1_000_000).unwrap();
    assert_eq!(competition.get_stake(addr(5)), 1_000_000);
    assert!(competition.submit_new_predictions(addr(5), hash(40)).is_ok());
}

#[test]
fn per_challenge_reward_fields_are_individually_queryable() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    fund(&token, addr(9), 1_000);
    open_round(&competition, 10);
    token.increase_stake(&competition, addr(5), 200).unwrap();
    competition.sponsor(addr(9), 500).unwrap();
    to_results(&competition);

    competition
        .pay_rewards(admin(), &[addr(5)], &[100], &[30], &[20])
        .unwrap();
    competition.burn(admin(), &[addr(5)], &[40]).unwrap();
    competition
        .update_challenge_and_tournament_scores(admin(), 1, &[addr(5)], &[7], &[9])
        .unwrap();

    assert_eq!(competition.get_staking_rewards(1, addr(5)).unwrap(), 100);
    assert_eq!(competition.get_challenge_rewards(1, addr(5)).unwrap(), 30);
    assert_eq!(competition.get_tournament_rewards(1, addr(5)).unwrap(), 20);
    assert_eq!(competition.get_overall_rewards(1, addr(5)).unwrap(), 150);
    assert_eq!(competition.get_burned_amount(1, addr(5)).unwrap(), 40);
    assert_eq!(competition.get_challenge_scores(1, addr(5)).unwrap(), 7);
    assert_eq!(competition.get_tournament_scores(1, addr(5)).unwrap(), 9);
    // untouched participants read all-zero records
    assert_eq!(competition.get_overall_rewards(1, addr(6)).unwrap(), 0);
}

#[test]
fn randomized_staking_keeps_the_aggregate_in_sync() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let (token, competition) = deploy();
    open_round(&competition, 10);
    let mut rng = StdRng::seed_from_u64(7);
    let participants: Vec<Address> = (100..120).map(addr).collect();
    for p in &participants {
        fund(&token, *p, 10_000);
    }

    for _ in 0..200 {
        let p = participants[rng.gen_range(0..participants.len())];
        let current = competition.get_stake(p);
        if rng.gen_bool(0.6) {
            let amount = rng.gen_range(1..500);
            let _ = token.increase_stake(&competition, p, amount);
        } else if current > 0 {
            // unwind fully or partially; illegal moves are rejected whole
            let amount = if rng.gen_bool(0.5) {
                current
            } else {
                rng.gen_range(1..=current)
            };
            let _ = token.decrease_stake(&competition, p, amount);
        }

        let sum: u64 = participants.iter().map(|p| competition.get_stake(*p)).sum();
        assert_eq!(sum, competition.get_current_total_staked());
        assert_balance_identity(&token, &competition);
    }

    // the staker list holds exactly the non-zero stakes
    let staked: Vec<Address> = participants
        .iter()
        .copied()
        .filter(|p| competition.get_stake(*p) > 0)
        .collect();
    let mut listed = competition.get_all_stakers();
    let mut expected = staked;
    listed.sort();
    expected.sort();
    assert_eq!(listed, expected);
}

#[test]
fn failed_withdrawal_restake_leaves_the_submission_in_place() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    open_round(&competition, 10);
    token
        .stake_and_submit(&competition, addr(5), 300, hash(40))
        .unwrap();
    assert_eq!(token.balance_of(addr(5)), 700);

    // withdrawing while raising the stake past the free balance must
    // reject the whole call, submission included
    let err = token
        .stake_and_submit(&competition, addr(5), 2_000, Hash32::ZERO)
        .unwrap_err();
    assert!(matches!(err, CompetitionError::InsufficientBalance { .. }));
    assert_eq!(competition.get_submission(1, addr(5)).unwrap(), hash(40));
    assert_eq!(competition.get_submission_counter(1).unwrap(), 1);
    assert_eq!(competition.get_stake(addr(5)), 300);
    assert_eq!(token.balance_of(addr(5)), 700);
    assert_balance_identity(&token, &competition);

    // an affordable restake through the same path still works
    token
        .stake_and_submit(&competition, addr(5), 1_000, Hash32::ZERO)
        .unwrap();
    assert!(competition.get_submission(1, addr(5)).unwrap().is_zero());
    assert_eq!(competition.get_stake(addr(5)), 1_000);
    assert_eq!(token.balance_of(addr(5)), 0);
}

#[test]
fn backed_submitter_unwinds_one_edge_at_a_time() {
    let (token, competition) = deploy();
    fund(&token, addr(5), 1_000);
    fund(&token, addr(6), 500);
    open_round(&competition, 11);
    token.set_stake(&competition, addr(6), 200).unwrap();
    token.set_stake(&competition, addr(5), 300).unwrap();
    competition.update_backed_participant(addr(5), addr(6)).unwrap();
    competition.submit_new_predictions(addr(5), hash(42)).unwrap();
    assert_eq!(
        competition.get_participant_state(addr(5)),
        ParticipantState::SubmittedBacking
    );

    // the exit runs one edge at a time: submission first, then backing,
    // then the stake itself
    let err = token.set_stake(&competition, addr(5), 0).unwrap_err();
    assert!(matches!(err, CompetitionError::StateInvariant(_)));
    assert_eq!(competition.get_stake(addr(5)), 300);

    competition.withdraw_submission(addr(5)).unwrap();
    assert_eq!(
        competition.get_participant_state(addr(5)),
        ParticipantState::Backing
    );
    let err = token.set_stake(&competition, addr(5), 0).unwrap_err();
    assert!(matches!(err, CompetitionError::StateInvariant(_)));
    assert_eq!(competition.get_stake(addr(5)), 300);

    competition.update_backed_participant(addr(5), addr(5)).unwrap();
    assert_eq!(
        competition.get_participant_state(addr(5)),
        ParticipantState::Staked
    );
    token.set_stake(&competition, addr(5), 0).unwrap();
    assert_eq!(
        competition.get_participant_state(addr(5)),
        ParticipantState::Idle
    );
    assert_eq!(competition.get_backed_participant(addr(5)), addr(5));
    assert_eq!(token.balance_of(addr(5)), 1_000);
    assert_balance_identity(&token, &competition);
}
