//! Tests for the behaviour decision table, evaluated against a real round store.
//!
//! Every test uses three miners, `a`, `b`, and `c`, with orders 1, 2, and 3 respectively. `c` is the
//! designated extra block producer of every round built by the fixtures.

use aedpos_rs::{
    consensus::decider::{BehaviourDecider, CorruptionKind, DecideError, DecisionInputs},
    round_store::accessors::internal::RoundStoreSingleton,
    types::{
        behaviour::Behaviour,
        crypto_primitives::VerifyingKey,
        data_types::{RoundNumber, TermNumber, TimeEachTerm, TinyBlocksNumber, Timestamp},
        round::Round,
    },
};
use log::LevelFilter;

mod common;

use crate::common::{
    fixtures::{
        configuration, genesis_round, initialized_round_store, miners, next_round, outsider,
        produce, produce_tiny_blocks, GENESIS_START, MINING_INTERVAL,
    },
    logging::setup_logger,
    mem_db::MemDB,
};

const ONE_WEEK: TimeEachTerm = TimeEachTerm::Bounded(7 * 24 * 60 * 60 * 1000);

fn decide(
    round_store: &RoundStoreSingleton<MemDB>,
    public_key: &VerifyingKey,
    now: Timestamp,
) -> Result<(Behaviour, Option<Round>), DecideError> {
    BehaviourDecider::new(&configuration(), None).decide(&round_store.snapshot(), public_key, now)
}

fn behaviour(
    round_store: &RoundStoreSingleton<MemDB>,
    public_key: &VerifyingKey,
    now: Timestamp,
) -> Behaviour {
    decide(round_store, public_key, now).unwrap().0
}

/// Initialize a round store with the genesis round, let `c` end it, and return round 2.
fn round_store_in_round_two(
    time_each_term: TimeEachTerm,
) -> (RoundStoreSingleton<MemDB>, Vec<VerifyingKey>, Round) {
    let miners = miners(3);
    let genesis = genesis_round(&miners);
    let (_, mut round_store) = initialized_round_store(&genesis, time_each_term);
    let round_two = next_round(&genesis, &miners, &miners[2]);
    assert!(round_store.advance_round(&round_two).unwrap());
    (round_store, miners, round_two)
}

/// Overwrite the current round in `round_store` with `round`.
fn update(round_store: &mut RoundStoreSingleton<MemDB>, round: &Round) {
    assert!(round_store.try_update_round(round).unwrap());
}

#[test]
fn nothing_without_current_round_test() {
    setup_logger(LevelFilter::Trace);

    let miners = miners(3);
    let empty_round_store = RoundStoreSingleton::new(MemDB::new(), None);
    assert!(matches!(
        decide(&empty_round_store, &miners[0], GENESIS_START),
        Ok((Behaviour::Nothing, None))
    ));

    let (_, round_store) = initialized_round_store(&genesis_round(&miners), ONE_WEEK);
    assert!(matches!(
        decide(&round_store, &outsider(), GENESIS_START),
        Ok((Behaviour::Nothing, None))
    ));
}

#[test]
fn decide_returns_current_round_test() {
    let miners = miners(3);
    let genesis = genesis_round(&miners);
    let (_, round_store) = initialized_round_store(&genesis, ONE_WEEK);

    let (_, current_round) = decide(&round_store, &miners[0], GENESIS_START).unwrap();
    assert_eq!(current_round, Some(genesis));
}

#[test]
fn first_round_waits_for_first_miner_test() {
    setup_logger(LevelFilter::Trace);

    let miners = miners(3);
    let mut genesis = genesis_round(&miners);
    let (_, mut round_store) = initialized_round_store(&genesis, ONE_WEEK);
    let b_slot = GENESIS_START.add_millis(MINING_INTERVAL.millis() as i64);

    // The first miner has not produced yet, so the others refuse to produce out of order.
    assert_eq!(behaviour(&round_store, &miners[1], b_slot), Behaviour::NextRound);
    assert_eq!(behaviour(&round_store, &miners[2], b_slot), Behaviour::NextRound);

    // The first miner itself starts the lineage.
    assert_eq!(
        behaviour(&round_store, &miners[0], GENESIS_START),
        Behaviour::UpdateValueWithoutPreviousInValue
    );

    produce(&mut genesis, &miners[0], GENESIS_START);
    update(&mut round_store, &genesis);
    assert_eq!(
        behaviour(&round_store, &miners[1], b_slot),
        Behaviour::UpdateValueWithoutPreviousInValue
    );
}

#[test]
fn first_round_never_changes_term_test() {
    let miners = miners(3);
    let mut genesis = genesis_round(&miners);
    let (_, mut round_store) = initialized_round_store(&genesis, TimeEachTerm::Bounded(1));

    produce(&mut genesis, &miners[0], GENESIS_START);
    produce_tiny_blocks(&mut genesis, &miners[0], 8);
    update(&mut round_store, &genesis);

    // No blockchain start timestamp is recorded in round 1, and none is needed.
    let long_after = GENESIS_START.add_millis(1_000_000_000);
    assert_eq!(behaviour(&round_store, &miners[0], long_after), Behaviour::NextRound);
}

#[test]
fn update_value_in_own_time_slot_test() {
    let (round_store, miners, round_two) = round_store_in_round_two(ONE_WEEK);
    let b_slot_start = round_two.miner(&miners[1]).unwrap().expected_mining_time;
    let b_slot_end = b_slot_start.add_millis(MINING_INTERVAL.millis() as i64);

    assert_eq!(behaviour(&round_store, &miners[1], b_slot_start), Behaviour::UpdateValue);
    assert_eq!(behaviour(&round_store, &miners[1], b_slot_end), Behaviour::UpdateValue);
    assert_eq!(
        behaviour(&round_store, &miners[1], b_slot_end.add_millis(1)),
        Behaviour::NextRound
    );
}

#[test]
fn term_just_changed_test() {
    let (mut round_store, miners, round_two) = round_store_in_round_two(ONE_WEEK);

    let mut round_three = next_round(&round_two, &miners, &miners[2]);
    round_three.term_number = TermNumber::new(2);
    assert!(round_store.advance_term(&round_three).unwrap());

    let a_slot = round_three.start_time().unwrap();
    assert_eq!(
        behaviour(&round_store, &miners[0], a_slot),
        Behaviour::UpdateValueWithoutPreviousInValue
    );
}

#[test]
fn grace_window_tiny_blocks_test() {
    let (mut round_store, miners, mut round_two) = round_store_in_round_two(ONE_WEEK);
    let before_start = round_two.start_time().unwrap().add_millis(-1_000);

    // `c` ended round 1 and may keep producing tiny blocks until round 2 starts.
    assert_eq!(behaviour(&round_store, &miners[2], before_start), Behaviour::TinyBlock);
    assert_eq!(behaviour(&round_store, &miners[1], before_start), Behaviour::UpdateValue);

    produce_tiny_blocks(&mut round_two, &miners[2], 7);
    update(&mut round_store, &round_two);
    assert_eq!(behaviour(&round_store, &miners[2], before_start), Behaviour::TinyBlock);

    // Quota used up: back to its ordinary time slot, which has not passed.
    produce_tiny_blocks(&mut round_two, &miners[2], 8);
    update(&mut round_store, &round_two);
    assert_eq!(behaviour(&round_store, &miners[2], before_start), Behaviour::UpdateValue);

    // Once the round has started, the grace window is closed.
    produce_tiny_blocks(&mut round_two, &miners[2], 0);
    update(&mut round_store, &round_two);
    let at_start = round_two.start_time().unwrap();
    assert_eq!(behaviour(&round_store, &miners[2], at_start), Behaviour::UpdateValue);
}

#[test]
fn tiny_block_quota_test() {
    let (mut round_store, miners, mut round_two) = round_store_in_round_two(ONE_WEEK);
    let b_slot = round_two.miner(&miners[1]).unwrap().expected_mining_time;
    produce(&mut round_two, &miners[1], b_slot);

    for produced in 0..8 {
        produce_tiny_blocks(&mut round_two, &miners[1], produced);
        update(&mut round_store, &round_two);
        assert_eq!(behaviour(&round_store, &miners[1], b_slot), Behaviour::TinyBlock);
    }

    produce_tiny_blocks(&mut round_two, &miners[1], 8);
    update(&mut round_store, &round_two);
    assert_eq!(behaviour(&round_store, &miners[1], b_slot), Behaviour::NextRound);
}

#[test]
fn extra_block_producer_double_quota_test() {
    let (mut round_store, miners, mut round_two) = round_store_in_round_two(ONE_WEEK);
    let before_start = round_two.start_time().unwrap().add_millis(-1_000);
    produce(&mut round_two, &miners[2], before_start.add_millis(-500));

    // Exactly at the ordinary quota, the previous extra block producer keeps going.
    produce_tiny_blocks(&mut round_two, &miners[2], 8);
    update(&mut round_store, &round_two);
    assert_eq!(behaviour(&round_store, &miners[2], before_start), Behaviour::TinyBlock);

    produce_tiny_blocks(&mut round_two, &miners[2], 15);
    update(&mut round_store, &round_two);
    assert_eq!(behaviour(&round_store, &miners[2], before_start), Behaviour::TinyBlock);

    produce_tiny_blocks(&mut round_two, &miners[2], 16);
    update(&mut round_store, &round_two);
    assert_eq!(behaviour(&round_store, &miners[2], before_start), Behaviour::NextRound);
}

#[test]
fn unbounded_terms_never_change_term_test() {
    let (mut round_store, miners, mut round_two) =
        round_store_in_round_two(TimeEachTerm::from_raw(TimeEachTerm::UNBOUNDED_SENTINEL));
    let b_slot = round_two.miner(&miners[1]).unwrap().expected_mining_time;
    produce(&mut round_two, &miners[1], b_slot);
    produce_tiny_blocks(&mut round_two, &miners[1], 8);
    update(&mut round_store, &round_two);

    for elapsed in [1, 60_000, 1_000_000_000, 100_000_000_000] {
        let now = b_slot.add_millis(elapsed);
        assert_eq!(behaviour(&round_store, &miners[1], now), Behaviour::NextRound);
        assert_eq!(behaviour(&round_store, &miners[0], now), Behaviour::NextRound);
    }
}

#[test]
fn next_term_after_term_length_test() {
    setup_logger(LevelFilter::Trace);

    let (round_store, miners, round_two) = round_store_in_round_two(TimeEachTerm::Bounded(60_000));
    let blockchain_start_timestamp = round_store.blockchain_start_timestamp().unwrap().unwrap();
    assert_eq!(Some(blockchain_start_timestamp), round_two.start_time());

    // `a` missed its slot in round 2 and has no out value.
    let just_before = blockchain_start_timestamp.add_millis(59_999);
    let boundary = blockchain_start_timestamp.add_millis(60_000);
    assert_eq!(behaviour(&round_store, &miners[0], just_before), Behaviour::NextRound);
    assert_eq!(behaviour(&round_store, &miners[0], boundary), Behaviour::NextTerm);
    assert_eq!(
        behaviour(&round_store, &miners[0], boundary.add_millis(30_000)),
        Behaviour::NextTerm
    );
}

#[test]
fn clock_at_timestamp_bounds_test() {
    let (mut round_store, miners, mut round_two) =
        round_store_in_round_two(TimeEachTerm::Bounded(60_000));
    let b_slot = round_two.miner(&miners[1]).unwrap().expected_mining_time;
    produce(&mut round_two, &miners[1], b_slot);
    produce_tiny_blocks(&mut round_two, &miners[1], 8);
    update(&mut round_store, &round_two);

    // Elapsed time since the blockchain start clamps at zero, so a clock far in the past stays in term 1.
    for now in [i64::MIN, i64::MIN + 1] {
        assert_eq!(
            behaviour(&round_store, &miners[1], Timestamp::from_millis(now)),
            Behaviour::NextRound
        );
    }
    for now in [i64::MAX - 1, i64::MAX] {
        assert_eq!(
            behaviour(&round_store, &miners[1], Timestamp::from_millis(now)),
            Behaviour::NextTerm
        );
    }

    // `c` is still in its grace window at the earliest representable time.
    assert_eq!(
        behaviour(&round_store, &miners[2], Timestamp::from_millis(i64::MIN)),
        Behaviour::TinyBlock
    );
}

#[test]
fn missing_blockchain_start_timestamp_test() {
    let miners = miners(3);
    let genesis = genesis_round(&miners);
    let (_, mut round_store) = initialized_round_store(&genesis, ONE_WEEK);

    // Moving to round 2 through the individual transitions skips recording the start timestamp.
    let round_two = next_round(&genesis, &miners, &miners[2]);
    assert!(round_store.try_add_round(&round_two).unwrap());
    assert!(round_store
        .try_update_round_number(RoundNumber::new(2))
        .unwrap());
    assert_eq!(round_store.blockchain_start_timestamp().unwrap(), None);

    // Decisions that do not reach the fallback are unaffected.
    let b_slot = round_two.miner(&miners[1]).unwrap().expected_mining_time;
    assert_eq!(behaviour(&round_store, &miners[1], b_slot), Behaviour::UpdateValue);

    let missed = b_slot.add_millis(60_000);
    match decide(&round_store, &miners[1], missed) {
        Err(
            err @ DecideError::ConsensusStateCorrupted(
                CorruptionKind::MissingBlockchainStartTimestamp,
            ),
        ) => assert!(err.to_string().starts_with("consensus state corrupted:")),
        other => panic!("expected corrupted consensus state, got {:?}", other),
    }
}

#[test]
fn decision_is_deterministic_test() {
    let (round_store, miners, round_two) = round_store_in_round_two(TimeEachTerm::Bounded(60_000));

    // A second node that applied the same transitions.
    let (other_round_store, _, _) = round_store_in_round_two(TimeEachTerm::Bounded(60_000));

    let start = round_two.start_time().unwrap();
    for offset in (-8_000..120_000).step_by(1_000) {
        let now = start.add_millis(offset);
        for public_key in &miners {
            let first = decide(&round_store, public_key, now).unwrap();
            let again = decide(&round_store, public_key, now).unwrap();
            let other = decide(&other_round_store, public_key, now).unwrap();
            assert_eq!(first, again);
            assert_eq!(first, other);
        }
    }
}

/// Tests every row of the decision table on hand-built inputs.
#[test]
fn decision_table_rows_test() {
    let base = DecisionInputs {
        has_previous_round: true,
        is_term_just_changed: false,
        is_time_slot_passed: false,
        has_out_value: false,
        is_first_miner: false,
        has_first_miner_mined: true,
        is_previous_extra_block_producer: false,
        is_before_round_start: false,
        produced_tiny_blocks: 0,
        tiny_blocks_number: TinyBlocksNumber::new(8),
    };

    // 2a.
    let bootstrapping = DecisionInputs {
        has_previous_round: false,
        has_first_miner_mined: false,
        ..base
    };
    assert_eq!(bootstrapping.production_behaviour(), Some(Behaviour::NextRound));
    assert_eq!(
        DecisionInputs {
            is_first_miner: true,
            ..bootstrapping
        }
        .production_behaviour(),
        Some(Behaviour::UpdateValueWithoutPreviousInValue)
    );

    // 2b.
    assert_eq!(
        DecisionInputs {
            has_previous_round: false,
            ..base
        }
        .production_behaviour(),
        Some(Behaviour::UpdateValueWithoutPreviousInValue)
    );
    assert_eq!(
        DecisionInputs {
            is_term_just_changed: true,
            is_time_slot_passed: true,
            ..base
        }
        .production_behaviour(),
        Some(Behaviour::UpdateValueWithoutPreviousInValue)
    );

    // 2c.
    let grace_window = DecisionInputs {
        is_previous_extra_block_producer: true,
        is_before_round_start: true,
        produced_tiny_blocks: 7,
        ..base
    };
    assert_eq!(grace_window.production_behaviour(), Some(Behaviour::TinyBlock));
    assert_eq!(
        DecisionInputs {
            produced_tiny_blocks: 8,
            ..grace_window
        }
        .production_behaviour(),
        Some(Behaviour::UpdateValue)
    );
    assert_eq!(
        DecisionInputs {
            is_before_round_start: false,
            ..grace_window
        }
        .production_behaviour(),
        Some(Behaviour::UpdateValue)
    );

    // 2d, and falling through.
    assert_eq!(base.production_behaviour(), Some(Behaviour::UpdateValue));
    assert_eq!(
        DecisionInputs {
            is_time_slot_passed: true,
            ..base
        }
        .production_behaviour(),
        None
    );

    // 3a.
    let produced = DecisionInputs {
        has_out_value: true,
        is_time_slot_passed: true,
        ..base
    };
    assert_eq!(produced.production_behaviour(), Some(Behaviour::TinyBlock));
    assert_eq!(
        DecisionInputs {
            produced_tiny_blocks: 8,
            ..produced
        }
        .production_behaviour(),
        None
    );

    // 3b.
    let extra_block_producer = DecisionInputs {
        is_previous_extra_block_producer: true,
        ..produced
    };
    assert_eq!(
        DecisionInputs {
            produced_tiny_blocks: 15,
            ..extra_block_producer
        }
        .production_behaviour(),
        Some(Behaviour::TinyBlock)
    );
    assert_eq!(
        DecisionInputs {
            produced_tiny_blocks: 16,
            ..extra_block_producer
        }
        .production_behaviour(),
        None
    );

    // A zero quota allows no tiny blocks at all.
    assert_eq!(
        DecisionInputs {
            tiny_blocks_number: TinyBlocksNumber::new(0),
            ..extra_block_producer
        }
        .production_behaviour(),
        None
    );
}
