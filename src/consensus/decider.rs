/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The state machine that decides the single next consensus action of a miner.
//!
//! Main type: [`BehaviourDecider`].
//!
//! # Decision table
//!
//! A decision is taken in two stages. First, everything the decision depends on is read from one round
//! store snapshot and condensed into a [`DecisionInputs`]. Then, the inputs are matched against the
//! following table, top to bottom, and the first matching row wins:
//!
//! |#|Has out value|Condition|Behaviour|
//! |---|---|---|---|
//! |2a|no|No previous round, miner is not first, first miner has no out value yet.|`NextRound`|
//! |2b|no|No previous round, or the term just changed.|`UpdateValueWithoutPreviousInValue`|
//! |2c|no|Miner ended the previous round, round has not started yet, tiny blocks below quota.|`TinyBlock`|
//! |2d|no|Miner's time slot has not passed.|`UpdateValue`|
//! |3a|yes|Tiny blocks below quota.|`TinyBlock`|
//! |3b|yes|Miner ended the previous round, tiny blocks below twice the quota.|`TinyBlock`|
//!
//! Row 2a keeps miners from producing out of order while the boot node's first block is still
//! unconfirmed, which would fork the chain.
//!
//! If no row matches, the miner has missed its slot and used up its tiny blocks, and it is asked to end
//! the round or the term instead:
//! 1. Chains with unbounded terms always get `NextRound`.
//! 2. In round 1 the blockchain start timestamp is not trustworthy yet, so `NextRound`.
//! 3. Otherwise, `NextTerm` if the [term gate](super::term) says it is time to change term, else
//!    `NextRound`. The blockchain start timestamp must be set by now; if it is not, the consensus state
//!    is corrupted and the decision fails with [`DecideError::ConsensusStateCorrupted`].
//!
//! # Determinism
//!
//! For a fixed public key, `now`, round store contents, and tiny block quota, [`decide`](BehaviourDecider::decide)
//! always returns the same behaviour. It reads no clocks and writes nothing.

use std::{
    fmt::{self, Display, Formatter},
    sync::mpsc::Sender,
    time::SystemTime,
};

use crate::{
    config::Configuration,
    events::{DecideBehaviourEvent, Event},
    round_store::{
        accessors::{internal::RoundStoreError, public::RoundStoreSnapshot},
        pluggables::KVGet,
    },
    types::{
        behaviour::Behaviour,
        crypto_primitives::VerifyingKey,
        data_types::{RoundNumber, TermNumber, TinyBlocksNumber, Timestamp},
        round::Round,
    },
};

use super::{
    command::ConsensusCommand,
    term::{self, TermGate},
};

/// Decides what a miner should do next, given the round store and the current time.
pub struct BehaviourDecider {
    tiny_blocks_number: TinyBlocksNumber,
    event_publisher: Option<Sender<Event>>,
}

impl BehaviourDecider {
    pub fn new(config: &Configuration, event_publisher: Option<Sender<Event>>) -> Self {
        Self {
            tiny_blocks_number: config.tiny_blocks_number,
            event_publisher,
        }
    }

    /// Decide the next behaviour of the miner identified by `public_key` at time `now`.
    ///
    /// Also returns the current round that the decision was based on, so that callers building the
    /// consensus transaction do not need to read it again.
    ///
    /// Returns `(Behaviour::Nothing, None)` if there is no current round, or if `public_key` is not one of
    /// its miners. This is an ordinary outcome, e.g., for a node that is not a miner yet.
    pub fn decide<S: KVGet>(
        &self,
        round_store: &RoundStoreSnapshot<S>,
        public_key: &VerifyingKey,
        now: Timestamp,
    ) -> Result<(Behaviour, Option<Round>), DecideError> {
        let current_round = match round_store.current_round()? {
            Some(round) if round.contains(public_key) => round,
            _ => {
                self.publish(public_key, None, Behaviour::Nothing);
                return Ok((Behaviour::Nothing, None));
            }
        };

        let (inputs, term_number) =
            self.decision_inputs(round_store, &current_round, public_key, now)?;

        let behaviour = match inputs.production_behaviour() {
            Some(behaviour) => behaviour,
            None => self.end_round_or_term(round_store, &current_round, term_number, now)?,
        };

        self.publish(public_key, Some(current_round.round_number), behaviour);
        Ok((behaviour, Some(current_round)))
    }

    /// Decide the next behaviour of the miner identified by `public_key`, and when to carry it out.
    ///
    /// Returns `None` whenever [`decide`](Self::decide) returns [`Behaviour::Nothing`].
    pub fn consensus_command<S: KVGet>(
        &self,
        round_store: &RoundStoreSnapshot<S>,
        public_key: &VerifyingKey,
        now: Timestamp,
    ) -> Result<Option<ConsensusCommand>, DecideError> {
        match self.decide(round_store, public_key, now)? {
            (behaviour, Some(current_round)) => ConsensusCommand::arrange(
                round_store,
                self.tiny_blocks_number,
                behaviour,
                &current_round,
                public_key,
                now,
            ),
            (_, None) => Ok(None),
        }
    }

    /// Read everything the decision table depends on from `round_store`.
    ///
    /// # Precondition
    ///
    /// `public_key` is a miner of `current_round`.
    fn decision_inputs<S: KVGet>(
        &self,
        round_store: &RoundStoreSnapshot<S>,
        current_round: &Round,
        public_key: &VerifyingKey,
        now: Timestamp,
    ) -> Result<(DecisionInputs, TermNumber), DecideError> {
        let has_previous_round = round_store.previous_round()?.is_some();
        let (is_term_just_changed, term_number) = TermGate::new(round_store).is_just_changed_term()?;
        let mining_interval = round_store.mining_interval()?;

        let miner = current_round
            .miner(public_key)
            .ok_or(DecideError::MinerExpectedButNotFound {
                round_number: current_round.round_number,
            })?;

        // A round without an `Order == 1` miner is treated like one whose first miner has not mined.
        let has_first_miner_mined = current_round
            .first_miner()
            .is_some_and(|first_miner| first_miner.has_out_value());
        let is_before_round_start = current_round
            .start_time()
            .is_some_and(|start_time| now < start_time);

        let inputs = DecisionInputs {
            has_previous_round,
            is_term_just_changed,
            is_time_slot_passed: miner.is_time_slot_passed(now, mining_interval),
            has_out_value: miner.has_out_value(),
            is_first_miner: miner.order.is_first(),
            has_first_miner_mined,
            is_previous_extra_block_producer: current_round
                .is_extra_block_producer_of_previous_round(public_key),
            is_before_round_start,
            produced_tiny_blocks: miner.produced_tiny_blocks,
            tiny_blocks_number: self.tiny_blocks_number,
        };

        Ok((inputs, term_number))
    }

    /// Decide between ending the round and ending the term, for a miner that has nothing left to produce.
    fn end_round_or_term<S: KVGet>(
        &self,
        round_store: &RoundStoreSnapshot<S>,
        current_round: &Round,
        term_number: TermNumber,
        now: Timestamp,
    ) -> Result<Behaviour, DecideError> {
        let time_each_term = round_store.time_each_term()?;
        if time_each_term.is_unbounded() {
            return Ok(Behaviour::NextRound);
        }

        if current_round.round_number == RoundNumber::genesis() {
            return Ok(Behaviour::NextRound);
        }

        let blockchain_start_timestamp = round_store.blockchain_start_timestamp()?.ok_or(
            DecideError::ConsensusStateCorrupted(CorruptionKind::MissingBlockchainStartTimestamp),
        )?;
        log::debug!("Using start timestamp: {}", blockchain_start_timestamp);

        let change_term = term::is_time_to_change_term(
            blockchain_start_timestamp,
            term_number,
            time_each_term,
            now,
        );
        if change_term {
            Ok(Behaviour::NextTerm)
        } else {
            Ok(Behaviour::NextRound)
        }
    }

    fn publish(
        &self,
        public_key: &VerifyingKey,
        round_number: Option<RoundNumber>,
        behaviour: Behaviour,
    ) {
        Event::DecideBehaviour(DecideBehaviourEvent {
            timestamp: SystemTime::now(),
            miner: *public_key,
            round_number,
            behaviour,
        })
        .publish(&self.event_publisher);
    }
}

/// Facts about a miner and the current round, computed once per decision.
///
/// Keeping these in one plain struct makes every row of the [decision table](self#decision-table)
/// testable on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecisionInputs {
    /// A non-empty previous round exists.
    pub has_previous_round: bool,

    /// The previous round belongs to a different term than the one currently recorded.
    pub is_term_just_changed: bool,

    /// The miner's time slot ended before `now`.
    pub is_time_slot_passed: bool,

    /// The miner has produced a full block in the current round.
    pub has_out_value: bool,

    /// The miner has `Order == 1`.
    pub is_first_miner: bool,

    /// The `Order == 1` miner has produced a full block in the current round.
    pub has_first_miner_mined: bool,

    /// The miner produced the extra block that ended the previous round.
    pub is_previous_extra_block_producer: bool,

    /// `now` is before the current round's nominal start time.
    pub is_before_round_start: bool,

    pub produced_tiny_blocks: u32,

    pub tiny_blocks_number: TinyBlocksNumber,
}

impl DecisionInputs {
    /// Match the inputs against rows 2a to 3b of the [decision table](self#decision-table).
    ///
    /// `None` means that no row matched, and the miner should end the round or the term.
    pub fn production_behaviour(&self) -> Option<Behaviour> {
        let quota = self.tiny_blocks_number.int();
        let extra_block_producer_quota = quota.saturating_mul(2);

        match *self {
            // 2a.
            DecisionInputs {
                has_out_value: false,
                has_previous_round: false,
                is_first_miner: false,
                has_first_miner_mined: false,
                ..
            } => Some(Behaviour::NextRound),

            // 2b.
            DecisionInputs {
                has_out_value: false,
                has_previous_round: false,
                ..
            }
            | DecisionInputs {
                has_out_value: false,
                is_term_just_changed: true,
                ..
            } => Some(Behaviour::UpdateValueWithoutPreviousInValue),

            // 2c.
            DecisionInputs {
                has_out_value: false,
                is_previous_extra_block_producer: true,
                is_before_round_start: true,
                produced_tiny_blocks,
                ..
            } if produced_tiny_blocks < quota => Some(Behaviour::TinyBlock),

            // 2d.
            DecisionInputs {
                has_out_value: false,
                is_time_slot_passed: false,
                ..
            } => Some(Behaviour::UpdateValue),

            DecisionInputs {
                has_out_value: false,
                ..
            } => None,

            // 3a.
            DecisionInputs {
                produced_tiny_blocks,
                ..
            } if produced_tiny_blocks < quota => Some(Behaviour::TinyBlock),

            // 3b.
            DecisionInputs {
                is_previous_extra_block_producer: true,
                produced_tiny_blocks,
                ..
            } if produced_tiny_blocks < extra_block_producer_quota => Some(Behaviour::TinyBlock),

            _ => None,
        }
    }
}

/// Enumerates the different ways a decision can fail.
#[derive(Debug)]
pub enum DecideError {
    /// See: [`RoundStoreError`].
    RoundStoreError(RoundStoreError),

    /// The round store is in a state that correct initialization never produces. Block production must
    /// stop for this round rather than guess.
    ConsensusStateCorrupted(CorruptionKind),

    /// The miner disappeared from the current round between two reads of the same snapshot.
    MinerExpectedButNotFound { round_number: RoundNumber },
}

/// What exactly is corrupted in a [`DecideError::ConsensusStateCorrupted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionKind {
    /// A round after the genesis round needs the blockchain start timestamp, but it was never recorded.
    MissingBlockchainStartTimestamp,
}

impl Display for DecideError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DecideError::RoundStoreError(err) => write!(f, "round store error: {:?}", err),
            DecideError::ConsensusStateCorrupted(CorruptionKind::MissingBlockchainStartTimestamp) => {
                write!(
                    f,
                    "consensus state corrupted: blockchain start timestamp is missing"
                )
            }
            DecideError::MinerExpectedButNotFound { round_number } => {
                write!(f, "miner expected but not found in round {}", round_number)
            }
        }
    }
}

impl From<RoundStoreError> for DecideError {
    fn from(value: RoundStoreError) -> Self {
        DecideError::RoundStoreError(value)
    }
}
