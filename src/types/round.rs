/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that store information about consensus rounds and the miners participating in them.

use std::collections::{BTreeMap, HashMap};

use borsh::{BorshDeserialize, BorshSerialize};

use super::{
    crypto_primitives::{SignatureError, VerifyingKey, VerifyingKeyBytes},
    data_types::{CryptoHash, MiningInterval, Order, RoundNumber, TermNumber, Timestamp},
};

/// What a single miner has done, and is expected to do, within one [`Round`].
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MinerInRound {
    /// Rank of the miner in the round. Unique within a round.
    pub order: Order,

    /// Start of the miner's time slot.
    pub expected_mining_time: Timestamp,

    /// `None` until the miner produces its first full block in the round.
    pub out_value: Option<CryptoHash>,

    /// How many tiny blocks the miner has produced in the round.
    pub produced_tiny_blocks: u32,

    /// Times at which the miner actually produced blocks in the round, oldest first.
    pub actual_mining_times: Vec<Timestamp>,

    /// Whether the miner is designated to terminate this round by producing its extra block.
    pub is_extra_block_producer: bool,
}

impl MinerInRound {
    /// Create a `MinerInRound` that has not produced anything yet.
    pub fn new(order: Order, expected_mining_time: Timestamp) -> Self {
        Self {
            order,
            expected_mining_time,
            out_value: None,
            produced_tiny_blocks: 0,
            actual_mining_times: Vec::new(),
            is_extra_block_producer: false,
        }
    }

    /// Whether the miner has produced a full block in the round.
    pub fn has_out_value(&self) -> bool {
        self.out_value.is_some()
    }

    /// Time at which the miner produced its first block in the round, if it has produced any.
    pub fn first_actual_mining_time(&self) -> Option<Timestamp> {
        self.actual_mining_times.first().copied()
    }

    /// Whether the miner's time slot ended strictly before `now`.
    pub fn is_time_slot_passed(&self, now: Timestamp, mining_interval: MiningInterval) -> bool {
        self.expected_mining_time
            .add_millis(mining_interval.millis() as i64)
            < now
    }
}

/// One cycle through the ordered set of miners, each with an assigned time slot.
///
/// ## Lifecycle
///
/// A round is created once, either as the genesis round (number 1) or as the next round written when a
/// miner ends the previous round or term. Miners then update it as they produce blocks, and it becomes
/// immutable once the round after it is created. Only the
/// [`RoundStoreSingleton`](crate::round_store::accessors::internal::RoundStoreSingleton) writes rounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
    pub round_number: RoundNumber,
    pub term_number: TermNumber,
    miners: HashMap<VerifyingKey, MinerInRound>,
    pub extra_block_producer_of_previous_round: Option<VerifyingKey>,
}

impl Round {
    /// Create a round with no miners.
    pub fn new(round_number: RoundNumber, term_number: TermNumber) -> Self {
        Self {
            round_number,
            term_number,
            miners: HashMap::new(),
            extra_block_producer_of_previous_round: None,
        }
    }

    /// Put `miner` into the round, replacing whatever was recorded for `public_key` before.
    pub fn put_miner(&mut self, public_key: VerifyingKey, miner: MinerInRound) {
        self.miners.insert(public_key, miner);
    }

    pub fn miner(&self, public_key: &VerifyingKey) -> Option<&MinerInRound> {
        self.miners.get(public_key)
    }

    pub fn miner_mut(&mut self, public_key: &VerifyingKey) -> Option<&mut MinerInRound> {
        self.miners.get_mut(public_key)
    }

    /// Check whether `public_key` participates in the round.
    pub fn contains(&self, public_key: &VerifyingKey) -> bool {
        self.miners.contains_key(public_key)
    }

    /// A round without miners carries no information and is treated as absent.
    pub fn is_empty(&self) -> bool {
        self.miners.is_empty()
    }

    /// Get the miner with `Order == 1`.
    pub fn first_miner(&self) -> Option<&MinerInRound> {
        self.miners.values().find(|miner| miner.order.is_first())
    }

    /// Nominal start time of the round: the expected mining time of the first miner.
    pub fn start_time(&self) -> Option<Timestamp> {
        self.first_miner().map(|miner| miner.expected_mining_time)
    }

    /// Time at which the extra block that ends the round is due: one mining interval after the last
    /// miner's expected mining time.
    pub fn extra_block_mining_time(&self, mining_interval: MiningInterval) -> Option<Timestamp> {
        self.miners
            .values()
            .max_by_key(|miner| miner.order)
            .map(|last| {
                last.expected_mining_time
                    .add_millis(mining_interval.millis() as i64)
            })
    }

    /// Whether `public_key` produced the extra block that ended the previous round.
    pub fn is_extra_block_producer_of_previous_round(&self, public_key: &VerifyingKey) -> bool {
        self.extra_block_producer_of_previous_round.as_ref() == Some(public_key)
    }
}

/// Intermediate representation of [`Round`] for safe serialization and deserialization.
///
/// To serialize an instance of `Round`, convert it into a `RoundBytes` using `From<&Round>`, then
/// serialize the `RoundBytes` using Borsh. Reverse the steps to deserialize a `Round`.
///
/// ## Rationale
///
/// [`ed25519_dalek::VerifyingKey`] does not implement the Borsh traits, so this type replaces it with
/// `VerifyingKeyBytes`. Instances of this type are not guaranteed to contain valid Ed25519 verifying
/// keys, and therefore conversion into `Round` using `TryFrom` is fallible.
///
/// Miners are kept in a `BTreeMap` so that the encoding of a round is the same on every node.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct RoundBytes {
    round_number: RoundNumber,
    term_number: TermNumber,
    miners: BTreeMap<VerifyingKeyBytes, MinerInRound>,
    extra_block_producer_of_previous_round: Option<VerifyingKeyBytes>,
}

impl From<&Round> for RoundBytes {
    fn from(round: &Round) -> Self {
        RoundBytes {
            round_number: round.round_number,
            term_number: round.term_number,
            miners: round
                .miners
                .iter()
                .map(|(public_key, miner)| (public_key.to_bytes(), miner.clone()))
                .collect(),
            extra_block_producer_of_previous_round: round
                .extra_block_producer_of_previous_round
                .map(|public_key| public_key.to_bytes()),
        }
    }
}

impl TryFrom<RoundBytes> for Round {
    type Error = SignatureError;

    fn try_from(value: RoundBytes) -> Result<Self, Self::Error> {
        let miners = value
            .miners
            .into_iter()
            .map(|(public_key, miner)| Ok((VerifyingKey::from_bytes(&public_key)?, miner)))
            .collect::<Result<HashMap<VerifyingKey, MinerInRound>, SignatureError>>()?;
        let extra_block_producer_of_previous_round = value
            .extra_block_producer_of_previous_round
            .map(|public_key| VerifyingKey::from_bytes(&public_key))
            .transpose()?;

        Ok(Round {
            round_number: value.round_number,
            term_number: value.term_number,
            miners,
            extra_block_producer_of_previous_round,
        })
    }
}
