//! Deterministic miners, rounds, and round stores shared by the integration tests.

use aedpos_rs::{
    config::Configuration,
    round_store::accessors::internal::RoundStoreSingleton,
    types::{
        crypto_primitives::{SigningKey, VerifyingKey},
        data_types::{
            Address, CryptoHash, MiningInterval, Order, RoundNumber, TermNumber, TimeEachTerm,
            Timestamp,
        },
        round::{MinerInRound, Round},
    },
};
use rand_core::OsRng;

use super::mem_db::MemDB;

pub(crate) const MINING_INTERVAL: MiningInterval = MiningInterval::new(4_000);

/// Nominal start time of the genesis round built by [`genesis_round`].
pub(crate) const GENESIS_START: Timestamp = Timestamp::from_millis(1_700_000_000_000);

pub(crate) const CONTRACT_ADDRESS: Address = Address::new([7u8; 32]);

/// Verifying keys of `n` miners, derived from fixed secret keys so that every run uses the same miners.
pub(crate) fn miners(n: u8) -> Vec<VerifyingKey> {
    (1..=n)
        .map(|i| SigningKey::from_bytes(&[i; 32]).verifying_key())
        .collect()
}

/// A random verifying key that is not one of [`miners`].
pub(crate) fn outsider() -> VerifyingKey {
    SigningKey::generate(&mut OsRng).verifying_key()
}

pub(crate) fn configuration() -> Configuration {
    Configuration::builder()
        .contract_address(CONTRACT_ADDRESS)
        .build()
}

/// Duration of a whole round of `miners_count` miners, including its extra block slot.
pub(crate) fn round_duration(miners_count: usize) -> i64 {
    (miners_count as i64 + 1) * MINING_INTERVAL.millis() as i64
}

/// Build a round in which `miners[i]` has `Order == i + 1` and a time slot starting `i` mining intervals
/// after `start`. The last miner is designated to produce the round's extra block.
pub(crate) fn round(
    round_number: u64,
    term_number: u64,
    miners: &[VerifyingKey],
    start: Timestamp,
) -> Round {
    let mut round = Round::new(RoundNumber::new(round_number), TermNumber::new(term_number));
    for (i, public_key) in miners.iter().enumerate() {
        let mut miner = MinerInRound::new(
            Order::new(i as u32 + 1),
            start.add_millis(i as i64 * MINING_INTERVAL.millis() as i64),
        );
        miner.is_extra_block_producer = i + 1 == miners.len();
        round.put_miner(*public_key, miner);
    }
    round
}

/// The round that follows `previous`, with the same miners, produced by `extra_block_producer`.
pub(crate) fn next_round(previous: &Round, miners: &[VerifyingKey], extra_block_producer: &VerifyingKey) -> Round {
    let start = previous
        .start_time()
        .unwrap()
        .add_millis(round_duration(miners.len()));
    let mut next = round(
        previous.round_number.int() + 1,
        previous.term_number.int(),
        miners,
        start,
    );
    next.extra_block_producer_of_previous_round = Some(*extra_block_producer);
    next
}

/// Round 1 of term 1, starting at [`GENESIS_START`].
pub(crate) fn genesis_round(miners: &[VerifyingKey]) -> Round {
    round(1, 1, miners, GENESIS_START)
}

/// Mark `public_key` as having produced its full block in `round` at `at`.
pub(crate) fn produce(round: &mut Round, public_key: &VerifyingKey, at: Timestamp) {
    let miner = round.miner_mut(public_key).unwrap();
    miner.out_value = Some(CryptoHash::new([miner.order.int() as u8; 32]));
    miner.actual_mining_times.push(at);
}

/// Record `count` tiny blocks for `public_key` in `round`.
pub(crate) fn produce_tiny_blocks(round: &mut Round, public_key: &VerifyingKey, count: u32) {
    round.miner_mut(public_key).unwrap().produced_tiny_blocks = count;
}

/// A fresh `MemDB` whose round store is initialized with `genesis`.
pub(crate) fn initialized_round_store(
    genesis: &Round,
    time_each_term: TimeEachTerm,
) -> (MemDB, RoundStoreSingleton<MemDB>) {
    let kv_store = MemDB::new();
    let mut round_store = RoundStoreSingleton::new(kv_store.clone(), None);
    round_store
        .initialize(genesis, MINING_INTERVAL, time_each_term)
        .unwrap();
    (kv_store, round_store)
}
