/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Arithmetic that turns the configured mining interval and tiny block quota into mining deadlines.
//!
//! A miner's time slot is one mining interval long, and is split evenly between the tiny blocks the
//! miner may produce in it. The `n`-th tiny block (counting from 0) is due `n` tiny-block durations after
//! an anchor timestamp. The anchor is either:
//! 1. The miner's own first actual mining time in the current round (the ordinary case), or
//! 2. The previous round's extra block mining time, for the previous round's extra block producer while
//!    it keeps producing tiny blocks before the current round nominally starts.
//!
//! All results are in milliseconds and may be negative, which callers interpret as "due now".

use crate::types::{
    data_types::{MiningInterval, TinyBlocksNumber, Timestamp},
    round::MinerInRound,
};

/// Pure calculator of tiny block deadlines. Holds no state besides its two parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSlotCalculator {
    mining_interval: MiningInterval,
    tiny_blocks_number: TinyBlocksNumber,
}

impl TimeSlotCalculator {
    pub fn new(mining_interval: MiningInterval, tiny_blocks_number: TinyBlocksNumber) -> Self {
        Self {
            mining_interval,
            tiny_blocks_number,
        }
    }

    /// Time allotted to each tiny block: `mining_interval / tiny_blocks_number`, truncated.
    ///
    /// A quota of zero tiny blocks allots no time at all.
    pub fn tiny_block_duration(&self) -> i64 {
        self.mining_interval
            .millis()
            .checked_div(self.tiny_blocks_number.int() as u64)
            .unwrap_or(0) as i64
    }

    /// Milliseconds from `now` until the next tiny block is due:
    /// `anchor + produced_tiny_blocks * tiny_block_duration - now`.
    pub fn milliseconds_until_next_slot(
        &self,
        anchor: Timestamp,
        produced_tiny_blocks: u32,
        now: Timestamp,
    ) -> i64 {
        let offset = self
            .tiny_block_duration()
            .saturating_mul(produced_tiny_blocks as i64);
        anchor.add_millis(offset) - now
    }

    /// Milliseconds until `miner`'s next tiny block is due, anchored to its first actual mining time in
    /// the current round. `None` if the miner has not produced any block in the round yet.
    pub fn milliseconds_until_next_tiny_block(
        &self,
        miner: &MinerInRound,
        now: Timestamp,
    ) -> Option<i64> {
        miner.first_actual_mining_time().map(|first_actual_mining_time| {
            self.milliseconds_until_next_slot(
                first_actual_mining_time,
                miner.produced_tiny_blocks,
                now,
            )
        })
    }

    /// Milliseconds until the previous round's extra block producer's next tiny block is due, anchored to
    /// `previous_extra_block_timestamp`.
    pub fn milliseconds_until_next_tiny_block_after_extra_block(
        &self,
        previous_extra_block_timestamp: Timestamp,
        produced_tiny_blocks: u32,
        now: Timestamp,
    ) -> i64 {
        self.milliseconds_until_next_slot(previous_extra_block_timestamp, produced_tiny_blocks, now)
    }
}

/// Tests that tiny block durations are truncated, not rounded, and that past-due slots come out negative.
#[test]
fn milliseconds_until_next_slot_truncation_test() {
    use crate::types::data_types::Order;

    let calculator = TimeSlotCalculator::new(MiningInterval::new(4000), TinyBlocksNumber::new(3));
    assert_eq!(calculator.tiny_block_duration(), 1333);

    let anchor = Timestamp::from_millis(10_000);
    assert_eq!(
        calculator.milliseconds_until_next_slot(anchor, 2, Timestamp::from_millis(11_000)),
        1666
    );
    assert_eq!(
        calculator.milliseconds_until_next_slot(anchor, 0, Timestamp::from_millis(10_500)),
        -500
    );

    let mut miner = MinerInRound::new(Order::new(1), anchor);
    assert_eq!(
        calculator.milliseconds_until_next_tiny_block(&miner, Timestamp::from_millis(10_000)),
        None
    );
    miner.actual_mining_times.push(Timestamp::from_millis(10_100));
    miner.produced_tiny_blocks = 1;
    assert_eq!(
        calculator.milliseconds_until_next_tiny_block(&miner, Timestamp::from_millis(10_200)),
        Some(10_100 + 1333 - 10_200)
    );

    let no_tiny_blocks = TimeSlotCalculator::new(MiningInterval::new(4000), TinyBlocksNumber::new(0));
    assert_eq!(no_tiny_blocks.tiny_block_duration(), 0);
}
