//! Mining deadlines for a decided [`Behaviour`].
//!
//! A [`ConsensusCommand`] tells the block-production scheduler when the miner should carry out the
//! behaviour it was assigned:
//!
//! |Behaviour|Expected mining time|
//! |---|---|
//! |`UpdateValue`, `UpdateValueWithoutPreviousInValue`|Start of the miner's own time slot.|
//! |`TinyBlock`, after the miner produced a full block|First actual mining time, plus one tiny block duration per tiny block already produced.|
//! |`TinyBlock`, before the round starts|Previous round's extra block mining time, plus one tiny block duration per tiny block already produced.|
//! |`NextRound`, `NextTerm`|Current round's extra block mining time for its designated extra block producer. Other miners wait one further mining interval per order, so that they only step in when the producers before them fail.|

use crate::{
    round_store::{accessors::public::RoundStoreSnapshot, pluggables::KVGet},
    types::{
        behaviour::Behaviour,
        crypto_primitives::VerifyingKey,
        data_types::{TinyBlocksNumber, Timestamp},
        round::Round,
    },
};

use super::{decider::DecideError, time_slots::TimeSlotCalculator};

/// When to carry out a behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsensusCommand {
    pub behaviour: Behaviour,
    pub expected_mining_time: Timestamp,
    /// `expected_mining_time - now`. Negative if the deadline has already passed, in which case the
    /// behaviour should be carried out immediately.
    pub left_milliseconds: i64,
}

impl ConsensusCommand {
    /// Compute the deadline of `behaviour` for the miner identified by `public_key` in `current_round`.
    ///
    /// Returns `None` for [`Behaviour::Nothing`], and if `public_key` is not a miner of `current_round`.
    pub fn arrange<S: KVGet>(
        round_store: &RoundStoreSnapshot<S>,
        tiny_blocks_number: TinyBlocksNumber,
        behaviour: Behaviour,
        current_round: &Round,
        public_key: &VerifyingKey,
        now: Timestamp,
    ) -> Result<Option<ConsensusCommand>, DecideError> {
        let miner = match current_round.miner(public_key) {
            Some(miner) if behaviour != Behaviour::Nothing => miner,
            _ => return Ok(None),
        };
        let mining_interval = round_store.mining_interval()?;
        let calculator = TimeSlotCalculator::new(mining_interval, tiny_blocks_number);

        let expected_mining_time = match behaviour {
            Behaviour::Nothing => return Ok(None),

            Behaviour::UpdateValueWithoutPreviousInValue | Behaviour::UpdateValue => {
                miner.expected_mining_time
            }

            Behaviour::TinyBlock => {
                let left_milliseconds = if miner.has_out_value() {
                    calculator.milliseconds_until_next_tiny_block(miner, now)
                } else {
                    round_store
                        .previous_round()?
                        .and_then(|previous_round| previous_round.extra_block_mining_time(mining_interval))
                        .map(|previous_extra_block_timestamp| {
                            calculator.milliseconds_until_next_tiny_block_after_extra_block(
                                previous_extra_block_timestamp,
                                miner.produced_tiny_blocks,
                                now,
                            )
                        })
                };
                now.add_millis(left_milliseconds.unwrap_or(0))
            }

            Behaviour::NextRound | Behaviour::NextTerm => {
                let extra_block_mining_time = current_round
                    .extra_block_mining_time(mining_interval)
                    .unwrap_or(miner.expected_mining_time);
                let backoff = if miner.is_extra_block_producer {
                    0
                } else {
                    (miner.order.int() as i64).saturating_mul(mining_interval.millis() as i64)
                };
                extra_block_mining_time.add_millis(backoff)
            }
        };

        Ok(Some(ConsensusCommand {
            behaviour,
            expected_mining_time,
            left_milliseconds: expected_mining_time - now,
        }))
    }
}
