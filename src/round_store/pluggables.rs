//! Traits for pluggable round store persistence.

use std::fmt::Display;

use borsh::BorshDeserialize;

use crate::types::{
    crypto_primitives::SignatureError,
    data_types::{MiningInterval, RoundNumber, TermNumber, TimeEachTerm, Timestamp},
    round::{Round, RoundBytes},
};

use super::variables::{self, concat};

pub trait KVStore: KVGet + Clone + Send + 'static {
    type WriteBatch: WriteBatch;
    type Snapshot<'a>: 'a + KVGet;

    fn write(&mut self, wb: Self::WriteBatch);
    fn snapshot<'b>(&'b self) -> Self::Snapshot<'_>;
}

pub trait KVGet {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /* ↓↓↓ Rounds ↓↓↓ */

    fn round(&self, round_number: RoundNumber) -> Result<Option<Round>, KVGetError> {
        let key = concat(&variables::ROUNDS, &round_number.to_le_bytes());
        match self.get(&key) {
            None => Ok(None),
            Some(bytes) => {
                let round_bytes = RoundBytes::deserialize(&mut bytes.as_slice()).map_err(|err| {
                    KVGetError::DeserializeValueError {
                        key: Key::Round { round_number },
                        source: err,
                    }
                })?;
                Ok(Some(Round::try_from(round_bytes).map_err(|err| {
                    KVGetError::Ed25519DalekError {
                        key: Key::Round { round_number },
                        source: err,
                    }
                })?))
            }
        }
    }

    /// Get the round that the current round number points to.
    ///
    /// Returns `None` before genesis, or if the pointer has been moved to a round that was never written.
    fn current_round(&self) -> Result<Option<Round>, KVGetError> {
        let round_number = self.current_round_number()?;
        if round_number.int() == 0 {
            return Ok(None);
        }
        self.round(round_number)
    }

    /// Get the round immediately before the current round.
    ///
    /// Returns `None` in the genesis round, or if the previous round is missing or has no miners.
    fn previous_round(&self) -> Result<Option<Round>, KVGetError> {
        match self.current_round_number()?.previous() {
            None => Ok(None),
            Some(round_number) => Ok(self.round(round_number)?.filter(|round| !round.is_empty())),
        }
    }

    /* ↓↓↓ Current Round Number ↓↓↓ */

    /// Returns `RoundNumber::new(0)` if no round has been started yet.
    fn current_round_number(&self) -> Result<RoundNumber, KVGetError> {
        Ok(self
            .optional_value(&variables::CURRENT_ROUND_NUMBER, Key::CurrentRoundNumber)?
            .unwrap_or(RoundNumber::new(0)))
    }

    /* ↓↓↓ Current Term Number ↓↓↓ */

    /// Returns `TermNumber::new(0)` if no term has been recorded yet.
    fn current_term_number(&self) -> Result<TermNumber, KVGetError> {
        Ok(self
            .optional_value(&variables::CURRENT_TERM_NUMBER, Key::CurrentTermNumber)?
            .unwrap_or(TermNumber::new(0)))
    }

    /* ↓↓↓ Blockchain Start Timestamp ↓↓↓ */

    fn blockchain_start_timestamp(&self) -> Result<Option<Timestamp>, KVGetError> {
        self.optional_value(
            &variables::BLOCKCHAIN_START_TIMESTAMP,
            Key::BlockchainStartTimestamp,
        )
    }

    /* ↓↓↓ Mining Interval ↓↓↓ */

    fn mining_interval(&self) -> Result<MiningInterval, KVGetError> {
        self.optional_value(&variables::MINING_INTERVAL, Key::MiningInterval)?
            .ok_or(KVGetError::ValueExpectedButNotFound {
                key: Key::MiningInterval,
            })
    }

    /* ↓↓↓ Time Each Term ↓↓↓ */

    fn time_each_term(&self) -> Result<TimeEachTerm, KVGetError> {
        self.optional_value(&variables::TIME_EACH_TERM, Key::TimeEachTerm)?
            .ok_or(KVGetError::ValueExpectedButNotFound {
                key: Key::TimeEachTerm,
            })
    }

    /// Get and deserialize the single value stored at `kv_key`, if any. `key` names the variable in errors.
    fn optional_value<T: BorshDeserialize>(
        &self,
        kv_key: &[u8],
        key: Key,
    ) -> Result<Option<T>, KVGetError> {
        match self.get(kv_key) {
            None => Ok(None),
            Some(bytes) => Ok(Some(
                T::deserialize(&mut bytes.as_slice())
                    .map_err(|err| KVGetError::DeserializeValueError { key, source: err })?,
            )),
        }
    }
}

/// Error when trying to read a value corresponding to a given key from the [key value store][KVStore].
/// The error may arise in the following circumstances:
/// 1. The value corresponding to a given key cannot be deserialized into its expected type,
/// 2. The value corresponding to a given key cannot be found,
/// 3. A stored miner key is not a valid Ed25519 verifying key.
#[derive(Debug)]
pub enum KVGetError {
    DeserializeValueError {
        key: Key,
        source: std::io::Error,
    },
    ValueExpectedButNotFound {
        key: Key,
    },
    Ed25519DalekError {
        key: Key,
        source: SignatureError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Round { round_number: RoundNumber },
    CurrentRoundNumber,
    CurrentTermNumber,
    BlockchainStartTimestamp,
    MiningInterval,
    TimeEachTerm,
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Round { round_number } => write!(f, "Round {}", round_number),
            Key::CurrentRoundNumber => write!(f, "Current Round Number"),
            Key::CurrentTermNumber => write!(f, "Current Term Number"),
            Key::BlockchainStartTimestamp => write!(f, "Blockchain Start Timestamp"),
            Key::MiningInterval => write!(f, "Mining Interval"),
            Key::TimeEachTerm => write!(f, "Time Each Term"),
        }
    }
}

/// Writes that [`KVStore::write`] applies atomically. The round store only ever sets keys.
pub trait WriteBatch {
    fn new() -> Self;
    fn set(&mut self, key: &[u8], value: &[u8]);
}
