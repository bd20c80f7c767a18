//! Internal read-and-write handle used by the block-production pipeline to mutate the round store.
//!
//! # Initializing the Round Store
//!
//! All variables in the round store start out empty. Five of them must be set with
//! [`initialize`](RoundStoreSingleton::initialize) before anything else is done with the store:
//!
//! |Variable|Initial value|
//! |---|---|
//! |Rounds|The genesis round, at round number 1.|
//! |Current Round Number|1|
//! |Current Term Number|The term number of the genesis round.|
//! |Mining Interval|Provided to `initialize`.|
//! |Time Each Term|Provided to `initialize`.|
//!
//! The Blockchain Start Timestamp stays unset until round 1 ends (see
//! [`advance_round`](RoundStoreSingleton::advance_round)), because the start time of the genesis round
//! is not trustworthy.
//!
//! # Single writer
//!
//! `RoundStoreSingleton` is the only type in this crate that writes to the round store. Callers must make
//! sure that at most one `RoundStoreSingleton` exists for a given `KVStore` at any moment, and that writes
//! for a chain are serialized. Readers use a [`RoundStoreCamera`](super::public::RoundStoreCamera)
//! instead.

use std::{sync::mpsc::Sender, time::SystemTime};

use borsh::BorshSerialize;

use crate::{
    events::{
        AddRoundEvent, Event, RejectTransitionEvent, SetBlockchainStartTimestampEvent, Transition,
        UpdateRoundEvent, UpdateRoundNumberEvent, UpdateTermNumberEvent,
    },
    types::{
        data_types::{MiningInterval, RoundNumber, TermNumber, TimeEachTerm, Timestamp},
        round::{Round, RoundBytes},
    },
};

use super::super::{
    invariants,
    pluggables::{KVGet, KVGetError, KVStore, Key, WriteBatch},
    variables::{self, concat},
};

use super::public::RoundStoreSnapshot;

/// Read and write handle into the round store that should be owned exclusively by the single writer.
///
/// ## Categories of methods
///
/// 1. [Lifecycle methods](#impl-RoundStoreSingleton<K>).
/// 2. [Top-level state updaters](#impl-RoundStoreSingleton<K>-1).
/// 3. [State getters](#impl-RoundStoreSingleton<K>-2).
pub struct RoundStoreSingleton<K: KVStore> {
    kv_store: K,
    event_publisher: Option<Sender<Event>>,
}

/// Lifecycle methods.
impl<K: KVStore> RoundStoreSingleton<K> {
    /// Create a new instance of `RoundStoreSingleton` on top of `kv_store`. Events describing completed
    /// writes and rejected transitions are sent to `event_publisher`, if provided.
    pub fn new(kv_store: K, event_publisher: Option<Sender<Event>>) -> Self {
        Self {
            kv_store,
            event_publisher,
        }
    }

    /// Initialize the round store variables listed in [initializing the round store](self).
    ///
    /// This function must be called exactly once on a `RoundStoreSingleton` with an empty backing
    /// `kv_store`, before any of the top-level state updaters are called.
    pub fn initialize(
        &mut self,
        genesis_round: &Round,
        mining_interval: MiningInterval,
        time_each_term: TimeEachTerm,
    ) -> Result<(), RoundStoreError> {
        if self.kv_store.current_round_number()?.int() != 0 {
            return Err(RoundStoreError::AlreadyInitialized);
        }
        if genesis_round.round_number != RoundNumber::genesis() {
            return Err(RoundStoreError::NotGenesisRound {
                round_number: genesis_round.round_number,
            });
        }

        let mut wb = RoundStoreWriteBatch::new();
        wb.set_round(genesis_round)?;
        wb.set_current_round_number(genesis_round.round_number)?;
        wb.set_current_term_number(genesis_round.term_number)?;
        wb.set_mining_interval(mining_interval)?;
        wb.set_time_each_term(time_each_term)?;
        self.write(wb);

        Event::AddRound(AddRoundEvent {
            timestamp: SystemTime::now(),
            round_number: genesis_round.round_number,
            term_number: genesis_round.term_number,
        })
        .publish(&self.event_publisher);
        Event::UpdateRoundNumber(UpdateRoundNumberEvent {
            timestamp: SystemTime::now(),
            round_number: genesis_round.round_number,
        })
        .publish(&self.event_publisher);

        Ok(())
    }

    /// Create a `RoundStoreSnapshot`.
    pub fn snapshot(&self) -> RoundStoreSnapshot<K::Snapshot<'_>> {
        RoundStoreSnapshot::new(self.kv_store.snapshot())
    }

    /// Atomically write the changes in `write_batch` into the round store.
    pub fn write(&mut self, write_batch: RoundStoreWriteBatch<K::WriteBatch>) {
        self.kv_store.write(write_batch.0)
    }
}

/// Top-level state updaters.
///
/// Every updater whose name starts with `try_`, as well as the `advance_*` updaters, returns `Ok(false)`
/// and leaves the round store untouched when its precondition does not hold. This is an expected
/// outcome: duplicate commit attempts and out-of-order transitions happen in normal operation. `Err` is
/// only returned when the round store itself cannot be read or written.
impl<K: KVStore> RoundStoreSingleton<K> {
    /// Store `round` as a new record, if no record exists yet for `round.round_number`.
    pub fn try_add_round(&mut self, round: &Round) -> Result<bool, RoundStoreError> {
        if !invariants::safe_add_round(&self.kv_store, round) {
            self.reject(Transition::AddRound, round.round_number);
            return Ok(false);
        }

        let mut wb = RoundStoreWriteBatch::new();
        wb.set_round(round)?;
        self.write(wb);

        Event::AddRound(AddRoundEvent {
            timestamp: SystemTime::now(),
            round_number: round.round_number,
            term_number: round.term_number,
        })
        .publish(&self.event_publisher);

        Ok(true)
    }

    /// Overwrite the record for `round.round_number` with `round`, if such a record already exists.
    pub fn try_update_round(&mut self, round: &Round) -> Result<bool, RoundStoreError> {
        if !invariants::safe_update_round(&self.kv_store, round) {
            self.reject(Transition::UpdateRound, round.round_number);
            return Ok(false);
        }

        let mut wb = RoundStoreWriteBatch::new();
        wb.set_round(round)?;
        self.write(wb);

        Event::UpdateRound(UpdateRoundEvent {
            timestamp: SystemTime::now(),
            round_number: round.round_number,
        })
        .publish(&self.event_publisher);

        Ok(true)
    }

    /// Move the current round number pointer to `round_number`, if it is 1 or exactly one more than the
    /// current round number.
    pub fn try_update_round_number(
        &mut self,
        round_number: RoundNumber,
    ) -> Result<bool, RoundStoreError> {
        let current_round_number = self.kv_store.current_round_number()?;
        if !invariants::safe_round_number(current_round_number, round_number) {
            self.reject(Transition::UpdateRoundNumber, round_number);
            return Ok(false);
        }

        let mut wb = RoundStoreWriteBatch::new();
        wb.set_current_round_number(round_number)?;
        self.write(wb);

        Event::UpdateRoundNumber(UpdateRoundNumberEvent {
            timestamp: SystemTime::now(),
            round_number,
        })
        .publish(&self.event_publisher);

        Ok(true)
    }

    /// Record the blockchain start timestamp. The timestamp is write-once: if it has already been set,
    /// this returns `false` and the stored value is kept.
    pub fn set_blockchain_start_timestamp(
        &mut self,
        start_timestamp: Timestamp,
    ) -> Result<bool, RoundStoreError> {
        if self.kv_store.blockchain_start_timestamp()?.is_some() {
            return Ok(false);
        }

        let mut wb = RoundStoreWriteBatch::new();
        wb.set_blockchain_start_timestamp(start_timestamp)?;
        self.write(wb);
        log::debug!("Set start timestamp to {}", start_timestamp);

        Event::SetBlockchainStartTimestamp(SetBlockchainStartTimestampEvent {
            timestamp: SystemTime::now(),
            start_timestamp,
        })
        .publish(&self.event_publisher);

        Ok(true)
    }

    /// Replace the mining interval. Used when governance changes the length of time slots.
    pub fn set_mining_interval(
        &mut self,
        mining_interval: MiningInterval,
    ) -> Result<(), RoundStoreError> {
        let mut wb = RoundStoreWriteBatch::new();
        wb.set_mining_interval(mining_interval)?;
        self.write(wb);
        Ok(())
    }

    /// Replace the term length. Used when governance changes how long terms last.
    pub fn set_time_each_term(&mut self, time_each_term: TimeEachTerm) -> Result<(), RoundStoreError> {
        let mut wb = RoundStoreWriteBatch::new();
        wb.set_time_each_term(time_each_term)?;
        self.write(wb);
        Ok(())
    }

    /// Atomically add `next_round` and make it the current round.
    ///
    /// ## Preconditions
    ///
    /// 1. No record exists yet for `next_round.round_number`.
    /// 2. `next_round.round_number` is exactly one more than the current round number.
    ///
    /// If either does not hold, nothing is written and `Ok(false)` is returned.
    ///
    /// ## Blockchain start timestamp
    ///
    /// When round 1 ends, the start time of round 2 is recorded as the blockchain start timestamp, unless
    /// one has already been set.
    pub fn advance_round(&mut self, next_round: &Round) -> Result<bool, RoundStoreError> {
        self.advance(next_round, None)
    }

    /// Atomically add `next_round`, make it the current round, and enter the term it belongs to.
    ///
    /// ## Preconditions
    ///
    /// The preconditions of [`advance_round`](Self::advance_round), and additionally,
    /// `next_round.term_number` is exactly one more than the current term number.
    pub fn advance_term(&mut self, next_round: &Round) -> Result<bool, RoundStoreError> {
        let current_term_number = self.kv_store.current_term_number()?;
        if !invariants::safe_next_term(current_term_number, next_round) {
            self.reject(Transition::AdvanceTerm, next_round.round_number);
            return Ok(false);
        }
        self.advance(next_round, Some(next_round.term_number))
    }
}

/// Helper functions called by the top-level state updaters.
impl<K: KVStore> RoundStoreSingleton<K> {
    fn advance(
        &mut self,
        next_round: &Round,
        new_term_number: Option<TermNumber>,
    ) -> Result<bool, RoundStoreError> {
        let current_round_number = self.kv_store.current_round_number()?;
        if !invariants::safe_add_round(&self.kv_store, next_round) {
            self.reject(Transition::AddRound, next_round.round_number);
            return Ok(false);
        }
        // Advancing never uses the genesis exception of `safe_round_number`.
        if next_round.round_number != current_round_number + 1 {
            self.reject(Transition::UpdateRoundNumber, next_round.round_number);
            return Ok(false);
        }

        let mut wb = RoundStoreWriteBatch::new();
        wb.set_round(next_round)?;
        wb.set_current_round_number(next_round.round_number)?;
        if let Some(term_number) = new_term_number {
            wb.set_current_term_number(term_number)?;
        }

        let start_timestamp = if current_round_number == RoundNumber::genesis()
            && self.kv_store.blockchain_start_timestamp()?.is_none()
        {
            next_round.start_time()
        } else {
            None
        };
        if let Some(start_timestamp) = start_timestamp {
            wb.set_blockchain_start_timestamp(start_timestamp)?;
        }

        self.write(wb);

        Event::AddRound(AddRoundEvent {
            timestamp: SystemTime::now(),
            round_number: next_round.round_number,
            term_number: next_round.term_number,
        })
        .publish(&self.event_publisher);
        Event::UpdateRoundNumber(UpdateRoundNumberEvent {
            timestamp: SystemTime::now(),
            round_number: next_round.round_number,
        })
        .publish(&self.event_publisher);
        if let Some(term_number) = new_term_number {
            Event::UpdateTermNumber(UpdateTermNumberEvent {
                timestamp: SystemTime::now(),
                term_number,
            })
            .publish(&self.event_publisher);
        }
        if let Some(start_timestamp) = start_timestamp {
            log::debug!("Set start timestamp to {}", start_timestamp);
            Event::SetBlockchainStartTimestamp(SetBlockchainStartTimestampEvent {
                timestamp: SystemTime::now(),
                start_timestamp,
            })
            .publish(&self.event_publisher);
        }

        Ok(true)
    }

    fn reject(&self, transition: Transition, round_number: RoundNumber) {
        Event::RejectTransition(RejectTransitionEvent {
            timestamp: SystemTime::now(),
            transition,
            round_number,
        })
        .publish(&self.event_publisher);
    }
}

/// State getters.
impl<K: KVStore> RoundStoreSingleton<K> {
    pub fn round(&self, round_number: RoundNumber) -> Result<Option<Round>, RoundStoreError> {
        Ok(self.kv_store.round(round_number)?)
    }

    pub fn current_round(&self) -> Result<Option<Round>, RoundStoreError> {
        Ok(self.kv_store.current_round()?)
    }

    pub fn previous_round(&self) -> Result<Option<Round>, RoundStoreError> {
        Ok(self.kv_store.previous_round()?)
    }

    pub fn current_round_number(&self) -> Result<RoundNumber, RoundStoreError> {
        Ok(self.kv_store.current_round_number()?)
    }

    pub fn current_term_number(&self) -> Result<TermNumber, RoundStoreError> {
        Ok(self.kv_store.current_term_number()?)
    }

    pub fn blockchain_start_timestamp(&self) -> Result<Option<Timestamp>, RoundStoreError> {
        Ok(self.kv_store.blockchain_start_timestamp()?)
    }

    pub fn mining_interval(&self) -> Result<MiningInterval, RoundStoreError> {
        Ok(self.kv_store.mining_interval()?)
    }

    pub fn time_each_term(&self) -> Result<TimeEachTerm, RoundStoreError> {
        Ok(self.kv_store.time_each_term()?)
    }
}

#[derive(Debug)]
pub enum RoundStoreError {
    /// Error when trying to get a value from the round store's underlying [key value store][KVStore].
    KVGetError(KVGetError),

    /// Error when trying to set a value into the round store's underlying key value store.
    KVSetError(KVSetError),

    /// [`initialize`](RoundStoreSingleton::initialize) was called on a round store that already has a
    /// current round.
    AlreadyInitialized,

    /// [`initialize`](RoundStoreSingleton::initialize) was given a round that is not round 1.
    NotGenesisRound { round_number: RoundNumber },
}

impl From<KVGetError> for RoundStoreError {
    fn from(value: KVGetError) -> Self {
        RoundStoreError::KVGetError(value)
    }
}

impl From<KVSetError> for RoundStoreError {
    fn from(value: KVSetError) -> Self {
        RoundStoreError::KVSetError(value)
    }
}

pub struct RoundStoreWriteBatch<W: WriteBatch>(pub(super) W);

impl<W: WriteBatch> RoundStoreWriteBatch<W> {
    pub(crate) fn new() -> RoundStoreWriteBatch<W> {
        RoundStoreWriteBatch(W::new())
    }

    /* ↓↓↓ Rounds ↓↓↓ */

    pub fn set_round(&mut self, round: &Round) -> Result<(), RoundStoreError> {
        self.set_value(
            &concat(&variables::ROUNDS, &round.round_number.to_le_bytes()),
            &RoundBytes::from(round),
            Key::Round {
                round_number: round.round_number,
            },
        )
    }

    /* ↓↓↓ Pointers ↓↓↓ */

    pub fn set_current_round_number(
        &mut self,
        round_number: RoundNumber,
    ) -> Result<(), RoundStoreError> {
        self.set_value(
            &variables::CURRENT_ROUND_NUMBER,
            &round_number,
            Key::CurrentRoundNumber,
        )
    }

    pub fn set_current_term_number(
        &mut self,
        term_number: TermNumber,
    ) -> Result<(), RoundStoreError> {
        self.set_value(
            &variables::CURRENT_TERM_NUMBER,
            &term_number,
            Key::CurrentTermNumber,
        )
    }

    /* ↓↓↓ Chain parameters ↓↓↓ */

    pub fn set_blockchain_start_timestamp(
        &mut self,
        start_timestamp: Timestamp,
    ) -> Result<(), RoundStoreError> {
        self.set_value(
            &variables::BLOCKCHAIN_START_TIMESTAMP,
            &start_timestamp,
            Key::BlockchainStartTimestamp,
        )
    }

    pub fn set_mining_interval(
        &mut self,
        mining_interval: MiningInterval,
    ) -> Result<(), RoundStoreError> {
        self.set_value(
            &variables::MINING_INTERVAL,
            &mining_interval,
            Key::MiningInterval,
        )
    }

    pub fn set_time_each_term(
        &mut self,
        time_each_term: TimeEachTerm,
    ) -> Result<(), RoundStoreError> {
        self.set_value(
            &variables::TIME_EACH_TERM,
            &time_each_term,
            Key::TimeEachTerm,
        )
    }

    fn set_value<T: BorshSerialize>(
        &mut self,
        kv_key: &[u8],
        value: &T,
        key: Key,
    ) -> Result<(), RoundStoreError> {
        let bytes = value
            .try_to_vec()
            .map_err(|err| KVSetError::SerializeValueError { key, source: err })?;
        self.0.set(kv_key, &bytes);
        Ok(())
    }
}

/// Error when trying to serialize a value before setting it into the round store.
#[derive(Debug)]
pub enum KVSetError {
    SerializeValueError { key: Key, source: std::io::Error },
}
