//! General purpose, read-only interface for querying the round store.

use crate::types::{
    data_types::{MiningInterval, RoundNumber, TermNumber, TimeEachTerm, Timestamp},
    round::Round,
};

use super::super::pluggables::{KVGet, KVStore};

use super::internal::RoundStoreError;

/// A factory for [`RoundStoreSnapshot`]s.
#[derive(Clone)]
pub struct RoundStoreCamera<K: KVStore>(K);

impl<K: KVStore> RoundStoreCamera<K> {
    pub fn new(kv_store: K) -> Self {
        RoundStoreCamera(kv_store)
    }

    pub fn snapshot(&self) -> RoundStoreSnapshot<K::Snapshot<'_>> {
        RoundStoreSnapshot(self.0.snapshot())
    }
}

/// A read-only view into the round store that is guaranteed to stay unchanged.
///
/// Every consensus decision is taken against a single snapshot, so that all of the reads that go into
/// one decision see the same state.
pub struct RoundStoreSnapshot<S: KVGet>(pub(super) S);

impl<S: KVGet> RoundStoreSnapshot<S> {
    pub(crate) fn new(kv_snapshot: S) -> Self {
        RoundStoreSnapshot(kv_snapshot)
    }

    pub fn round(&self, round_number: RoundNumber) -> Result<Option<Round>, RoundStoreError> {
        Ok(self.0.round(round_number)?)
    }

    pub fn current_round(&self) -> Result<Option<Round>, RoundStoreError> {
        Ok(self.0.current_round()?)
    }

    pub fn previous_round(&self) -> Result<Option<Round>, RoundStoreError> {
        Ok(self.0.previous_round()?)
    }

    pub fn current_round_number(&self) -> Result<RoundNumber, RoundStoreError> {
        Ok(self.0.current_round_number()?)
    }

    pub fn current_term_number(&self) -> Result<TermNumber, RoundStoreError> {
        Ok(self.0.current_term_number()?)
    }

    pub fn blockchain_start_timestamp(&self) -> Result<Option<Timestamp>, RoundStoreError> {
        Ok(self.0.blockchain_start_timestamp()?)
    }

    pub fn mining_interval(&self) -> Result<MiningInterval, RoundStoreError> {
        Ok(self.0.mining_interval()?)
    }

    pub fn time_each_term(&self) -> Result<TimeEachTerm, RoundStoreError> {
        Ok(self.0.time_each_term()?)
    }
}
