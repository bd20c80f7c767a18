//! The persistent consensus round state of a node.
//!
//! # Rounds
//!
//! The round store is a mapping from [round number](crate::types::data_types::RoundNumber) to
//! [`Round`](crate::types::round::Round), plus a handful of single values: the current round number,
//! the current term number, the blockchain start timestamp, and the chain's mining interval and term
//! length. It behaves like a single-writer key-value table keyed by an ever-increasing integer: rounds are
//! only ever added at the next round number, are never deleted, and stop changing once the round after
//! them is created. The rules that keep it this way are implemented in [`invariants`].
//!
//! The documentation for the [`variables`] submodule lists everything stored by the `round_store`
//! module.
//!
//! # Pluggable persistence
//!
//! - The round store is kept in persistent storage, most probably in the host's filesystem.
//! - Library users get to choose how exactly this is done.
//! - This crate merely requires that whatever the user provides as a persistence mechanism implements the
//!   abstract functionality of a key-value store with atomic, batched writes.
//! - This abstract functionality is made concrete by the traits defined in the [`pluggables`] module.
//!
//! # Accessing the Round Store
//!
//! Implementations of the pluggable persistence traits get wrapped inside round store [`accessors`]. These
//! put the round store variables in the right places in the `KVStore`, and make sure that only one handle,
//! the [`RoundStoreSingleton`](accessors::internal::RoundStoreSingleton), can write.

pub mod accessors;

pub mod invariants;

pub mod pluggables;

pub mod variables;
