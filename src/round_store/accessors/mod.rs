//! Handles through which the round store is read and written.
//!
//! - [`internal`]: the single read-and-write handle, [`RoundStoreSingleton`](internal::RoundStoreSingleton).
//! - [`public`]: read-only [`RoundStoreCamera`](public::RoundStoreCamera)s and the snapshots they take.

pub mod internal;

pub mod public;
