/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Decision logic: what a miner should do next, and when.
//!
//! The submodules are layered bottom-up:
//! 1. [`time_slots`]: pure arithmetic over mining intervals and tiny block quotas.
//! 2. [`term`]: predicates over term boundaries.
//! 3. [`decider`]: the behaviour decision table, reading a single
//!    [`RoundStoreSnapshot`](crate::round_store::accessors::public::RoundStoreSnapshot).
//! 4. [`command`] and [`transaction`]: turning a decided behaviour into a deadline and a consensus
//!    contract call.
//!
//! Nothing in this module writes to the round store. Committing the rounds that result from a behaviour is
//! the job of [`RoundStoreSingleton`](crate::round_store::accessors::internal::RoundStoreSingleton).

pub mod command;

pub mod decider;

pub mod term;

pub mod time_slots;

pub mod transaction;
