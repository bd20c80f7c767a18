/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A Rust implementation of the decision engine of round-based, delegated proof-of-stake consensus.
//!
//! Miners take turns producing blocks in fixed time slots. One pass through the ordered set of miners
//! is a [round](types::round::Round), and a fixed span of wall-clock time covering many rounds is a
//! term. On every block-production opportunity, a miner asks the engine what to do next: produce its
//! full block, produce a tiny block, end the round, end the term, or nothing. The answer is a
//! [`Behaviour`](types::behaviour::Behaviour).
//!
//! The crate is organized as follows:
//! - [`types`]: plain data types, from round numbers to whole rounds.
//! - [`round_store`]: pluggable, atomic persistence of rounds and chain parameters, plus the only
//!   writer allowed to change them.
//! - [`consensus`]: the decision table, term and time slot arithmetic, and the commands and
//!   transactions that carry out a decision.
//! - [`engine`]: wiring of the above with an [event bus](events) behind a builder-pattern interface.

pub mod config;

pub mod consensus;

pub mod engine;

pub(crate) mod event_bus;

pub mod events;

pub mod logging;

pub mod round_store;

pub mod types;
