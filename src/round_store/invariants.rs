/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Rules and predicates that help with maintaining the invariant properties of the round store.
//!
//! # Invariants
//!
//! The round store maintains three invariants that every node relies on to reach the same consensus
//! decisions from the same replicated state:
//! 1. **Monotonic round numbers**: the current round number is only ever set to 1 (genesis) or to
//!    exactly one more than its current value. Rounds are never skipped.
//! 2. **Write-once rounds**: a round record is created at most once per round number. Later writes to
//!    the same round number must be updates of an existing record, and creating a record that already
//!    exists is rejected rather than overwriting it.
//! 3. **Monotonic terms**: the current term number only ever increases by exactly one, and only together
//!    with the creation of the first round of the new term.
//!
//! The predicates in this module answer the question "**whether**" a given transition preserves these
//! invariants. They are checked in the preconditions of the top-level updaters of
//! [`RoundStoreSingleton`](super::accessors::internal::RoundStoreSingleton). Violations are not errors:
//! a rejected transition is an expected outcome that callers branch on.

use crate::types::{
    data_types::{RoundNumber, TermNumber},
    round::Round,
};

use super::{
    pluggables::KVGet,
    variables::{self, concat},
};

/// Check whether the current round number may be set to `next` when it is currently `current`.
///
/// # Conditional checks
///
/// `safe_round_number` returns `true` if and only if either:
/// 1. `next` is the genesis round number (1), or
/// 2. `next == current + 1`.
pub fn safe_round_number(current: RoundNumber, next: RoundNumber) -> bool {
    next == RoundNumber::genesis() || next == current + 1
}

/// Check whether `round` may be added as a new record, i.e., no record exists yet for its round number.
pub fn safe_add_round<S: KVGet>(store: &S, round: &Round) -> bool {
    !round_exists(store, round.round_number)
}

/// Check whether `round` may overwrite an existing record, i.e., a record already exists for its round
/// number.
pub fn safe_update_round<S: KVGet>(store: &S, round: &Round) -> bool {
    round_exists(store, round.round_number)
}

/// Check whether `next_round` may open a new term when the chain is currently in `current_term`.
///
/// The first round of a new term must carry exactly the next term number.
pub fn safe_next_term(current_term: TermNumber, next_round: &Round) -> bool {
    next_round.term_number == current_term + 1
}

/// Check whether a record exists for `round_number`, without deserializing it.
fn round_exists<S: KVGet>(store: &S, round_number: RoundNumber) -> bool {
    store
        .get(&concat(&variables::ROUNDS, &round_number.to_le_bytes()))
        .is_some()
}
