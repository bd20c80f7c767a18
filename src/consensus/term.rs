//! Predicates that decide whether the chain has just changed term, or should change term now.
//!
//! # Term boundaries
//!
//! Term boundaries are a closed-form function of two fixed, replicated inputs, the blockchain start
//! timestamp and the term length, so every node computes the same boundaries no matter when or where it
//! evaluates them. With `elapsed = now - blockchain_start_timestamp` (clamped at zero), the term index
//! implied at `now` is `elapsed / time_each_term` (truncated). Term `n` (1-based) covers index `n - 1`,
//! so it is time to change term once the implied index reaches the current term number.
//!
//! For a fixed current term number this predicate is monotonic in `now`: once it holds, it keeps holding
//! until the chain actually enters the next term.

use crate::{
    round_store::{
        accessors::{internal::RoundStoreError, public::RoundStoreSnapshot},
        pluggables::KVGet,
    },
    types::data_types::{TermNumber, TimeEachTerm, Timestamp},
};

/// Reads whether the term just changed from a single round store snapshot.
pub struct TermGate<'a, S: KVGet> {
    round_store: &'a RoundStoreSnapshot<S>,
}

impl<'a, S: KVGet> TermGate<'a, S> {
    pub fn new(round_store: &'a RoundStoreSnapshot<S>) -> Self {
        Self { round_store }
    }

    /// Check whether the previous round belongs to a different term than the one currently recorded.
    ///
    /// Also returns the currently recorded term number. The first value is `false` if there is no previous
    /// round or no recorded term.
    pub fn is_just_changed_term(&self) -> Result<(bool, TermNumber), RoundStoreError> {
        let term_number = self.round_store.current_term_number()?;
        if term_number.int() == 0 {
            return Ok((false, term_number));
        }
        let just_changed = match self.round_store.previous_round()? {
            Some(previous_round) => previous_round.term_number != term_number,
            None => false,
        };
        Ok((just_changed, term_number))
    }
}

/// Index (0-based) of the term that `now` falls into. `None` if terms are unbounded or have zero length.
pub fn term_index(
    blockchain_start_timestamp: Timestamp,
    time_each_term: TimeEachTerm,
    now: Timestamp,
) -> Option<u64> {
    match time_each_term {
        TimeEachTerm::Unbounded => None,
        TimeEachTerm::Bounded(millis) => {
            let elapsed = (now - blockchain_start_timestamp).max(0) as u64;
            elapsed.checked_div(millis)
        }
    }
}

/// Check whether enough time has elapsed since `blockchain_start_timestamp` for the chain to leave
/// `current_term_number`. Never true for chains whose terms are unbounded. See
/// [term boundaries](self#term-boundaries).
pub fn is_time_to_change_term(
    blockchain_start_timestamp: Timestamp,
    current_term_number: TermNumber,
    time_each_term: TimeEachTerm,
    now: Timestamp,
) -> bool {
    term_index(blockchain_start_timestamp, time_each_term, now)
        .is_some_and(|index| index >= current_term_number.int())
}

/// Tests that the term predicate flips exactly at term boundaries and stays true afterwards.
#[test]
fn is_time_to_change_term_monotonic_test() {
    let start = Timestamp::from_millis(1_000_000);
    let time_each_term = TimeEachTerm::Bounded(60_000);
    let term = TermNumber::new(2);

    // Term 2 covers [start + 60s, start + 120s).
    assert!(!is_time_to_change_term(start, term, time_each_term, start));
    assert!(!is_time_to_change_term(
        start,
        term,
        time_each_term,
        start.add_millis(119_999)
    ));

    let mut previous = false;
    for offset in (0..=300_000).step_by(5_000) {
        let now = start.add_millis(offset);
        let changed = is_time_to_change_term(start, term, time_each_term, now);
        assert!(!previous || changed);
        assert_eq!(changed, offset >= 120_000);
        previous = changed;
    }

    assert!(!is_time_to_change_term(
        start,
        term,
        TimeEachTerm::Unbounded,
        start.add_millis(i64::MAX / 2)
    ));
    assert!(!is_time_to_change_term(
        start,
        term,
        TimeEachTerm::Bounded(0),
        start.add_millis(1)
    ));
    // Clock behind the start timestamp.
    assert!(!is_time_to_change_term(
        start,
        TermNumber::new(1),
        time_each_term,
        start.add_millis(-5_000)
    ));
}
