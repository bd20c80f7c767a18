/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them via the engine's
//! [config](crate::config::Configuration).
//!
//! aedpos_rs logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values are
//! always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following snippet
//! is how a [DecideBehaviour](crate::events::DecideBehaviourEvent) is printed:
//!
//! ```text
//! DecideBehaviour, 1701329264, Id5u7f6, 12, TinyBlock
//! ```
//!
//! In the snippet:
//! - The third value is the first seven characters of the Base64 encoding of the miner's public key.
//! - The fourth value is the number of the round the decision was based on, or `-` if there was no
//!   current round.
//! - The fifth value is the decided behaviour.

use crate::events::*;
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use log;
use std::time::SystemTime;

// Names of each event in PascalCase for printing:
pub const DECIDE_BEHAVIOUR: &str = "DecideBehaviour";

pub const ADD_ROUND: &str = "AddRound";
pub const UPDATE_ROUND: &str = "UpdateRound";
pub const UPDATE_ROUND_NUMBER: &str = "UpdateRoundNumber";
pub const UPDATE_TERM_NUMBER: &str = "UpdateTermNumber";
pub const SET_BLOCKCHAIN_START_TIMESTAMP: &str = "SetBlockchainStartTimestamp";

pub const REJECT_TRANSITION: &str = "RejectTransition";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> Box<dyn Fn(&Self) + Send>;
}

impl Logger for DecideBehaviourEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |decide_behaviour_event: &DecideBehaviourEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                DECIDE_BEHAVIOUR,
                secs_since_unix_epoch(decide_behaviour_event.timestamp),
                first_seven_base64_chars(&decide_behaviour_event.miner.to_bytes()),
                decide_behaviour_event
                    .round_number
                    .map_or(String::from("-"), |round_number| round_number.to_string()),
                decide_behaviour_event.behaviour
            )
        };
        Box::new(logger)
    }
}

impl Logger for AddRoundEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |add_round_event: &AddRoundEvent| {
            log::info!(
                "{}, {}, {}, {}",
                ADD_ROUND,
                secs_since_unix_epoch(add_round_event.timestamp),
                add_round_event.round_number,
                add_round_event.term_number
            )
        };
        Box::new(logger)
    }
}

impl Logger for UpdateRoundEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |update_round_event: &UpdateRoundEvent| {
            log::info!(
                "{}, {}, {}",
                UPDATE_ROUND,
                secs_since_unix_epoch(update_round_event.timestamp),
                update_round_event.round_number
            )
        };
        Box::new(logger)
    }
}

impl Logger for UpdateRoundNumberEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |update_round_number_event: &UpdateRoundNumberEvent| {
            log::info!(
                "{}, {}, {}",
                UPDATE_ROUND_NUMBER,
                secs_since_unix_epoch(update_round_number_event.timestamp),
                update_round_number_event.round_number
            )
        };
        Box::new(logger)
    }
}

impl Logger for UpdateTermNumberEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |update_term_number_event: &UpdateTermNumberEvent| {
            log::info!(
                "{}, {}, {}",
                UPDATE_TERM_NUMBER,
                secs_since_unix_epoch(update_term_number_event.timestamp),
                update_term_number_event.term_number
            )
        };
        Box::new(logger)
    }
}

impl Logger for SetBlockchainStartTimestampEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |set_start_timestamp_event: &SetBlockchainStartTimestampEvent| {
            log::info!(
                "{}, {}, {}",
                SET_BLOCKCHAIN_START_TIMESTAMP,
                secs_since_unix_epoch(set_start_timestamp_event.timestamp),
                set_start_timestamp_event.start_timestamp
            )
        };
        Box::new(logger)
    }
}

impl Logger for RejectTransitionEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |reject_transition_event: &RejectTransitionEvent| {
            log::info!(
                "{}, {}, {:?}, {}",
                REJECT_TRANSITION,
                secs_since_unix_epoch(reject_transition_event.timestamp),
                reject_transition_event.transition,
                reject_transition_event.round_number
            )
        };
        Box::new(logger)
    }
}

// Get a more readable representation of a bytesequence by base64-encoding it and taking the first 7 characters.
fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

// Events stamped before the Unix Epoch are printed as 0.
fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|since| since.as_secs())
        .unwrap_or(0)
}

#[test]
fn first_seven_base64_chars_test() {
    assert_eq!(first_seven_base64_chars(&[0u8; 32]), "AAAAAAA");
    assert_eq!(first_seven_base64_chars(&[0xff]), "/w");
    assert_eq!(first_seven_base64_chars(&[]), "");
}
