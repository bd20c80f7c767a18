//! Definitions of events emitted by the consensus engine, for event handling and logging.
//!
//! Note: an event for a given action indicates that the action has been completed. For the round
//! store, this means the corresponding write batch has already been written.

use std::sync::mpsc::Sender;
use std::time::SystemTime;

use crate::types::{
    behaviour::Behaviour,
    crypto_primitives::VerifyingKey,
    data_types::{RoundNumber, TermNumber, Timestamp},
};

pub enum Event {
    // Events that read state.
    DecideBehaviour(DecideBehaviourEvent),
    // Events that change persistent state.
    AddRound(AddRoundEvent),
    UpdateRound(UpdateRoundEvent),
    UpdateRoundNumber(UpdateRoundNumberEvent),
    UpdateTermNumber(UpdateTermNumberEvent),
    SetBlockchainStartTimestamp(SetBlockchainStartTimestampEvent),
    // Events for transitions that were refused.
    RejectTransition(RejectTransitionEvent),
}

impl Event {
    /// Send the event to `event_publisher`, if there is one.
    ///
    /// A disconnected subscriber is not an error for the publisher: the event is dropped.
    pub(crate) fn publish(self, event_publisher: &Option<Sender<Event>>) {
        if let Some(event_publisher) = event_publisher {
            let _ = event_publisher.send(self);
        }
    }
}

pub struct DecideBehaviourEvent {
    pub timestamp: SystemTime,
    pub miner: VerifyingKey,
    /// `None` if there was no current round to decide on.
    pub round_number: Option<RoundNumber>,
    pub behaviour: Behaviour,
}

pub struct AddRoundEvent {
    pub timestamp: SystemTime,
    pub round_number: RoundNumber,
    pub term_number: TermNumber,
}

pub struct UpdateRoundEvent {
    pub timestamp: SystemTime,
    pub round_number: RoundNumber,
}

pub struct UpdateRoundNumberEvent {
    pub timestamp: SystemTime,
    pub round_number: RoundNumber,
}

pub struct UpdateTermNumberEvent {
    pub timestamp: SystemTime,
    pub term_number: TermNumber,
}

pub struct SetBlockchainStartTimestampEvent {
    pub timestamp: SystemTime,
    pub start_timestamp: Timestamp,
}

/// A round store transition whose precondition did not hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    AddRound,
    UpdateRound,
    UpdateRoundNumber,
    AdvanceTerm,
}

pub struct RejectTransitionEvent {
    pub timestamp: SystemTime,
    pub transition: Transition,
    /// The round number the rejected transition was for.
    pub round_number: RoundNumber,
}
