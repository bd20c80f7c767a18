//! The action a miner should take next.

use std::fmt::{self, Display, Formatter};

use borsh::{BorshDeserialize, BorshSerialize};

/// The single next consensus action a miner should take, as decided by
/// [`BehaviourDecider`](crate::consensus::decider::BehaviourDecider).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub enum Behaviour {
    /// Do not produce anything.
    Nothing,
    /// Produce the miner's first full block in a lineage that has no previous in-value to extend.
    UpdateValueWithoutPreviousInValue,
    /// Produce the miner's full block inside its time slot.
    UpdateValue,
    /// Produce a tiny block.
    TinyBlock,
    /// End the current round.
    NextRound,
    /// End the current term.
    NextTerm,
}

impl Behaviour {
    /// Name of the consensus contract method that a transaction carrying out this behaviour calls.
    /// `Nothing` calls no method.
    pub const fn method_name(&self) -> Option<&'static str> {
        match self {
            Behaviour::Nothing => None,
            Behaviour::UpdateValueWithoutPreviousInValue | Behaviour::UpdateValue => {
                Some("UpdateValue")
            }
            Behaviour::TinyBlock => Some("UpdateTinyBlockInformation"),
            Behaviour::NextRound => Some("NextRound"),
            Behaviour::NextTerm => Some("NextTerm"),
        }
    }
}

impl Display for Behaviour {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
