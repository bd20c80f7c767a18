/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Byte-prefixes that specify where each round store variable is stored in the user-provided key-value
//! store.
//!
//! # List of State Variables
//!
//! |Variable|Type|Description|
//! |---|---|---|
//! |Rounds|[`RoundNumber`](crate::types::data_types::RoundNumber) -> [`Round`](crate::types::round::Round)|Every round ever written. Rounds are never deleted.|
//! |Current Round Number|[`RoundNumber`](crate::types::data_types::RoundNumber)|The number of the round miners are currently producing into. Unset (read as 0) before genesis.|
//! |Current Term Number|[`TermNumber`](crate::types::data_types::TermNumber)|The term the chain is currently in. Unset (read as 0) before genesis.|
//! |Blockchain Start Timestamp|[`Timestamp`](crate::types::data_types::Timestamp)|The start time of round 2, recorded once when round 1 ends. Never changes after that.|
//! |Mining Interval|[`MiningInterval`](crate::types::data_types::MiningInterval)|Length of each miner's time slot.|
//! |Time Each Term|[`TimeEachTerm`](crate::types::data_types::TimeEachTerm)|How long each term lasts, or `Unbounded` for chains that never change term.|
//!
//! # Persistence of state variables
//!
//! Every variable is stored as a **Borsh-serialized value**. Single values are stored at one-byte,
//! constant keys sharing the variable's name. The "Rounds" mapping is stored in one key per round,
//! formed by concatenating [`ROUNDS`] with the little-endian bytes of the round number. Rounds are
//! serialized in their [`RoundBytes`](crate::types::round::RoundBytes) form.

// State variables
pub const ROUNDS: [u8; 1] = [0];
pub const CURRENT_ROUND_NUMBER: [u8; 1] = [1];
pub const CURRENT_TERM_NUMBER: [u8; 1] = [2];
pub const BLOCKCHAIN_START_TIMESTAMP: [u8; 1] = [3];
pub const MINING_INTERVAL: [u8; 1] = [4];
pub const TIME_EACH_TERM: [u8; 1] = [5];

/// Concatenate two byteslices into one vector.
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut res = Vec::with_capacity(a.len() + b.len());
    res.extend_from_slice(a);
    res.extend_from_slice(b);
    res
}
