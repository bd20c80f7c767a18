/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that exist only to store numbers and bytes, and do not have any major "active" behavior.

use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::{Add, Sub},
};

use borsh::{BorshDeserialize, BorshSerialize};

/// Number of a [round](super::round::Round).
///
/// Round numbers start at 1 for the genesis round and increase by exactly 1 for every subsequent round.
/// The value 0 is never assigned to a round; the round store uses it to mean "no round yet".
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct RoundNumber(u64);

impl RoundNumber {
    /// Create a new `RoundNumber` wrapping `int`.
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    /// Get the `RoundNumber` of the genesis round, which is 1.
    pub const fn genesis() -> Self {
        Self(1)
    }

    /// Get the inner `u64` of this `RoundNumber`.
    pub const fn int(&self) -> u64 {
        self.0
    }

    /// Get the little-endian representation of the inner `u64` value of this `RoundNumber`.
    pub fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Get the number of the round immediately before this one, if there is one.
    pub fn previous(&self) -> Option<RoundNumber> {
        if self.0 >= 2 {
            Some(RoundNumber(self.0 - 1))
        } else {
            None
        }
    }
}

impl Display for RoundNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Add<u64> for RoundNumber {
    type Output = RoundNumber;

    fn add(self, rhs: u64) -> Self::Output {
        RoundNumber(self.0.add(rhs))
    }
}

/// Number of a term.
///
/// A term spans many rounds. Term numbers start at 1; a stored value of 0 means the term has not been
/// recorded.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct TermNumber(u64);

impl TermNumber {
    /// Create a new `TermNumber` wrapping `int`.
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    /// Get the inner `u64` of this `TermNumber`.
    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for TermNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Add<u64> for TermNumber {
    type Output = TermNumber;

    fn add(self, rhs: u64) -> Self::Output {
        TermNumber(self.0.add(rhs))
    }
}

/// 1-based rank of a miner within a round. Defines the miner's time slot.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct Order(u32);

impl Order {
    /// Create a new `Order` wrapping `int`.
    pub const fn new(int: u32) -> Self {
        Self(int)
    }

    /// Get the inner `u32` of this `Order`.
    pub const fn int(&self) -> u32 {
        self.0
    }

    /// Whether this is the first time slot of a round.
    pub const fn is_first(&self) -> bool {
        self.0 == 1
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A point in time, as milliseconds since the Unix Epoch.
///
/// Timestamps are signed so that subtracting one from another yields a signed number of milliseconds.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new `Timestamp` `millis` milliseconds after the Unix Epoch.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Get the number of milliseconds between the Unix Epoch and this `Timestamp`.
    pub const fn millis(&self) -> i64 {
        self.0
    }

    /// Get the `Timestamp` that is `millis` milliseconds after this one, saturating at the bounds of
    /// `i64`.
    pub const fn add_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

/// Signed milliseconds from `rhs` to `self`, saturating at the bounds of `i64`.
impl Sub<Timestamp> for Timestamp {
    type Output = i64;

    fn sub(self, rhs: Timestamp) -> Self::Output {
        self.0.saturating_sub(rhs.0)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Length, in milliseconds, of one miner's time slot in a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct MiningInterval(u64);

impl MiningInterval {
    /// Create a new `MiningInterval` of `millis` milliseconds.
    pub const fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Get the length of this `MiningInterval` in milliseconds.
    pub const fn millis(&self) -> u64 {
        self.0
    }
}

/// Maximum number of tiny blocks a miner may produce in a normal turn.
///
/// The extra block producer of the previous round is allowed twice this many.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct TinyBlocksNumber(u32);

impl TinyBlocksNumber {
    /// Create a new `TinyBlocksNumber` wrapping `int`.
    pub const fn new(int: u32) -> Self {
        Self(int)
    }

    /// Get the inner `u32` of this `TinyBlocksNumber`.
    pub const fn int(&self) -> u32 {
        self.0
    }
}

impl Default for TinyBlocksNumber {
    fn default() -> Self {
        Self(8)
    }
}

/// How long each term lasts.
///
/// Chains that never change term (side chains) use [`Unbounded`](TimeEachTerm::Unbounded). When the
/// value is read from an external source that encodes it as an integer, `i32::MAX` is the sentinel for
/// "unbounded"; see [`from_raw`](Self::from_raw).
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub enum TimeEachTerm {
    /// Each term lasts this many milliseconds.
    Bounded(u64),
    /// Terms never change.
    Unbounded,
}

impl TimeEachTerm {
    /// Integer sentinel used by external encodings for [`Unbounded`](TimeEachTerm::Unbounded).
    pub const UNBOUNDED_SENTINEL: u64 = i32::MAX as u64;

    /// Interpret an integer encoding of the term length, mapping the sentinel to `Unbounded`.
    pub const fn from_raw(millis: u64) -> Self {
        if millis == Self::UNBOUNDED_SENTINEL {
            TimeEachTerm::Unbounded
        } else {
            TimeEachTerm::Bounded(millis)
        }
    }

    /// Whether terms never change.
    pub const fn is_unbounded(&self) -> bool {
        matches!(self, TimeEachTerm::Unbounded)
    }
}

/// 32-byte cryptographic hash.
///
/// Used as a miner's [`out_value`](super::round::MinerInRound::out_value). Its contents are never
/// interpreted by the decision logic; only its presence matters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct CryptoHash([u8; 32]);

impl CryptoHash {
    /// Create a new `CryptoHash` wrapping `bytes`.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Display for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Debug for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Address of an account: the SHA256 hash of its owner's verifying key, or of a contract.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct Address([u8; 32]);

impl Address {
    /// Create a new `Address` wrapping `bytes`.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
