//! Types that are used across multiple components of the consensus engine.
//!
//! Types specific to a single component, such as the decision inputs of the
//! [behaviour decider](crate::consensus::decider), live in that component's module.

pub mod behaviour;

pub mod crypto_primitives;

pub mod data_types;

pub mod round;
