/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Methods to build, run, and initialize the storage of a consensus engine.
//!
//! The key components of this module are:
//! - The builder-pattern interface to construct a [specification of the engine](EngineSpec) with:
//!   1. `EngineSpec::builder` to construct an `EngineSpecBuilder`,
//!   2. The setters of the `EngineSpecBuilder`, and
//!   3. The `EngineSpecBuilder::build` method to construct an [`EngineSpec`],
//! - The function to [start](EngineSpec::start) an [`Engine`] given its specification,
//! - The function to [initialize](Engine::initialize) the engine's [round store](crate::round_store),
//! - [The type](Engine) which keeps the engine alive.
//!
//! ## Starting an engine
//!
//! ```ignore
//! Engine::initialize(kv_store.clone(), &genesis_round, mining_interval, time_each_term)?;
//!
//! let engine =
//!     EngineSpec::builder()
//!     .kv_store(kv_store)
//!     .configuration(configuration)
//!     .on_decide_behaviour(decide_behaviour_handler)
//!     .build()
//!     .start();
//! ```
//!
//! ### Required setters
//!
//! - `.kv_store(...)`
//! - `.configuration(...)`
//!
//! ### Optional setters
//!
//! The optional setters are for registering user-defined event handlers for events from [crate::events]:
//! - `.on_decide_behaviour(...)`
//! - `.on_add_round(...)`
//! - `.on_update_round(...)`
//! - `.on_update_round_number(...)`
//! - `.on_update_term_number(...)`
//! - `.on_set_blockchain_start_timestamp(...)`
//! - `.on_reject_transition(...)`

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use typed_builder::TypedBuilder;

use crate::config::Configuration;
use crate::consensus::{
    command::ConsensusCommand,
    decider::{BehaviourDecider, DecideError},
    transaction::ConsensusTransaction,
};
use crate::event_bus::*;
use crate::events::*;
use crate::round_store::{
    accessors::{
        internal::{RoundStoreError, RoundStoreSingleton},
        public::RoundStoreCamera,
    },
    pluggables::KVStore,
};
use crate::types::{
    behaviour::Behaviour,
    crypto_primitives::VerifyingKey,
    data_types::{MiningInterval, TimeEachTerm, Timestamp},
    round::Round,
};

/// Stores all necessary parameters and trait implementations required to run an [`Engine`].
#[derive(TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building an [EngineSpec]. On the builder call the following methods to construct a valid [EngineSpec].

    Required:
    - `.kv_store(...)`
    - `.configuration(...)`

    Optional:
    - `.on_decide_behaviour(...)`
    - `.on_add_round(...)`
    - `.on_update_round(...)`
    - `.on_update_round_number(...)`
    - `.on_update_term_number(...)`
    - `.on_set_blockchain_start_timestamp(...)`
    - `.on_reject_transition(...)`
"))]
pub struct EngineSpec<K: KVStore> {
    // Required parameters
    #[builder(setter(doc = "Set the key-value store instance. Required."))]
    kv_store: K,
    #[builder(setter(doc = "Set the engine's configuration. Required."))]
    configuration: Configuration,

    // Optional parameters
    #[builder(default, setter(transform = |handler: impl Fn(&DecideBehaviourEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<DecideBehaviourEvent>),
    doc = "Register a handler closure to be invoked after the engine decides a miner's next behaviour. Optional."))]
    on_decide_behaviour: Option<HandlerPtr<DecideBehaviourEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&AddRoundEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<AddRoundEvent>),
    doc = "Register a handler closure to be invoked after a new round is written into the round store. Optional."))]
    on_add_round: Option<HandlerPtr<AddRoundEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&UpdateRoundEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<UpdateRoundEvent>),
    doc = "Register a handler closure to be invoked after an existing round is overwritten. Optional."))]
    on_update_round: Option<HandlerPtr<UpdateRoundEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&UpdateRoundNumberEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<UpdateRoundNumberEvent>),
    doc = "Register a handler closure to be invoked after the current round number changes. Optional."))]
    on_update_round_number: Option<HandlerPtr<UpdateRoundNumberEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&UpdateTermNumberEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<UpdateTermNumberEvent>),
    doc = "Register a handler closure to be invoked after the current term number changes. Optional."))]
    on_update_term_number: Option<HandlerPtr<UpdateTermNumberEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&SetBlockchainStartTimestampEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<SetBlockchainStartTimestampEvent>),
    doc = "Register a handler closure to be invoked after the blockchain start timestamp is recorded. Optional."))]
    on_set_blockchain_start_timestamp: Option<HandlerPtr<SetBlockchainStartTimestampEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&RejectTransitionEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<RejectTransitionEvent>),
    doc = "Register a handler closure to be invoked after the round store refuses a transition. Optional."))]
    on_reject_transition: Option<HandlerPtr<RejectTransitionEvent>>,
}

impl<K: KVStore> EngineSpec<K> {
    /// Start the event bus (if any handler is registered) and return the handle to the engine.
    pub fn start(self) -> Engine<K> {
        let event_handlers = EventHandlers::new(
            self.configuration.log_events,
            self.on_decide_behaviour,
            self.on_add_round,
            self.on_update_round,
            self.on_update_round_number,
            self.on_update_term_number,
            self.on_set_blockchain_start_timestamp,
            self.on_reject_transition,
        );

        let (event_publisher, event_bus, event_bus_shutdown) = if event_handlers.is_empty() {
            (None, None, None)
        } else {
            let (event_publisher, event_subscriber) = mpsc::channel();
            let (event_bus_shutdown, event_bus_shutdown_receiver) = mpsc::channel();
            let event_bus =
                start_event_bus(event_handlers, event_subscriber, event_bus_shutdown_receiver);
            (
                Some(event_publisher),
                Some(event_bus),
                Some(event_bus_shutdown),
            )
        };

        Engine {
            round_store: RoundStoreSingleton::new(self.kv_store.clone(), event_publisher.clone()),
            round_store_camera: RoundStoreCamera::new(self.kv_store),
            decider: BehaviourDecider::new(&self.configuration, event_publisher),
            configuration: self.configuration,
            event_bus,
            event_bus_shutdown,
        }
    }
}

/// A handle to a running consensus engine. When this value is dropped, the event bus thread is
/// gracefully shut down after dispatching the events that were already published.
pub struct Engine<K: KVStore> {
    round_store: RoundStoreSingleton<K>,
    round_store_camera: RoundStoreCamera<K>,
    decider: BehaviourDecider,
    configuration: Configuration,
    event_bus: Option<JoinHandle<()>>,
    event_bus_shutdown: Option<Sender<()>>,
}

impl<K: KVStore> Engine<K> {
    /// Initialize the [round store](crate::round_store) in `kv_store` with the genesis round and the
    /// replicated chain parameters. Must be called exactly once per chain, before the engine is started.
    pub fn initialize(
        kv_store: K,
        genesis_round: &Round,
        mining_interval: MiningInterval,
        time_each_term: TimeEachTerm,
    ) -> Result<(), RoundStoreError> {
        let mut round_store = RoundStoreSingleton::new(kv_store, None);
        round_store.initialize(genesis_round, mining_interval, time_each_term)
    }

    /// Decide the next behaviour of the miner identified by `public_key` at time `now`, against a fresh
    /// snapshot of the round store.
    pub fn decide(
        &self,
        public_key: &VerifyingKey,
        now: Timestamp,
    ) -> Result<(Behaviour, Option<Round>), DecideError> {
        let snapshot = self.round_store_camera.snapshot();
        self.decider.decide(&snapshot, public_key, now)
    }

    /// Decide the next behaviour of the miner identified by `public_key`, and when to carry it out.
    pub fn consensus_command(
        &self,
        public_key: &VerifyingKey,
        now: Timestamp,
    ) -> Result<Option<ConsensusCommand>, DecideError> {
        let snapshot = self.round_store_camera.snapshot();
        self.decider.consensus_command(&snapshot, public_key, now)
    }

    /// Build the transaction that carries out `behaviour` on `round`. See
    /// [`ConsensusTransaction::generate`].
    pub fn consensus_transaction(
        &self,
        public_key: &VerifyingKey,
        behaviour: Behaviour,
        round: &Round,
    ) -> Result<Option<ConsensusTransaction>, std::io::Error> {
        ConsensusTransaction::generate(&self.configuration, public_key, behaviour, round)
    }

    /// Returns the single writer of the round store, through which committed consensus transactions
    /// apply their rounds.
    pub fn round_store(&mut self) -> &mut RoundStoreSingleton<K> {
        &mut self.round_store
    }

    /// Returns a [`RoundStoreCamera`] which can be used to peek into the round store.
    pub fn round_store_camera(&self) -> &RoundStoreCamera<K> {
        &self.round_store_camera
    }
}

impl<K: KVStore> Drop for Engine<K> {
    fn drop(&mut self) {
        if let Some(shutdown) = self.event_bus_shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(event_bus) = self.event_bus.take() {
            let _ = event_bus.join();
        }
    }
}
