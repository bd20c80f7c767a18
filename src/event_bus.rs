//! Thread that receives [events](crate::events) from the engine and dispatches them to registered
//! handlers.

use crate::events::*;
use crate::logging::Logger;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::mpsc::TryRecvError;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

pub(crate) type HandlerPtr<T> = Box<dyn Fn(&T) + Send>;

/// How long the event bus waits for an event before checking for a shutdown signal again.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub(crate) struct EventHandlers {
    pub(crate) decide_behaviour_handlers: Vec<HandlerPtr<DecideBehaviourEvent>>,
    pub(crate) add_round_handlers: Vec<HandlerPtr<AddRoundEvent>>,
    pub(crate) update_round_handlers: Vec<HandlerPtr<UpdateRoundEvent>>,
    pub(crate) update_round_number_handlers: Vec<HandlerPtr<UpdateRoundNumberEvent>>,
    pub(crate) update_term_number_handlers: Vec<HandlerPtr<UpdateTermNumberEvent>>,
    pub(crate) set_blockchain_start_timestamp_handlers:
        Vec<HandlerPtr<SetBlockchainStartTimestampEvent>>,
    pub(crate) reject_transition_handlers: Vec<HandlerPtr<RejectTransitionEvent>>,
}

impl EventHandlers {
    /// Collect the user-provided handlers, plus the default [loggers](crate::logging) if `log_events`
    /// is set.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        log_events: bool,
        decide_behaviour_handler: Option<HandlerPtr<DecideBehaviourEvent>>,
        add_round_handler: Option<HandlerPtr<AddRoundEvent>>,
        update_round_handler: Option<HandlerPtr<UpdateRoundEvent>>,
        update_round_number_handler: Option<HandlerPtr<UpdateRoundNumberEvent>>,
        update_term_number_handler: Option<HandlerPtr<UpdateTermNumberEvent>>,
        set_blockchain_start_timestamp_handler: Option<HandlerPtr<SetBlockchainStartTimestampEvent>>,
        reject_transition_handler: Option<HandlerPtr<RejectTransitionEvent>>,
    ) -> EventHandlers {
        fn handlers<T: Logger>(log_events: bool, handler: Option<HandlerPtr<T>>) -> Vec<HandlerPtr<T>> {
            let mut handlers = Vec::new();
            if log_events {
                handlers.push(T::get_logger());
            }
            if let Some(handler) = handler {
                handlers.push(handler);
            }
            handlers
        }

        EventHandlers {
            decide_behaviour_handlers: handlers(log_events, decide_behaviour_handler),
            add_round_handlers: handlers(log_events, add_round_handler),
            update_round_handlers: handlers(log_events, update_round_handler),
            update_round_number_handlers: handlers(log_events, update_round_number_handler),
            update_term_number_handlers: handlers(log_events, update_term_number_handler),
            set_blockchain_start_timestamp_handlers: handlers(
                log_events,
                set_blockchain_start_timestamp_handler,
            ),
            reject_transition_handlers: handlers(log_events, reject_transition_handler),
        }
    }

    /// Whether no handler at all is registered, in which case there is no need to publish events.
    pub(crate) fn is_empty(&self) -> bool {
        self.decide_behaviour_handlers.is_empty()
            && self.add_round_handlers.is_empty()
            && self.update_round_handlers.is_empty()
            && self.update_round_number_handlers.is_empty()
            && self.update_term_number_handlers.is_empty()
            && self.set_blockchain_start_timestamp_handlers.is_empty()
            && self.reject_transition_handlers.is_empty()
    }

    pub(crate) fn fire_handlers(&self, event: Event) {
        match event {
            Event::DecideBehaviour(decide_behaviour_event) => self
                .decide_behaviour_handlers
                .iter()
                .for_each(|handler| handler(&decide_behaviour_event)),

            Event::AddRound(add_round_event) => self
                .add_round_handlers
                .iter()
                .for_each(|handler| handler(&add_round_event)),

            Event::UpdateRound(update_round_event) => self
                .update_round_handlers
                .iter()
                .for_each(|handler| handler(&update_round_event)),

            Event::UpdateRoundNumber(update_round_number_event) => self
                .update_round_number_handlers
                .iter()
                .for_each(|handler| handler(&update_round_number_event)),

            Event::UpdateTermNumber(update_term_number_event) => self
                .update_term_number_handlers
                .iter()
                .for_each(|handler| handler(&update_term_number_event)),

            Event::SetBlockchainStartTimestamp(set_start_timestamp_event) => self
                .set_blockchain_start_timestamp_handlers
                .iter()
                .for_each(|handler| handler(&set_start_timestamp_event)),

            Event::RejectTransition(reject_transition_event) => self
                .reject_transition_handlers
                .iter()
                .for_each(|handler| handler(&reject_transition_event)),
        }
    }
}

/// Start the event bus thread. The thread exits when it receives a shutdown signal, or when either the
/// shutdown sender or every event publisher has been dropped.
///
/// Events that were already published when the shutdown signal arrives are still dispatched.
pub(crate) fn start_event_bus(
    event_handlers: EventHandlers,
    event_subscriber: Receiver<Event>,
    shutdown_signal: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match shutdown_signal.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => {
                while let Ok(event) = event_subscriber.try_recv() {
                    event_handlers.fire_handlers(event)
                }
                return;
            }
            Err(TryRecvError::Empty) => (),
        }

        match event_subscriber.recv_timeout(POLL_INTERVAL) {
            Ok(event) => event_handlers.fire_handlers(event),
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => return,
        }
    })
}
