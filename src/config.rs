//! Local configuration of a consensus engine instance.
//!
//! Only parameters that may differ between nodes without affecting agreement live here. Parameters that
//! every node must agree on (the mining interval, the term length, and the blockchain start timestamp)
//! are replicated through the [round store](crate::round_store) instead.

use typed_builder::TypedBuilder;

use crate::types::data_types::{Address, TinyBlocksNumber};

/// Stores the parameters that configure an [`Engine`](crate::engine::Engine).
///
/// ## Log Events
///
/// aedpos_rs logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
/// printed onto a terminal or to a file, set up a [logging
/// implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
#[derive(Clone, Debug, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [Configuration]. On the builder call the following methods to construct a valid [Configuration].

    Required:
    - `.contract_address(...)`

    Optional:
    - `.tiny_blocks_number(...)`
    - `.log_events(...)`
"))]
pub struct Configuration {
    #[builder(setter(
        doc = "Set the address of the consensus contract that consensus transactions are sent to. Required."
    ))]
    pub contract_address: Address,
    #[builder(
        default,
        setter(
            doc = "Set how many tiny blocks a miner may produce in its time slot. Optional, defaults to 8."
        )
    )]
    pub tiny_blocks_number: TinyBlocksNumber,
    #[builder(
        default = false,
        setter(doc = "Enable logging of events? Optional, defaults to false.")
    )]
    pub log_events: bool,
}
