//! Radio Control Logic
//!
//! Link state, command dispatch and the transmit queue. The physical
//! transceiver is reached only through the [`transceiver::Transceiver`]
//! trait.

pub mod controller;
pub mod queue;
pub mod state;
pub mod transceiver;
