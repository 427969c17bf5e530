//! RF Bridge Firmware Library
//!
//! Protocol core for a microcontroller that bridges a host serial link to
//! a sub-GHz packet transceiver. The host sends bracketed text commands;
//! the bridge retunes the radio, queues payloads for transmission and
//! forwards validated records it receives.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SCHEDULER                               │
//! │   one command per tick  →  TX dispatch  |  RX poll           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    PROTOCOL LAYER                            │
//! │  Command parser  │  Link controller  │  Status lines         │
//! │  Transmit queue  │  Record codec     │  Chunk validation     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      I/O SEAMS                               │
//! │  Transceiver trait (radio driver)  │  embedded-io-async      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The radio driver and the serial port are supplied by the board
//! crate. Everything here runs on the host as well, which is how the
//! test suite drives it.
//!
//! # Design Principles
//!
//! - **Immutable-by-default**: link state transitions return new instances
//! - **Bounded memory**: every buffer has a fixed capacity
//! - **Single owner**: link state, queue and validator belong to the scheduler
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

/// System configuration and constants
pub mod config;

/// Shared types used across modules
pub mod types;

/// Communication Protocols
///
/// Host command parser and status line formatting.
pub mod protocol;

/// Radio Records
///
/// JSON record codec, checksums and receive-side validation.
pub mod packet;

/// Radio Control Logic
///
/// Link state, transmit queue and command dispatch.
pub mod radio;

/// Serial Link
///
/// Line framing over `embedded-io-async` ports.
pub mod serial;

/// Main loop
pub mod scheduler;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::protocol::{parse, parse_strict, Command, Status};
    pub use crate::radio::transceiver::{RadioError, Transceiver};
    pub use crate::scheduler::{run, Scheduler};
    pub use crate::serial::{ChannelLines, LineSource, SerialLines, StatusWriter};

    // Error handling
    pub use core::result::Result;
}
