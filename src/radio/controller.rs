//! Link Controller
//!
//! Applies host commands to the link state, the transmit queue and the
//! radio, and picks the status line each command answers with.

use core::mem;

use crate::config::BridgeConfig;
use crate::protocol::{parse_strict, Command, Status};
use crate::radio::queue::TransmitQueue;
use crate::radio::state::RadioLinkState;
use crate::radio::transceiver::{RadioError, Transceiver};
use crate::types::{FileTransfer, LinkMode};

/// What became of one command line
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dispatch<'a> {
    /// Command the line parsed to (lenient fallback if malformed)
    pub command: Command<'a>,
    /// Whether the command took effect
    pub applied: bool,
    /// Status line to send back, if any
    pub status: Option<Status<'a>>,
}

/// Command dispatcher
#[derive(Clone, Copy, Debug)]
pub struct LinkController {
    apply_lenient: bool,
}

impl LinkController {
    /// Create a controller from bridge configuration
    #[must_use]
    pub const fn new(config: &BridgeConfig) -> Self {
        Self {
            apply_lenient: config.apply_lenient_commands,
        }
    }

    /// Parse and apply one command line
    pub async fn handle_line<'a, R: Transceiver>(
        &self,
        line: &'a str,
        state: &mut RadioLinkState,
        queue: &mut TransmitQueue,
        radio: &mut R,
    ) -> Dispatch<'a> {
        let command = match parse_strict(line) {
            Ok(command) => command,
            Err(malformed) if self.apply_lenient => {
                warn!("{} command {}, applying defaults", malformed.fallback.name(), malformed.kind);
                malformed.fallback
            }
            Err(malformed) => {
                warn!("{} command {}, dropped", malformed.fallback.name(), malformed.kind);
                return Dispatch {
                    command: malformed.fallback,
                    applied: false,
                    status: None,
                };
            }
        };

        let status = self.apply(command, state, queue, radio).await;
        Dispatch {
            command,
            applied: !matches!(command, Command::Unrecognized),
            status,
        }
    }

    /// Apply an already parsed command
    pub async fn apply<'a, R: Transceiver>(
        &self,
        command: Command<'a>,
        state: &mut RadioLinkState,
        queue: &mut TransmitQueue,
        radio: &mut R,
    ) -> Option<Status<'a>> {
        match command {
            Command::SetFrequency { mhz } => {
                if let Err(err) = radio.set_frequency(mhz).await {
                    warn!("radio rejected {} MHz (code {})", mhz, err.code());
                }
                *state = mem::take(state).with_frequency(mhz);
                info!("frequency set to {} MHz", mhz);
                Some(Status::FreqSet)
            }
            Command::EnterTransmitMode => {
                *state = mem::take(state).with_mode(LinkMode::Transmit);
                info!("transmit mode");
                Some(Status::TxMode)
            }
            Command::EnterReceiveMode => {
                *state = mem::take(state).with_mode(LinkMode::Receive);
                info!("receive mode");
                Some(Status::RxMode)
            }
            Command::ReceiveReadyAck => Some(Status::RxReady),
            Command::FileAnnounce {
                filename,
                total_chunks,
                total_size,
            } => {
                info!("file {}: {} chunks, {} bytes", filename, total_chunks, total_size);
                *state = mem::take(state).with_announced(FileTransfer::new(
                    filename,
                    total_chunks,
                    total_size,
                ));
                Some(Status::FileStart {
                    filename,
                    total: total_chunks,
                })
            }
            Command::DataChunk { payload } => {
                match queue.enqueue(payload) {
                    Ok(()) => debug!("queued {} bytes ({} pending)", payload.len(), queue.len()),
                    Err(err) => warn!("dropped {} byte payload: {}", payload.len(), err),
                }
                None
            }
            Command::Unrecognized => {
                debug!("ignored unrecognized line");
                None
            }
        }
    }
}
