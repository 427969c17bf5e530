//! Bridge Scheduler
//!
//! Single-task cooperative loop. Each tick:
//!
//! 1. takes at most one command line from the host and applies it
//! 2. in transmit mode, tries to send the head of the transmit queue;
//!    in receive mode, waits for one record and validates it
//!
//! Link state, queue and reassembler are owned here and touched only
//! from this task, so no locking is involved. When serial input runs in
//! another task, lines cross over through a channel
//! ([`crate::serial::ChannelLines`]).

use core::fmt;

use embedded_io_async::Write;

use crate::config::{BridgeConfig, MAX_RECORD_LEN};
use crate::packet::reassembler::{Reassembler, RejectReason};
use crate::protocol::Status;
use crate::radio::controller::LinkController;
use crate::radio::queue::{TransmitOutcome, TransmitQueue};
use crate::radio::state::RadioLinkState;
use crate::radio::transceiver::{RadioError, Transceiver};
use crate::serial::{LineSource, StatusWriter};
use crate::types::LinkMode;

/// Diagnostic sent when a validated record does not re-encode
const ENCODE_OVERFLOW: &str = "EncodeOverflow";

/// Radio failed to start, or its error could not be reported
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartError<E> {
    /// `begin` failed with this driver code
    RadioInit {
        /// Driver status code
        code: i16,
    },
    /// Writing the init error line failed
    Output(E),
}

impl<E> fmt::Display for StartError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RadioInit { code } => write!(f, "radio init failed (code {code})"),
            Self::Output(_) => f.write_str("serial write failed during startup"),
        }
    }
}

#[cfg(feature = "embedded")]
impl<E> defmt::Format for StartError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::RadioInit { code } => defmt::write!(f, "radio init failed (code {})", code),
            Self::Output(_) => defmt::write!(f, "serial write failed during startup"),
        }
    }
}

/// Serial failure during a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickError<I, O> {
    /// Reading a command line failed
    Input(I),
    /// Writing a status line failed
    Output(O),
}

impl<I, O> fmt::Display for TickError<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(_) => f.write_str("serial read failed"),
            Self::Output(_) => f.write_str("serial write failed"),
        }
    }
}

#[cfg(feature = "embedded")]
impl<I, O> defmt::Format for TickError<I, O> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Input(_) => defmt::write!(f, "serial read failed"),
            Self::Output(_) => defmt::write!(f, "serial write failed"),
        }
    }
}

/// Result of one receive attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// No packet before the driver timed out
    Idle,
    /// Driver reported an error other than a timeout
    RadioError(i16),
    /// Record validated and forwarded to the host
    Forwarded,
    /// Record validated but its JSON outgrew the forward buffer
    ForwardOverflow,
    /// Record dropped
    Rejected(RejectReason),
}

/// Radio work done in a tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Transmit mode dispatch
    Transmit(TransmitOutcome),
    /// Receive mode poll
    Receive(ReceiveOutcome),
}

/// Summary of one tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// Name of the command handled, if a line was read
    pub command: Option<&'static str>,
    /// Whether that command took effect
    pub applied: bool,
    /// Radio step taken
    pub step: Step,
}

/// Bridge main loop state
pub struct Scheduler<R, L, W> {
    radio: R,
    lines: L,
    out: StatusWriter<W>,
    state: RadioLinkState,
    queue: TransmitQueue,
    controller: LinkController,
    reassembler: Reassembler,
    rx_buffer: [u8; MAX_RECORD_LEN],
}

impl<R, L, W> Scheduler<R, L, W>
where
    R: Transceiver,
    L: LineSource,
    W: Write,
{
    /// Configure the radio and build the scheduler
    ///
    /// # Errors
    ///
    /// If the radio fails to start, `<ERROR|RADIO_INIT_CODE:n>` is sent
    /// and [`StartError::RadioInit`] returned. The caller must not carry
    /// on with an unconfigured radio.
    pub async fn start(
        mut radio: R,
        lines: L,
        out: W,
        config: BridgeConfig,
    ) -> Result<Self, StartError<W::Error>> {
        let mut out = StatusWriter::new(out);

        if let Err(err) = radio.begin(&config.radio).await {
            let code = err.code();
            error!("radio init failed, code {}", code);
            out.send(&Status::RadioInitCode(code))
                .await
                .map_err(StartError::Output)?;
            return Err(StartError::RadioInit { code });
        }
        info!(
            "radio up at {} MHz, {} kbps, {} dBm",
            config.radio.frequency_mhz,
            config.radio.bit_rate_kbps,
            config.radio.output_power_dbm
        );

        Ok(Self {
            radio,
            lines,
            out,
            state: RadioLinkState::new(config.radio.frequency_mhz),
            queue: TransmitQueue::new(),
            controller: LinkController::new(&config),
            reassembler: Reassembler::new(),
            rx_buffer: [0; MAX_RECORD_LEN],
        })
    }

    /// Run one loop iteration
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if the serial link fails. Work already done
    /// in the tick stays done.
    pub async fn tick(&mut self) -> Result<TickReport, TickError<L::Error, W::Error>> {
        let mut command = None;
        let mut applied = false;

        if let Some(line) = self.lines.next_line().await.map_err(TickError::Input)? {
            let dispatch = self
                .controller
                .handle_line(&line, &mut self.state, &mut self.queue, &mut self.radio)
                .await;
            command = Some(dispatch.command.name());
            applied = dispatch.applied;
            if let Some(status) = dispatch.status {
                self.out.send(&status).await.map_err(TickError::Output)?;
            }
        }

        let step = match self.state.mode() {
            LinkMode::Transmit => Step::Transmit(self.transmit_step().await?),
            LinkMode::Receive => Step::Receive(self.receive_step().await?),
        };

        Ok(TickReport {
            command,
            applied,
            step,
        })
    }

    async fn transmit_step(&mut self) -> Result<TransmitOutcome, TickError<L::Error, W::Error>> {
        let outcome = self.queue.try_dispatch_one(&mut self.radio).await;
        let status = match outcome {
            TransmitOutcome::Idle => return Ok(outcome),
            TransmitOutcome::Sent => Status::TxSuccess,
            TransmitOutcome::Retried => Status::TxFail,
        };
        self.out.send(&status).await.map_err(TickError::Output)?;
        Ok(outcome)
    }

    async fn receive_step(&mut self) -> Result<ReceiveOutcome, TickError<L::Error, W::Error>> {
        let len = match self.radio.receive(&mut self.rx_buffer).await {
            Ok(len) => len.min(MAX_RECORD_LEN),
            Err(err) if err.is_timeout() => return Ok(ReceiveOutcome::Idle),
            Err(err) => {
                debug!("receive failed, code {}", err.code());
                return Ok(ReceiveOutcome::RadioError(err.code()));
            }
        };

        match self.reassembler.validate(&self.rx_buffer[..len]) {
            Ok(validated) => {
                if let Ok(json) = validated.encode() {
                    self.out
                        .send(&Status::Data(&json))
                        .await
                        .map_err(TickError::Output)?;
                    Ok(ReceiveOutcome::Forwarded)
                } else {
                    error!("validated record too large to forward");
                    self.out
                        .send(&Status::Json(ENCODE_OVERFLOW))
                        .await
                        .map_err(TickError::Output)?;
                    Ok(ReceiveOutcome::ForwardOverflow)
                }
            }
            Err(reason) => {
                warn!("record rejected: {}", reason);
                let status = match &reason {
                    RejectReason::MalformedEncoding(diag) => Status::Json(diag),
                    RejectReason::ChecksumMismatch { .. } => Status::ChecksumErr,
                };
                self.out.send(&status).await.map_err(TickError::Output)?;
                Ok(ReceiveOutcome::Rejected(reason))
            }
        }
    }

    /// Current link state
    #[must_use]
    pub const fn state(&self) -> &RadioLinkState {
        &self.state
    }

    /// Transmit queue
    #[must_use]
    pub const fn queue(&self) -> &TransmitQueue {
        &self.queue
    }

    /// Receive-side validator
    #[must_use]
    pub const fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// The transceiver
    #[must_use]
    pub const fn radio(&self) -> &R {
        &self.radio
    }

    /// The transceiver, mutably
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// The line source, mutably
    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    /// Status output
    #[must_use]
    pub const fn output(&self) -> &StatusWriter<W> {
        &self.out
    }
}

/// Start the bridge and tick forever
///
/// If the radio does not start, the error line is sent and this future
/// parks for good: the bridge never runs with an unconfigured radio.
pub async fn run<R, L, W>(radio: R, lines: L, out: W, config: BridgeConfig) -> !
where
    R: Transceiver,
    L: LineSource,
    W: Write,
{
    let mut scheduler = match Scheduler::start(radio, lines, out, config).await {
        Ok(scheduler) => scheduler,
        Err(err) => {
            error!("bridge halted: {}", err);
            loop {
                core::future::pending::<()>().await;
            }
        }
    };

    loop {
        if let Err(err) = scheduler.tick().await {
            warn!("tick abandoned: {}", err);
        }
        embassy_futures::yield_now().await;
    }
}
