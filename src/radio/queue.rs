//! Transmit Queue
//!
//! Bounded FIFO of payloads waiting for the radio. One payload is tried
//! per scheduler tick; a failed payload goes to the back of the queue and
//! is retried with no limit.

use core::fmt;

use heapless::Deque;

use crate::config::{MAX_PAYLOAD_LEN, TX_QUEUE_CAPACITY};
use crate::radio::transceiver::{RadioError, Transceiver};
use crate::types::{copy_truncated, Payload};

/// Why a payload was not queued
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnqueueError {
    /// Queue already holds `TX_QUEUE_CAPACITY` payloads
    QueueFull,
    /// Payload is longer than one radio record
    PayloadTooLong,
}

impl fmt::Display for EnqueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => f.write_str("transmit queue full"),
            Self::PayloadTooLong => write!(f, "payload exceeds {MAX_PAYLOAD_LEN} bytes"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for EnqueueError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::QueueFull => defmt::write!(f, "queue full"),
            Self::PayloadTooLong => defmt::write!(f, "payload too long"),
        }
    }
}

/// Result of one dispatch attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransmitOutcome {
    /// Nothing was queued
    Idle,
    /// Head payload sent and removed
    Sent,
    /// Head payload failed and moved to the tail
    Retried,
}

#[cfg(feature = "embedded")]
impl defmt::Format for TransmitOutcome {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "idle"),
            Self::Sent => defmt::write!(f, "sent"),
            Self::Retried => defmt::write!(f, "retried"),
        }
    }
}

/// Outbound payload FIFO
///
/// Full queue policy: new payloads are rejected; queued ones are kept.
#[derive(Clone, Debug, Default)]
pub struct TransmitQueue {
    pending: Deque<Payload, TX_QUEUE_CAPACITY>,
}

impl TransmitQueue {
    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Deque::new(),
        }
    }

    /// Append a payload at the tail
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError`] when the queue is full or the payload
    /// does not fit in one record. The payload is dropped either way.
    pub fn enqueue(&mut self, payload: &str) -> Result<(), EnqueueError> {
        if self.pending.is_full() {
            return Err(EnqueueError::QueueFull);
        }
        let (payload, cut) = copy_truncated::<MAX_PAYLOAD_LEN>(payload);
        if cut {
            return Err(EnqueueError::PayloadTooLong);
        }
        self.pending
            .push_back(payload)
            .map_err(|_| EnqueueError::QueueFull)
    }

    /// Try to send the head payload
    ///
    /// On failure the payload is re-appended at the tail; removal freed
    /// its slot, so the re-append always succeeds.
    pub async fn try_dispatch_one<R: Transceiver>(&mut self, radio: &mut R) -> TransmitOutcome {
        let Some(payload) = self.pending.pop_front() else {
            return TransmitOutcome::Idle;
        };

        match radio.transmit(payload.as_bytes()).await {
            Ok(()) => TransmitOutcome::Sent,
            Err(err) => {
                warn!("transmit failed (code {}), requeued", err.code());
                let _ = self.pending.push_back(payload);
                TransmitOutcome::Retried
            }
        }
    }

    /// Number of queued payloads
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Check if the queue is at capacity
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.pending.is_full()
    }

    /// Queued payloads, head first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(Payload::as_str)
    }
}
