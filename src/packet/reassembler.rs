//! Packet Reassembler
//!
//! Validates records arriving from the radio one at a time:
//!
//! 1. decode the JSON record
//! 2. copy header fields into fixed-capacity storage, truncating
//! 3. recompute the data checksum and compare against the header
//!
//! A rejected record is dropped. There is no return channel to the
//! sender, so rejections are only visible on the local status link.

use core::fmt;
use heapless::String;

use crate::config::FORWARD_JSON_CAPACITY;
use crate::packet::checksum::{checksum, checksum_hex};
use crate::packet::header::PacketHeader;
use crate::packet::progress::{ChunkProgress, TransferProgress};
use crate::packet::record::{Diagnostic, EncodeError, RadioRecord};
use crate::types::ChecksumHex;

/// Why a received record was dropped
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Record did not decode; carries the decoder diagnostic
    MalformedEncoding(Diagnostic),
    /// Recomputed checksum differs from the header
    ChecksumMismatch {
        /// Checksum stated in the header
        expected: ChecksumHex,
        /// Checksum of the received data
        computed: u8,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEncoding(diag) => write!(f, "malformed record: {diag}"),
            Self::ChecksumMismatch { expected, computed } => {
                write!(f, "checksum mismatch: header {expected}, data {computed:02x}")
            }
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RejectReason {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::MalformedEncoding(diag) => defmt::write!(f, "malformed({})", diag.as_str()),
            Self::ChecksumMismatch { expected, computed } => {
                defmt::write!(f, "checksum({} != {:02x})", expected.as_str(), computed)
            }
        }
    }
}

/// A record that passed validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedRecord {
    /// Fixed-capacity header copy
    pub header: PacketHeader,
    /// Full decoded record, forwarded to the host
    pub record: RadioRecord,
}

impl ValidatedRecord {
    /// Re-encode the full record for forwarding
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if the JSON exceeds the forward buffer.
    pub fn encode(&self) -> Result<String<FORWARD_JSON_CAPACITY>, EncodeError> {
        self.record.encode()
    }
}

/// Running totals of validation outcomes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReceiveStats {
    /// Records forwarded
    pub accepted: u32,
    /// Records that failed to decode
    pub malformed: u32,
    /// Records with a bad checksum
    pub checksum_errors: u32,
    /// Accepted records whose header lost data to truncation
    pub truncated: u32,
}

/// Receive-side validator
#[derive(Clone, Debug, Default)]
pub struct Reassembler {
    stats: ReceiveStats,
    progress: TransferProgress,
}

impl Reassembler {
    /// Create a new reassembler
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stats: ReceiveStats {
                accepted: 0,
                malformed: 0,
                checksum_errors: 0,
                truncated: 0,
            },
            progress: TransferProgress::new(),
        }
    }

    /// Validate one raw record from the radio
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason`] when the record does not decode or its
    /// checksum does not match.
    pub fn validate(&mut self, raw: &[u8]) -> Result<ValidatedRecord, RejectReason> {
        let record = RadioRecord::decode(raw).map_err(|err| {
            self.stats.malformed += 1;
            RejectReason::MalformedEncoding(err.0)
        })?;

        let (header, truncation) = PacketHeader::from_record(&record);
        if truncation.any() {
            warn!(
                "header truncated (type {}, filename {}, checksum {})",
                truncation.kind,
                truncation.filename,
                truncation.checksum
            );
        }

        let data = record.data.as_bytes();
        if checksum_hex(data) != header.checksum {
            self.stats.checksum_errors += 1;
            return Err(RejectReason::ChecksumMismatch {
                expected: header.checksum,
                computed: checksum(data),
            });
        }

        self.stats.accepted += 1;
        if truncation.any() {
            self.stats.truncated += 1;
        }
        self.track(&header);

        Ok(ValidatedRecord { header, record })
    }

    fn track(&mut self, header: &PacketHeader) {
        match self.progress.observe(header) {
            ChunkProgress::New { received, total } => {
                debug!("chunk {} of {}: {}/{} received", header.seq, total, received, total);
            }
            ChunkProgress::Complete => {
                info!(
                    "transfer complete: {} ({} chunks)",
                    self.progress.filename(),
                    self.progress.total()
                );
            }
            ChunkProgress::Duplicate => debug!("duplicate chunk {}", header.seq),
            ChunkProgress::OutOfRange => {
                warn!("chunk {} outside 0..{}", header.seq, header.total);
            }
        }
    }

    /// Validation totals
    #[must_use]
    pub const fn stats(&self) -> ReceiveStats {
        self.stats
    }

    /// Progress of the file currently arriving
    #[must_use]
    pub const fn progress(&self) -> &TransferProgress {
        &self.progress
    }
}
