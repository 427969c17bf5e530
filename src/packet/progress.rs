//! Transfer Progress
//!
//! Counts the distinct chunks received for the current file. Chunks may
//! arrive in any order and may repeat; nothing is buffered or written.

use crate::config::MAX_TRACKED_CHUNKS;
use crate::packet::header::PacketHeader;
use crate::packet::record::KIND_START;
use crate::types::Filename;

const WORDS: usize = MAX_TRACKED_CHUNKS / 32;

/// Result of recording one chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkProgress {
    /// First sighting of this chunk
    New {
        /// Distinct chunks received so far
        received: u16,
        /// Chunks expected
        total: u16,
    },
    /// Chunk already counted
    Duplicate,
    /// `seq` not below `total`, or beyond the tracking window
    OutOfRange,
    /// This chunk completed the file
    Complete,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ChunkProgress {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::New { received, total } => defmt::write!(f, "{}/{}", received, total),
            Self::Duplicate => defmt::write!(f, "duplicate"),
            Self::OutOfRange => defmt::write!(f, "out of range"),
            Self::Complete => defmt::write!(f, "complete"),
        }
    }
}

/// Chunk bookkeeping for the file currently arriving
#[derive(Clone, Debug)]
pub struct TransferProgress {
    filename: Filename,
    total: u16,
    received: u16,
    seen: [u32; WORDS],
}

impl TransferProgress {
    /// Create an empty tracker
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filename: Filename::new(),
            total: 0,
            received: 0,
            seen: [0; WORDS],
        }
    }

    /// Record a validated chunk
    pub fn observe(&mut self, header: &PacketHeader) -> ChunkProgress {
        let restart = header.kind.as_str() == KIND_START
            || header.filename != self.filename
            || header.total != self.total;
        if restart {
            self.restart(header);
        }

        let seq = usize::from(header.seq);
        if !header.seq_in_range() || seq >= MAX_TRACKED_CHUNKS {
            return ChunkProgress::OutOfRange;
        }

        let (word, bit) = (seq / 32, 1u32 << (seq % 32));
        if self.seen[word] & bit != 0 {
            return ChunkProgress::Duplicate;
        }
        self.seen[word] |= bit;
        self.received += 1;

        if self.is_complete() {
            ChunkProgress::Complete
        } else {
            ChunkProgress::New {
                received: self.received,
                total: self.total,
            }
        }
    }

    fn restart(&mut self, header: &PacketHeader) {
        self.filename = header.filename.clone();
        self.total = header.total;
        self.received = 0;
        self.seen = [0; WORDS];
    }

    /// File being tracked
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Distinct chunks received
    #[must_use]
    pub const fn received(&self) -> u16 {
        self.received
    }

    /// Chunks expected
    #[must_use]
    pub const fn total(&self) -> u16 {
        self.total
    }

    /// Check if every chunk has arrived
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.total > 0 && self.received == self.total
    }
}

impl Default for TransferProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::copy_truncated;

    fn header(kind: &str, seq: u16, total: u16) -> PacketHeader {
        PacketHeader {
            kind: copy_truncated(kind).0,
            seq,
            total,
            filename: copy_truncated("f.bin").0,
            ..PacketHeader::default()
        }
    }

    #[test]
    fn counts_out_of_order_chunks() {
        let mut progress = TransferProgress::new();
        assert_eq!(
            progress.observe(&header("DATA", 2, 3)),
            ChunkProgress::New { received: 1, total: 3 }
        );
        assert_eq!(
            progress.observe(&header("DATA", 0, 3)),
            ChunkProgress::New { received: 2, total: 3 }
        );
        assert_eq!(progress.observe(&header("DATA", 1, 3)), ChunkProgress::Complete);
    }

    #[test]
    fn start_chunk_restarts_tracking() {
        let mut progress = TransferProgress::new();
        progress.observe(&header("DATA", 1, 3));
        progress.observe(&header("DATA", 2, 3));
        assert_eq!(
            progress.observe(&header("START", 0, 3)),
            ChunkProgress::New { received: 1, total: 3 }
        );
    }

    #[test]
    fn duplicate_and_completion() {
        let mut progress = TransferProgress::new();
        progress.observe(&header("START", 0, 2));
        assert_eq!(progress.observe(&header("DATA", 0, 2)), ChunkProgress::Duplicate);
        assert_eq!(progress.observe(&header("DATA", 1, 2)), ChunkProgress::Complete);
        assert!(progress.is_complete());
    }

    #[test]
    fn seq_at_total_is_out_of_range() {
        let mut progress = TransferProgress::new();
        assert_eq!(progress.observe(&header("DATA", 3, 3)), ChunkProgress::OutOfRange);
        assert_eq!(progress.received(), 0);
    }
}
