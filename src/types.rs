//! Shared types used across the bridge
//!
//! Bounded string aliases for every fixed-capacity field, plus the
//! link mode and file announcement types held in the link state.

use core::fmt;

use heapless::String;

use crate::config::{
    CHECKSUM_CAPACITY, FILENAME_CAPACITY, MAX_PAYLOAD_LEN, SERIAL_LINE_CAPACITY, TYPE_TAG_CAPACITY,
};

/// Packet type tag (`START`, `DATA`, ...)
pub type TypeTag = String<TYPE_TAG_CAPACITY>;

/// Filename as carried in a packet header
pub type Filename = String<FILENAME_CAPACITY>;

/// Two-digit hex checksum field
pub type ChecksumHex = String<CHECKSUM_CAPACITY>;

/// Payload waiting in the transmit queue
pub type Payload = String<MAX_PAYLOAD_LEN>;

/// One command line read from the serial link
pub type Line = String<SERIAL_LINE_CAPACITY>;

/// Copy `src` into a bounded string, cutting it at capacity.
///
/// The cut lands on the last char boundary that fits. Returns the copy
/// and whether anything was cut off.
#[must_use]
pub fn copy_truncated<const N: usize>(src: &str) -> (String<N>, bool) {
    let mut end = src.len().min(N);
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::new();
    // Cannot fail: end <= N
    let _ = out.push_str(&src[..end]);
    (out, end < src.len())
}

/// Operating direction of the radio link
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LinkMode {
    /// Drain the transmit queue
    #[default]
    Transmit,
    /// Poll the transceiver for records
    Receive,
}

impl LinkMode {
    /// Check if the link is transmitting
    #[must_use]
    pub const fn is_transmit(self) -> bool {
        matches!(self, Self::Transmit)
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transmit => f.write_str("TX"),
            Self::Receive => f.write_str("RX"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LinkMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Transmit => defmt::write!(f, "TX"),
            Self::Receive => defmt::write!(f, "RX"),
        }
    }
}

/// Metadata of the most recently announced file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileTransfer {
    /// Announced filename, truncated to header capacity
    pub filename: Filename,
    /// Number of chunks the sender will queue
    pub total_chunks: u32,
    /// Size of the original file in bytes
    pub total_size: u32,
}

impl FileTransfer {
    /// Build from announcement fields
    #[must_use]
    pub fn new(filename: &str, total_chunks: u32, total_size: u32) -> Self {
        let (filename, _) = copy_truncated(filename);
        Self {
            filename,
            total_chunks,
            total_size,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FileTransfer {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "File({}, {} chunks, {} bytes)",
            self.filename.as_str(),
            self.total_chunks,
            self.total_size
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_fits() {
        let (s, cut) = copy_truncated::<8>("START");
        assert_eq!(s.as_str(), "START");
        assert!(!cut);
    }

    #[test]
    fn copy_cuts_at_capacity() {
        let (s, cut) = copy_truncated::<4>("abcdefgh");
        assert_eq!(s.as_str(), "abcd");
        assert!(cut);
    }

    #[test]
    fn copy_respects_char_boundary() {
        // 'é' is two bytes; capacity 2 lands inside it
        let (s, cut) = copy_truncated::<2>("aé");
        assert_eq!(s.as_str(), "a");
        assert!(cut);
    }
}
