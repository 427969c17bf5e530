//! Packet Header
//!
//! Fixed-capacity copy of a record's header fields. Overlong strings are
//! cut to capacity instead of rejected; [`Truncation`] reports which
//! fields lost data.

use crate::packet::record::RadioRecord;
use crate::types::{copy_truncated, ChecksumHex, Filename, TypeTag};

/// Header fields of one chunk
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PacketHeader {
    /// Packet type tag (at most 7 bytes)
    pub kind: TypeTag,
    /// Chunk index (0-based)
    pub seq: u16,
    /// Chunk count
    pub total: u16,
    /// Filename (at most 31 bytes)
    pub filename: Filename,
    /// Checksum as received (at most 2 bytes)
    pub checksum: ChecksumHex,
    /// Stated payload length
    pub data_len: u32,
}

/// Which header fields were cut to fit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Truncation {
    /// Type tag was longer than 7 bytes
    pub kind: bool,
    /// Filename was longer than 31 bytes
    pub filename: bool,
    /// Checksum was longer than 2 bytes
    pub checksum: bool,
}

impl Truncation {
    /// Check if any field lost data
    #[must_use]
    pub const fn any(self) -> bool {
        self.kind || self.filename || self.checksum
    }
}

impl PacketHeader {
    /// Copy the header fields out of a decoded record
    #[must_use]
    pub fn from_record(record: &RadioRecord) -> (Self, Truncation) {
        let (kind, kind_cut) = copy_truncated(&record.kind);
        let (filename, filename_cut) = copy_truncated(&record.filename);
        let (checksum, checksum_cut) = copy_truncated(&record.checksum);

        let header = Self {
            kind,
            seq: record.seq,
            total: record.total,
            filename,
            checksum,
            data_len: record.data_len,
        };
        let truncation = Truncation {
            kind: kind_cut,
            filename: filename_cut,
            checksum: checksum_cut,
        };
        (header, truncation)
    }

    /// Check `seq < total`
    #[must_use]
    pub const fn seq_in_range(&self) -> bool {
        self.seq < self.total
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PacketHeader {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{} {}/{} {} [{}]",
            self.kind.as_str(),
            self.seq,
            self.total,
            self.filename.as_str(),
            self.checksum.as_str()
        );
    }
}
