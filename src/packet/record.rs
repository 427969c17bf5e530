//! Radio Record Codec
//!
//! One chunk of a file transfer as carried over the air: a compact JSON
//! object with the fields
//!
//! ```text
//! {"type":"DATA","seq":3,"total":12,"filename":"photo.jpg",
//!  "checksum":"5e","data_len":64,"data":"..."}
//! ```
//!
//! String fields are decoded at full record capacity so the record can
//! be forwarded unchanged; the fixed-width header copy is taken
//! separately (see [`crate::packet::header`]). JSON escapes in strings
//! are decoded, and [`RadioRecord::encode`] writes them back.
//!
//! Numeric fields are typed: a `seq` or `total` above `u16::MAX`, or a
//! negative or fractional `data_len`, fails the whole record as
//! malformed rather than clamping the field.

use core::fmt::{self, Write};

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::config::{JSON_DIAGNOSTIC_CAPACITY, MAX_RECORD_LEN};
use crate::packet::checksum::checksum_hex;

/// String field of a decoded record
pub type RecordText = String<MAX_RECORD_LEN>;

/// Decoder diagnostic text
pub type Diagnostic = String<JSON_DIAGNOSTIC_CAPACITY>;

/// Type tag of the first chunk of a file
pub const KIND_START: &str = "START";

/// Type tag of every following chunk
pub const KIND_DATA: &str = "DATA";

/// Decoded over-the-radio record
///
/// Missing fields decode to their defaults; unknown fields are skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioRecord {
    /// Packet type tag
    #[serde(rename = "type")]
    pub kind: RecordText,
    /// Chunk index (0-based)
    pub seq: u16,
    /// Chunk count of the transfer
    pub total: u16,
    /// Name of the transferred file
    pub filename: RecordText,
    /// Hex checksum of `data`
    pub checksum: RecordText,
    /// Length of `data` as stated by the sender
    pub data_len: u32,
    /// Chunk contents
    pub data: RecordText,
}

/// A field does not fit into a record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldTooLong;

impl fmt::Display for FieldTooLong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("field exceeds record capacity")
    }
}

/// Record could not be decoded
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeError(pub Diagnostic);

impl DecodeError {
    fn new(message: impl fmt::Display) -> Self {
        let mut text = Diagnostic::new();
        // Overlong diagnostics keep what fit
        let _ = write!(text, "{message}");
        Self(text)
    }

    /// Diagnostic text
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record could not be encoded into the given capacity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeError;

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("encoded record exceeds buffer")
    }
}

impl RadioRecord {
    /// Build a chunk with `checksum` and `data_len` filled in
    ///
    /// # Errors
    ///
    /// Returns [`FieldTooLong`] if any string exceeds record capacity.
    pub fn sealed(
        kind: &str,
        seq: u16,
        total: u16,
        filename: &str,
        data: &str,
    ) -> Result<Self, FieldTooLong> {
        let mut record = Self {
            seq,
            total,
            data_len: u32::try_from(data.len()).map_err(|_| FieldTooLong)?,
            ..Self::default()
        };
        record.kind.push_str(kind).map_err(|()| FieldTooLong)?;
        record.filename.push_str(filename).map_err(|()| FieldTooLong)?;
        record.data.push_str(data).map_err(|()| FieldTooLong)?;
        record
            .checksum
            .push_str(&checksum_hex(data.as_bytes()))
            .map_err(|()| FieldTooLong)?;
        Ok(record)
    }

    /// Type tag for chunk `index` of a transfer
    #[must_use]
    pub const fn kind_for(index: u16) -> &'static str {
        if index == 0 {
            KIND_START
        } else {
            KIND_DATA
        }
    }

    /// Decode a record received from the radio
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] with the decoder's diagnostic when the
    /// bytes are not UTF-8 or not a JSON object of the expected shape.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let text = core::str::from_utf8(raw).map_err(|_| DecodeError::new("invalid UTF-8"))?;
        // Unescaped text is never longer than its escaped form
        let mut scratch = [0u8; MAX_RECORD_LEN];
        let (record, _) = serde_json_core::from_str_escaped::<Self>(text, &mut scratch)
            .map_err(DecodeError::new)?;
        Ok(record)
    }

    /// Encode as compact JSON
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if the JSON does not fit in `N` bytes.
    pub fn encode<const N: usize>(&self) -> Result<String<N>, EncodeError> {
        serde_json_core::to_string(self).map_err(|_| EncodeError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_fills_checksum_and_length() {
        let record = RadioRecord::sealed("DATA", 1, 3, "a.txt", "hello").unwrap();
        assert_eq!(record.data_len, 5);
        // 'h'+'e'+'l'+'l'+'o' = 532 = 0x214
        assert_eq!(record.checksum.as_str(), "14");
    }

    #[test]
    fn kind_for_first_chunk_is_start() {
        assert_eq!(RadioRecord::kind_for(0), KIND_START);
        assert_eq!(RadioRecord::kind_for(7), KIND_DATA);
    }

    #[test]
    fn missing_fields_default() {
        let record = RadioRecord::decode(br#"{"data":"x"}"#).unwrap();
        assert_eq!(record.data.as_str(), "x");
        assert_eq!(record.seq, 0);
        assert!(record.filename.is_empty());
    }

    #[test]
    fn non_utf8_is_rejected() {
        let err = RadioRecord::decode(&[0xFF, 0xFE]).unwrap_err();
        assert_eq!(err.message(), "invalid UTF-8");
    }

    #[test]
    fn escaped_strings_are_decoded() {
        let record = RadioRecord::decode(br#"{"filename":"a\"b","data":"c\\d\n"}"#).unwrap();
        assert_eq!(record.filename.as_str(), "a\"b");
        assert_eq!(record.data.as_str(), "c\\d\n");
    }

    #[test]
    fn out_of_range_numbers_fail_the_record() {
        assert!(RadioRecord::decode(br#"{"seq":70000,"data":"x"}"#).is_err());
        assert!(RadioRecord::decode(br#"{"total":65536}"#).is_err());
        assert!(RadioRecord::decode(br#"{"data_len":-1}"#).is_err());
    }
}
