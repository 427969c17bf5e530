//! Chunk Checksum
//!
//! Additive 8-bit checksum over the chunk data. Not collision
//! resistant; it only catches gross corruption on the link.

use core::fmt::Write;

use crate::types::ChecksumHex;

/// Sum of all bytes modulo 256
#[must_use]
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Checksum rendered as two lowercase hex digits
#[must_use]
pub fn checksum_hex(payload: &[u8]) -> ChecksumHex {
    let mut hex = ChecksumHex::new();
    // Two digits always fit
    let _ = write!(hex, "{:02x}", checksum(payload));
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum_hex(&[]).as_str(), "00");
    }

    #[test]
    fn wraps_at_256() {
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(&[0x80; 4]), 0x00);
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(checksum_hex(&[0x0A]).as_str(), "0a");
        assert_eq!(checksum_hex(&[0xAB]).as_str(), "ab");
    }
}
