//! Communication Protocols
//!
//! Host command parsing and status line formatting for the serial link.
//!
//! Commands are bracket-delimited ASCII lines:
//!
//! ```text
//! <SET|433.92,...>            set carrier frequency (MHz)
//! <TXMODE>                    drain the transmit queue
//! <RXMODE>                    poll the radio for records
//! <RX_READY>                  acknowledge receive readiness
//! <FILE|name|chunks|size>     announce an outgoing file
//! <DATA|payload>              queue a payload for transmission
//! ```
//!
//! Field extraction scans for delimiters and never fails: a missing
//! delimiter widens or empties the field, a bad number becomes zero.
//! [`parse_strict`] reports those cases while still offering the lenient
//! result.

use core::fmt;

/// Command prefixes, in match priority order
mod prefix {
    pub const SET: &str = "<SET|";
    pub const TXMODE: &str = "<TXMODE>";
    pub const RXMODE: &str = "<RXMODE>";
    pub const RX_READY: &str = "<RX_READY>";
    pub const FILE: &str = "<FILE|";
    pub const DATA: &str = "<DATA|";
}

/// Command parsed from one serial line
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command<'a> {
    /// Retune the carrier (MHz)
    SetFrequency {
        /// Requested frequency in MHz
        mhz: f32,
    },
    /// Switch to transmit mode
    EnterTransmitMode,
    /// Switch to receive mode
    EnterReceiveMode,
    /// Host is ready to receive
    ReceiveReadyAck,
    /// Host announces an outgoing file
    FileAnnounce {
        /// Name of the file
        filename: &'a str,
        /// Number of chunks that will follow
        total_chunks: u32,
        /// File size in bytes
        total_size: u32,
    },
    /// Payload to queue for transmission
    DataChunk {
        /// Raw payload text
        payload: &'a str,
    },
    /// Line matched no known prefix
    Unrecognized,
}

impl Command<'_> {
    /// Short name for logging
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetFrequency { .. } => "SET",
            Self::EnterTransmitMode => "TXMODE",
            Self::EnterReceiveMode => "RXMODE",
            Self::ReceiveReadyAck => "RX_READY",
            Self::FileAnnounce { .. } => "FILE",
            Self::DataChunk { .. } => "DATA",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Command<'_> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::SetFrequency { mhz } => defmt::write!(f, "SetFreq({} MHz)", mhz),
            Self::FileAnnounce {
                filename,
                total_chunks,
                total_size,
            } => defmt::write!(f, "File({}, {}, {})", filename, total_chunks, total_size),
            Self::DataChunk { payload } => defmt::write!(f, "Data({} bytes)", payload.len()),
            other => defmt::write!(f, "{}", other.name()),
        }
    }
}

/// Why a line failed strict parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MalformedKind {
    /// An expected `|`, `,` or `>` was not found where needed
    MissingDelimiter,
    /// A numeric field did not parse as a number
    InvalidNumber,
}

impl fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDelimiter => f.write_str("missing delimiter"),
            Self::InvalidNumber => f.write_str("invalid number"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for MalformedKind {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::MissingDelimiter => defmt::write!(f, "missing delimiter"),
            Self::InvalidNumber => defmt::write!(f, "invalid number"),
        }
    }
}

/// A recognised command whose fields did not parse cleanly
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Malformed<'a> {
    /// What went wrong
    pub kind: MalformedKind,
    /// The command produced by lenient parsing
    pub fallback: Command<'a>,
}

/// Parse a line, defaulting malformed fields.
///
/// Never fails: unknown lines yield [`Command::Unrecognized`].
#[must_use]
pub fn parse(line: &str) -> Command<'_> {
    parse_fields(line).0
}

/// Parse a line, reporting fields that needed defaulting.
///
/// # Errors
///
/// Returns [`Malformed`] when a recognised command is missing a
/// delimiter or carries a non-numeric number. The error holds the
/// command [`parse`] would have returned.
pub fn parse_strict(line: &str) -> Result<Command<'_>, Malformed<'_>> {
    match parse_fields(line) {
        (command, None) => Ok(command),
        (fallback, Some(kind)) => Err(Malformed { kind, fallback }),
    }
}

fn parse_fields(line: &str) -> (Command<'_>, Option<MalformedKind>) {
    if line.starts_with(prefix::SET) {
        parse_set(line)
    } else if line.starts_with(prefix::TXMODE) {
        (Command::EnterTransmitMode, None)
    } else if line.starts_with(prefix::RXMODE) {
        (Command::EnterReceiveMode, None)
    } else if line.starts_with(prefix::RX_READY) {
        (Command::ReceiveReadyAck, None)
    } else if line.starts_with(prefix::FILE) {
        parse_file(line)
    } else if line.starts_with(prefix::DATA) {
        parse_data(line)
    } else {
        (Command::Unrecognized, None)
    }
}

fn parse_set(line: &str) -> (Command<'_>, Option<MalformedKind>) {
    let start = prefix::SET.len();
    let comma = line.find(',');
    let text = slice(line, start, comma.unwrap_or(line.len()));
    let mhz = lenient_f32(text);

    let problem = if comma.is_none() {
        Some(MalformedKind::MissingDelimiter)
    } else if strict_f32(text) != Some(mhz) {
        Some(MalformedKind::InvalidNumber)
    } else {
        None
    };
    (Command::SetFrequency { mhz }, problem)
}

fn parse_file(line: &str) -> (Command<'_>, Option<MalformedKind>) {
    let start = prefix::FILE.len();
    let len = line.len();
    let name_end = line[start..].find('|').map(|i| i + start);
    // The prefix itself holds a '|', so this always finds one
    let last_bar = line.rfind('|').unwrap_or(start - 1);
    let close = line.find('>');

    let filename = slice(line, start, name_end.unwrap_or(len));
    let total_text = slice(line, name_end.map_or(len, |i| i + 1), last_bar);
    let size_text = slice(line, last_bar + 1, close.unwrap_or(len));

    let total_chunks = lenient_u32(total_text);
    let total_size = lenient_u32(size_text);
    let command = Command::FileAnnounce {
        filename,
        total_chunks,
        total_size,
    };

    let delimiters_ok = match (name_end, close) {
        (Some(name_end), Some(close)) => name_end < last_bar && last_bar < close,
        _ => false,
    };
    let problem = if !delimiters_ok {
        Some(MalformedKind::MissingDelimiter)
    } else if strict_u32(total_text) != Some(total_chunks)
        || strict_u32(size_text) != Some(total_size)
    {
        Some(MalformedKind::InvalidNumber)
    } else {
        None
    };
    (command, problem)
}

fn parse_data(line: &str) -> (Command<'_>, Option<MalformedKind>) {
    let close = line.find('>');
    let payload = slice(line, prefix::DATA.len(), close.unwrap_or(line.len()));
    let problem = close.is_none().then_some(MalformedKind::MissingDelimiter);
    (Command::DataChunk { payload }, problem)
}

/// Substring by byte range, empty when the range is inverted.
///
/// Callers only pass indices of ASCII delimiters (or the line ends),
/// which are always char boundaries.
fn slice(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        ""
    } else {
        &line[start..end]
    }
}

/// Leading `[+-]digits[.digits][e[+-]digits]` of `text`, after leading
/// whitespace. Fraction and exponent only when `allow_fraction`.
fn numeric_prefix(text: &str, allow_fraction: bool) -> &str {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if allow_fraction && end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if allow_fraction && end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        // Exponent counts only when at least one digit follows
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let digits = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > digits {
            end = exp;
        }
    }
    &text[..end]
}

fn lenient_f32(text: &str) -> f32 {
    numeric_prefix(text, true).parse().unwrap_or(0.0)
}

fn lenient_u32(text: &str) -> u32 {
    numeric_prefix(text, false).parse().unwrap_or(0)
}

fn strict_f32(text: &str) -> Option<f32> {
    text.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

fn strict_u32(text: &str) -> Option<u32> {
    text.trim().parse().ok()
}

/// Outbound status or error line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status<'a> {
    /// Frequency applied
    FreqSet,
    /// Now in transmit mode
    TxMode,
    /// Now in receive mode
    RxMode,
    /// Receive readiness acknowledged
    RxReady,
    /// File announcement echoed back
    FileStart {
        /// Announced filename
        filename: &'a str,
        /// Announced chunk count
        total: u32,
    },
    /// Head of queue transmitted
    TxSuccess,
    /// Head of queue failed and was requeued
    TxFail,
    /// Received record failed its checksum
    ChecksumErr,
    /// Validated record, re-encoded as JSON
    Data(&'a str),
    /// Radio failed to start
    RadioInitCode(i16),
    /// Received record failed to decode
    Json(&'a str),
}

impl fmt::Display for Status<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FreqSet => f.write_str("<STATUS|FREQ_SET>"),
            Self::TxMode => f.write_str("<STATUS|TX_MODE>"),
            Self::RxMode => f.write_str("<STATUS|RX_MODE>"),
            Self::RxReady => f.write_str("<STATUS|RX_READY>"),
            Self::FileStart { filename, total } => {
                write!(f, "<STATUS|FILE_START|{filename}|{total}>")
            }
            Self::TxSuccess => f.write_str("<STATUS|TX_SUCCESS>"),
            Self::TxFail => f.write_str("<STATUS|TX_FAIL>"),
            Self::ChecksumErr => f.write_str("<STATUS|CHECKSUM_ERR>"),
            Self::Data(json) => write!(f, "<DATA|{json}>"),
            Self::RadioInitCode(code) => write!(f, "<ERROR|RADIO_INIT_CODE:{code}>"),
            Self::Json(message) => write!(f, "<ERROR|JSON:{message}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_prefix_stops_at_garbage() {
        assert_eq!(numeric_prefix("433.92>", true), "433.92");
        assert_eq!(numeric_prefix("  12abc", false), "12");
        assert_eq!(numeric_prefix("-3.5x", true), "-3.5");
        assert_eq!(numeric_prefix("abc", true), "");
    }

    #[test]
    fn numeric_prefix_takes_exponent() {
        assert_eq!(numeric_prefix("4.3392e2,", true), "4.3392e2");
        assert_eq!(numeric_prefix("1E-3x", true), "1E-3");
        assert_eq!(numeric_prefix("7e", true), "7");
        assert_eq!(numeric_prefix("7e+", true), "7");
        assert_eq!(numeric_prefix("12e3", false), "12");
    }

    #[test]
    fn lenient_numbers_default_to_zero() {
        assert_eq!(lenient_f32("garbage"), 0.0);
        assert_eq!(lenient_f32("."), 0.0);
        assert_eq!(lenient_u32("-5"), 0);
        assert_eq!(lenient_u32("7 chunks"), 7);
    }

    #[test]
    fn strict_rejects_non_finite() {
        assert!(strict_f32("inf").is_none());
        assert!(strict_f32("NaN").is_none());
        assert_eq!(strict_f32(" 915.0 "), Some(915.0));
    }

    #[test]
    fn slice_inverted_range_is_empty() {
        assert_eq!(slice("abcdef", 4, 2), "");
        assert_eq!(slice("abcdef", 2, 100), "cdef");
    }
}
