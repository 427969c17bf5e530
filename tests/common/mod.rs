//! Test doubles shared by the integration tests
//!
//! A scripted transceiver, an in-memory serial port and a scripted line
//! source. All of them complete immediately so tests can drive futures
//! with `embassy_futures::block_on`.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;

use rf_bridge::config::{RadioConfig, MAX_RECORD_LEN};
use rf_bridge::packet::record::RadioRecord;
use rf_bridge::radio::transceiver::{RadioError, Transceiver};
use rf_bridge::serial::LineSource;
use rf_bridge::types::Line;

// ============================================================================
// Radio
// ============================================================================

/// Driver code for a receive timeout
pub const RX_TIMEOUT: i16 = -6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockError {
    pub code: i16,
}

impl MockError {
    pub const fn timeout() -> Self {
        Self { code: RX_TIMEOUT }
    }
}

impl RadioError for MockError {
    fn code(&self) -> i16 {
        self.code
    }

    fn is_timeout(&self) -> bool {
        self.code == RX_TIMEOUT
    }
}

/// Scripted transceiver
///
/// Transmit results are taken from `transmit_results` (success once it
/// runs dry). Receives pop `incoming` and time out once it is empty.
#[derive(Debug, Default)]
pub struct MockRadio {
    pub begin_error: Option<MockError>,
    pub frequency_error: Option<MockError>,
    pub configured: Option<RadioConfig>,
    pub frequency_mhz: Option<f32>,
    pub transmit_results: VecDeque<Result<(), MockError>>,
    pub attempts: Vec<Vec<u8>>,
    pub sent: Vec<Vec<u8>>,
    pub incoming: VecDeque<Result<Vec<u8>, MockError>>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_init(code: i16) -> Self {
        Self {
            begin_error: Some(MockError { code }),
            ..Self::default()
        }
    }

    pub fn fail_next_transmits(&mut self, count: usize) {
        for _ in 0..count {
            self.transmit_results.push_back(Err(MockError { code: -1 }));
        }
    }

    pub fn deliver(&mut self, bytes: &[u8]) {
        self.incoming.push_back(Ok(bytes.to_vec()));
    }

    pub fn deliver_error(&mut self, code: i16) {
        self.incoming.push_back(Err(MockError { code }));
    }

    pub fn sent_text(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

impl Transceiver for MockRadio {
    type Error = MockError;

    async fn begin(&mut self, config: &RadioConfig) -> Result<(), Self::Error> {
        if let Some(err) = self.begin_error {
            return Err(err);
        }
        self.configured = Some(*config);
        self.frequency_mhz = Some(config.frequency_mhz);
        Ok(())
    }

    async fn set_frequency(&mut self, mhz: f32) -> Result<(), Self::Error> {
        if let Some(err) = self.frequency_error {
            return Err(err);
        }
        self.frequency_mhz = Some(mhz);
        Ok(())
    }

    async fn transmit(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.attempts.push(data.to_vec());
        let result = self.transmit_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.sent.push(data.to_vec());
        }
        result
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.incoming.pop_front() {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Err(err)) => Err(err),
            None => Err(MockError::timeout()),
        }
    }
}

// ============================================================================
// Serial
// ============================================================================

/// In-memory serial port
///
/// Reads drain `input`; once it is empty a read yields and returns 0.
#[derive(Debug, Default)]
pub struct MockSerial {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
    pub flushes: usize,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(text: &str) -> Self {
        Self {
            input: text.bytes().collect(),
            ..Self::default()
        }
    }

    pub fn feed(&mut self, text: &str) {
        self.input.extend(text.bytes());
    }

    /// Output split into CR LF terminated lines
    pub fn lines(&self) -> Vec<String> {
        let text = String::from_utf8_lossy(&self.output);
        text.split_terminator("\r\n").map(str::to_owned).collect()
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = Infallible;
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.input.is_empty())
    }
}

impl embedded_io_async::Read for MockSerial {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.input.is_empty() {
            embassy_futures::yield_now().await;
            return Ok(0);
        }
        let mut n = 0;
        while n < buf.len() {
            match self.input.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl embedded_io_async::Write for MockSerial {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

// ============================================================================
// Line source
// ============================================================================

/// Line source fed directly by the test
#[derive(Debug, Default)]
pub struct ScriptedLines {
    pub pending: VecDeque<Line>,
}

impl ScriptedLines {
    pub fn new(lines: &[&str]) -> Self {
        let mut source = Self::default();
        for line in lines {
            source.push(line);
        }
        source
    }

    pub fn push(&mut self, line: &str) {
        let mut owned = Line::new();
        owned.push_str(line).unwrap();
        self.pending.push_back(owned);
    }
}

impl LineSource for ScriptedLines {
    type Error = Infallible;

    async fn next_line(&mut self) -> Result<Option<Line>, Self::Error> {
        Ok(self.pending.pop_front())
    }
}

// ============================================================================
// Records
// ============================================================================

/// Encoded chunk as a sender would transmit it
pub fn encoded_chunk(seq: u16, total: u16, filename: &str, data: &str) -> Vec<u8> {
    let record = RadioRecord::sealed(RadioRecord::kind_for(seq), seq, total, filename, data).unwrap();
    let json: heapless::String<{ 2 * MAX_RECORD_LEN }> = record.encode().unwrap();
    json.as_bytes().to_vec()
}
