//! Serial Link
//!
//! Line framing for host commands and status output over any
//! `embedded-io-async` byte stream (UART, USB CDC ACM, ...).
//!
//! Two line sources are provided: [`SerialLines`] polls the port from the
//! scheduler task, and [`ChannelLines`] takes lines from a channel filled
//! by a separate serial task (see [`pump_lines`]).

use core::convert::Infallible;
use core::fmt::Write as _;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Receiver};
use embedded_io::ReadReady;
use embedded_io_async::{Read, Write};
use heapless::{String, Vec};

use crate::config::{LINE_CHANNEL_DEPTH, SERIAL_LINE_CAPACITY, SERIAL_READ_CHUNK, STATUS_LINE_CAPACITY};
use crate::protocol::Status;
use crate::types::Line;

/// Channel carrying command lines between tasks
pub type LineChannel<M> = Channel<M, Line, LINE_CHANNEL_DEPTH>;

const fn is_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// Line assembly buffer
///
/// Lines end at CR, LF or any run of them. A line that fills the buffer
/// without a terminator is discarded up to its terminator.
pub struct LineBuffer {
    buffer: [u8; SERIAL_LINE_CAPACITY],
    read_pos: usize,
    write_pos: usize,
    discarding: bool,
    overflows: u32,
}

impl LineBuffer {
    /// Create a new line buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; SERIAL_LINE_CAPACITY],
            read_pos: 0,
            write_pos: 0,
            discarding: false,
            overflows: 0,
        }
    }

    /// Push received bytes into the buffer
    pub fn push(&mut self, data: &[u8]) {
        for &byte in data {
            if self.discarding {
                self.discarding = !is_terminator(byte);
                continue;
            }
            if self.write_pos == SERIAL_LINE_CAPACITY {
                self.compact();
            }
            if self.write_pos == SERIAL_LINE_CAPACITY {
                if self.has_line() {
                    // Complete lines are waiting; drop bytes until they are read
                    continue;
                }
                warn!("serial line exceeds {} bytes, discarded", SERIAL_LINE_CAPACITY);
                self.clear();
                self.overflows += 1;
                self.discarding = !is_terminator(byte);
                continue;
            }
            self.buffer[self.write_pos] = byte;
            self.write_pos += 1;
        }
    }

    fn has_line(&self) -> bool {
        self.buffer[self.read_pos..self.write_pos]
            .iter()
            .any(|&b| is_terminator(b))
    }

    /// Read a line (up to newline or CR)
    pub fn read_line(&mut self) -> Option<Vec<u8, SERIAL_LINE_CAPACITY>> {
        let pos = self.buffer[self.read_pos..self.write_pos]
            .iter()
            .position(|&b| is_terminator(b))?;

        let end = self.read_pos + pos;
        let mut line = Vec::new();
        // Cannot fail: a line is never longer than the buffer
        let _ = line.extend_from_slice(&self.buffer[self.read_pos..end]);

        // Skip the terminator run
        self.read_pos = end + 1;
        while self.read_pos < self.write_pos && is_terminator(self.buffer[self.read_pos]) {
            self.read_pos += 1;
        }

        if self.read_pos >= SERIAL_LINE_CAPACITY / 2 {
            self.compact();
        }

        Some(line)
    }

    /// Compact the buffer
    fn compact(&mut self) {
        if self.read_pos > 0 {
            let remaining = self.write_pos - self.read_pos;
            self.buffer.copy_within(self.read_pos..self.write_pos, 0);
            self.read_pos = 0;
            self.write_pos = remaining;
        }
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
    }

    /// Get buffered bytes not yet returned as lines
    #[must_use]
    pub const fn available(&self) -> usize {
        self.write_pos - self.read_pos
    }

    /// Number of overlong lines discarded
    #[must_use]
    pub const fn overflows(&self) -> u32 {
        self.overflows
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert raw line bytes; invalid UTF-8 becomes an empty line
fn to_line(bytes: Vec<u8, SERIAL_LINE_CAPACITY>) -> Line {
    String::from_utf8(bytes).unwrap_or_else(|_| {
        warn!("serial line is not UTF-8, ignored");
        Line::new()
    })
}

/// Source of host command lines
#[allow(async_fn_in_trait)]
pub trait LineSource {
    /// Transport error type
    type Error;

    /// Next complete line, without waiting for one
    async fn next_line(&mut self) -> Result<Option<Line>, Self::Error>;
}

/// Line source reading directly from a serial port
pub struct SerialLines<T> {
    port: T,
    buffer: LineBuffer,
}

impl<T> SerialLines<T>
where
    T: Read + ReadReady,
{
    /// Wrap a serial port
    #[must_use]
    pub const fn new(port: T) -> Self {
        Self {
            port,
            buffer: LineBuffer::new(),
        }
    }

    /// Wait until a full line has arrived
    ///
    /// # Errors
    ///
    /// Returns the port error if a read fails.
    pub async fn read_line(&mut self) -> Result<Line, T::Error> {
        loop {
            if let Some(bytes) = self.buffer.read_line() {
                return Ok(to_line(bytes));
            }
            let mut chunk = [0u8; SERIAL_READ_CHUNK];
            let n = self.port.read(&mut chunk).await?;
            self.buffer.push(&chunk[..n]);
        }
    }

    /// Line buffer state
    #[must_use]
    pub const fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    /// Release the port
    pub fn into_inner(self) -> T {
        self.port
    }
}

impl<T> LineSource for SerialLines<T>
where
    T: Read + ReadReady,
{
    type Error = T::Error;

    async fn next_line(&mut self) -> Result<Option<Line>, Self::Error> {
        if !self.buffer.has_line() && self.port.read_ready()? {
            let mut chunk = [0u8; SERIAL_READ_CHUNK];
            let n = self.port.read(&mut chunk).await?;
            self.buffer.push(&chunk[..n]);
        }
        Ok(self.buffer.read_line().map(to_line))
    }
}

/// Line source fed through a channel by another task
pub struct ChannelLines<'ch, M: RawMutex> {
    receiver: Receiver<'ch, M, Line, LINE_CHANNEL_DEPTH>,
}

impl<'ch, M: RawMutex> ChannelLines<'ch, M> {
    /// Take lines from `channel`
    #[must_use]
    pub fn new(channel: &'ch LineChannel<M>) -> Self {
        Self {
            receiver: channel.receiver(),
        }
    }
}

impl<M: RawMutex> LineSource for ChannelLines<'_, M> {
    type Error = Infallible;

    async fn next_line(&mut self) -> Result<Option<Line>, Self::Error> {
        Ok(self.receiver.try_receive().ok())
    }
}

/// Forward lines from a serial port into a channel, forever
///
/// Run this in its own task when serial I/O must not share the
/// scheduler task; the scheduler then reads through [`ChannelLines`].
///
/// # Errors
///
/// Returns the port error if a read fails.
pub async fn pump_lines<T, M>(
    serial: &mut SerialLines<T>,
    channel: &LineChannel<M>,
) -> Result<(), T::Error>
where
    T: Read + ReadReady,
    M: RawMutex,
{
    loop {
        let line = serial.read_line().await?;
        channel.send(line).await;
    }
}

/// Status line writer
pub struct StatusWriter<W> {
    port: W,
    sent: u32,
}

impl<W: Write> StatusWriter<W> {
    /// Wrap a serial port
    #[must_use]
    pub const fn new(port: W) -> Self {
        Self { port, sent: 0 }
    }

    /// Send one status line, CR LF terminated
    ///
    /// # Errors
    ///
    /// Returns the port error if the write fails.
    pub async fn send(&mut self, status: &Status<'_>) -> Result<(), W::Error> {
        let mut line: String<STATUS_LINE_CAPACITY> = String::new();
        if write!(line, "{status}\r\n").is_err() {
            error!("status line exceeds {} bytes, not sent", STATUS_LINE_CAPACITY);
            return Ok(());
        }
        self.port.write_all(line.as_bytes()).await?;
        self.port.flush().await?;
        self.sent += 1;
        Ok(())
    }

    /// Number of lines sent
    #[must_use]
    pub const fn sent(&self) -> u32 {
        self.sent
    }

    /// Borrow the underlying port
    #[must_use]
    pub const fn port(&self) -> &W {
        &self.port
    }

    /// Release the port
    pub fn into_inner(self) -> W {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_run_is_one_terminator() {
        let mut buf = LineBuffer::new();
        buf.push(b"<TXMODE>\r\n\r\n<RXMODE>\n");
        assert_eq!(buf.read_line().unwrap().as_slice(), b"<TXMODE>");
        assert_eq!(buf.read_line().unwrap().as_slice(), b"<RXMODE>");
        assert!(buf.read_line().is_none());
    }

    #[test]
    fn overlong_line_is_discarded_whole() {
        let mut buf = LineBuffer::new();
        let long = [b'x'; SERIAL_LINE_CAPACITY + 10];
        buf.push(&long);
        buf.push(b"tail\n<TXMODE>\n");
        assert_eq!(buf.overflows(), 1);
        assert_eq!(buf.read_line().unwrap().as_slice(), b"<TXMODE>");
    }

    #[test]
    fn invalid_utf8_becomes_empty_line() {
        let mut bytes: Vec<u8, SERIAL_LINE_CAPACITY> = Vec::new();
        bytes.extend_from_slice(&[0xC3, 0x28]).unwrap();
        assert!(to_line(bytes).is_empty());
    }
}
