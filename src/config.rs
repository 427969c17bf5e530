//! System configuration and protocol constants
//!
//! This module defines compile-time constants for the bridge.
//! Buffer capacities, radio defaults and field limits are centralized here.

/// Serial link baud rate
pub const SERIAL_BAUD_RATE: u32 = 115_200;

/// Default startup frequency (868 MHz SRD band)
pub const DEFAULT_FREQUENCY_MHZ: f32 = 868.0;

/// Default over-the-air bit rate in kbps
pub const DEFAULT_BIT_RATE_KBPS: f32 = 1.2;

/// Default receiver bandwidth in kHz
pub const DEFAULT_RX_BANDWIDTH_KHZ: f32 = 58.0;

/// Default FSK frequency deviation in kHz
pub const DEFAULT_FREQUENCY_DEVIATION_KHZ: f32 = 5.0;

/// Default transmit power in dBm
pub const DEFAULT_OUTPUT_POWER_DBM: i8 = 10;

/// Maximum number of payloads waiting for transmission
pub const TX_QUEUE_CAPACITY: usize = 50;

/// Largest record the transceiver carries in one packet
pub const MAX_RECORD_LEN: usize = 255;

/// Largest payload accepted from a `<DATA|...>` command
pub const MAX_PAYLOAD_LEN: usize = MAX_RECORD_LEN;

/// Serial command line buffer size
pub const SERIAL_LINE_CAPACITY: usize = 512;

/// Bytes pulled from the serial link per read
pub const SERIAL_READ_CHUNK: usize = 64;

/// Outbound status line buffer size
pub const STATUS_LINE_CAPACITY: usize = SERIAL_LINE_CAPACITY + 64;

/// Capacity of re-encoded JSON forwarded as `<DATA|...>`
pub const FORWARD_JSON_CAPACITY: usize = 2 * MAX_RECORD_LEN;

/// Capacity of a decoder diagnostic message
pub const JSON_DIAGNOSTIC_CAPACITY: usize = 64;

/// Packet type tag capacity (excluding terminator)
pub const TYPE_TAG_CAPACITY: usize = 7;

/// Filename capacity (excluding terminator)
pub const FILENAME_CAPACITY: usize = 31;

/// Checksum field capacity: two hex digits
pub const CHECKSUM_CAPACITY: usize = 2;

/// Chunks tracked per transfer
pub const MAX_TRACKED_CHUNKS: usize = 2048;

/// Depth of the inter-task line channel
pub const LINE_CHANNEL_DEPTH: usize = 4;

/// Transceiver configuration applied at startup
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadioConfig {
    /// Carrier frequency in MHz
    pub frequency_mhz: f32,
    /// Bit rate in kbps
    pub bit_rate_kbps: f32,
    /// Receiver filter bandwidth in kHz
    pub rx_bandwidth_khz: f32,
    /// Frequency deviation in kHz
    pub frequency_deviation_khz: f32,
    /// Output power in dBm
    pub output_power_dbm: i8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_mhz: DEFAULT_FREQUENCY_MHZ,
            bit_rate_kbps: DEFAULT_BIT_RATE_KBPS,
            rx_bandwidth_khz: DEFAULT_RX_BANDWIDTH_KHZ,
            frequency_deviation_khz: DEFAULT_FREQUENCY_DEVIATION_KHZ,
            output_power_dbm: DEFAULT_OUTPUT_POWER_DBM,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Radio({} MHz, {} kbps, bw {} kHz, dev {} kHz, {} dBm)",
            self.frequency_mhz,
            self.bit_rate_kbps,
            self.rx_bandwidth_khz,
            self.frequency_deviation_khz,
            self.output_power_dbm
        );
    }
}

/// Bridge behaviour switches
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BridgeConfig {
    /// Startup radio configuration
    pub radio: RadioConfig,
    /// Apply the defaulted command when a line is malformed
    ///
    /// When `false`, malformed lines are logged and dropped.
    pub apply_lenient_commands: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            radio: RadioConfig::default(),
            apply_lenient_commands: true,
        }
    }
}

impl BridgeConfig {
    /// Configuration that drops malformed command lines
    #[must_use]
    pub fn strict() -> Self {
        Self {
            apply_lenient_commands: false,
            ..Self::default()
        }
    }
}
