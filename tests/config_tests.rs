//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --test config_tests

use rf_bridge::config::*;

// =============================================================================
// Serial Link Tests
// =============================================================================

#[test]
fn baud_rate_standard() {
    assert_eq!(SERIAL_BAUD_RATE, 115_200);
}

#[test]
fn serial_line_fits_data_command() {
    // "<DATA|" + payload + ">"
    assert!(SERIAL_LINE_CAPACITY >= MAX_PAYLOAD_LEN + 7);
}

#[test]
fn status_line_fits_forwarded_record() {
    // "<DATA|" + json + ">\r\n"
    assert!(STATUS_LINE_CAPACITY >= FORWARD_JSON_CAPACITY + 9);
}

#[test]
fn read_chunk_smaller_than_line() {
    assert!(SERIAL_READ_CHUNK > 0);
    assert!(SERIAL_READ_CHUNK < SERIAL_LINE_CAPACITY);
}

// =============================================================================
// Record Limit Tests
// =============================================================================

#[test]
fn header_field_limits() {
    assert_eq!(TYPE_TAG_CAPACITY, 7);
    assert_eq!(FILENAME_CAPACITY, 31);
    assert_eq!(CHECKSUM_CAPACITY, 2);
}

#[test]
fn payload_fits_one_record() {
    assert!(MAX_PAYLOAD_LEN <= MAX_RECORD_LEN);
}

#[test]
fn tracked_chunks_whole_words() {
    assert_eq!(MAX_TRACKED_CHUNKS % 32, 0);
    assert!(MAX_TRACKED_CHUNKS <= usize::from(u16::MAX));
}

#[test]
fn queue_capacity() {
    assert_eq!(TX_QUEUE_CAPACITY, 50);
}

// =============================================================================
// Radio Defaults Tests
// =============================================================================

#[test]
fn radio_config_defaults() {
    let radio = RadioConfig::default();
    assert_eq!(radio.frequency_mhz, 868.0);
    assert_eq!(radio.bit_rate_kbps, 1.2);
    assert_eq!(radio.rx_bandwidth_khz, 58.0);
    assert_eq!(radio.frequency_deviation_khz, 5.0);
    assert_eq!(radio.output_power_dbm, 10);
}

#[test]
fn default_frequency_in_sub_ghz_band() {
    assert!(DEFAULT_FREQUENCY_MHZ > 300.0 && DEFAULT_FREQUENCY_MHZ < 1000.0);
}

#[test]
fn bridge_config_lenient_by_default() {
    let config = BridgeConfig::default();
    assert!(config.apply_lenient_commands);
    assert_eq!(config.radio, RadioConfig::default());
}

#[test]
fn bridge_config_strict() {
    let config = BridgeConfig::strict();
    assert!(!config.apply_lenient_commands);
    assert_eq!(config.radio, RadioConfig::default());
}
