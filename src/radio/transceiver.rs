//! Transceiver Interface
//!
//! The physical radio driver lives outside this crate. Anything that can
//! configure itself, send a packet and wait for one can drive the bridge.

use core::fmt::Debug;

use crate::config::RadioConfig;

/// Error reported by a transceiver driver
pub trait RadioError: Debug {
    /// Numeric driver status code, reported to the host on init failure
    fn code(&self) -> i16;

    /// Check if this is a receive timeout rather than a fault
    fn is_timeout(&self) -> bool {
        false
    }
}

/// Sub-GHz packet transceiver
///
/// Calls may block for the driver's own hardware timeout; the bridge
/// adds no timeout of its own.
#[allow(async_fn_in_trait)]
pub trait Transceiver {
    /// Driver error type
    type Error: RadioError;

    /// Initialize the radio and apply `config`
    async fn begin(&mut self, config: &RadioConfig) -> Result<(), Self::Error>;

    /// Retune the carrier
    async fn set_frequency(&mut self, mhz: f32) -> Result<(), Self::Error>;

    /// Send one packet
    async fn transmit(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Wait for one packet, returning its length in `buf`
    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}
