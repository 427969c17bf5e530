//! Radio Link State
//!
//! Frequency and direction of the link, owned by the scheduler.
//! Transitions return new instances, following the same immutable
//! style as the rest of the radio logic.

use crate::config::DEFAULT_FREQUENCY_MHZ;
use crate::types::{FileTransfer, LinkMode};

/// Current link configuration
#[derive(Clone, Debug, PartialEq)]
pub struct RadioLinkState {
    /// Carrier frequency in MHz
    frequency_mhz: f32,
    /// Transmit or receive
    mode: LinkMode,
    /// Last file announced by the host
    announced: Option<FileTransfer>,
}

impl RadioLinkState {
    /// Create a link state at `frequency_mhz` in transmit mode
    #[must_use]
    pub const fn new(frequency_mhz: f32) -> Self {
        Self {
            frequency_mhz,
            mode: LinkMode::Transmit,
            announced: None,
        }
    }

    /// Get carrier frequency in MHz
    #[must_use]
    pub const fn frequency_mhz(&self) -> f32 {
        self.frequency_mhz
    }

    /// Get link mode
    #[must_use]
    pub const fn mode(&self) -> LinkMode {
        self.mode
    }

    /// Last announced file, if any
    #[must_use]
    pub const fn announced(&self) -> Option<&FileTransfer> {
        self.announced.as_ref()
    }

    /// Set frequency (returns new state)
    #[must_use]
    pub fn with_frequency(self, frequency_mhz: f32) -> Self {
        Self {
            frequency_mhz,
            ..self
        }
    }

    /// Set mode (returns new state)
    #[must_use]
    pub fn with_mode(self, mode: LinkMode) -> Self {
        Self { mode, ..self }
    }

    /// Record a file announcement (returns new state)
    #[must_use]
    pub fn with_announced(self, transfer: FileTransfer) -> Self {
        Self {
            announced: Some(transfer),
            ..self
        }
    }
}

impl Default for RadioLinkState {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY_MHZ)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioLinkState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Link({} MHz, {})", self.frequency_mhz, self.mode);
    }
}
