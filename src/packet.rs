//! Packet Handling
//!
//! Over-the-radio record format, per-chunk validation and transfer
//! progress tracking for the receive path.

pub mod checksum;
pub mod header;
pub mod progress;
pub mod reassembler;
pub mod record;
