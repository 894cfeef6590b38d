//! Error types for the MPSSE panel hardware library.

use crate::driver::DriverStatus;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the bridge or the panel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Operation attempted before open or after close.
    #[error("transport not connected")]
    TransportNotConnected,

    /// The driver rejected a write or accepted fewer bytes than requested.
    #[error("device write failed ({status}): {written} of {expected} bytes written")]
    WriteFailed {
        status: DriverStatus,
        written: usize,
        expected: usize,
    },

    /// A non-write driver call reported a failure status.
    #[error("driver {operation} failed: {status}")]
    Driver {
        operation: &'static str,
        status: DriverStatus,
    },

    /// The device returned fewer response bytes than the packet clocked in.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// Pin index outside the two 8-bit banks, or MISO used as an output.
    #[error("invalid pin: {0}")]
    InvalidPin(u8),

    /// SPI mode outside 0..=3.
    #[error("invalid SPI mode: {0}")]
    InvalidSpiMode(u8),

    /// SPI mode text that is not a mode number.
    #[error("invalid SPI mode: {0}")]
    UnknownSpiMode(String),

    /// Requested SPI clock cannot be produced by the divisor.
    #[error("unreachable SPI clock: {0} Hz")]
    UnreachableClock(u32),

    /// Packet would exceed the transport's maximum single write.
    #[error("packet too large: {size} bytes (max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// Panel used before a successful reset and init sequence.
    #[error("panel not initialized")]
    PanelNotInitialized,

    /// Framebuffer size mismatch.
    #[error("Framebuffer size mismatch: expected {expected}, got {actual}")]
    FramebufferSize { expected: usize, actual: usize },

    /// Unknown panel model name.
    #[error("Invalid panel model: {0}")]
    InvalidPanel(String),

    /// Unknown flush strategy name.
    #[error("Invalid flush strategy: {0}")]
    InvalidFlushStrategy(String),
}
