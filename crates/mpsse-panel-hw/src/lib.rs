//! MPSSE Panel Hardware Library
//!
//! Drives small monochrome and RGB565 SPI LCD panels through the MPSSE
//! bit-bang engine of a USB-to-SPI bridge. SPI transfers and the auxiliary
//! control lines (CS, A0/DC, RESET) are batched into single USB writes.

pub mod capture;
pub mod driver;
pub mod error;
pub mod lcd;
pub mod mpsse;

pub use capture::{CaptureDriver, CaptureLog};
pub use driver::{BitMode, DeviceHandle, DriverStatus, PurgeFlags, VendorDriver};
pub use error::{Error, Result};
pub use lcd::{
    FlushEngine, FlushReport, FlushStrategy, Font, Framebuffer, LcdDevice, PanelKind, PanelModel,
    PanelProtocol, PixelFormat,
};
pub use mpsse::{
    clock_divisor, BitBangTransport, Command, PacketBuilder, Pin, PinMap, SpiMode,
    TransportConfig,
};

/// Reference clock the divisor formula is computed against.
pub const MASTER_CLOCK_HZ: u32 = 12_000_000;

/// Largest buffer handed to the driver in a single write.
pub const MAX_PACKET_SIZE: usize = 65_536;
