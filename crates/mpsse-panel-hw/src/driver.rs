//! Vendor driver binding.
//!
//! The bridge's vendor library (device enumeration, handle management, raw
//! reads and writes) lives behind these traits. Everything above this module
//! only ever sees a [`DeviceHandle`].

use std::fmt;

/// Status codes reported by the vendor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    Ok,
    InvalidHandle,
    DeviceNotFound,
    DeviceNotOpened,
    IoError,
    InsufficientResources,
    InvalidParameter,
    InvalidBaudRate,
    DeviceNotOpenedForErase,
    DeviceNotOpenedForWrite,
    FailedToWriteDevice,
    EepromReadFailed,
    EepromWriteFailed,
    EepromEraseFailed,
    EepromNotPresent,
    EepromNotProgrammed,
    InvalidArgs,
    NotSupported,
    OtherError,
    DeviceListNotReady,
    /// Code outside the documented range.
    Other(u32),
}

impl DriverStatus {
    /// Maps a raw driver status code.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => DriverStatus::Ok,
            1 => DriverStatus::InvalidHandle,
            2 => DriverStatus::DeviceNotFound,
            3 => DriverStatus::DeviceNotOpened,
            4 => DriverStatus::IoError,
            5 => DriverStatus::InsufficientResources,
            6 => DriverStatus::InvalidParameter,
            7 => DriverStatus::InvalidBaudRate,
            8 => DriverStatus::DeviceNotOpenedForErase,
            9 => DriverStatus::DeviceNotOpenedForWrite,
            10 => DriverStatus::FailedToWriteDevice,
            11 => DriverStatus::EepromReadFailed,
            12 => DriverStatus::EepromWriteFailed,
            13 => DriverStatus::EepromEraseFailed,
            14 => DriverStatus::EepromNotPresent,
            15 => DriverStatus::EepromNotProgrammed,
            16 => DriverStatus::InvalidArgs,
            17 => DriverStatus::NotSupported,
            18 => DriverStatus::OtherError,
            19 => DriverStatus::DeviceListNotReady,
            other => DriverStatus::Other(other),
        }
    }

    /// Returns the raw status code.
    pub fn code(&self) -> u32 {
        match self {
            DriverStatus::Ok => 0,
            DriverStatus::InvalidHandle => 1,
            DriverStatus::DeviceNotFound => 2,
            DriverStatus::DeviceNotOpened => 3,
            DriverStatus::IoError => 4,
            DriverStatus::InsufficientResources => 5,
            DriverStatus::InvalidParameter => 6,
            DriverStatus::InvalidBaudRate => 7,
            DriverStatus::DeviceNotOpenedForErase => 8,
            DriverStatus::DeviceNotOpenedForWrite => 9,
            DriverStatus::FailedToWriteDevice => 10,
            DriverStatus::EepromReadFailed => 11,
            DriverStatus::EepromWriteFailed => 12,
            DriverStatus::EepromEraseFailed => 13,
            DriverStatus::EepromNotPresent => 14,
            DriverStatus::EepromNotProgrammed => 15,
            DriverStatus::InvalidArgs => 16,
            DriverStatus::NotSupported => 17,
            DriverStatus::OtherError => 18,
            DriverStatus::DeviceListNotReady => 19,
            DriverStatus::Other(code) => *code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, DriverStatus::Ok)
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverStatus::Ok => "OK",
            DriverStatus::InvalidHandle => "INVALID_HANDLE",
            DriverStatus::DeviceNotFound => "DEVICE_NOT_FOUND",
            DriverStatus::DeviceNotOpened => "DEVICE_NOT_OPENED",
            DriverStatus::IoError => "IO_ERROR",
            DriverStatus::InsufficientResources => "INSUFFICIENT_RESOURCES",
            DriverStatus::InvalidParameter => "INVALID_PARAMETER",
            DriverStatus::InvalidBaudRate => "INVALID_BAUD_RATE",
            DriverStatus::DeviceNotOpenedForErase => "DEVICE_NOT_OPENED_FOR_ERASE",
            DriverStatus::DeviceNotOpenedForWrite => "DEVICE_NOT_OPENED_FOR_WRITE",
            DriverStatus::FailedToWriteDevice => "FAILED_TO_WRITE_DEVICE",
            DriverStatus::EepromReadFailed => "EEPROM_READ_FAILED",
            DriverStatus::EepromWriteFailed => "EEPROM_WRITE_FAILED",
            DriverStatus::EepromEraseFailed => "EEPROM_ERASE_FAILED",
            DriverStatus::EepromNotPresent => "EEPROM_NOT_PRESENT",
            DriverStatus::EepromNotProgrammed => "EEPROM_NOT_PROGRAMMED",
            DriverStatus::InvalidArgs => "INVALID_ARGS",
            DriverStatus::NotSupported => "NOT_SUPPORTED",
            DriverStatus::OtherError => "OTHER_ERROR",
            DriverStatus::DeviceListNotReady => "DEVICE_LIST_NOT_READY",
            DriverStatus::Other(code) => return write!(f, "status {}", code),
        };
        write!(f, "{}", name)
    }
}

/// Result of a raw driver call.
pub type DriverResult<T> = std::result::Result<T, DriverStatus>;

/// Bit modes understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BitMode {
    Reset = 0x00,
    AsyncBitBang = 0x01,
    Mpsse = 0x02,
    SyncBitBang = 0x04,
    McuHost = 0x08,
    FastSerial = 0x10,
    CbusBitBang = 0x20,
    SyncFifo = 0x40,
}

/// Buffers cleared by [`DeviceHandle::purge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeFlags(u32);

impl PurgeFlags {
    pub const RX: PurgeFlags = PurgeFlags(0x01);
    pub const TX: PurgeFlags = PurgeFlags(0x02);
    pub const ALL: PurgeFlags = PurgeFlags(0x03);

    pub fn bits(&self) -> u32 {
        self.0
    }
}

/// An open device handle.
pub trait DeviceHandle {
    /// Selects the chip's bit mode; `mask` sets the bit-bang pin directions.
    fn set_bit_mode(&mut self, mask: u8, mode: BitMode) -> DriverResult<()>;

    /// Queues bytes for the device and returns how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> DriverResult<usize>;

    /// Reads up to `max_len` bytes from the receive queue.
    fn read(&mut self, max_len: usize) -> DriverResult<Vec<u8>>;

    /// Clears the receive and/or transmit buffers.
    fn purge(&mut self, flags: PurgeFlags) -> DriverResult<()>;

    /// Sets the USB receive latency timer.
    fn set_latency_timer(&mut self, _ms: u8) -> DriverResult<()> {
        Ok(())
    }

    /// Sets the USB in/out transfer sizes.
    fn set_usb_parameters(&mut self, _in_size: u32, _out_size: u32) -> DriverResult<()> {
        Ok(())
    }

    /// Releases the handle.
    fn close(&mut self) -> DriverResult<()>;
}

/// Entry point into the vendor library.
pub trait VendorDriver {
    type Device: DeviceHandle;

    /// Opens the device at `index` in the driver's enumeration order.
    fn open(&mut self, index: u32) -> DriverResult<Self::Device>;
}
