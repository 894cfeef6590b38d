//! MPSSE command opcodes and clock-edge selection.
//!
//! Byte-oriented clock commands are followed by `len - 1` as a little-endian
//! 16-bit value, then (for write commands) the payload itself.

use super::transport::SpiMode;

/// Set low-bank data bits: `[0x80, value, direction]`.
pub const SET_BITS_LOW: u8 = 0x80;
/// Read low-bank data bits, one response byte.
pub const GET_BITS_LOW: u8 = 0x81;
/// Set high-bank data bits: `[0x82, value, direction]`.
pub const SET_BITS_HIGH: u8 = 0x82;
/// Read high-bank data bits, one response byte.
pub const GET_BITS_HIGH: u8 = 0x83;
pub const LOOPBACK_ON: u8 = 0x84;
pub const LOOPBACK_OFF: u8 = 0x85;
/// Set clock divisor: `[0x86, lo, hi]`.
pub const SET_CLOCK_DIVISOR: u8 = 0x86;
/// Flush the chip's response buffer back to the host immediately.
pub const SEND_IMMEDIATE: u8 = 0x87;
pub const DISABLE_CLOCK_DIVIDE_BY_5: u8 = 0x8A;
pub const DISABLE_3_PHASE_CLOCKING: u8 = 0x8D;
pub const DISABLE_ADAPTIVE_CLOCKING: u8 = 0x97;

pub const CLOCK_BYTES_OUT_RISING: u8 = 0x10;
pub const CLOCK_BYTES_OUT_FALLING: u8 = 0x11;
pub const CLOCK_BYTES_IN_RISING: u8 = 0x20;
pub const CLOCK_BYTES_IN_FALLING: u8 = 0x24;
pub const CLOCK_BYTES_OUT_FALLING_IN_RISING: u8 = 0x31;
pub const CLOCK_BYTES_OUT_RISING_IN_FALLING: u8 = 0x34;

/// Longest payload a single clock command can describe.
pub const MAX_CLOCK_BYTES: usize = 0x1_0000;

/// Direction of a clocked byte transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Host to device only (MOSI).
    Out,
    /// Device to host only (MISO).
    In,
    /// Full duplex.
    InOut,
}

impl Transfer {
    /// Returns true if the chip will send response bytes for this transfer.
    pub fn reads(&self) -> bool {
        matches!(self, Transfer::In | Transfer::InOut)
    }

    /// Returns true if the command carries a payload.
    pub fn writes(&self) -> bool {
        matches!(self, Transfer::Out | Transfer::InOut)
    }
}

/// Selects the clock command for a transfer in the given SPI mode.
///
/// Write: CPOL == CPHA clocks out on the falling edge, otherwise rising.
/// Read: modes 0 and 3 sample on the rising edge, modes 1 and 2 on falling.
/// Full duplex pairs the two.
pub fn clock_opcode(mode: SpiMode, transfer: Transfer) -> u8 {
    match (transfer, mode) {
        (Transfer::Out, SpiMode::Mode0 | SpiMode::Mode3) => CLOCK_BYTES_OUT_FALLING,
        (Transfer::Out, SpiMode::Mode1 | SpiMode::Mode2) => CLOCK_BYTES_OUT_RISING,
        (Transfer::In, SpiMode::Mode0 | SpiMode::Mode3) => CLOCK_BYTES_IN_RISING,
        (Transfer::In, SpiMode::Mode1 | SpiMode::Mode2) => CLOCK_BYTES_IN_FALLING,
        (Transfer::InOut, SpiMode::Mode0 | SpiMode::Mode3) => CLOCK_BYTES_OUT_FALLING_IN_RISING,
        (Transfer::InOut, SpiMode::Mode1 | SpiMode::Mode2) => CLOCK_BYTES_OUT_RISING_IN_FALLING,
    }
}

/// Encodes a clock command's length field (`len - 1`, little-endian).
pub fn length_field(len: usize) -> [u8; 2] {
    let field = len.saturating_sub(1) as u16;
    field.to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_opcode_table() {
        let expected = [
            (SpiMode::Mode0, 0x11, 0x20, 0x31),
            (SpiMode::Mode1, 0x10, 0x24, 0x34),
            (SpiMode::Mode2, 0x10, 0x24, 0x34),
            (SpiMode::Mode3, 0x11, 0x20, 0x31),
        ];
        for (mode, write, read, duplex) in expected {
            assert_eq!(clock_opcode(mode, Transfer::Out), write, "write {}", mode);
            assert_eq!(clock_opcode(mode, Transfer::In), read, "read {}", mode);
            assert_eq!(clock_opcode(mode, Transfer::InOut), duplex, "duplex {}", mode);
        }
    }

    #[test]
    fn test_write_edge_follows_cpol_cpha() {
        for mode in SpiMode::ALL {
            let falling = clock_opcode(mode, Transfer::Out) == CLOCK_BYTES_OUT_FALLING;
            assert_eq!(falling, mode.cpol() == mode.cpha());
        }
    }

    #[test]
    fn test_length_field() {
        assert_eq!(length_field(1), [0x00, 0x00]);
        assert_eq!(length_field(4), [0x03, 0x00]);
        assert_eq!(length_field(300), [0x2B, 0x01]);
        assert_eq!(length_field(MAX_CLOCK_BYTES), [0xFF, 0xFF]);
    }
}
