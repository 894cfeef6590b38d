//! Packet composition.
//!
//! A packet is an ordered list of commands serialized into one contiguous
//! buffer and handed to the driver in a single write, so a GPIO change, a
//! clocked transfer and a second GPIO change cost one USB frame, not three.

use super::gpio::{Bank, GpioBank};
use super::opcode::{self, Transfer, MAX_CLOCK_BYTES, SET_CLOCK_DIVISOR};
use super::transport::SpiMode;
use crate::{Error, Result, MAX_PACKET_SIZE};

/// One engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Drive a bank: `[set_opcode, value, direction]`.
    SetGpio {
        bank: Bank,
        value: u8,
        direction: u8,
    },
    /// Clock a payload out (or out and in, depending on the opcode).
    ClockBytes { opcode: u8, payload: Vec<u8> },
    /// Clock `len` bytes in without driving data.
    ClockBytesIn { opcode: u8, len: usize },
    /// Sample a bank, producing one response byte.
    GetGpio(Bank),
    SetClockDivisor(u16),
    /// A single-byte opcode with no arguments.
    Control(u8),
}

impl Command {
    pub fn set_gpio(bank: Bank, state: GpioBank) -> Self {
        Command::SetGpio {
            bank,
            value: state.value,
            direction: state.direction,
        }
    }

    /// Builds the mode-appropriate clock command for a transfer.
    ///
    /// For [`Transfer::In`] only the payload length is used.
    pub fn clock(mode: SpiMode, transfer: Transfer, payload: &[u8]) -> Self {
        let opcode = opcode::clock_opcode(mode, transfer);
        if transfer.writes() {
            Command::ClockBytes {
                opcode,
                payload: payload.to_vec(),
            }
        } else {
            Command::ClockBytesIn {
                opcode,
                len: payload.len(),
            }
        }
    }

    /// Number of bytes this command occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match self {
            Command::SetGpio { .. } => 3,
            Command::ClockBytes { payload, .. } => 3 + payload.len(),
            Command::ClockBytesIn { .. } => 3,
            Command::GetGpio(_) => 1,
            Command::SetClockDivisor(_) => 3,
            Command::Control(_) => 1,
        }
    }

    /// Number of bytes the chip sends back for this command.
    pub fn response_len(&self) -> usize {
        match self {
            Command::ClockBytes { opcode, payload } if opcode & 0x20 != 0 => payload.len(),
            Command::ClockBytesIn { len, .. } => *len,
            Command::GetGpio(_) => 1,
            _ => 0,
        }
    }

    fn clocked_len(&self) -> usize {
        match self {
            Command::ClockBytes { payload, .. } => payload.len(),
            Command::ClockBytesIn { len, .. } => *len,
            _ => 0,
        }
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Command::SetGpio {
                bank,
                value,
                direction,
            } => out.extend_from_slice(&[bank.set_opcode(), *value, *direction]),
            Command::ClockBytes { opcode, payload } => {
                out.push(*opcode);
                out.extend_from_slice(&opcode::length_field(payload.len()));
                out.extend_from_slice(payload);
            }
            Command::ClockBytesIn { opcode, len } => {
                out.push(*opcode);
                out.extend_from_slice(&opcode::length_field(*len));
            }
            Command::GetGpio(bank) => out.push(bank.get_opcode()),
            Command::SetClockDivisor(divisor) => {
                out.push(SET_CLOCK_DIVISOR);
                out.extend_from_slice(&divisor.to_le_bytes());
            }
            Command::Control(op) => out.push(*op),
        }
    }
}

/// Receives finalized packets. Each call is exactly one underlying write.
pub trait PacketSink {
    fn write_packet(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Accumulates commands without touching the device.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    commands: Vec<Command>,
    idle_restore: Option<Command>,
    max_len: usize,
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketBuilder {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            idle_restore: None,
            max_len: MAX_PACKET_SIZE,
        }
    }

    /// Caps the serialized size.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Appends a bank write after every other command when serialized,
    /// returning the clock line to its idle level.
    pub fn with_idle_restore(mut self, bank: Bank, state: GpioBank) -> Self {
        self.idle_restore = Some(Command::set_gpio(bank, state));
        self
    }

    /// Appends a command. Clock commands with an empty payload are dropped.
    pub fn push(&mut self, command: Command) -> Result<&mut Self> {
        let clocked = command.clocked_len();
        if clocked > MAX_CLOCK_BYTES {
            return Err(Error::PacketTooLarge {
                size: clocked,
                max: MAX_CLOCK_BYTES,
            });
        }
        let is_clock = matches!(
            command,
            Command::ClockBytes { .. } | Command::ClockBytesIn { .. }
        );
        if !(is_clock && clocked == 0) {
            self.commands.push(command);
        }
        Ok(self)
    }

    pub fn set_gpio(&mut self, bank: Bank, state: GpioBank) -> &mut Self {
        self.commands.push(Command::set_gpio(bank, state));
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Bytes the packet will occupy, including idle restoration.
    pub fn encoded_len(&self) -> usize {
        self.commands
            .iter()
            .chain(self.idle_restore.iter())
            .map(Command::encoded_len)
            .sum()
    }

    /// Bytes the chip will send back once the packet executes.
    pub fn response_len(&self) -> usize {
        self.commands.iter().map(Command::response_len).sum()
    }

    /// Serializes all commands into one buffer.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let size = self.encoded_len();
        if size > self.max_len {
            return Err(Error::PacketTooLarge {
                size,
                max: self.max_len,
            });
        }
        let mut out = Vec::with_capacity(size);
        for command in self.commands.iter().chain(self.idle_restore.iter()) {
            command.encode_into(&mut out);
        }
        Ok(out)
    }

    /// Serializes and writes the packet once. Returns the expected response length.
    pub fn finalize<S: PacketSink + ?Sized>(self, sink: &mut S) -> Result<usize> {
        let bytes = self.serialize()?;
        sink.write_packet(&bytes)?;
        Ok(self.response_len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl PacketSink for Vec<Vec<u8>> {
        fn write_packet(&mut self, bytes: &[u8]) -> Result<()> {
            self.push(bytes.to_vec());
            Ok(())
        }
    }

    fn cs_bracket() -> (GpioBank, GpioBank) {
        (GpioBank::new(0x03, 0x07), GpioBank::new(0x07, 0x07))
    }

    #[test]
    fn test_gpio_clock_gpio_is_one_buffer() {
        let (active, idle) = cs_bracket();
        let mut packet = PacketBuilder::new().with_idle_restore(Bank::Low, GpioBank::new(0x00, 0x0B));
        packet.set_gpio(Bank::High, active);
        packet
            .push(Command::clock(SpiMode::Mode0, Transfer::Out, &[1, 2, 3, 4]))
            .unwrap();
        packet.set_gpio(Bank::High, idle);

        assert_eq!(packet.encoded_len(), 3 + 3 + (3 + 4) + 3);

        let mut sink: Vec<Vec<u8>> = Vec::new();
        let response = packet.finalize(&mut sink).unwrap();
        assert_eq!(response, 0);
        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink[0],
            vec![
                0x82, 0x03, 0x07, // CS low
                0x11, 0x03, 0x00, 1, 2, 3, 4, // clock out, falling edge
                0x82, 0x07, 0x07, // CS high
                0x80, 0x00, 0x0B, // clock idle
            ]
        );
    }

    #[test]
    fn test_without_idle_restore() {
        let (active, idle) = cs_bracket();
        let mut packet = PacketBuilder::new();
        packet.set_gpio(Bank::High, active);
        packet
            .push(Command::clock(SpiMode::Mode0, Transfer::Out, &[1, 2, 3, 4]))
            .unwrap();
        packet.set_gpio(Bank::High, idle);
        assert_eq!(packet.serialize().unwrap().len(), 13);
    }

    #[test]
    fn test_response_len() {
        let mut packet = PacketBuilder::new();
        packet
            .push(Command::clock(SpiMode::Mode1, Transfer::In, &[0; 5]))
            .unwrap()
            .push(Command::clock(SpiMode::Mode1, Transfer::InOut, &[9; 3]))
            .unwrap()
            .push(Command::GetGpio(Bank::High))
            .unwrap()
            .push(Command::clock(SpiMode::Mode1, Transfer::Out, &[7; 8]))
            .unwrap();
        assert_eq!(packet.response_len(), 5 + 3 + 1);
        let bytes = packet.serialize().unwrap();
        assert_eq!(&bytes[..3], &[0x24, 0x04, 0x00]);
        assert_eq!(&bytes[3..6], &[0x34, 0x02, 0x00]);
    }

    #[test]
    fn test_empty_clock_is_dropped() {
        let mut packet = PacketBuilder::new();
        packet
            .push(Command::clock(SpiMode::Mode0, Transfer::Out, &[]))
            .unwrap();
        assert!(packet.is_empty());
    }

    #[test]
    fn test_too_large() {
        let mut packet = PacketBuilder::new().with_max_len(16);
        packet
            .push(Command::clock(SpiMode::Mode0, Transfer::Out, &[0; 14]))
            .unwrap();
        let mut sink: Vec<Vec<u8>> = Vec::new();
        assert_eq!(
            packet.finalize(&mut sink),
            Err(Error::PacketTooLarge { size: 17, max: 16 })
        );
        assert!(sink.is_empty());

        let mut packet = PacketBuilder::new();
        let oversized = vec![0; MAX_CLOCK_BYTES + 1];
        assert!(matches!(
            packet.push(Command::clock(SpiMode::Mode0, Transfer::Out, &oversized)),
            Err(Error::PacketTooLarge { .. })
        ));
    }

    #[test]
    fn test_divisor_and_control_encoding() {
        let mut out = Vec::new();
        Command::SetClockDivisor(0x1234).encode_into(&mut out);
        Command::Control(0x85).encode_into(&mut out);
        assert_eq!(out, vec![0x86, 0x34, 0x12, 0x85]);
    }
}
