//! MPSSE engine: opcodes, GPIO banks, packet composition and the SPI transport.

pub mod gpio;
pub mod opcode;
pub mod packet;
pub mod transport;

pub use gpio::{Bank, GpioBank, GpioState, Pin, PinMap};
pub use opcode::Transfer;
pub use packet::{Command, PacketBuilder, PacketSink};
pub use transport::{clock_divisor, BitBangTransport, SpiMode, TransportConfig};
