//! GPIO bank state for the bridge's two 8-bit data ports.

use super::opcode::{GET_BITS_HIGH, GET_BITS_LOW, SET_BITS_HIGH, SET_BITS_LOW};
use crate::{Error, Result};

/// Number of addressable pins across both banks.
pub const PIN_COUNT: u8 = 16;

/// One of the bridge's two 8-bit GPIO ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    /// ADBUS: carries SCLK, MOSI and MISO.
    Low,
    /// ACBUS.
    High,
}

impl Bank {
    /// Opcode that drives this bank.
    pub fn set_opcode(&self) -> u8 {
        match self {
            Bank::Low => SET_BITS_LOW,
            Bank::High => SET_BITS_HIGH,
        }
    }

    /// Opcode that samples this bank.
    pub fn get_opcode(&self) -> u8 {
        match self {
            Bank::Low => GET_BITS_LOW,
            Bank::High => GET_BITS_HIGH,
        }
    }
}

/// A pin index, 0..=7 in the low bank and 8..=15 in the high bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pin(u8);

impl Pin {
    /// Creates a pin, rejecting indices outside both banks.
    pub fn new(index: u8) -> Result<Self> {
        if index < PIN_COUNT {
            Ok(Self(index))
        } else {
            Err(Error::InvalidPin(index))
        }
    }

    const fn fixed(index: u8) -> Self {
        Self(index)
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn bank(&self) -> Bank {
        if self.0 < 8 {
            Bank::Low
        } else {
            Bank::High
        }
    }

    /// Bit position within the pin's bank.
    pub fn bit(&self) -> u8 {
        self.0 % 8
    }

    pub fn mask(&self) -> u8 {
        1 << self.bit()
    }
}

impl TryFrom<u8> for Pin {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self> {
        Pin::new(index)
    }
}

impl std::fmt::Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.bank() {
            Bank::Low => write!(f, "AD{}", self.bit()),
            Bank::High => write!(f, "AC{}", self.bit()),
        }
    }
}

/// Direction and level of one bank. A set direction bit is an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpioBank {
    pub direction: u8,
    pub value: u8,
}

impl GpioBank {
    pub fn new(value: u8, direction: u8) -> Self {
        Self { direction, value }
    }

    /// Drives `bit` to `level`, marking it as an output.
    pub fn set_level(&mut self, bit: u8, level: bool) {
        let mask = 1 << bit;
        if level {
            self.value |= mask;
        } else {
            self.value &= !mask;
        }
        self.direction |= mask;
    }

    pub fn set_output(&mut self, bit: u8, output: bool) {
        let mask = 1 << bit;
        if output {
            self.direction |= mask;
        } else {
            self.direction &= !mask;
        }
    }

    pub fn level(&self, bit: u8) -> bool {
        self.value & (1 << bit) != 0
    }

    pub fn is_output(&self, bit: u8) -> bool {
        self.direction & (1 << bit) != 0
    }
}

/// In-memory state of both banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpioState {
    pub low: GpioBank,
    pub high: GpioBank,
}

impl GpioState {
    pub fn bank(&self, bank: Bank) -> &GpioBank {
        match bank {
            Bank::Low => &self.low,
            Bank::High => &self.high,
        }
    }

    pub fn bank_mut(&mut self, bank: Bank) -> &mut GpioBank {
        match bank {
            Bank::Low => &mut self.low,
            Bank::High => &mut self.high,
        }
    }

    pub fn set_level(&mut self, pin: Pin, level: bool) {
        self.bank_mut(pin.bank()).set_level(pin.bit(), level);
    }

    pub fn set_output(&mut self, pin: Pin, output: bool) {
        self.bank_mut(pin.bank()).set_output(pin.bit(), output);
    }

    pub fn level(&self, pin: Pin) -> bool {
        self.bank(pin.bank()).level(pin.bit())
    }

    pub fn is_output(&self, pin: Pin) -> bool {
        self.bank(pin.bank()).is_output(pin.bit())
    }
}

/// Assignment of logical signals to bridge pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub sclk: Pin,
    pub mosi: Pin,
    pub miso: Pin,
    pub cs: Pin,
    pub a0: Pin,
    pub reset: Pin,
    /// Additional pins driven low as outputs at start-up, one bit per pin.
    pub extra_outputs: u16,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            sclk: Pin::fixed(0),
            mosi: Pin::fixed(1),
            miso: Pin::fixed(2),
            cs: Pin::fixed(10),
            a0: Pin::fixed(8),
            reset: Pin::fixed(9),
            extra_outputs: 1 << 3,
        }
    }
}

impl PinMap {
    /// Builds a map from raw indices.
    pub fn from_indices(sclk: u8, mosi: u8, miso: u8, cs: u8, a0: u8, reset: u8) -> Result<Self> {
        let map = Self {
            sclk: Pin::new(sclk)?,
            mosi: Pin::new(mosi)?,
            miso: Pin::new(miso)?,
            cs: Pin::new(cs)?,
            a0: Pin::new(a0)?,
            reset: Pin::new(reset)?,
            extra_outputs: 0,
        };
        map.validate()?;
        Ok(map)
    }

    pub fn with_extra_outputs(mut self, mask: u16) -> Self {
        self.extra_outputs = mask;
        self
    }

    fn outputs(&self) -> [Pin; 5] {
        [self.sclk, self.mosi, self.cs, self.a0, self.reset]
    }

    /// Checks that no signal shares a pin and that the engine's fixed
    /// SCLK/MOSI/MISO positions in the low bank are respected.
    pub fn validate(&self) -> Result<()> {
        let all = [self.sclk, self.mosi, self.miso, self.cs, self.a0, self.reset];
        for (i, pin) in all.iter().enumerate() {
            if all[i + 1..].contains(pin) {
                return Err(Error::InvalidPin(pin.index()));
            }
        }
        for (pin, expected) in [(self.sclk, 0), (self.mosi, 1), (self.miso, 2)] {
            if pin.index() != expected {
                return Err(Error::InvalidPin(pin.index()));
            }
        }
        if self.extra_outputs & (1 << self.miso.index()) != 0 {
            return Err(Error::InvalidPin(self.miso.index()));
        }
        Ok(())
    }

    /// Start-up state: every signal an output except MISO, CS deasserted,
    /// RESET released, A0 high, and SCLK at its idle level for `cpol`.
    pub fn initial_state(&self, cpol: bool) -> GpioState {
        let mut state = GpioState::default();
        for index in 0..PIN_COUNT {
            if self.extra_outputs & (1 << index) != 0 {
                state.set_level(Pin::fixed(index), false);
            }
        }
        for pin in self.outputs() {
            state.set_level(pin, false);
        }
        state.set_level(self.sclk, cpol);
        state.set_level(self.cs, true);
        state.set_level(self.reset, true);
        state.set_level(self.a0, true);
        state.set_output(self.miso, false);
        state
    }
}
