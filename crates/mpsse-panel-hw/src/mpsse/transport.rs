//! SPI over the MPSSE engine.
//!
//! [`BitBangTransport`] owns the device handle and the in-memory GPIO state.
//! Pin changes are staged in memory and reach the chip only inside a packet,
//! so a chip-select edge, a data/command switch and the clocked bytes all
//! travel in one driver write.

use super::gpio::{Bank, GpioBank, GpioState, Pin, PinMap};
use super::opcode::{
    Transfer, DISABLE_3_PHASE_CLOCKING, DISABLE_ADAPTIVE_CLOCKING, DISABLE_CLOCK_DIVIDE_BY_5,
    LOOPBACK_OFF, MAX_CLOCK_BYTES, SEND_IMMEDIATE,
};
use super::packet::{Command, PacketBuilder, PacketSink};
use crate::driver::{BitMode, DeviceHandle, DriverStatus, PurgeFlags, VendorDriver};
use crate::{Error, Result, MASTER_CLOCK_HZ, MAX_PACKET_SIZE};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settle time after each bit mode change.
const BIT_MODE_SETTLE: Duration = Duration::from_millis(10);

/// Bytes a CS-framed transfer adds around its payload: CS assert, clock
/// header, CS release and the idle-clock restore.
const FRAME_OVERHEAD: usize = 3 + 3 + 3 + 3;

/// SPI clock polarity and phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpiMode {
    /// CPOL 0, CPHA 0.
    #[default]
    Mode0,
    /// CPOL 0, CPHA 1.
    Mode1,
    /// CPOL 1, CPHA 0.
    Mode2,
    /// CPOL 1, CPHA 1.
    Mode3,
}

impl SpiMode {
    pub const ALL: [SpiMode; 4] = [SpiMode::Mode0, SpiMode::Mode1, SpiMode::Mode2, SpiMode::Mode3];

    pub fn from_index(index: u8) -> Result<Self> {
        match index {
            0 => Ok(SpiMode::Mode0),
            1 => Ok(SpiMode::Mode1),
            2 => Ok(SpiMode::Mode2),
            3 => Ok(SpiMode::Mode3),
            other => Err(Error::InvalidSpiMode(other)),
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => 1,
            SpiMode::Mode2 => 2,
            SpiMode::Mode3 => 3,
        }
    }

    /// Idle clock level: true means SCLK rests high.
    pub fn cpol(&self) -> bool {
        matches!(self, SpiMode::Mode2 | SpiMode::Mode3)
    }

    /// Sample on the second clock edge.
    pub fn cpha(&self) -> bool {
        matches!(self, SpiMode::Mode1 | SpiMode::Mode3)
    }
}

impl TryFrom<u8> for SpiMode {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self> {
        SpiMode::from_index(index)
    }
}

impl FromStr for SpiMode {
    type Err = Error;

    /// Accepts `0`..`3` or `mode0`..`mode3`.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        let digits = lower.strip_prefix("mode").unwrap_or(lower.as_str()).trim();
        match digits.parse::<u8>() {
            Ok(index) => SpiMode::from_index(index),
            Err(_) => Err(Error::UnknownSpiMode(s.to_string())),
        }
    }
}

impl fmt::Display for SpiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mode{}", self.index())
    }
}

/// Computes the clock divisor for `clock_hz` from the engine's master clock.
///
/// `divisor = round(master / (2 * clock_hz)) - 1`, clamped to `0..=0xFFFF`.
/// A zero clock, or one faster than half the master clock, is rejected.
pub fn clock_divisor(master_hz: u32, clock_hz: u32) -> Result<u16> {
    if clock_hz == 0 || clock_hz > master_hz / 2 {
        return Err(Error::UnreachableClock(clock_hz));
    }
    let master = u64::from(master_hz);
    let clock = u64::from(clock_hz);
    let rounded = (master + clock) / (2 * clock);
    Ok(rounded.saturating_sub(1).min(0xFFFF) as u16)
}

/// Transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub mode: SpiMode,
    pub clock_hz: u32,
    /// Reference the divisor is computed against.
    pub master_clock_hz: u32,
    pub pins: PinMap,
    /// Largest single driver write.
    pub max_packet_len: usize,
    pub latency_timer_ms: u8,
    /// USB in/out transfer size.
    pub usb_transfer_size: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: SpiMode::Mode0,
            clock_hz: 1_000_000,
            master_clock_hz: MASTER_CLOCK_HZ,
            pins: PinMap::default(),
            max_packet_len: MAX_PACKET_SIZE,
            latency_timer_ms: 1,
            usb_transfer_size: 65_536,
        }
    }
}

impl TransportConfig {
    pub fn with_mode(mut self, mode: SpiMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_clock_hz(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    pub fn with_master_clock_hz(mut self, master_clock_hz: u32) -> Self {
        self.master_clock_hz = master_clock_hz;
        self
    }

    pub fn with_pins(mut self, pins: PinMap) -> Self {
        self.pins = pins;
        self
    }

    pub fn with_max_packet_len(mut self, max_packet_len: usize) -> Self {
        self.max_packet_len = max_packet_len;
        self
    }
}

/// An open SPI session on one bridge.
pub struct BitBangTransport<H: DeviceHandle> {
    handle: Option<H>,
    config: TransportConfig,
    gpio: GpioState,
    divisor: u16,
    packets_sent: u64,
}

impl<H: DeviceHandle> BitBangTransport<H> {
    /// Opens device `index`, switches it to MPSSE mode and emits the
    /// configuration preamble.
    pub fn open<D>(driver: &mut D, index: u32, config: TransportConfig) -> Result<Self>
    where
        D: VendorDriver<Device = H>,
    {
        config.pins.validate()?;
        let divisor = clock_divisor(config.master_clock_hz, config.clock_hz)?;

        let mut handle = driver
            .open(index)
            .map_err(|status| driver_error("open", status))?;

        handle
            .set_usb_parameters(config.usb_transfer_size, config.usb_transfer_size)
            .map_err(|status| driver_error("set_usb_parameters", status))?;
        handle
            .set_latency_timer(config.latency_timer_ms)
            .map_err(|status| driver_error("set_latency_timer", status))?;
        handle
            .set_bit_mode(0x00, BitMode::Reset)
            .map_err(|status| driver_error("set_bit_mode", status))?;
        std::thread::sleep(BIT_MODE_SETTLE);
        handle
            .set_bit_mode(0x00, BitMode::Mpsse)
            .map_err(|status| driver_error("set_bit_mode", status))?;
        std::thread::sleep(BIT_MODE_SETTLE);
        handle
            .purge(PurgeFlags::ALL)
            .map_err(|status| driver_error("purge", status))?;

        let mut transport = Self {
            handle: Some(handle),
            gpio: config.pins.initial_state(config.mode.cpol()),
            config,
            divisor,
            packets_sent: 0,
        };
        let gpio = transport.gpio;
        transport.send_preamble(divisor, gpio)?;

        info!(
            "MPSSE device {} opened ({}, {} Hz, divisor {})",
            index, config.mode, config.clock_hz, divisor
        );
        Ok(transport)
    }

    /// Changes SPI mode and clock, re-emitting the full preamble.
    pub fn configure(&mut self, mode: SpiMode, clock_hz: u32) -> Result<()> {
        self.ensure_connected()?;
        let divisor = clock_divisor(self.config.master_clock_hz, clock_hz)?;
        let mut gpio = self.gpio;
        gpio.set_level(self.config.pins.sclk, mode.cpol());

        self.send_preamble(divisor, gpio)?;
        self.config.mode = mode;
        self.config.clock_hz = clock_hz;
        self.divisor = divisor;
        self.gpio = gpio;
        info!("SPI configured: {}, {} Hz (divisor {})", mode, clock_hz, divisor);
        Ok(())
    }

    fn send_preamble(&mut self, divisor: u16, gpio: GpioState) -> Result<()> {
        let mut packet = PacketBuilder::new();
        for op in [
            DISABLE_CLOCK_DIVIDE_BY_5,
            DISABLE_ADAPTIVE_CLOCKING,
            DISABLE_3_PHASE_CLOCKING,
        ] {
            packet.push(Command::Control(op))?;
        }
        packet
            .push(Command::SetClockDivisor(divisor))?
            .push(Command::Control(LOOPBACK_OFF))?;
        packet
            .set_gpio(Bank::Low, gpio.low)
            .set_gpio(Bank::High, gpio.high);
        self.submit(packet).map(|_| ())
    }

    /// Stages a pin level in memory. Nothing is written until the next packet
    /// that carries the pin's bank, or [`flush_gpio`](Self::flush_gpio).
    pub fn set_pin(&mut self, pin: Pin, level: bool) -> Result<()> {
        if pin == self.config.pins.miso {
            return Err(Error::InvalidPin(pin.index()));
        }
        self.gpio.set_level(pin, level);
        Ok(())
    }

    /// Stages a pin direction. MISO can never be an output.
    pub fn set_pin_direction(&mut self, pin: Pin, output: bool) -> Result<()> {
        if output && pin == self.config.pins.miso {
            return Err(Error::InvalidPin(pin.index()));
        }
        self.gpio.set_output(pin, output);
        Ok(())
    }

    /// Writes both banks' staged state to the chip.
    pub fn flush_gpio(&mut self) -> Result<()> {
        let mut packet = self.packet();
        packet
            .set_gpio(Bank::Low, self.gpio.low)
            .set_gpio(Bank::High, self.gpio.high);
        self.submit(packet).map(|_| ())
    }

    /// Starts a packet that ends by returning SCLK to its idle level.
    pub fn packet(&self) -> PacketBuilder {
        PacketBuilder::new()
            .with_max_len(self.config.max_packet_len)
            .with_idle_restore(Bank::Low, self.idle_low_bank())
    }

    fn idle_low_bank(&self) -> GpioBank {
        let mut low = self.gpio.low;
        let sclk = self.config.pins.sclk;
        low.set_level(sclk.bit(), self.config.mode.cpol());
        low
    }

    /// Stages several pin levels, then appends one bank write per bank touched.
    pub fn stage_pins(&mut self, packet: &mut PacketBuilder, levels: &[(Pin, bool)]) -> Result<()> {
        let mut touched = [false; 2];
        for &(pin, level) in levels {
            self.set_pin(pin, level)?;
            touched[bank_slot(pin.bank())] = true;
        }
        for bank in [Bank::Low, Bank::High] {
            if touched[bank_slot(bank)] {
                packet.set_gpio(bank, *self.gpio.bank(bank));
            }
        }
        Ok(())
    }

    /// Appends a mode-appropriate clock command.
    pub fn clock_bytes(
        &self,
        packet: &mut PacketBuilder,
        payload: &[u8],
        transfer: Transfer,
    ) -> Result<()> {
        packet.push(Command::clock(self.config.mode, transfer, payload))?;
        Ok(())
    }

    /// Writes the packet in one driver write and collects its response.
    pub fn submit(&mut self, packet: PacketBuilder) -> Result<Vec<u8>> {
        self.ensure_connected()?;
        let expected = packet.finalize(self)?;
        if expected == 0 {
            return Ok(Vec::new());
        }
        self.read_exact(expected)
    }

    fn read_exact(&mut self, expected: usize) -> Result<Vec<u8>> {
        let handle = self.handle.as_mut().ok_or(Error::TransportNotConnected)?;
        let mut response = Vec::with_capacity(expected);
        while response.len() < expected {
            let chunk = handle
                .read(expected - response.len())
                .map_err(|status| driver_error("read", status))?;
            if chunk.is_empty() {
                return Err(Error::ShortRead {
                    expected,
                    actual: response.len(),
                });
            }
            response.extend_from_slice(&chunk);
        }
        Ok(response)
    }

    /// Largest payload one CS-framed write packet can carry.
    pub fn frame_capacity(&self) -> Result<usize> {
        self.chunk_capacity(Transfer::Out)
    }

    /// Largest chunk of a framed transfer. Reads also carry SEND_IMMEDIATE.
    fn chunk_capacity(&self, transfer: Transfer) -> Result<usize> {
        let overhead = FRAME_OVERHEAD + usize::from(transfer.reads());
        match self.config.max_packet_len.checked_sub(overhead) {
            Some(capacity) if capacity > 0 => Ok(capacity.min(MAX_CLOCK_BYTES)),
            _ => Err(Error::PacketTooLarge {
                size: overhead + 1,
                max: self.config.max_packet_len,
            }),
        }
    }

    fn framed(&mut self, payload: &[u8], transfer: Transfer) -> Result<Vec<u8>> {
        let cs = self.config.pins.cs;
        let mut response = Vec::new();
        for chunk in payload.chunks(self.chunk_capacity(transfer)?) {
            let mut packet = self.packet();
            self.stage_pins(&mut packet, &[(cs, false)])?;
            self.clock_bytes(&mut packet, chunk, transfer)?;
            self.stage_pins(&mut packet, &[(cs, true)])?;
            if transfer.reads() {
                packet.push(Command::Control(SEND_IMMEDIATE))?;
            }
            response.extend(self.submit(packet)?);
        }
        Ok(response)
    }

    /// Clocks `payload` out with CS asserted, splitting oversized payloads
    /// into independently framed packets.
    pub fn write(&mut self, payload: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        self.framed(payload, Transfer::Out).map(|_| ())
    }

    /// Clocks `len` bytes in with CS asserted.
    pub fn read(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure_connected()?;
        self.framed(&vec![0; len], Transfer::In)
    }

    /// Full-duplex exchange; the response has the same length as `payload`.
    pub fn transfer(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        self.ensure_connected()?;
        self.framed(payload, Transfer::InOut)
    }

    /// Clocks `write` out, then `read_len` bytes in, all under one CS
    /// assertion. Pieces that do not fit one packet continue in the next
    /// with CS still held low; it is released only after the last read.
    pub fn write_read(&mut self, write: &[u8], read_len: usize) -> Result<Vec<u8>> {
        self.ensure_connected()?;
        if write.is_empty() && read_len == 0 {
            return Ok(Vec::new());
        }
        let capacity = self.chunk_capacity(Transfer::In)?;
        let max_len = self.config.max_packet_len;
        let mode = self.config.mode;
        let cs = self.config.pins.cs;

        let reads = vec![0; read_len];
        let pieces = write
            .chunks(capacity)
            .map(|chunk| Command::clock(mode, Transfer::Out, chunk))
            .chain(
                reads
                    .chunks(capacity)
                    .map(|chunk| Command::clock(mode, Transfer::In, chunk)),
            );

        let mut response = Vec::with_capacity(read_len);
        let mut packet = self.packet();
        self.stage_pins(&mut packet, &[(cs, false)])?;
        let mut clocked = false;
        for command in pieces {
            // room for this command, the CS release and SEND_IMMEDIATE
            let needed = command.encoded_len() + 3 + 1;
            if clocked && packet.encoded_len() + needed > max_len {
                if packet.response_len() > 0 {
                    packet.push(Command::Control(SEND_IMMEDIATE))?;
                }
                response.extend(self.submit(packet)?);
                packet = self.packet();
                clocked = false;
            }
            packet.push(command)?;
            clocked = true;
        }
        self.stage_pins(&mut packet, &[(cs, true)])?;
        if packet.response_len() > 0 {
            packet.push(Command::Control(SEND_IMMEDIATE))?;
        }
        response.extend(self.submit(packet)?);
        Ok(response)
    }

    /// Samples both banks, returning `(low, high)` pin levels.
    pub fn read_gpio(&mut self) -> Result<(u8, u8)> {
        let mut packet = PacketBuilder::new().with_max_len(self.config.max_packet_len);
        packet
            .push(Command::GetGpio(Bank::Low))?
            .push(Command::GetGpio(Bank::High))?
            .push(Command::Control(SEND_IMMEDIATE))?;
        let response = self.submit(packet)?;
        match response.as_slice() {
            [low, high] => Ok((*low, *high)),
            other => Err(Error::ShortRead {
                expected: 2,
                actual: other.len(),
            }),
        }
    }

    /// Releases the device handle.
    pub fn close(&mut self) -> Result<()> {
        let mut handle = self.handle.take().ok_or(Error::TransportNotConnected)?;
        handle
            .close()
            .map_err(|status| driver_error("close", status))?;
        info!("MPSSE device closed after {} packets", self.packets_sent);
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.handle.is_some() {
            Ok(())
        } else {
            Err(Error::TransportNotConnected)
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn mode(&self) -> SpiMode {
        self.config.mode
    }

    pub fn pins(&self) -> &PinMap {
        &self.config.pins
    }

    pub fn gpio(&self) -> &GpioState {
        &self.gpio
    }

    pub fn divisor(&self) -> u16 {
        self.divisor
    }

    /// Driver writes issued since open.
    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }
}

impl<H: DeviceHandle> PacketSink for BitBangTransport<H> {
    fn write_packet(&mut self, bytes: &[u8]) -> Result<()> {
        let handle = self.handle.as_mut().ok_or(Error::TransportNotConnected)?;
        let expected = bytes.len();
        match handle.write(bytes) {
            Ok(written) if written == expected => {
                self.packets_sent += 1;
                debug!("Packet {}: {} bytes", self.packets_sent, expected);
                Ok(())
            }
            Ok(written) => Err(Error::WriteFailed {
                status: DriverStatus::Ok,
                written,
                expected,
            }),
            Err(status) => Err(Error::WriteFailed {
                status,
                written: 0,
                expected,
            }),
        }
    }
}

impl<H: DeviceHandle> Drop for BitBangTransport<H> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(status) = handle.close() {
                warn!("Failed to close MPSSE device: {}", status);
            }
        }
    }
}

impl<H: DeviceHandle> fmt::Debug for BitBangTransport<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitBangTransport")
            .field("connected", &self.handle.is_some())
            .field("config", &self.config)
            .field("gpio", &self.gpio)
            .field("divisor", &self.divisor)
            .finish()
    }
}

fn driver_error(operation: &'static str, status: DriverStatus) -> Error {
    Error::Driver { operation, status }
}

fn bank_slot(bank: Bank) -> usize {
    match bank {
        Bank::Low => 0,
        Bank::High => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureDevice, CaptureDriver};

    fn open(config: TransportConfig) -> (CaptureDriver, BitBangTransport<CaptureDevice>) {
        let mut driver = CaptureDriver::new();
        let transport = BitBangTransport::open(&mut driver, 0, config).unwrap();
        (driver, transport)
    }

    #[test]
    fn test_divisor() {
        assert_eq!(clock_divisor(12_000_000, 1_000_000), Ok(5));
        assert_eq!(clock_divisor(12_000_000, 6_000_000), Ok(0));
        assert_eq!(clock_divisor(12_000_000, 1), Ok(0xFFFF));
        assert_eq!(clock_divisor(12_000_000, 0), Err(Error::UnreachableClock(0)));
        assert_eq!(
            clock_divisor(12_000_000, 7_000_000),
            Err(Error::UnreachableClock(7_000_000))
        );
    }

    #[test]
    fn test_spi_mode_parsing() {
        assert_eq!("2".parse::<SpiMode>(), Ok(SpiMode::Mode2));
        assert_eq!("Mode3".parse::<SpiMode>(), Ok(SpiMode::Mode3));
        assert_eq!(SpiMode::from_index(4), Err(Error::InvalidSpiMode(4)));
        assert_eq!(
            "fast".parse::<SpiMode>(),
            Err(Error::UnknownSpiMode("fast".to_string()))
        );
        assert_eq!("mode7".parse::<SpiMode>(), Err(Error::InvalidSpiMode(7)));
        assert_eq!(SpiMode::Mode1.to_string(), "mode1");
        assert!(SpiMode::Mode2.cpol() && !SpiMode::Mode2.cpha());
    }

    #[test]
    fn test_open_sequence() {
        let (driver, transport) = open(TransportConfig::default());
        let log = driver.snapshot();
        assert_eq!(log.opened, vec![0]);
        assert_eq!(log.usb_parameters, Some((65_536, 65_536)));
        assert_eq!(log.latency_ms, Some(1));
        assert_eq!(
            log.bit_modes,
            vec![(0x00, BitMode::Reset), (0x00, BitMode::Mpsse)]
        );
        assert_eq!(log.purges, vec![PurgeFlags::ALL]);
        assert_eq!(
            log.writes,
            vec![vec![
                0x8A, 0x97, 0x8D, 0x86, 0x05, 0x00, 0x85, 0x80, 0x00, 0x0B, 0x82, 0x07, 0x07
            ]]
        );
        assert_eq!(transport.divisor(), 5);
    }

    #[test]
    fn test_open_rejects_bad_clock_before_touching_device() {
        let mut driver = CaptureDriver::new();
        let config = TransportConfig::default().with_clock_hz(0);
        let result = BitBangTransport::open(&mut driver, 0, config);
        assert_eq!(result.err(), Some(Error::UnreachableClock(0)));
        assert!(driver.snapshot().opened.is_empty());
    }

    #[test]
    fn test_open_failure_maps_status() {
        let mut driver = CaptureDriver::new();
        driver.fail_open(DriverStatus::DeviceNotFound);
        let result = BitBangTransport::open(&mut driver, 3, TransportConfig::default());
        assert_eq!(
            result.err(),
            Some(Error::Driver {
                operation: "open",
                status: DriverStatus::DeviceNotFound
            })
        );
    }

    #[test]
    fn test_configure_reemits_preamble_with_idle_clock() {
        let (driver, mut transport) = open(TransportConfig::default());
        driver.clear_writes();
        transport.configure(SpiMode::Mode3, 2_000_000).unwrap();
        let writes = driver.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(&writes[0][3..6], &[0x86, 0x02, 0x00]);
        assert_eq!(&writes[0][7..10], &[0x80, 0x01, 0x0B]);
        assert_eq!(transport.mode(), SpiMode::Mode3);
    }

    #[test]
    fn test_failed_configure_keeps_previous_settings() {
        let (driver, mut transport) = open(TransportConfig::default());
        driver.fail_write_at(1);
        assert!(transport.configure(SpiMode::Mode3, 2_000_000).is_err());
        assert_eq!(transport.mode(), SpiMode::Mode0);
        assert_eq!(transport.config().clock_hz, 1_000_000);
        assert_eq!(transport.divisor(), 5);
        let sclk = transport.pins().sclk;
        assert!(!transport.gpio().level(sclk));

        transport.configure(SpiMode::Mode3, 2_000_000).unwrap();
        assert_eq!(transport.mode(), SpiMode::Mode3);
        assert_eq!(transport.divisor(), 2);
    }

    #[test]
    fn test_set_pin_is_deferred() {
        let (driver, mut transport) = open(TransportConfig::default());
        driver.clear_writes();
        let reset = transport.pins().reset;
        transport.set_pin(reset, false).unwrap();
        assert_eq!(driver.write_count(), 0);
        transport.flush_gpio().unwrap();
        assert_eq!(
            driver.writes(),
            vec![vec![0x80, 0x00, 0x0B, 0x82, 0x05, 0x07, 0x80, 0x00, 0x0B]]
        );
    }

    #[test]
    fn test_miso_cannot_be_output() {
        let (_driver, mut transport) = open(TransportConfig::default());
        let miso = transport.pins().miso;
        assert_eq!(transport.set_pin(miso, true), Err(Error::InvalidPin(2)));
        assert_eq!(
            transport.set_pin_direction(miso, true),
            Err(Error::InvalidPin(2))
        );
        assert!(transport.set_pin_direction(miso, false).is_ok());
    }

    #[test]
    fn test_write_is_one_framed_packet() {
        let (driver, mut transport) = open(TransportConfig::default());
        driver.clear_writes();
        transport.write(&[0xDE, 0xAD]).unwrap();
        assert_eq!(
            driver.writes(),
            vec![vec![
                0x82, 0x03, 0x07, 0x11, 0x01, 0x00, 0xDE, 0xAD, 0x82, 0x07, 0x07, 0x80, 0x00,
                0x0B
            ]]
        );
    }

    #[test]
    fn test_write_splits_oversized_payload() {
        let config = TransportConfig::default().with_max_packet_len(32);
        let (driver, mut transport) = open(config);
        driver.clear_writes();
        transport.write(&[0x55; 45]).unwrap();
        let writes = driver.writes();
        assert_eq!(writes.len(), 3);
        for packet in &writes {
            assert!(packet.len() <= 32);
            assert_eq!(&packet[..3], &[0x82, 0x03, 0x07]);
        }
        assert_eq!(writes[2][4], 45 - 2 * 20 - 1);
    }

    #[test]
    fn test_transfer_collects_response() {
        let (driver, mut transport) = open(TransportConfig::default());
        driver.queue_response(&[0x10, 0x20, 0x30]);
        assert_eq!(transport.transfer(&[1, 2, 3]).unwrap(), vec![0x10, 0x20, 0x30]);
        let last = driver.writes().pop().unwrap();
        assert_eq!(last[3], 0x31);
        assert!(last.contains(&SEND_IMMEDIATE));
    }

    #[test]
    fn test_transfer_splits_at_packet_limit() {
        let config = TransportConfig::default().with_max_packet_len(32);
        let (driver, mut transport) = open(config);
        driver.clear_writes();
        let payload: Vec<u8> = (0..20).collect();
        driver.queue_response(&payload);
        assert_eq!(transport.transfer(&payload).unwrap(), payload);
        let writes = driver.writes();
        assert_eq!(writes.len(), 2);
        for packet in &writes {
            assert!(packet.len() <= 32);
            assert_eq!(&packet[..4], &[0x82, 0x03, 0x07, 0x31]);
        }
        assert_eq!(writes[0].len(), 32);
        assert_eq!(writes[1][4], 0);
    }

    #[test]
    fn test_full_size_transfer_splits() {
        let (driver, mut transport) = open(TransportConfig::default());
        driver.clear_writes();
        let payload = vec![0x55; MAX_PACKET_SIZE - FRAME_OVERHEAD];
        driver.queue_response(&payload);
        assert_eq!(transport.transfer(&payload).unwrap().len(), payload.len());
        let writes = driver.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|packet| packet.len() <= MAX_PACKET_SIZE));
    }

    #[test]
    fn test_write_read_holds_cs_across_phases() {
        let (driver, mut transport) = open(TransportConfig::default());
        driver.clear_writes();
        driver.queue_response(&[0xC2, 0x20]);
        assert_eq!(transport.write_read(&[0x9F], 2).unwrap(), vec![0xC2, 0x20]);
        assert_eq!(
            driver.writes(),
            vec![vec![
                0x82, 0x03, 0x07, 0x11, 0x00, 0x00, 0x9F, 0x20, 0x01, 0x00, 0x82, 0x07, 0x07,
                0x87, 0x80, 0x00, 0x0B
            ]]
        );
    }

    #[test]
    fn test_write_read_continues_frame_across_packets() {
        let config = TransportConfig::default().with_max_packet_len(32);
        let (driver, mut transport) = open(config);
        driver.clear_writes();
        let reply: Vec<u8> = (0..20).collect();
        driver.queue_response(&reply);
        assert_eq!(transport.write_read(&[0xA5; 25], 20).unwrap(), reply);

        let writes = driver.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|packet| packet.len() <= 32));
        // first packet asserts CS and leaves it asserted
        assert_eq!(&writes[0][..6], &[0x82, 0x03, 0x07, 0x11, 0x12, 0x00]);
        assert_eq!(writes[0].len(), 28);
        assert_eq!(&writes[0][25..], &[0x80, 0x00, 0x0B]);
        // second packet finishes the write, reads, then releases CS
        assert_eq!(&writes[1][..3], &[0x11, 0x05, 0x00]);
        assert_eq!(
            &writes[1][9..],
            &[0x20, 0x12, 0x00, 0x20, 0x00, 0x00, 0x82, 0x07, 0x07, 0x87, 0x80, 0x00, 0x0B]
        );
    }

    #[test]
    fn test_short_read() {
        let (driver, mut transport) = open(TransportConfig::default());
        driver.queue_response(&[0xAA]);
        assert_eq!(
            transport.read(4),
            Err(Error::ShortRead {
                expected: 4,
                actual: 1
            })
        );
    }

    #[test]
    fn test_read_gpio() {
        let (driver, mut transport) = open(TransportConfig::default());
        driver.clear_writes();
        driver.queue_response(&[0x04, 0x07]);
        assert_eq!(transport.read_gpio().unwrap(), (0x04, 0x07));
        assert_eq!(driver.writes(), vec![vec![0x81, 0x83, 0x87]]);
    }

    #[test]
    fn test_write_failures() {
        let (driver, mut transport) = open(TransportConfig::default());
        driver.fail_write_at(1);
        assert!(matches!(
            transport.write(&[1]),
            Err(Error::WriteFailed {
                status: DriverStatus::IoError,
                ..
            })
        ));
        driver.short_write_at(2);
        assert!(matches!(
            transport.write(&[1]),
            Err(Error::WriteFailed { written: 13, expected: 14, .. })
        ));
    }

    #[test]
    fn test_close() {
        let (driver, mut transport) = open(TransportConfig::default());
        transport.close().unwrap();
        assert!(driver.snapshot().closed);
        assert_eq!(transport.write(&[1]), Err(Error::TransportNotConnected));
        assert_eq!(transport.close(), Err(Error::TransportNotConnected));
    }

    #[test]
    fn test_drop_closes() {
        let (driver, transport) = open(TransportConfig::default());
        drop(transport);
        assert!(driver.snapshot().closed);
    }
}
