//! Command/data framing over the SPI transport.
//!
//! Every panel byte travels with A0 (data/command select) set to the right
//! level and CS asserted. A [`PanelTransaction`] groups bytes so that CS is
//! asserted once, A0 toggles in place between runs, and the whole sequence
//! goes out as one packet.

use super::panel::{InitStep, ResetTiming};
use crate::driver::DeviceHandle;
use crate::mpsse::opcode::{Transfer, MAX_CLOCK_BYTES, SEND_IMMEDIATE};
use crate::mpsse::{BitBangTransport, Command, PacketBuilder};
use crate::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Encoded size of one bank write.
const GPIO_LEN: usize = 3;
/// Encoded size of a clock command header.
const CLOCK_HEADER_LEN: usize = 3;

/// A run of bytes sharing one A0 level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub is_data: bool,
    pub bytes: Vec<u8>,
}

impl Segment {
    pub fn command(bytes: &[u8]) -> Self {
        Self {
            is_data: false,
            bytes: bytes.to_vec(),
        }
    }

    pub fn data(bytes: &[u8]) -> Self {
        Self {
            is_data: true,
            bytes: bytes.to_vec(),
        }
    }
}

/// Ordered command and data bytes sent under one CS assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelTransaction {
    segments: Vec<Segment>,
}

impl PanelTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(&mut self, byte: u8) -> &mut Self {
        self.push(false, &[byte])
    }

    pub fn data(&mut self, byte: u8) -> &mut Self {
        self.push(true, &[byte])
    }

    pub fn data_block(&mut self, bytes: &[u8]) -> &mut Self {
        self.push(true, bytes)
    }

    fn push(&mut self, is_data: bool, bytes: &[u8]) -> &mut Self {
        if bytes.is_empty() {
            return self;
        }
        match self.segments.last_mut() {
            Some(last) if last.is_data == is_data => last.bytes.extend_from_slice(bytes),
            _ => self.segments.push(Segment {
                is_data,
                bytes: bytes.to_vec(),
            }),
        }
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total panel bytes carried.
    pub fn payload_len(&self) -> usize {
        self.segments.iter().map(|s| s.bytes.len()).sum()
    }
}

struct OpenPacket {
    builder: PacketBuilder,
    a0: bool,
    payload: usize,
}

/// Panel command/data protocol on top of a [`BitBangTransport`].
#[derive(Debug)]
pub struct PanelProtocol<H: DeviceHandle> {
    transport: BitBangTransport<H>,
}

impl<H: DeviceHandle> PanelProtocol<H> {
    pub fn new(transport: BitBangTransport<H>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &BitBangTransport<H> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut BitBangTransport<H> {
        &mut self.transport
    }

    /// Sends one command byte as its own packet.
    pub fn send_command(&mut self, byte: u8) -> Result<()> {
        let mut tx = PanelTransaction::new();
        tx.command(byte);
        self.submit(&tx).map(|_| ())
    }

    /// Sends one data byte as its own packet.
    pub fn send_data(&mut self, byte: u8) -> Result<()> {
        let mut tx = PanelTransaction::new();
        tx.data(byte);
        self.submit(&tx).map(|_| ())
    }

    /// Sends a data block, split into CS-framed packets only if it exceeds
    /// the transport's packet limit.
    pub fn send_data_block(&mut self, bytes: &[u8]) -> Result<()> {
        let mut tx = PanelTransaction::new();
        tx.data_block(bytes);
        self.submit(&tx).map(|_| ())
    }

    /// Sends a transaction and returns the number of packets written.
    pub fn submit(&mut self, tx: &PanelTransaction) -> Result<usize> {
        if tx.is_empty() {
            return Ok(0);
        }
        if !self.transport.is_connected() {
            return Err(Error::TransportNotConnected);
        }
        let result = self.submit_packets(tx);
        if result.is_err() {
            let cs = self.transport.pins().cs;
            self.transport.set_pin(cs, true)?;
        }
        result
    }

    fn submit_packets(&mut self, tx: &PanelTransaction) -> Result<usize> {
        let max_len = self.transport.config().max_packet_len;
        let a0_pin = self.transport.pins().a0;
        let mut packets = 0;
        let mut open: Option<OpenPacket> = None;

        for segment in tx.segments() {
            let mut rest = segment.bytes.as_slice();
            while !rest.is_empty() {
                let mut current = match open.take() {
                    Some(current) => current,
                    None => self.begin(segment.is_data)?,
                };
                let switch = if current.a0 == segment.is_data { 0 } else { GPIO_LEN };
                let used = current.builder.encoded_len() + switch + CLOCK_HEADER_LEN + GPIO_LEN;
                let room = max_len.saturating_sub(used).min(MAX_CLOCK_BYTES);
                if room == 0 {
                    if current.payload == 0 {
                        return Err(Error::PacketTooLarge {
                            size: used + 1,
                            max: max_len,
                        });
                    }
                    self.finish(current)?;
                    packets += 1;
                    continue;
                }
                if switch > 0 {
                    self.transport
                        .stage_pins(&mut current.builder, &[(a0_pin, segment.is_data)])?;
                    current.a0 = segment.is_data;
                }
                let (chunk, tail) = rest.split_at(room.min(rest.len()));
                self.transport
                    .clock_bytes(&mut current.builder, chunk, Transfer::Out)?;
                current.payload += chunk.len();
                rest = tail;
                open = Some(current);
            }
        }

        if let Some(current) = open {
            self.finish(current)?;
            packets += 1;
        }
        debug!(
            "Panel transaction: {} bytes in {} packet(s)",
            tx.payload_len(),
            packets
        );
        Ok(packets)
    }

    /// Starts a packet with CS asserted and A0 at the given level.
    fn begin(&mut self, a0: bool) -> Result<OpenPacket> {
        let pins = *self.transport.pins();
        let mut builder = self.transport.packet();
        self.transport
            .stage_pins(&mut builder, &[(pins.cs, false), (pins.a0, a0)])?;
        Ok(OpenPacket {
            builder,
            a0,
            payload: 0,
        })
    }

    fn finish(&mut self, mut current: OpenPacket) -> Result<()> {
        let cs = self.transport.pins().cs;
        self.transport.stage_pins(&mut current.builder, &[(cs, true)])?;
        self.transport.submit(current.builder).map(|_| ())
    }

    /// Reads `len` bytes from the panel with A0 at the data level.
    pub fn read_data(&mut self, len: usize) -> Result<Vec<u8>> {
        let cs = self.transport.pins().cs;
        let capacity = self.transport.frame_capacity()?.saturating_sub(GPIO_LEN).max(1);
        let mut response = Vec::with_capacity(len);
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(capacity);
            let mut current = self.begin(true)?;
            self.transport
                .clock_bytes(&mut current.builder, &vec![0; chunk], Transfer::In)?;
            self.transport.stage_pins(&mut current.builder, &[(cs, true)])?;
            current.builder.push(Command::Control(SEND_IMMEDIATE))?;
            response.extend(self.transport.submit(current.builder)?);
            remaining -= chunk;
        }
        Ok(response)
    }

    /// Pulses RESET low, then waits for the controller to settle.
    pub fn reset(&mut self, timing: ResetTiming) -> Result<()> {
        let reset = self.transport.pins().reset;
        self.transport.set_pin(reset, false)?;
        self.transport.flush_gpio()?;
        std::thread::sleep(timing.hold);
        self.transport.set_pin(reset, true)?;
        self.transport.flush_gpio()?;
        std::thread::sleep(timing.settle);
        debug!("Panel reset ({:?} hold, {:?} settle)", timing.hold, timing.settle);
        Ok(())
    }

    /// Plays an init table. Runs of commands and data between delays go out
    /// as one transaction each.
    pub fn run_init(&mut self, steps: &[InitStep]) -> Result<()> {
        let mut tx = PanelTransaction::new();
        for step in steps {
            match *step {
                InitStep::Command(byte) => {
                    tx.command(byte);
                }
                InitStep::Data(byte) => {
                    tx.data(byte);
                }
                InitStep::Delay(ms) => {
                    self.submit(&tx)?;
                    tx = PanelTransaction::new();
                    std::thread::sleep(Duration::from_millis(u64::from(ms)));
                }
            }
        }
        self.submit(&tx).map(|_| ())
    }

    /// Releases the underlying device.
    pub fn close(&mut self) -> Result<()> {
        self.transport.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureDevice, CaptureDriver};
    use crate::mpsse::TransportConfig;

    fn open(config: TransportConfig) -> (CaptureDriver, PanelProtocol<CaptureDevice>) {
        let mut driver = CaptureDriver::new();
        let transport = BitBangTransport::open(&mut driver, 0, config).unwrap();
        driver.clear_writes();
        (driver, PanelProtocol::new(transport))
    }

    #[test]
    fn test_transaction_merges_runs() {
        let mut tx = PanelTransaction::new();
        tx.command(0x60).command(0x70).data(55).data_block(&[1, 2]).data_block(&[]);
        assert_eq!(
            tx.segments(),
            &[Segment::command(&[0x60, 0x70]), Segment::data(&[55, 1, 2])]
        );
        assert_eq!(tx.payload_len(), 5);
    }

    #[test]
    fn test_send_command_is_one_packet() {
        let (driver, mut protocol) = open(TransportConfig::default());
        protocol.send_command(0xAF).unwrap();
        assert_eq!(
            driver.writes(),
            vec![vec![
                0x82, 0x02, 0x07, // CS low, A0 command
                0x11, 0x00, 0x00, 0xAF, //
                0x82, 0x06, 0x07, // CS high
                0x80, 0x00, 0x0B, // clock idle
            ]]
        );
    }

    #[test]
    fn test_send_data_sets_a0_high() {
        let (driver, mut protocol) = open(TransportConfig::default());
        protocol.send_data(0x12).unwrap();
        let packet = &driver.writes()[0];
        assert_eq!(&packet[..3], &[0x82, 0x03, 0x07]);
        assert_eq!(&packet[7..10], &[0x82, 0x07, 0x07]);
    }

    #[test]
    fn test_mixed_transaction_toggles_a0_in_place() {
        let (driver, mut protocol) = open(TransportConfig::default());
        let mut tx = PanelTransaction::new();
        tx.command(0x04).data(55).command(0x01).data_block(&[0xAA; 4]);
        assert_eq!(protocol.submit(&tx).unwrap(), 1);
        let writes = driver.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0],
            vec![
                0x82, 0x02, 0x07, 0x11, 0x00, 0x00, 0x04, //
                0x82, 0x03, 0x07, 0x11, 0x00, 0x00, 55, //
                0x82, 0x02, 0x07, 0x11, 0x00, 0x00, 0x01, //
                0x82, 0x03, 0x07, 0x11, 0x03, 0x00, 0xAA, 0xAA, 0xAA, 0xAA, //
                0x82, 0x07, 0x07, 0x80, 0x00, 0x0B,
            ]
        );
    }

    #[test]
    fn test_large_block_is_split_into_framed_packets() {
        let config = TransportConfig::default().with_max_packet_len(64);
        let (driver, mut protocol) = open(config);
        let block: Vec<u8> = (0..200).map(|i| i as u8).collect();
        protocol.send_data_block(&block).unwrap();

        let writes = driver.writes();
        assert!(writes.len() > 1);
        let mut sent = Vec::new();
        for packet in &writes {
            assert!(packet.len() <= 64);
            assert_eq!(&packet[..3], &[0x82, 0x03, 0x07]);
            assert_eq!(&packet[packet.len() - 6..packet.len() - 3], &[0x82, 0x07, 0x07]);
            sent.extend_from_slice(&packet[6..packet.len() - 6]);
        }
        assert_eq!(sent, block);
    }

    #[test]
    fn test_packet_limit_too_small() {
        let config = TransportConfig::default().with_max_packet_len(12);
        let (_driver, mut protocol) = open(config);
        assert!(matches!(
            protocol.send_command(0x01),
            Err(Error::PacketTooLarge { .. })
        ));
        assert!(protocol.transport().gpio().level(protocol.transport().pins().cs));
    }

    #[test]
    fn test_write_failure_leaves_cs_released() {
        let (driver, mut protocol) = open(TransportConfig::default());
        driver.fail_write_at(1);
        assert!(protocol.send_data(0x01).is_err());
        let cs = protocol.transport().pins().cs;
        assert!(protocol.transport().gpio().level(cs));
        protocol.send_data(0x01).unwrap();
        assert_eq!(driver.write_count(), 1);
    }

    #[test]
    fn test_read_data() {
        let (driver, mut protocol) = open(TransportConfig::default());
        driver.queue_response(&[0x5A, 0xA5]);
        assert_eq!(protocol.read_data(2).unwrap(), vec![0x5A, 0xA5]);
        let packet = driver.writes().pop().unwrap();
        assert_eq!(&packet[..6], &[0x82, 0x03, 0x07, 0x20, 0x01, 0x00]);
        assert!(packet.contains(&SEND_IMMEDIATE));
    }

    #[test]
    fn test_reset_pulses_line() {
        let (driver, mut protocol) = open(TransportConfig::default());
        let timing = ResetTiming {
            hold: Duration::from_millis(1),
            settle: Duration::from_millis(1),
        };
        protocol.reset(timing).unwrap();
        let writes = driver.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(&writes[0][3..6], &[0x82, 0x05, 0x07]);
        assert_eq!(&writes[1][3..6], &[0x82, 0x07, 0x07]);
    }

    #[test]
    fn test_init_table_splits_on_delays() {
        let (driver, mut protocol) = open(TransportConfig::default());
        let steps = [
            InitStep::Command(0xE1),
            InitStep::Data(0xE2),
            InitStep::Delay(1),
            InitStep::Command(0xA4),
        ];
        protocol.run_init(&steps).unwrap();
        assert_eq!(driver.write_count(), 2);
    }

    #[test]
    fn test_closed_protocol() {
        let (_driver, mut protocol) = open(TransportConfig::default());
        protocol.close().unwrap();
        assert_eq!(protocol.send_command(0x01), Err(Error::TransportNotConnected));
    }
}
