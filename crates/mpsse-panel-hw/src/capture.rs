//! In-memory capture driver.
//!
//! Implements the vendor driver traits without hardware: every write is
//! recorded as one packet, reads are served from a queue of canned response
//! bytes, and write/open faults can be injected. Clones share one log.

use crate::driver::{BitMode, DeviceHandle, DriverResult, DriverStatus, PurgeFlags, VendorDriver};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Everything the capture device has seen.
#[derive(Debug, Clone, Default)]
pub struct CaptureLog {
    /// Device indices passed to `open`.
    pub opened: Vec<u32>,
    /// One entry per driver write, in order.
    pub writes: Vec<Vec<u8>>,
    /// Bit mode changes as `(mask, mode)`.
    pub bit_modes: Vec<(u8, BitMode)>,
    pub purges: Vec<PurgeFlags>,
    pub latency_ms: Option<u8>,
    pub usb_parameters: Option<(u32, u32)>,
    pub closed: bool,
}

impl CaptureLog {
    /// Total bytes written across all packets.
    pub fn bytes_written(&self) -> usize {
        self.writes.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Default)]
struct State {
    log: CaptureLog,
    responses: VecDeque<u8>,
    fail_open: Option<DriverStatus>,
    write_attempts: usize,
    fail_write_at: Option<usize>,
    short_write_at: Option<usize>,
}

/// Vendor driver that records traffic instead of touching USB.
#[derive(Debug, Clone, Default)]
pub struct CaptureDriver {
    state: Arc<Mutex<State>>,
}

impl CaptureDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a copy of the log.
    pub fn snapshot(&self) -> CaptureLog {
        self.state().log.clone()
    }

    /// Returns the recorded writes.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state().log.writes.clone()
    }

    /// Number of writes recorded so far.
    pub fn write_count(&self) -> usize {
        self.state().log.writes.len()
    }

    /// Forgets recorded writes, keeping faults and queued responses.
    pub fn clear_writes(&self) {
        self.state().log.writes.clear();
    }

    /// Queues bytes returned by subsequent reads.
    pub fn queue_response(&self, bytes: &[u8]) {
        self.state().responses.extend(bytes.iter().copied());
    }

    /// Makes `open` fail with the given status.
    pub fn fail_open(&self, status: DriverStatus) {
        self.state().fail_open = Some(status);
    }

    /// Makes the write attempt with this zero-based index fail with `IO_ERROR`.
    pub fn fail_write_at(&self, index: usize) {
        self.state().fail_write_at = Some(index);
    }

    /// Makes the write attempt with this zero-based index accept one byte less.
    pub fn short_write_at(&self, index: usize) {
        self.state().short_write_at = Some(index);
    }
}

impl VendorDriver for CaptureDriver {
    type Device = CaptureDevice;

    fn open(&mut self, index: u32) -> DriverResult<CaptureDevice> {
        let mut state = self.state();
        if let Some(status) = state.fail_open {
            return Err(status);
        }
        state.log.opened.push(index);
        state.log.closed = false;
        debug!("Capture device {} opened", index);
        Ok(CaptureDevice {
            state: Arc::clone(&self.state),
        })
    }
}

/// Handle returned by [`CaptureDriver::open`].
#[derive(Debug)]
pub struct CaptureDevice {
    state: Arc<Mutex<State>>,
}

impl CaptureDevice {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DeviceHandle for CaptureDevice {
    fn set_bit_mode(&mut self, mask: u8, mode: BitMode) -> DriverResult<()> {
        self.state().log.bit_modes.push((mask, mode));
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> DriverResult<usize> {
        let mut state = self.state();
        let index = state.write_attempts;
        state.write_attempts += 1;
        if state.fail_write_at == Some(index) {
            state.fail_write_at = None;
            return Err(DriverStatus::IoError);
        }
        let accepted = if state.short_write_at == Some(index) {
            state.short_write_at = None;
            bytes.len().saturating_sub(1)
        } else {
            bytes.len()
        };
        state.log.writes.push(bytes[..accepted].to_vec());
        Ok(accepted)
    }

    fn read(&mut self, max_len: usize) -> DriverResult<Vec<u8>> {
        let mut state = self.state();
        let take = max_len.min(state.responses.len());
        Ok(state.responses.drain(..take).collect())
    }

    fn purge(&mut self, flags: PurgeFlags) -> DriverResult<()> {
        let mut state = self.state();
        state.log.purges.push(flags);
        if flags.bits() & PurgeFlags::RX.bits() != 0 {
            state.responses.clear();
        }
        Ok(())
    }

    fn set_latency_timer(&mut self, ms: u8) -> DriverResult<()> {
        self.state().log.latency_ms = Some(ms);
        Ok(())
    }

    fn set_usb_parameters(&mut self, in_size: u32, out_size: u32) -> DriverResult<()> {
        self.state().log.usb_parameters = Some((in_size, out_size));
        Ok(())
    }

    fn close(&mut self) -> DriverResult<()> {
        self.state().log.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_writes() {
        let mut driver = CaptureDriver::new();
        let mut device = driver.open(0).unwrap();
        assert_eq!(device.write(&[1, 2, 3]).unwrap(), 3);
        assert_eq!(device.write(&[4]).unwrap(), 1);
        assert_eq!(driver.writes(), vec![vec![1, 2, 3], vec![4]]);
        assert_eq!(driver.snapshot().bytes_written(), 4);
    }

    #[test]
    fn test_injected_faults() {
        let mut driver = CaptureDriver::new();
        let mut device = driver.open(0).unwrap();
        driver.fail_write_at(1);
        driver.short_write_at(2);
        assert!(device.write(&[1]).is_ok());
        assert_eq!(device.write(&[2]), Err(DriverStatus::IoError));
        assert_eq!(device.write(&[3, 4]).unwrap(), 1);
        assert_eq!(device.write(&[5]).unwrap(), 1);
    }

    #[test]
    fn test_queued_responses() {
        let mut driver = CaptureDriver::new();
        let mut device = driver.open(0).unwrap();
        driver.queue_response(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(device.read(2).unwrap(), vec![0xAA, 0xBB]);
        device.purge(PurgeFlags::RX).unwrap();
        assert!(device.read(2).unwrap().is_empty());
    }

    #[test]
    fn test_fail_open() {
        let mut driver = CaptureDriver::new();
        driver.fail_open(DriverStatus::DeviceNotFound);
        assert_eq!(driver.open(0).err(), Some(DriverStatus::DeviceNotFound));
    }
}
