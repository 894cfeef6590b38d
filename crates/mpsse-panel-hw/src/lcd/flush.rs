//! Framebuffer to panel transfer.

use super::framebuffer::Framebuffer;
use super::panel::{Addressing, PanelModel};
use super::protocol::{PanelProtocol, PanelTransaction};
use crate::driver::DeviceHandle;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How addressing commands and page data are grouped into packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushStrategy {
    /// One packet per page: CS asserted once, A0 toggled between the
    /// addressing commands and the page data.
    #[default]
    Batched,
    /// Every command and data byte is its own packet, then the page data.
    PerCall,
}

impl FromStr for FlushStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "batched" => Ok(FlushStrategy::Batched),
            "per-call" | "percall" | "per_call" => Ok(FlushStrategy::PerCall),
            _ => Err(Error::InvalidFlushStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for FlushStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushStrategy::Batched => write!(f, "batched"),
            FlushStrategy::PerCall => write!(f, "per-call"),
        }
    }
}

/// Where a flush currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushState {
    #[default]
    Idle,
    AddressingPage(u16),
    TransferringPage(u16),
}

/// Summary of one flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    /// Pages (8-row bands) transferred.
    pub pages: usize,
    /// Driver writes issued.
    pub packets: usize,
    /// Pixel bytes transferred.
    pub bytes: usize,
}

/// Walks the framebuffer in panel order and sends it.
#[derive(Debug, Clone, Default)]
pub struct FlushEngine {
    strategy: FlushStrategy,
    state: FlushState,
}

impl FlushEngine {
    pub fn new(strategy: FlushStrategy) -> Self {
        Self {
            strategy,
            state: FlushState::Idle,
        }
    }

    pub fn strategy(&self) -> FlushStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: FlushStrategy) {
        self.strategy = strategy;
    }

    pub fn state(&self) -> FlushState {
        self.state
    }

    /// Sends every page if `full`, otherwise only pages drawn to since their
    /// last successful transfer. A page is marked clean only once it has
    /// reached the device.
    pub fn flush<H: DeviceHandle>(
        &mut self,
        protocol: &mut PanelProtocol<H>,
        model: &PanelModel,
        framebuffer: &mut Framebuffer,
        full: bool,
    ) -> Result<FlushReport> {
        let result = match model.addressing {
            Addressing::Paged(_) => self.flush_pages(protocol, model, framebuffer, full),
            Addressing::Windowed(_) => self.flush_window(protocol, model, framebuffer, full),
        };
        self.state = FlushState::Idle;
        result
    }

    fn flush_pages<H: DeviceHandle>(
        &mut self,
        protocol: &mut PanelProtocol<H>,
        model: &PanelModel,
        framebuffer: &mut Framebuffer,
        full: bool,
    ) -> Result<FlushReport> {
        let Addressing::Paged(paged) = model.addressing else {
            return Err(Error::InvalidPanel(model.name.clone()));
        };
        let column = u8::try_from(model.physical_column(0))
            .map_err(|_| Error::InvalidPanel(model.name.clone()))?;
        let pages: Vec<u16> = if full {
            (0..framebuffer.page_count()).collect()
        } else {
            framebuffer.dirty_pages()
        };

        let mut report = FlushReport::default();
        for page in pages {
            self.state = FlushState::AddressingPage(page);
            let mut tx = PanelTransaction::new();
            paged.encode(&mut tx, page, column);

            let data = framebuffer.page(page);
            let len = data.len();
            report.packets += self.send(protocol, tx, data)?;
            report.pages += 1;
            report.bytes += len;
            framebuffer.mark_clean(page);
            debug!("Flushed page {} ({} bytes)", page, len);
        }
        Ok(report)
    }

    fn flush_window<H: DeviceHandle>(
        &mut self,
        protocol: &mut PanelProtocol<H>,
        model: &PanelModel,
        framebuffer: &mut Framebuffer,
        full: bool,
    ) -> Result<FlushReport> {
        let Addressing::Windowed(window) = model.addressing else {
            return Err(Error::InvalidPanel(model.name.clone()));
        };
        let span = if full {
            framebuffer.page_count().checked_sub(1).map(|last| (0, last))
        } else {
            let dirty = framebuffer.dirty_pages();
            dirty.first().zip(dirty.last()).map(|(&a, &b)| (a, b))
        };
        let Some((first, last)) = span else {
            return Ok(FlushReport::default());
        };

        self.state = FlushState::AddressingPage(first);
        let y0 = first * 8;
        let y1 = ((last + 1) * 8).min(framebuffer.height()) - 1;
        let x0 = model.physical_column(0);
        let x1 = model.physical_column(framebuffer.width() - 1);
        let mut tx = PanelTransaction::new();
        window.encode(&mut tx, x0, y0, x1, y1);

        let data = framebuffer.pages(first, last);
        let report = FlushReport {
            pages: usize::from(last - first + 1),
            packets: self.send(protocol, tx, data)?,
            bytes: data.len(),
        };
        for page in first..=last {
            framebuffer.mark_clean(page);
        }
        debug!(
            "Flushed window rows {}..={} ({} bytes)",
            y0, y1, report.bytes
        );
        Ok(report)
    }

    /// Sends addressing then data according to the strategy; returns packets written.
    fn send<H: DeviceHandle>(
        &mut self,
        protocol: &mut PanelProtocol<H>,
        mut addressing: PanelTransaction,
        data: &[u8],
    ) -> Result<usize> {
        let page = match self.state {
            FlushState::AddressingPage(page) | FlushState::TransferringPage(page) => page,
            FlushState::Idle => 0,
        };
        match self.strategy {
            FlushStrategy::Batched => {
                self.state = FlushState::TransferringPage(page);
                addressing.data_block(data);
                protocol.submit(&addressing)
            }
            FlushStrategy::PerCall => {
                let mut packets = 0;
                for segment in addressing.segments() {
                    for &byte in &segment.bytes {
                        let mut single = PanelTransaction::new();
                        if segment.is_data {
                            single.data(byte);
                        } else {
                            single.command(byte);
                        }
                        packets += protocol.submit(&single)?;
                    }
                }
                self.state = FlushState::TransferringPage(page);
                let mut block = PanelTransaction::new();
                block.data_block(data);
                packets += protocol.submit(&block)?;
                Ok(packets)
            }
        }
    }
}
