//! LCD device: protocol, panel model and framebuffer together.

use crate::driver::{DeviceHandle, VendorDriver};
use crate::mpsse::{BitBangTransport, TransportConfig};
use crate::{Error, Result};
use tracing::{debug, info, warn};

use super::flush::{FlushEngine, FlushReport, FlushStrategy};
use super::framebuffer::Framebuffer;
use super::panel::{ContrastControl, DisplayControl, PanelModel};
use super::protocol::{PanelProtocol, PanelTransaction};

/// LCD device controller.
#[derive(Debug)]
pub struct LcdDevice<H: DeviceHandle> {
    protocol: PanelProtocol<H>,
    model: PanelModel,
    framebuffer: Framebuffer,
    flush: FlushEngine,
    initialized: bool,
}

impl<H: DeviceHandle> LcdDevice<H> {
    /// Opens the bridge and binds it to a panel model. The panel itself is
    /// not touched until [`LcdDevice::init`].
    pub fn open<D>(
        driver: &mut D,
        index: u32,
        config: TransportConfig,
        model: PanelModel,
    ) -> Result<Self>
    where
        D: VendorDriver<Device = H>,
    {
        model.validate()?;
        let transport = BitBangTransport::open(driver, index, config)?;
        info!(
            "LCD {} attached ({}x{}, {})",
            model.name, model.geometry.width, model.geometry.height, model.format
        );
        Ok(Self::with_protocol(PanelProtocol::new(transport), model))
    }

    /// Wraps an already open protocol.
    pub fn with_protocol(protocol: PanelProtocol<H>, model: PanelModel) -> Self {
        Self {
            framebuffer: Framebuffer::for_model(&model),
            protocol,
            model,
            flush: FlushEngine::default(),
            initialized: false,
        }
    }

    /// Resets the panel and plays its init table.
    pub fn init(&mut self) -> Result<()> {
        self.initialized = false;
        self.protocol.reset(self.model.reset)?;
        self.protocol.run_init(&self.model.init)?;
        self.framebuffer.mark_all_dirty();
        self.initialized = true;
        info!("LCD {} initialized ({} init steps)", self.model.name, self.model.init.len());
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Transfers the framebuffer: every page if `full`, dirty pages otherwise.
    pub fn flush(&mut self, full: bool) -> Result<FlushReport> {
        if !self.initialized {
            return Err(Error::PanelNotInitialized);
        }
        let report = self
            .flush
            .flush(&mut self.protocol, &self.model, &mut self.framebuffer, full)?;
        debug!(
            "Flush: {} pages, {} packets, {} bytes",
            report.pages, report.packets, report.bytes
        );
        Ok(report)
    }

    pub fn set_contrast(&mut self, value: u8) -> Result<()> {
        let control = self.model.contrast.ok_or_else(|| {
            Error::InvalidPanel(format!("{}: no contrast control", self.model.name))
        })?;
        let mut tx = PanelTransaction::new();
        match control {
            ContrastControl::CommandData(cmd) => tx.command(cmd).data(value),
            ContrastControl::CommandPair(cmd) => tx.command(cmd).command(value),
        };
        self.send_initialized(&tx)?;
        debug!("Contrast set to {}", value);
        Ok(())
    }

    pub fn set_display_on(&mut self, on: bool) -> Result<()> {
        let display = self.display_control()?;
        let mut tx = PanelTransaction::new();
        tx.command(if on { display.on } else { display.off });
        self.send_initialized(&tx)
    }

    pub fn set_inverted(&mut self, inverted: bool) -> Result<()> {
        let display = self.display_control()?;
        let mut tx = PanelTransaction::new();
        tx.command(if inverted {
            display.inverted
        } else {
            display.normal
        });
        self.send_initialized(&tx)
    }

    fn display_control(&self) -> Result<DisplayControl> {
        self.model.display.ok_or_else(|| {
            Error::InvalidPanel(format!("{}: no display control", self.model.name))
        })
    }

    fn send_initialized(&mut self, tx: &PanelTransaction) -> Result<()> {
        if !self.initialized {
            return Err(Error::PanelNotInitialized);
        }
        self.protocol.submit(tx).map(|_| ())
    }

    pub fn set_flush_strategy(&mut self, strategy: FlushStrategy) {
        self.flush.set_strategy(strategy);
    }

    pub fn flush_strategy(&self) -> FlushStrategy {
        self.flush.strategy()
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    pub fn model(&self) -> &PanelModel {
        &self.model
    }

    pub fn protocol(&self) -> &PanelProtocol<H> {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut PanelProtocol<H> {
        &mut self.protocol
    }

    /// Closes the bridge. The device cannot be used afterwards.
    pub fn close(&mut self) -> Result<()> {
        self.initialized = false;
        if let Err(e) = self.protocol.close() {
            warn!("Failed to close LCD {}: {}", self.model.name, e);
            return Err(e);
        }
        info!("LCD {} closed", self.model.name);
        Ok(())
    }
}
