//! Configuration management.

use anyhow::{Context, Result};
use mpsse_panel_hw::{FlushStrategy, PanelKind, PinMap, SpiMode, TransportConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bridge index as enumerated by the vendor driver
    #[serde(default)]
    pub device: u32,

    /// Panel model: uc1638, ssd1306, st7789
    #[serde(default = "default_panel")]
    pub panel: String,

    /// Flush strategy: batched, per-call
    #[serde(default = "default_flush")]
    pub flush: String,

    /// Contrast applied after init, if the panel supports it
    #[serde(default)]
    pub contrast: Option<u8>,

    /// SPI configuration
    #[serde(default)]
    pub spi: SpiConfig,

    /// Pin assignment
    #[serde(default)]
    pub pins: PinConfig,
}

/// SPI bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiConfig {
    /// SPI mode (0-3, or mode0..mode3)
    #[serde(default = "default_mode")]
    pub mode: String,

    /// SCLK frequency in Hz
    #[serde(default = "default_clock")]
    pub clock_hz: u32,

    /// Reference clock the divisor is computed against
    #[serde(default = "default_master_clock")]
    pub master_clock_hz: u32,

    /// Largest single USB write in bytes
    #[serde(default = "default_max_packet")]
    pub max_packet_len: usize,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            clock_hz: default_clock(),
            master_clock_hz: default_master_clock(),
            max_packet_len: default_max_packet(),
        }
    }
}

/// Pin indices, 0-7 on the low bank and 8-15 on the high bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinConfig {
    #[serde(default = "default_sclk")]
    pub sclk: u8,
    #[serde(default = "default_mosi")]
    pub mosi: u8,
    #[serde(default = "default_miso")]
    pub miso: u8,
    #[serde(default = "default_cs")]
    pub cs: u8,
    #[serde(default = "default_a0")]
    pub a0: u8,
    #[serde(default = "default_reset")]
    pub reset: u8,
    /// Extra pins driven low as outputs, one bit per pin
    #[serde(default = "default_extra_outputs")]
    pub extra_outputs: u16,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            sclk: default_sclk(),
            mosi: default_mosi(),
            miso: default_miso(),
            cs: default_cs(),
            a0: default_a0(),
            reset: default_reset(),
            extra_outputs: default_extra_outputs(),
        }
    }
}

// Default value functions
fn default_panel() -> String {
    "uc1638".to_string()
}

fn default_flush() -> String {
    "batched".to_string()
}

fn default_mode() -> String {
    "mode0".to_string()
}

fn default_clock() -> u32 {
    1_000_000
}

fn default_master_clock() -> u32 {
    mpsse_panel_hw::MASTER_CLOCK_HZ
}

fn default_max_packet() -> usize {
    mpsse_panel_hw::MAX_PACKET_SIZE
}

fn default_sclk() -> u8 {
    0
}

fn default_mosi() -> u8 {
    1
}

fn default_miso() -> u8 {
    2
}

fn default_cs() -> u8 {
    10
}

fn default_a0() -> u8 {
    8
}

fn default_reset() -> u8 {
    9
}

fn default_extra_outputs() -> u16 {
    1 << 3
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
        Ok(())
    }

    pub fn panel_kind(&self) -> Result<PanelKind> {
        self.panel
            .parse()
            .with_context(|| format!("Unknown panel '{}'", self.panel))
    }

    pub fn flush_strategy(&self) -> Result<FlushStrategy> {
        self.flush
            .parse()
            .with_context(|| format!("Unknown flush strategy '{}'", self.flush))
    }

    /// Builds the transport configuration, validating mode and pins.
    pub fn transport(&self) -> Result<TransportConfig> {
        let mode: SpiMode = self
            .spi
            .mode
            .parse()
            .with_context(|| format!("Invalid SPI mode '{}'", self.spi.mode))?;
        let p = &self.pins;
        let pins = PinMap::from_indices(p.sclk, p.mosi, p.miso, p.cs, p.a0, p.reset)
            .context("Invalid pin assignment")?
            .with_extra_outputs(p.extra_outputs);
        Ok(TransportConfig::default()
            .with_mode(mode)
            .with_clock_hz(self.spi.clock_hz)
            .with_master_clock_hz(self.spi.master_clock_hz)
            .with_max_packet_len(self.spi.max_packet_len)
            .with_pins(pins))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: 0,
            panel: default_panel(),
            flush: default_flush(),
            contrast: None,
            spi: SpiConfig::default(),
            pins: PinConfig::default(),
        }
    }
}
