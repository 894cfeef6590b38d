//! Panel controller descriptions.
//!
//! A [`PanelModel`] is data: geometry, pixel format, how pages or windows are
//! addressed, and the controller's init table. The built-in models cover the
//! controllers this library has been used with.

use super::framebuffer::PixelFormat;
use super::protocol::PanelTransaction;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// One entry of a controller init table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    /// Byte sent with A0 low.
    Command(u8),
    /// Byte sent with A0 high.
    Data(u8),
    /// Pause in milliseconds.
    Delay(u16),
}

impl From<(bool, u8)> for InitStep {
    /// Converts an `(is_command, byte)` pair.
    fn from((is_command, byte): (bool, u8)) -> Self {
        if is_command {
            InitStep::Command(byte)
        } else {
            InitStep::Data(byte)
        }
    }
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStep::Command(byte) => write!(f, "cmd  0x{:02X}", byte),
            InitStep::Data(byte) => write!(f, "data 0x{:02X}", byte),
            InitStep::Delay(ms) => write!(f, "wait {} ms", ms),
        }
    }
}

/// Panel dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
    /// First physical controller column used by the glass.
    pub column_offset: u16,
}

impl Geometry {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            column_offset: 0,
        }
    }

    /// Number of 8-row bands.
    pub fn page_count(&self) -> u16 {
        self.height.div_ceil(8)
    }
}

/// Encoding of a page number into page-select commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelect {
    /// Two commands: `low | (page & 0x0F)`, then `high | (page >> 4)`.
    SplitNibbles { low: u8, high: u8 },
    /// One command: `base | page`.
    Direct(u8),
}

impl PageSelect {
    /// Number of pages the encoding can address without wrapping.
    pub fn page_limit(&self) -> u32 {
        match *self {
            PageSelect::SplitNibbles { .. } => 256,
            PageSelect::Direct(0) => 256,
            PageSelect::Direct(base) => 1 << base.trailing_zeros(),
        }
    }
}

/// Encoding of a column into column-address commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSelect {
    /// A command followed by the column as one data byte.
    CommandData(u8),
    /// Two commands: `low | (column & 0x0F)`, then `high | (column >> 4)`.
    SplitNibbles { low: u8, high: u8 },
}

/// Addressing for controllers whose memory is organised in 8-row pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageAddressing {
    pub page_select: PageSelect,
    pub column_select: ColumnSelect,
    /// Issued after addressing, immediately before page data.
    pub write_command: Option<u8>,
}

impl PageAddressing {
    /// Appends page select, column reset and the write command.
    pub fn encode(&self, tx: &mut PanelTransaction, page: u16, column: u8) {
        let page = page as u8;
        match self.page_select {
            PageSelect::SplitNibbles { low, high } => {
                tx.command(low | (page & 0x0F)).command(high | (page >> 4));
            }
            PageSelect::Direct(base) => {
                tx.command(base | page);
            }
        }
        match self.column_select {
            ColumnSelect::CommandData(cmd) => {
                tx.command(cmd).data(column);
            }
            ColumnSelect::SplitNibbles { low, high } => {
                tx.command(low | (column & 0x0F)).command(high | (column >> 4));
            }
        }
        if let Some(cmd) = self.write_command {
            tx.command(cmd);
        }
    }
}

/// Addressing for controllers with a column/row window and a memory-write command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAddressing {
    pub column_command: u8,
    pub row_command: u8,
    pub write_command: u8,
}

impl WindowAddressing {
    /// Appends the window (inclusive, 16-bit big-endian bounds) and the write command.
    pub fn encode(&self, tx: &mut PanelTransaction, x0: u16, y0: u16, x1: u16, y1: u16) {
        tx.command(self.column_command);
        tx.data_block(&x0.to_be_bytes()).data_block(&x1.to_be_bytes());
        tx.command(self.row_command);
        tx.data_block(&y0.to_be_bytes()).data_block(&y1.to_be_bytes());
        tx.command(self.write_command);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    Paged(PageAddressing),
    Windowed(WindowAddressing),
}

/// How a controller takes a contrast value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContrastControl {
    /// Command, then the value as a data byte.
    CommandData(u8),
    /// Command, then the value as a second command byte.
    CommandPair(u8),
}

/// Display enable and inversion commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayControl {
    pub on: u8,
    pub off: u8,
    pub inverted: u8,
    pub normal: u8,
}

/// RESET pulse timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetTiming {
    /// Time RESET is held low.
    pub hold: Duration,
    /// Wait after release before the first command.
    pub settle: Duration,
}

impl Default for ResetTiming {
    fn default() -> Self {
        Self {
            hold: Duration::from_millis(20),
            settle: Duration::from_millis(20),
        }
    }
}

/// Everything needed to drive one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelModel {
    pub name: String,
    pub geometry: Geometry,
    pub format: PixelFormat,
    pub addressing: Addressing,
    pub init: Vec<InitStep>,
    pub reset: ResetTiming,
    pub contrast: Option<ContrastControl>,
    pub display: Option<DisplayControl>,
}

impl PanelModel {
    /// A model with no init table and default reset timing.
    pub fn custom(
        name: impl Into<String>,
        geometry: Geometry,
        format: PixelFormat,
        addressing: Addressing,
    ) -> Self {
        Self {
            name: name.into(),
            geometry,
            format,
            addressing,
            init: Vec::new(),
            reset: ResetTiming::default(),
            contrast: None,
            display: None,
        }
    }

    /// UC1638, 128x128 monochrome, glass starting at controller column 55.
    pub fn uc1638() -> Self {
        use InitStep::{Command as C, Data as D, Delay};

        let geometry = Geometry {
            width: 128,
            height: 128,
            column_offset: 55,
        };
        let addressing = Addressing::Paged(PageAddressing {
            page_select: PageSelect::SplitNibbles {
                low: 0x60,
                high: 0x70,
            },
            column_select: ColumnSelect::CommandData(0x04),
            write_command: Some(0x01),
        });
        #[rustfmt::skip]
        let init = vec![
            // System reset
            C(0xE1), D(0xE2), Delay(2),
            C(0xA4), C(0xA6),
            C(0xB8), D(0x00),
            // Pump, temperature compensation, bias
            C(0x2D), C(0x20), C(0xEA),
            C(0x81), D(170),
            C(0xA3),
            C(0xC8), D(0x2F),
            C(0x89), C(0x95), C(0x84),
            C(0xF1), D(127),
            C(0xC4), C(0x86), C(0x40), C(0x50),
            C(0x04), D(55),
            C(0x60), C(0x70),
            // Window program: columns 55..=182, pages 0..=15
            C(0xF4), D(55), C(0xF6), D(182),
            C(0xF5), D(0), C(0xF7), D(15),
            C(0xF9),
            C(0xC9), D(0xAD),
        ];

        Self {
            init,
            contrast: Some(ContrastControl::CommandData(0x81)),
            display: Some(DisplayControl {
                on: 0xAF,
                off: 0xAE,
                inverted: 0xA7,
                normal: 0xA6,
            }),
            ..Self::custom("uc1638", geometry, PixelFormat::Mono, addressing)
        }
    }

    /// SSD1306, 128x64 monochrome.
    pub fn ssd1306() -> Self {
        let addressing = Addressing::Paged(PageAddressing {
            page_select: PageSelect::Direct(0xB0),
            column_select: ColumnSelect::SplitNibbles {
                low: 0x00,
                high: 0x10,
            },
            write_command: None,
        });
        let commands = [
            0xAE, 0xD5, 0x80, 0xA8, 0x3F, 0xD3, 0x00, 0x40, 0x8D, 0x14, 0x20, 0x00, 0xA1, 0xC8,
            0xDA, 0x12, 0x81, 0xCF, 0xD9, 0xF1, 0xDB, 0x40, 0xA4, 0xA6, 0xAF,
        ];

        Self {
            init: commands.iter().map(|&byte| InitStep::Command(byte)).collect(),
            reset: ResetTiming {
                hold: Duration::from_millis(20),
                settle: Duration::from_millis(100),
            },
            contrast: Some(ContrastControl::CommandPair(0x81)),
            display: Some(DisplayControl {
                on: 0xAF,
                off: 0xAE,
                inverted: 0xA7,
                normal: 0xA6,
            }),
            ..Self::custom(
                "ssd1306",
                Geometry::new(128, 64),
                PixelFormat::Mono,
                addressing,
            )
        }
    }

    /// ST7789-class 320x240 RGB565.
    pub fn st7789() -> Self {
        let addressing = Addressing::Windowed(WindowAddressing {
            column_command: 0x2A,
            row_command: 0x2B,
            write_command: 0x2C,
        });
        let init = vec![
            InitStep::Command(0x11),
            InitStep::Delay(120),
            InitStep::Command(0x36),
            InitStep::Data(0xB4),
            InitStep::Command(0x3A),
            InitStep::Data(0x05),
            InitStep::Command(0x29),
            InitStep::Delay(50),
        ];

        Self {
            init,
            reset: ResetTiming {
                hold: Duration::from_millis(100),
                settle: Duration::from_millis(150),
            },
            display: Some(DisplayControl {
                on: 0x29,
                off: 0x28,
                inverted: 0x21,
                normal: 0x20,
            }),
            ..Self::custom(
                "st7789",
                Geometry::new(320, 240),
                PixelFormat::Rgb565,
                addressing,
            )
        }
    }

    pub fn with_init(mut self, init: Vec<InitStep>) -> Self {
        self.init = init;
        self
    }

    pub fn with_column_offset(mut self, column_offset: u16) -> Self {
        self.geometry.column_offset = column_offset;
        self
    }

    pub fn with_reset_timing(mut self, reset: ResetTiming) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_contrast(mut self, contrast: ContrastControl) -> Self {
        self.contrast = Some(contrast);
        self
    }

    pub fn with_display_control(mut self, display: DisplayControl) -> Self {
        self.display = Some(display);
        self
    }

    /// Checks that geometry, format and addressing agree and that every
    /// addressed column fits the controller's column register.
    pub fn validate(&self) -> Result<()> {
        let Geometry {
            width,
            height,
            column_offset,
        } = self.geometry;
        if width == 0 || height == 0 {
            return Err(Error::InvalidPanel(format!(
                "{}: empty geometry {}x{}",
                self.name, width, height
            )));
        }
        let last_column = u32::from(column_offset) + u32::from(width) - 1;
        match self.addressing {
            Addressing::Paged(paged) => {
                let pages = u32::from(self.geometry.page_count());
                let limit = paged.page_select.page_limit();
                if pages > limit {
                    return Err(Error::InvalidPanel(format!(
                        "{}: {} pages but page select addresses only {}",
                        self.name, pages, limit
                    )));
                }
                if self.format != PixelFormat::Mono {
                    return Err(Error::InvalidPanel(format!(
                        "{}: paged addressing needs a 1 bpp buffer",
                        self.name
                    )));
                }
                if last_column > u32::from(u8::MAX) {
                    return Err(Error::InvalidPanel(format!(
                        "{}: column {} exceeds the 8-bit column register",
                        self.name, last_column
                    )));
                }
            }
            Addressing::Windowed(_) => {
                if last_column > u32::from(u16::MAX) {
                    return Err(Error::InvalidPanel(format!(
                        "{}: column {} exceeds the window register",
                        self.name, last_column
                    )));
                }
            }
        }
        Ok(())
    }

    /// Controller column for local column `x`.
    pub fn physical_column(&self, x: u16) -> u16 {
        x + self.geometry.column_offset
    }
}

/// Built-in controller models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelKind {
    #[default]
    Uc1638,
    Ssd1306,
    St7789,
}

impl PanelKind {
    pub const ALL: [PanelKind; 3] = [PanelKind::Uc1638, PanelKind::Ssd1306, PanelKind::St7789];

    pub fn model(&self) -> PanelModel {
        match self {
            PanelKind::Uc1638 => PanelModel::uc1638(),
            PanelKind::Ssd1306 => PanelModel::ssd1306(),
            PanelKind::St7789 => PanelModel::st7789(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PanelKind::Uc1638 => "UC1638 128x128 monochrome, paged, column offset 55",
            PanelKind::Ssd1306 => "SSD1306 128x64 monochrome, paged",
            PanelKind::St7789 => "ST7789 320x240 RGB565, windowed",
        }
    }
}

impl FromStr for PanelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "uc1638" | "pmdb" => Ok(PanelKind::Uc1638),
            "ssd1306" => Ok(PanelKind::Ssd1306),
            "st7789" | "ppdb035" => Ok(PanelKind::St7789),
            _ => Err(Error::InvalidPanel(s.to_string())),
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelKind::Uc1638 => write!(f, "uc1638"),
            PanelKind::Ssd1306 => write!(f, "ssd1306"),
            PanelKind::St7789 => write!(f, "st7789"),
        }
    }
}
