//! LCD panel module.
//!
//! Controller models, the command/data protocol over the bit-bang transport,
//! an in-memory framebuffer and the engine that moves it to the glass.

mod device;
mod flush;
mod font;
mod protocol;

pub mod framebuffer;
pub mod panel;

pub use device::LcdDevice;
pub use flush::{FlushEngine, FlushReport, FlushState, FlushStrategy};
pub use font::{Ascii6x12, Font};
pub use framebuffer::{
    parse_hex_color, rgb565_to_rgb888, rgb888_to_rgb565, Framebuffer, PixelFormat,
};
pub use panel::{
    Addressing, ColumnSelect, ContrastControl, DisplayControl, Geometry, InitStep,
    PageAddressing, PageSelect, PanelKind, PanelModel, ResetTiming, WindowAddressing,
};
pub use protocol::{PanelProtocol, PanelTransaction, Segment};
