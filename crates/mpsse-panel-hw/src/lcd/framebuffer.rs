//! Pixel framebuffer for paged monochrome and RGB565 panels.
//!
//! Monochrome buffers are page-major: byte `page * width + x` holds the eight
//! pixels `(x, page * 8 .. page * 8 + 8)`, bit `y % 8` for row `y`. RGB565
//! buffers are row-major, two big-endian bytes per pixel. Drawing never
//! touches the device; every write marks the 8-row band it lands in dirty.

use super::font::Font;
use super::panel::PanelModel;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Pixel encoding of a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 1 bit per pixel, page-major.
    #[default]
    Mono,
    /// 16 bits per pixel, row-major, big-endian.
    Rgb565,
}

impl PixelFormat {
    pub fn bits_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Mono => 1,
            PixelFormat::Rgb565 => 16,
        }
    }

    /// Buffer size for a `width` x `height` image.
    pub fn buffer_len(&self, width: u16, height: u16) -> usize {
        let (width, height) = (width as usize, height as usize);
        match self {
            PixelFormat::Mono => width * height.div_ceil(8),
            PixelFormat::Rgb565 => width * height * 2,
        }
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mono" | "1bpp" => Ok(PixelFormat::Mono),
            "rgb565" => Ok(PixelFormat::Rgb565),
            _ => Err(Error::InvalidPanel(format!("unknown pixel format: {}", s))),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Mono => write!(f, "mono"),
            PixelFormat::Rgb565 => write!(f, "rgb565"),
        }
    }
}

/// In-memory image of the panel.
#[derive(Clone)]
pub struct Framebuffer {
    data: Vec<u8>,
    width: u16,
    height: u16,
    format: PixelFormat,
    /// One flag per 8-row band.
    dirty: Vec<bool>,
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framebuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("dirty_pages", &self.dirty_pages().len())
            .finish()
    }
}

impl Framebuffer {
    /// Creates a cleared framebuffer with every page dirty.
    pub fn new(width: u16, height: u16, format: PixelFormat) -> Self {
        Self {
            data: vec![0; format.buffer_len(width, height)],
            width,
            height,
            format,
            dirty: vec![true; height.div_ceil(8) as usize],
        }
    }

    /// Creates a framebuffer matching a panel model.
    pub fn for_model(model: &PanelModel) -> Self {
        Self::new(model.geometry.width, model.geometry.height, model.format)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Number of 8-row bands.
    pub fn page_count(&self) -> u16 {
        self.dirty.len() as u16
    }

    /// Returns the raw buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replaces the raw buffer, marking everything dirty.
    pub fn copy_from_slice(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != self.data.len() {
            return Err(Error::FramebufferSize {
                expected: self.data.len(),
                actual: data.len(),
            });
        }
        self.data.copy_from_slice(data);
        self.mark_all_dirty();
        Ok(())
    }

    /// Bytes of the bands `first..=last`, in transfer order.
    pub fn pages(&self, first: u16, last: u16) -> &[u8] {
        let (start, end) = self.band_bytes(first, last);
        &self.data[start..end]
    }

    /// Bytes of one band.
    pub fn page(&self, page: u16) -> &[u8] {
        self.pages(page, page)
    }

    fn band_bytes(&self, first: u16, last: u16) -> (usize, usize) {
        let last = last.min(self.page_count().saturating_sub(1));
        let width = self.width as usize;
        match self.format {
            PixelFormat::Mono => (first as usize * width, (last as usize + 1) * width),
            PixelFormat::Rgb565 => {
                let row_bytes = width * 2;
                let end_row = ((last as usize + 1) * 8).min(self.height as usize);
                (first as usize * 8 * row_bytes, end_row * row_bytes)
            }
        }
    }

    pub fn is_page_dirty(&self, page: u16) -> bool {
        self.dirty.get(page as usize).copied().unwrap_or(false)
    }

    /// Indices of bands modified since they were last flushed.
    pub fn dirty_pages(&self) -> Vec<u16> {
        self.dirty
            .iter()
            .enumerate()
            .filter(|(_, dirty)| **dirty)
            .map(|(page, _)| page as u16)
            .collect()
    }

    pub fn has_dirty_pages(&self) -> bool {
        self.dirty.iter().any(|d| *d)
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty.fill(true);
    }

    /// Marks a band as in sync with the panel.
    pub fn mark_clean(&mut self, page: u16) {
        if let Some(flag) = self.dirty.get_mut(page as usize) {
            *flag = false;
        }
    }

    fn mark_dirty(&mut self, y: u16) {
        if let Some(flag) = self.dirty.get_mut((y / 8) as usize) {
            *flag = true;
        }
    }

    /// Fills the buffer with one colour: 0x00/0xFF for mono, the big-endian
    /// pixel pattern for RGB565.
    pub fn clear(&mut self, color: u16) {
        match self.format {
            PixelFormat::Mono => {
                let fill = if color != 0 { 0xFF } else { 0x00 };
                self.data.fill(fill);
            }
            PixelFormat::Rgb565 => {
                let [hi, lo] = color.to_be_bytes();
                for pixel in self.data.chunks_exact_mut(2) {
                    pixel[0] = hi;
                    pixel[1] = lo;
                }
            }
        }
        self.mark_all_dirty();
    }

    fn put(&mut self, x: u16, y: u16, color: u16) {
        let width = self.width as usize;
        match self.format {
            PixelFormat::Mono => {
                let idx = (y / 8) as usize * width + x as usize;
                let mask = 1u8 << (y % 8);
                if color != 0 {
                    self.data[idx] |= mask;
                } else {
                    self.data[idx] &= !mask;
                }
            }
            PixelFormat::Rgb565 => {
                let idx = (y as usize * width + x as usize) * 2;
                self.data[idx..idx + 2].copy_from_slice(&color.to_be_bytes());
            }
        }
        self.mark_dirty(y);
    }

    fn clamp_x(&self, x: i32) -> u16 {
        x.clamp(0, i32::from(self.width) - 1) as u16
    }

    fn clamp_y(&self, y: i32) -> u16 {
        y.clamp(0, i32::from(self.height) - 1) as u16
    }

    /// Plots a pixel. Coordinates outside the buffer are clamped to the
    /// nearest edge column or row.
    pub fn draw_point(&mut self, x: i32, y: i32, color: u16) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (x, y) = (self.clamp_x(x), self.clamp_y(y));
        self.put(x, y, color);
    }

    /// Plots a pixel only if it lies inside the buffer.
    fn draw_point_clipped(&mut self, x: i32, y: i32, color: u16) {
        if x >= 0 && y >= 0 && x < i32::from(self.width) && y < i32::from(self.height) {
            self.put(x as u16, y as u16, color);
        }
    }

    /// Reads a pixel: 0/1 for mono, the RGB565 value otherwise.
    pub fn get_pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let width = self.width as usize;
        let pixel = match self.format {
            PixelFormat::Mono => {
                let byte = self.data[(y / 8) as usize * width + x as usize];
                u16::from((byte >> (y % 8)) & 1)
            }
            PixelFormat::Rgb565 => {
                let idx = (y as usize * width + x as usize) * 2;
                u16::from_be_bytes([self.data[idx], self.data[idx + 1]])
            }
        };
        Some(pixel)
    }

    /// Draws a line with a double error accumulator stepping along the
    /// major axis. Both endpoints are plotted.
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u16) {
        let (dx, dy) = ((x2 - x1).abs(), (y2 - y1).abs());
        let (incx, incy) = ((x2 - x1).signum(), (y2 - y1).signum());
        let distance = dx.max(dy);
        let (mut x, mut y) = (x1, y1);
        let (mut xerr, mut yerr) = (0, 0);

        for _ in 0..=distance {
            self.draw_point(x, y, color);
            xerr += dx;
            yerr += dy;
            if distance > 0 && xerr >= distance {
                xerr -= distance;
                x += incx;
            }
            if distance > 0 && yerr >= distance {
                yerr -= distance;
                y += incy;
            }
        }
    }

    /// Draws a rectangle outline.
    pub fn draw_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u16) {
        self.draw_line(x1, y1, x2, y1, color);
        self.draw_line(x1, y1, x1, y2, color);
        self.draw_line(x1, y2, x2, y2, color);
        self.draw_line(x2, y1, x2, y2, color);
    }

    /// Midpoint circle. Each step plots all eight octant reflections.
    pub fn draw_circle(&mut self, cx: i32, cy: i32, r: i32, color: u16) {
        if r < 0 {
            return;
        }
        let mut f = 1 - r;
        let mut ddf_x = 1;
        let mut ddf_y = -2 * r;
        let (mut x, mut y) = (0, r);

        self.plot_octants(cx, cy, x, y, color);
        while x < y {
            if f >= 0 {
                y -= 1;
                ddf_y += 2;
                f += ddf_y;
            }
            x += 1;
            ddf_x += 2;
            f += ddf_x;
            self.plot_octants(cx, cy, x, y, color);
        }
    }

    fn plot_octants(&mut self, cx: i32, cy: i32, a: i32, b: i32, color: u16) {
        for (px, py) in [
            (cx + a, cy + b),
            (cx - a, cy + b),
            (cx + a, cy - b),
            (cx - a, cy - b),
            (cx + b, cy + a),
            (cx - b, cy + a),
            (cx + b, cy - a),
            (cx - b, cy - a),
        ] {
            self.draw_point(px, py, color);
        }
    }

    /// Fills the rectangle spanned by two corners, inclusive. Corners are
    /// clamped like [`draw_point`](Self::draw_point).
    pub fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u16) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (xa, xb) = (self.clamp_x(x1), self.clamp_x(x2));
        let (ya, yb) = (self.clamp_y(y1), self.clamp_y(y2));
        let (x_lo, x_hi) = (xa.min(xb) as usize, xa.max(xb) as usize);
        let (y_lo, y_hi) = (ya.min(yb), ya.max(yb));
        let width = self.width as usize;

        match self.format {
            PixelFormat::Mono => {
                let (first, last) = (y_lo / 8, y_hi / 8);
                for page in first..=last {
                    let row_start = if page == first { y_lo % 8 } else { 0 };
                    let row_end = if page == last { y_hi % 8 } else { 7 };
                    let mask = (0xFFu8 << row_start) & (0xFFu8 >> (7 - row_end));
                    let base = page as usize * width;
                    for byte in &mut self.data[base + x_lo..=base + x_hi] {
                        if color != 0 {
                            *byte |= mask;
                        } else {
                            *byte &= !mask;
                        }
                    }
                    self.dirty[page as usize] = true;
                }
            }
            PixelFormat::Rgb565 => {
                let pattern = color.to_be_bytes();
                for y in y_lo..=y_hi {
                    let row = y as usize * width;
                    for x in x_lo..=x_hi {
                        let idx = (row + x) * 2;
                        self.data[idx..idx + 2].copy_from_slice(&pattern);
                    }
                    self.mark_dirty(y);
                }
            }
        }
    }

    /// Draws one glyph with its top-left corner at `(x, y)`.
    ///
    /// Set glyph bits take `fg`. Unset bits take `bg` unless `overlay` is
    /// true, in which case they are left untouched. Pixels outside the buffer
    /// are dropped.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_char<F: Font + ?Sized>(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: u16,
        bg: u16,
        font: &F,
        overlay: bool,
    ) {
        for row in 0..font.height() {
            let bits = font.row(ch, row);
            for col in 0..font.width() {
                let (px, py) = (x + i32::from(col), y + i32::from(row));
                if bits & (1 << col) != 0 {
                    self.draw_point_clipped(px, py, fg);
                } else if !overlay {
                    self.draw_point_clipped(px, py, bg);
                }
            }
        }
    }

    /// Draws a string left to right without wrapping. Returns the x position
    /// after the last glyph.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text<F: Font + ?Sized>(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        fg: u16,
        bg: u16,
        font: &F,
        overlay: bool,
    ) -> i32 {
        let advance = i32::from(font.advance());
        let mut cursor = x;
        for ch in text.chars() {
            self.draw_char(cursor, y, ch, fg, bg, font, overlay);
            cursor += advance;
        }
        cursor
    }

    /// Draws `value` right-aligned in a field of `digits` cells, with leading
    /// zeros shown as blanks. The last digit is always drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_number<F: Font + ?Sized>(
        &mut self,
        x: i32,
        y: i32,
        value: u64,
        digits: usize,
        fg: u16,
        bg: u16,
        font: &F,
    ) {
        let advance = i32::from(font.advance());
        let mut leading = true;
        for t in 0..digits {
            let place = 10u64.checked_pow((digits - t - 1) as u32);
            let digit = place.map_or(0, |p| (value / p) % 10) as u8;
            let cell_x = x + t as i32 * advance;
            if leading && t + 1 < digits && digit == 0 {
                self.draw_char(cell_x, y, ' ', fg, bg, font, false);
                continue;
            }
            leading = false;
            self.draw_char(cell_x, y, char::from(b'0' + digit), fg, bg, font, false);
        }
    }

    /// Draws `value` with one decimal place: `digits` digits of the value
    /// in tenths, zero padded, with '.' before the last one. Takes
    /// `digits + 1` cells. The fraction is truncated and negative values
    /// draw as zero.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_float<F: Font + ?Sized>(
        &mut self,
        x: i32,
        y: i32,
        value: f64,
        digits: usize,
        fg: u16,
        bg: u16,
        font: &F,
    ) {
        let advance = i32::from(font.advance());
        let tenths = (value * 10.0) as u64;
        for t in 0..digits {
            let place = 10u64.checked_pow((digits - t - 1) as u32);
            let digit = place.map_or(0, |p| (tenths / p) % 10) as u8;
            let mut cell = t as i32;
            if t + 1 == digits {
                self.draw_char(x + cell * advance, y, '.', fg, bg, font, false);
                cell += 1;
            }
            self.draw_char(x + cell * advance, y, char::from(b'0' + digit), fg, bg, font, false);
        }
    }

    /// Converts to RGBA8 for image export. Set mono pixels are black on white.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                let pixel = self.get_pixel(x, y).unwrap_or(0);
                let (r, g, b) = match self.format {
                    PixelFormat::Mono if pixel != 0 => (0, 0, 0),
                    PixelFormat::Mono => (255, 255, 255),
                    PixelFormat::Rgb565 => rgb565_to_rgb888(pixel),
                };
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
        }
        rgba
    }
}

/// Converts RGB888 to RGB565.
#[inline]
pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r >> 3) as u16;
    let g6 = (g >> 2) as u16;
    let b5 = (b >> 3) as u16;
    (r5 << 11) | (g6 << 5) | b5
}

/// Converts RGB565 to RGB888.
#[inline]
pub fn rgb565_to_rgb888(pixel: u16) -> (u8, u8, u8) {
    let r = ((pixel >> 11) & 0x1F) as u8;
    let g = ((pixel >> 5) & 0x3F) as u8;
    let b = (pixel & 0x1F) as u8;
    // Expand to 8-bit
    let r8 = (r << 3) | (r >> 2);
    let g8 = (g << 2) | (g >> 4);
    let b8 = (b << 3) | (b >> 2);
    (r8, g8, b8)
}

/// Parses a `#RRGGBB` colour to RGB565.
pub fn parse_hex_color(hex: &str) -> Option<u16> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(rgb888_to_rgb565(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::font::Ascii6x12;
    use std::collections::HashSet;

    fn mono() -> Framebuffer {
        Framebuffer::new(128, 128, PixelFormat::Mono)
    }

    fn lit(fb: &Framebuffer) -> HashSet<(i32, i32)> {
        let mut set = HashSet::new();
        for y in 0..fb.height() {
            for x in 0..fb.width() {
                if fb.get_pixel(x, y) == Some(1) {
                    set.insert((i32::from(x), i32::from(y)));
                }
            }
        }
        set
    }

    #[test]
    fn test_rgb565_conversion() {
        assert_eq!(rgb888_to_rgb565(255, 0, 0), 0xF800);
        assert_eq!(rgb888_to_rgb565(0, 255, 0), 0x07E0);
        assert_eq!(rgb888_to_rgb565(0, 0, 255), 0x001F);
        assert_eq!(rgb888_to_rgb565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb565_to_rgb888(0xFFFF), (255, 255, 255));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000"), Some(0xF800));
        assert_eq!(parse_hex_color("00FF00"), Some(0x07E0));
        assert_eq!(parse_hex_color("invalid"), None);
    }

    #[test]
    fn test_mono_layout() {
        let mut fb = mono();
        fb.clear(0);
        fb.draw_point(5, 19, 1);
        assert_eq!(fb.data()[2 * 128 + 5], 1 << 3);
        assert_eq!(fb.get_pixel(5, 19), Some(1));
    }

    #[test]
    fn test_point_set_then_clear_restores_buffer() {
        let mut fb = mono();
        fb.clear(0);
        let cleared = fb.data().to_vec();
        fb.draw_point(17, 42, 1);
        assert_ne!(fb.data(), cleared.as_slice());
        fb.draw_point(17, 42, 0);
        assert_eq!(fb.data(), cleared.as_slice());
    }

    #[test]
    fn test_point_clamps_to_edges() {
        let mut fb = mono();
        fb.clear(0);
        fb.draw_point(500, 500, 1);
        fb.draw_point(-3, 7, 1);
        assert_eq!(fb.get_pixel(127, 127), Some(1));
        assert_eq!(fb.get_pixel(0, 7), Some(1));
        assert_eq!(lit(&fb).len(), 2);
    }

    fn assert_fill_matches_points(x1: i32, y1: i32, x2: i32, y2: i32) {
        let mut filled = mono();
        filled.clear(0);
        filled.fill_rect(x1, y1, x2, y2, 1);

        let mut plotted = mono();
        plotted.clear(0);
        for y in y1..=y2 {
            for x in x1..=x2 {
                plotted.draw_point(x, y, 1);
            }
        }
        assert_eq!(filled.data(), plotted.data());

        filled.fill_rect(x1 + 1, y1 + 1, x2 - 1, y2 - 1, 0);
        for y in y1 + 1..y2 {
            for x in x1 + 1..x2 {
                plotted.draw_point(x, y, 0);
            }
        }
        assert_eq!(filled.data(), plotted.data());
    }

    #[test]
    fn test_fill_rect_page_straddling() {
        assert_fill_matches_points(3, 5, 40, 29);
    }

    #[test]
    fn test_fill_rect_single_page() {
        assert_fill_matches_points(10, 9, 20, 14);
    }

    #[test]
    fn test_fill_rect_rgb565() {
        let mut fb = Framebuffer::new(16, 16, PixelFormat::Rgb565);
        fb.clear(0x0000);
        fb.fill_rect(2, 3, 4, 5, 0xF800);
        assert_eq!(fb.get_pixel(3, 4), Some(0xF800));
        assert_eq!(fb.get_pixel(5, 4), Some(0x0000));
        let idx = (3 * 16 + 2) * 2;
        assert_eq!(&fb.data()[idx..idx + 2], &[0xF8, 0x00]);
    }

    #[test]
    fn test_horizontal_line() {
        let mut fb = mono();
        fb.clear(0);
        fb.draw_line(0, 0, 10, 0, 1);
        let pixels = lit(&fb);
        assert_eq!(pixels.len(), 11);
        assert!(pixels.iter().all(|&(_, y)| y == 0));
    }

    #[test]
    fn test_line_reaches_both_endpoints() {
        let mut fb = mono();
        fb.clear(0);
        fb.draw_line(20, 30, 7, 2, 1);
        let pixels = lit(&fb);
        assert!(pixels.contains(&(20, 30)));
        assert!(pixels.contains(&(7, 2)));
        assert_eq!(pixels.len(), 29);
    }

    #[test]
    fn test_circle_symmetry() {
        let mut fb = mono();
        fb.clear(0);
        fb.draw_circle(50, 50, 10, 1);
        let pixels = lit(&fb);
        assert!(pixels.contains(&(60, 50)));
        assert!(pixels.contains(&(50, 40)));
        for &(x, y) in &pixels {
            let (dx, dy) = (x - 50, y - 50);
            assert!(pixels.contains(&(50 + dy, 50 + dx)), "({}, {})", x, y);
            assert!(pixels.contains(&(50 - dx, 50 + dy)));
            assert!(pixels.contains(&(50 + dx, 50 - dy)));
        }
    }

    #[test]
    fn test_clear_patterns() {
        let mut fb = mono();
        fb.clear(1);
        assert!(fb.data().iter().all(|&b| b == 0xFF));

        let mut color = Framebuffer::new(4, 2, PixelFormat::Rgb565);
        color.clear(0x1234);
        assert_eq!(color.data(), &[0x12, 0x34].repeat(8)[..]);
    }

    #[test]
    fn test_text_overlay_and_clipping() {
        let font = Ascii6x12;
        let mut fb = mono();
        fb.clear(1);
        fb.draw_text(0, 0, "A", 1, 0, &font, false);
        assert_eq!(fb.get_pixel(2, 2), Some(1));
        assert_eq!(fb.get_pixel(0, 0), Some(0));
        assert_eq!(fb.get_pixel(6, 0), Some(1));

        fb.clear(1);
        fb.draw_text(0, 0, "A", 1, 0, &font, true);
        assert!(fb.data().iter().all(|&b| b == 0xFF));

        fb.clear(0);
        let end = fb.draw_text(124, 0, "MM", 1, 0, &font, false);
        assert_eq!(end, 136);
        assert!(lit(&fb).iter().all(|&(x, _)| x >= 124));
    }

    #[test]
    fn test_draw_number_blanks_leading_zeros() {
        let font = Ascii6x12;
        let mut expected = mono();
        expected.clear(0);
        expected.draw_text(0, 0, "  42", 1, 0, &font, false);

        let mut fb = mono();
        fb.clear(0);
        fb.draw_number(0, 0, 42, 4, 1, 0, &font);
        assert_eq!(fb.data(), expected.data());

        fb.clear(0);
        expected.clear(0);
        fb.draw_number(0, 0, 0, 3, 1, 0, &font);
        expected.draw_text(0, 0, "  0", 1, 0, &font, false);
        assert_eq!(fb.data(), expected.data());
    }

    #[test]
    fn test_draw_float_one_decimal() {
        let font = Ascii6x12;
        let mut expected = mono();
        expected.clear(0);
        expected.draw_text(0, 0, "03.1", 1, 0, &font, false);

        let mut fb = mono();
        fb.clear(0);
        fb.draw_float(0, 0, 3.14159, 3, 1, 0, &font);
        assert_eq!(fb.data(), expected.data());

        fb.clear(0);
        expected.clear(0);
        fb.draw_float(0, 12, 12.5, 4, 1, 0, &font);
        expected.draw_text(0, 12, "012.5", 1, 0, &font, false);
        assert_eq!(fb.data(), expected.data());

        fb.clear(0);
        expected.clear(0);
        fb.draw_float(0, 0, -2.0, 2, 1, 0, &font);
        expected.draw_text(0, 0, "0.0", 1, 0, &font, false);
        assert_eq!(fb.data(), expected.data());
    }

    #[test]
    fn test_dirty_tracking() {
        let mut fb = mono();
        for page in 0..fb.page_count() {
            fb.mark_clean(page);
        }
        assert!(!fb.has_dirty_pages());
        fb.draw_point(3, 17, 1);
        fb.fill_rect(0, 60, 5, 70, 1);
        assert_eq!(fb.dirty_pages(), vec![2, 7, 8]);
    }

    #[test]
    fn test_page_slices() {
        let mut fb = Framebuffer::new(4, 12, PixelFormat::Rgb565);
        fb.clear(0xFFFF);
        assert_eq!(fb.page(0).len(), 4 * 8 * 2);
        assert_eq!(fb.page(1).len(), 4 * 4 * 2);
        assert_eq!(fb.pages(0, 1).len(), fb.data().len());
        assert_eq!(mono().page(3).len(), 128);
    }

    #[test]
    fn test_copy_from_slice_size() {
        let mut fb = mono();
        assert_eq!(
            fb.copy_from_slice(&[0; 10]),
            Err(Error::FramebufferSize {
                expected: 2048,
                actual: 10
            })
        );
    }

    #[test]
    fn test_to_rgba8() {
        let mut fb = Framebuffer::new(2, 1, PixelFormat::Mono);
        fb.clear(0);
        fb.draw_point(1, 0, 1);
        assert_eq!(fb.to_rgba8(), vec![255, 255, 255, 255, 0, 0, 0, 255]);
    }
}
