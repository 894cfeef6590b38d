//! Demo scene.

use mpsse_panel_hw::lcd::Ascii6x12;
use mpsse_panel_hw::{Framebuffer, PixelFormat};

/// Foreground and background for the scene in the buffer's pixel format.
fn colors(format: PixelFormat) -> (u16, u16) {
    match format {
        PixelFormat::Mono => (1, 0),
        PixelFormat::Rgb565 => (0xFFFF, 0x0000),
    }
}

/// Border, diagonal, circle and a few lines of text, scaled to the buffer.
pub fn draw(fb: &mut Framebuffer, title: &str) {
    let (fg, bg) = colors(fb.format());
    let font = Ascii6x12;
    let w = i32::from(fb.width());
    let h = i32::from(fb.height());

    fb.clear(bg);
    fb.draw_rect(0, 0, w - 1, h - 1, fg);
    fb.draw_line(0, 0, w - 1, h - 1, fg);
    fb.draw_circle(w * 5 / 8, h * 5 / 16, w.min(h) / 6, fg);

    fb.draw_text(10, h * 15 / 32, "Hello", fg, bg, &font, true);
    fb.draw_text(10, h * 5 / 8, &title.to_uppercase(), fg, bg, &font, true);
    fb.draw_number(10, h * 25 / 32, 12345, 5, fg, bg, &font);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpsse_panel_hw::PanelModel;

    #[test]
    fn test_scene_on_uc1638() {
        let mut fb = Framebuffer::for_model(&PanelModel::uc1638());
        draw(&mut fb, "uc1638");
        assert_eq!(fb.get_pixel(0, 0), Some(1));
        assert_eq!(fb.get_pixel(127, 127), Some(1));
        assert_eq!(fb.get_pixel(64, 64), Some(1));
        assert_eq!(fb.get_pixel(101, 40), Some(1));
        assert_eq!(fb.get_pixel(80, 40), Some(0));
        assert_eq!(fb.dirty_pages().len(), 16);
    }

    #[test]
    fn test_scene_on_rgb565() {
        let mut fb = Framebuffer::for_model(&PanelModel::st7789());
        draw(&mut fb, "st7789");
        assert_eq!(fb.get_pixel(319, 0), Some(0xFFFF));
        assert_eq!(fb.get_pixel(1, 100), Some(0x0000));
    }
}
