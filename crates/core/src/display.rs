//! 128×64 page-addressed monochrome framebuffer.
//!
//! Mirrors how the joypad's OLED takes data: pick a row page, stream column
//! bytes, close the transaction. The column pointer advances after each byte
//! and wraps to the next page at the right edge. Pixels are kept as RGBA so
//! the frontend can blit or screenshot them directly.

use crate::hal::DisplaySurface;
use crate::{SCREEN_HEIGHT, SCREEN_PAGES, SCREEN_WIDTH};

const FB_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT * 4; // RGBA

/// Page framebuffer standing in for the OLED.
pub struct PageDisplay {
    pub framebuffer: Vec<u8>,
    /// Raw page memory, one byte per column per page
    vram: [u8; SCREEN_WIDTH * SCREEN_PAGES],
    /// Current column pointer
    col: u8,
    /// Current page pointer (each page = 8 rows)
    page: u8,
    /// Inside a data_start/data_end transaction
    open: bool,
    /// Lit pixel brightness
    pub brightness: u8,
    /// Framebuffer changed since the last `take_dirty`
    dirty: bool,
    /// Transactions started since the last counter reset
    pub dbg_rows: u32,
    /// Data bytes received since the last counter reset
    pub dbg_data_count: u32,
}

impl Default for PageDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl PageDisplay {
    pub fn new() -> Self {
        let mut display = PageDisplay {
            framebuffer: vec![0; FB_SIZE],
            vram: [0; SCREEN_WIDTH * SCREEN_PAGES],
            col: 0,
            page: 0,
            open: false,
            brightness: 0xCF,
            dirty: false,
            dbg_rows: 0,
            dbg_data_count: 0,
        };
        display.clear();
        display
    }

    /// Blank every pixel.
    pub fn clear(&mut self) {
        self.vram = [0; SCREEN_WIDTH * SCREEN_PAGES];
        for px in self.framebuffer.chunks_exact_mut(4) {
            px.copy_from_slice(&[0, 0, 0, 0xFF]);
        }
        self.dirty = true;
    }

    /// Column byte at (`col`, `page`).
    pub fn column(&self, col: usize, page: usize) -> u8 {
        self.vram[page * SCREEN_WIDTH + col]
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        (self.column(x, y / 8) >> (y % 8)) & 1 != 0
    }

    pub fn lit_pixels(&self) -> usize {
        self.vram.iter().map(|b| b.count_ones() as usize).sum()
    }

    fn write_column(&mut self, byte: u8) {
        let x = self.col as usize;
        let page = self.page as usize;
        self.vram[page * SCREEN_WIDTH + x] = byte;
        let bright = self.brightness;
        for bit in 0..8usize {
            let on = (byte >> bit) & 1 != 0;
            let y = page * 8 + bit;
            let offset = (y * SCREEN_WIDTH + x) * 4;
            let level = if on { bright } else { 0 };
            self.framebuffer[offset] = level;
            self.framebuffer[offset + 1] = level;
            self.framebuffer[offset + 2] = level;
            self.framebuffer[offset + 3] = 0xFF;
        }
        self.dirty = true;

        // Advance cursor
        self.col += 1;
        if self.col as usize >= SCREEN_WIDTH {
            self.col = 0;
            self.page = (self.page + 1) % SCREEN_PAGES as u8;
        }
    }

    /// Whether anything was drawn since the last call; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Reset per-frame debug counters
    pub fn dbg_reset_counters(&mut self) {
        self.dbg_rows = 0;
        self.dbg_data_count = 0;
    }

    /// Convert framebuffer to u32 pixel array (0xRRGGBB format for minifb)
    pub fn as_pixel_buffer(&self) -> Vec<u32> {
        self.framebuffer.chunks_exact(4)
            .map(|px| ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32)
            .collect()
    }

    /// Render as half-block text, two pixel rows per line.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((SCREEN_WIDTH + 3) * SCREEN_HEIGHT / 2);
        for y in (0..SCREEN_HEIGHT).step_by(2) {
            out.push('|');
            for x in 0..SCREEN_WIDTH {
                let t = self.pixel(x, y);
                let b = self.pixel(x, y + 1);
                out.push(match (t, b) { (true, true) => '█', (true, false) => '▀', (false, true) => '▄', _ => ' ' });
            }
            out.push_str("|\n");
        }
        out
    }
}

impl DisplaySurface for PageDisplay {
    fn data_start(&mut self, page: u8) {
        self.dbg_rows += 1;
        self.page = page % SCREEN_PAGES as u8;
        self.col = 0;
        self.open = true;
    }

    fn send(&mut self, byte: u8) {
        self.dbg_data_count += 1;
        if self.open {
            self.write_column(byte);
        }
    }

    fn data_end(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu;

    #[test]
    fn test_display_creation() {
        let display = PageDisplay::new();
        assert_eq!(display.lit_pixels(), 0);
        assert_eq!(display.framebuffer.len(), FB_SIZE);
        assert_eq!(display.framebuffer[3], 0xFF);
    }

    #[test]
    fn test_write_pixel_data() {
        let mut display = PageDisplay::new();
        display.data_start(2);
        display.send(0xFF);
        display.send(0x01);
        display.data_end();
        assert!(display.take_dirty());
        for bit in 0..8 {
            assert!(display.pixel(0, 16 + bit), "pixel (0, {}) should be on", 16 + bit);
        }
        assert!(display.pixel(1, 16));
        assert!(!display.pixel(1, 17));
        let offset = (16 * SCREEN_WIDTH) * 4;
        assert_eq!(display.framebuffer[offset], display.brightness);
    }

    #[test]
    fn test_dirty_flag_cleared_on_take() {
        let mut display = PageDisplay::new();
        assert!(display.take_dirty());
        assert!(!display.take_dirty());
        // Stray bytes draw nothing
        display.send(0xFF);
        assert!(!display.take_dirty());
        display.data_start(0);
        display.send(0x00);
        display.data_end();
        assert!(display.take_dirty());
        display.clear();
        assert!(display.take_dirty());
    }

    #[test]
    fn test_bytes_outside_transaction_ignored() {
        let mut display = PageDisplay::new();
        display.send(0xFF);
        assert_eq!(display.lit_pixels(), 0);
        assert_eq!(display.dbg_data_count, 1);
    }

    #[test]
    fn test_column_wraps_to_next_page() {
        let mut display = PageDisplay::new();
        display.data_start(7);
        for _ in 0..SCREEN_WIDTH + 1 {
            display.send(0x80);
        }
        display.data_end();
        assert_eq!(display.column(0, 0), 0x80);
        assert_eq!(display.column(1, 0), 0);
    }

    #[test]
    fn test_menu_renders_lit_bars() {
        let mut display = PageDisplay::new();
        menu::draw_menu(&mut display, true);
        menu::draw_cursor(&mut display, 0);
        // First margin column of every row is lit (inverted blank)
        for page in menu::ROW_PAGES {
            assert_eq!(display.column(0, page as usize), 0xFF);
        }
        // cursor tip lands in column 1 of page 1
        assert_eq!(display.column(1, 1), !0x41);
        assert_eq!(display.column(0, 0), 0);
        assert!(display.to_ascii().contains('█'));
    }
}
