//! Minimal PNG encoder for screenshots.
//!
//! Writes a single IDAT chunk compressed with `miniz_oxide`. The only pixel
//! format needed is 8-bit grayscale from the 1-bit framebuffer.

use crate::display::PageDisplay;
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const COLOR_GRAY: u8 = 0;
const ZLIB_LEVEL: u8 = 6;

/// Encode a monochrome image as a grayscale PNG.
///
/// `pixels` is a flat array of booleans (true = white, false = black).
pub fn encode_png_mono(width: u32, height: u32, pixels: &[bool]) -> Vec<u8> {
    let mut raw = Vec::with_capacity((width as usize + 1) * height as usize);
    for row in pixels.chunks_exact(width as usize).take(height as usize) {
        raw.push(0); // filter: None
        raw.extend(row.iter().map(|&on| if on { 255 } else { 0 }));
    }
    assemble(width, height, COLOR_GRAY, &raw)
}

/// Screenshot of the page framebuffer as a 1-bit-looking grayscale PNG.
pub fn screenshot(display: &PageDisplay) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(SCREEN_WIDTH * SCREEN_HEIGHT);
    for y in 0..SCREEN_HEIGHT {
        for x in 0..SCREEN_WIDTH {
            pixels.push(display.pixel(x, y));
        }
    }
    encode_png_mono(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, &pixels)
}

fn assemble(width: u32, height: u32, color_type: u8, raw: &[u8]) -> Vec<u8> {
    let zlib_data = miniz_oxide::deflate::compress_to_vec_zlib(raw, ZLIB_LEVEL);
    let mut png = Vec::with_capacity(zlib_data.len() + 64);
    png.extend_from_slice(&SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(color_type);
    ihdr.push(0); // compression
    ihdr.push(0); // filter
    ihdr.push(0); // interlace
    write_chunk(&mut png, b"IHDR", &ihdr);
    write_chunk(&mut png, b"IDAT", &zlib_data);
    write_chunk(&mut png, b"IEND", &[]);
    png
}

fn write_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    // CRC over type + data
    let crc = crc32(&chunk_type[..], data);
    out.extend_from_slice(&crc.to_be_bytes());
}

// CRC-32 (PNG/zlib)
fn crc32(chunk_type: &[u8], data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFFFFFF;
    for &b in chunk_type.iter().chain(data.iter()) {
        crc ^= b as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
        }
    }
    crc ^ 0xFFFFFFFF
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::DisplaySurface;

    /// Pull the IDAT payload back out and inflate it.
    fn idat(png: &[u8]) -> Vec<u8> {
        let mut pos = 8;
        while pos + 8 <= png.len() {
            let len = u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
            let kind = &png[pos + 4..pos + 8];
            if kind == b"IDAT" {
                let data = &png[pos + 8..pos + 8 + len];
                return miniz_oxide::inflate::decompress_to_vec_zlib(data).unwrap();
            }
            pos += 12 + len;
        }
        panic!("no IDAT");
    }

    #[test]
    fn test_crc_of_iend() {
        // Well-known CRC of an empty IEND chunk
        assert_eq!(crc32(b"IEND", &[]), 0xAE426082);
    }

    #[test]
    fn test_mono_png_layout() {
        let png = encode_png_mono(2, 2, &[true, false, false, true]);
        assert_eq!(&png[..8], &SIGNATURE);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(png[25], COLOR_GRAY);
        assert_eq!(idat(&png), vec![0, 255, 0, 0, 0, 255]);
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn test_screenshot_matches_framebuffer() {
        let mut display = PageDisplay::new();
        display.data_start(0);
        display.send(0x01);
        display.data_end();
        let raw = idat(&screenshot(&display));
        assert_eq!(raw.len(), (SCREEN_WIDTH + 1) * SCREEN_HEIGHT);
        assert_eq!(raw[1], 255);
        assert_eq!(raw[2], 0);
        assert_eq!(raw.iter().filter(|&&b| b == 255).count(), 1);
    }
}
