//! 5×7 column font for the menu labels.
//!
//! Only the characters the menu prints are present. Each glyph is five column
//! bytes, LSB at the top; glyphs are separated by one blank column. Text is
//! sent complemented so the menu appears as dark letters on a lit bar.

use crate::hal::DisplaySurface;

/// Width of a glyph in columns, without the separating gap.
pub const GLYPH_WIDTH: usize = 5;

/// Cursor arrow drawn in front of the selected row.
pub const CURSOR: [u8; 5] = [0x00, 0x41, 0x22, 0x14, 0x08];

pub fn glyph(c: char) -> Option<[u8; GLYPH_WIDTH]> {
    let g = match c {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x36, 0x36, 0x00, 0x00],
        'A' => [0x7E, 0x11, 0x11, 0x11, 0x7E],
        'C' => [0x3E, 0x41, 0x41, 0x41, 0x22],
        'D' => [0x7F, 0x41, 0x41, 0x41, 0x3E],
        'E' => [0x7F, 0x49, 0x49, 0x49, 0x41],
        'F' => [0x7F, 0x09, 0x09, 0x09, 0x01],
        'I' => [0x00, 0x41, 0x7F, 0x41, 0x00],
        'M' => [0x7F, 0x02, 0x0C, 0x02, 0x7F],
        'N' => [0x7F, 0x04, 0x08, 0x10, 0x7F],
        'O' => [0x3E, 0x41, 0x41, 0x41, 0x3E],
        'P' => [0x7F, 0x09, 0x09, 0x09, 0x06],
        'R' => [0x7F, 0x09, 0x19, 0x29, 0x46],
        'S' => [0x46, 0x49, 0x49, 0x49, 0x31],
        'T' => [0x01, 0x01, 0x7F, 0x01, 0x01],
        'U' => [0x3F, 0x40, 0x40, 0x40, 0x3F],
        _ => return None,
    };
    Some(g)
}

/// Send `n` inverted blank columns.
pub fn send_blank<S: DisplaySurface>(surface: &mut S, n: usize) {
    for _ in 0..n {
        surface.send(!0x00);
    }
}

/// Send `text` inverted, one gap column between glyphs, plus one after the
/// last glyph when `trailing_gap` is set. Unknown characters render blank.
pub fn send_text<S: DisplaySurface>(surface: &mut S, text: &str, trailing_gap: bool) {
    let count = text.chars().count();
    for (i, c) in text.chars().enumerate() {
        let g = glyph(c).unwrap_or([0; GLYPH_WIDTH]);
        for col in g {
            surface.send(!col);
        }
        if i + 1 < count || trailing_gap {
            surface.send(!0x00);
        }
    }
}

/// Columns `send_text` emits for `text`.
pub fn text_width(text: &str, trailing_gap: bool) -> usize {
    let n = text.chars().count();
    if n == 0 {
        return 0;
    }
    n * (GLYPH_WIDTH + 1) - if trailing_gap { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RecordingDisplay;

    #[test]
    fn test_menu_charset_present() {
        for c in "TETRIS PACMAN SOUND:ONOFF".chars() {
            assert!(glyph(c).is_some(), "missing {:?}", c);
        }
        assert!(glyph('z').is_none());
    }

    #[test]
    fn test_send_text_inverts_and_spaces() {
        let mut d = RecordingDisplay::new();
        d.data_start(0);
        send_text(&mut d, "IS", false);
        d.data_end();
        let (_, bytes) = &d.transactions()[0];
        assert_eq!(bytes.len(), text_width("IS", false));
        assert_eq!(bytes, &vec![0xFF, 0xBE, 0x80, 0xBE, 0xFF, 0xFF, 0xB9, 0xB6, 0xB6, 0xB6, 0xCE]);
    }

    #[test]
    fn test_trailing_gap() {
        assert_eq!(text_width("ON", true), 12);
        assert_eq!(text_width("ON", false), 11);
        assert_eq!(text_width("", true), 0);
    }
}
