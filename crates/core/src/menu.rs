//! Game selection menu.
//!
//! Three rows: two games and a sound switch. The cursor moves with up/down
//! and stops at both ends (no wrap-around). The action button either starts
//! the game under the cursor or flips the sound setting.
//!
//! Inputs are not debounced in hardware. Every transition that changes state
//! is followed by a 200 ms blocking pause, which keeps a held direction from
//! racing through the rows and a held button from re-triggering.
//!
//! ```text
//!   page 1   > TETRIS
//!   page 3     PACMAN
//!   page 6     SOUND:ON
//! ```

use log::{debug, info};

use crate::font;
use crate::hal::{AnalogInput, DelayProvider, DigitalPin, DisplaySurface};
use crate::sound::{CONFIRM_HIGH, CONFIRM_LOW};
use crate::{Joypad, SCREEN_PAGES, SCREEN_WIDTH};

/// Pause after every state-changing input (doubles as debounce).
pub const ACTION_DELAY_MS: u32 = 200;
/// Highest menu position (the sound row).
pub const LAST_POSITION: u8 = 2;
/// Position of the sound switch row.
pub const SOUND_POSITION: u8 = 2;
/// Row page of each menu position.
pub const ROW_PAGES: [u8; 3] = [1, 3, 6];
/// Logo width in columns (its height is the full screen).
pub const LOGO_WIDTH: usize = 64;
/// Size of a page-major startup logo bitmap.
pub const LOGO_BYTES: usize = LOGO_WIDTH * SCREEN_PAGES;
/// Blank columns before the label text.
const LEFT_MARGIN: usize = 6;

/// Selectable games, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Game {
    Tetris,
    Pacman,
}

impl Game {
    pub fn from_position(position: u8) -> Option<Game> {
        match position {
            0 => Some(Game::Tetris),
            1 => Some(Game::Pacman),
            _ => None,
        }
    }

    /// Index handed to the game dispatcher (same as the menu position).
    pub fn index(self) -> u8 {
        match self {
            Game::Tetris => 0,
            Game::Pacman => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Game::Tetris => "TETRIS",
            Game::Pacman => "PACMAN",
        }
    }

    pub fn state(self) -> OverallState {
        match self {
            Game::Tetris => OverallState::Tetris,
            Game::Pacman => OverallState::Pacman,
        }
    }
}

/// Top-level console state, owned by the game dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallState {
    Menu = 0,
    Tetris = 1,
    Pacman = 2,
}

/// State that survives between polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuContext {
    position: u8,
    /// Position of the last redraw (None until the first one)
    drawn: Option<u8>,
    sound_enabled: bool,
}

impl Default for MenuContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuContext {
    pub fn new() -> Self {
        MenuContext { position: 0, drawn: None, sound_enabled: true }
    }

    /// Context resumed from persisted settings. Out-of-range positions clamp
    /// to the last row.
    pub fn restore(position: u8, sound_enabled: bool) -> Self {
        MenuContext { position: position.min(LAST_POSITION), drawn: None, sound_enabled }
    }

    pub fn position(&self) -> u8 {
        self.position
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Forget the last redraw so the next poll repaints (e.g. after a game
    /// has used the screen).
    pub fn invalidate(&mut self) {
        self.drawn = None;
    }

    /// Move the cursor up. Returns whether the position changed.
    pub fn move_up(&mut self) -> bool {
        if self.position > 0 {
            self.position -= 1;
            true
        } else {
            false
        }
    }

    /// Move the cursor down. Returns whether the position changed.
    pub fn move_down(&mut self) -> bool {
        if self.position < LAST_POSITION {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// One pass of the menu loop.
    ///
    /// Samples up, down and the action button in that order (a fresh ADC
    /// conversion each), plays confirmation tones, and repaints when needed.
    /// Returns the game to launch when one was confirmed.
    pub fn poll<A, B, S, D, Surf>(&mut self, joypad: &mut Joypad<A, B, S, D>, display: &mut Surf) -> Option<Game>
    where
        A: AnalogInput,
        B: DigitalPin,
        S: DigitalPin,
        D: DelayProvider,
        Surf: DisplaySurface,
    {
        let mut needs_redraw = false;
        let mut selected = None;

        if joypad.pad.up_pressed() && self.move_up() {
            debug!("menu up -> {}", self.position);
            if self.sound_enabled {
                needs_redraw = true;
            }
            joypad.delay.delay_ms(ACTION_DELAY_MS);
        }

        if joypad.pad.down_pressed() && self.move_down() {
            debug!("menu down -> {}", self.position);
            if self.sound_enabled {
                needs_redraw = true;
            }
            joypad.delay.delay_ms(ACTION_DELAY_MS);
        }

        if joypad.action.pressed() {
            match Game::from_position(self.position) {
                Some(game) => {
                    self.chirp(joypad);
                    joypad.delay.delay_ms(ACTION_DELAY_MS);
                    info!("selected {} (game {})", game.label(), game.index());
                    selected = Some(game);
                }
                None => {
                    self.sound_enabled = !self.sound_enabled;
                    info!("sound {}", if self.sound_enabled { "on" } else { "off" });
                    self.chirp(joypad);
                    needs_redraw = true;
                    joypad.delay.delay_ms(ACTION_DELAY_MS);
                }
            }
        }

        if needs_redraw || self.drawn != Some(self.position) {
            self.redraw(display);
        }

        selected
    }

    /// Low-then-high confirmation chirp. The low note is skipped outright
    /// when sound is off; the high note relies on the generator's own gate.
    fn chirp<A, B, S, D>(&self, joypad: &mut Joypad<A, B, S, D>)
    where
        A: AnalogInput,
        B: DigitalPin,
        S: DigitalPin,
        D: DelayProvider,
    {
        if self.sound_enabled {
            joypad.buzzer.play_tone(&mut joypad.delay, self.sound_enabled, CONFIRM_LOW);
        }
        joypad.buzzer.play_tone(&mut joypad.delay, self.sound_enabled, CONFIRM_HIGH);
    }

    /// Paint all rows and the cursor, and remember what was drawn.
    pub fn redraw<Surf: DisplaySurface>(&mut self, display: &mut Surf) {
        debug!("menu redraw at {}", self.position);
        draw_menu(display, self.sound_enabled);
        draw_cursor(display, self.position);
        self.drawn = Some(self.position);
    }
}

/// Paint the three menu rows.
pub fn draw_menu<Surf: DisplaySurface>(display: &mut Surf, sound_enabled: bool) {
    for game in [Game::Tetris, Game::Pacman] {
        display.data_start(ROW_PAGES[game.index() as usize]);
        font::send_blank(display, LEFT_MARGIN);
        font::send_text(display, game.label(), false);
        display.data_end();
    }

    display.data_start(ROW_PAGES[SOUND_POSITION as usize]);
    font::send_blank(display, LEFT_MARGIN);
    font::send_text(display, "SOUND:", true);
    if sound_enabled {
        font::send_text(display, "ON", true);
        // wipe the tail of a previous "OFF"
        font::send_blank(display, font::text_width("OFF", true) - font::text_width("ON", true));
    } else {
        font::send_text(display, "OFF", true);
    }
    display.data_end();
}

/// Power-on splash: a lit screen with a 64×64 logo in the right half.
///
/// `logo` holds eight pages of 64 column bytes, page-major.
pub fn draw_startup_logo<Surf: DisplaySurface>(display: &mut Surf, logo: &[u8; LOGO_BYTES]) {
    for page in 0..SCREEN_PAGES as u8 {
        display.data_start(page);
        for _ in 0..SCREEN_WIDTH - LOGO_WIDTH {
            display.send(0xFF);
        }
        let row = page as usize * LOGO_WIDTH;
        for &col in &logo[row..row + LOGO_WIDTH] {
            display.send(col);
        }
        display.data_end();
    }
}

/// Paint the cursor arrow at the start of the row for `position`.
pub fn draw_cursor<Surf: DisplaySurface>(display: &mut Surf, position: u8) {
    let page = ROW_PAGES[position.min(LAST_POSITION) as usize];
    display.data_start(page);
    for col in font::CURSOR {
        display.send(!col);
    }
    display.data_end();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joystick::Calibration;
    use crate::sim::{RecordingDisplay, ScriptedAdc, SimClock, SimDelay, SimPin};

    type TestPad = Joypad<ScriptedAdc, SimPin, SimPin, SimDelay>;

    fn rig() -> (TestPad, RecordingDisplay) {
        let clock = SimClock::new();
        let joypad = Joypad::new(
            ScriptedAdc::new(0),
            SimPin::new(clock.clone(), true),
            SimPin::new(clock.clone(), true),
            SimDelay::new(clock),
        );
        (joypad, RecordingDisplay::new())
    }

    const UP: u16 = 197;
    const DOWN: u16 = 346;

    /// Queue the two pad samples one poll takes.
    fn script(joypad: &mut TestPad, up: u16, down: u16) {
        joypad.pad.adc_mut().extend([up, down]);
    }

    fn press(joypad: &mut TestPad) {
        joypad.action.pin_mut().force(false);
    }

    fn release(joypad: &mut TestPad) {
        joypad.action.pin_mut().force(true);
    }

    #[test]
    fn test_first_poll_redraws() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::new();
        assert_eq!(menu.poll(&mut joypad, &mut display), None);
        assert_eq!(display.pages_started(), vec![1, 3, 6, 1]);
        assert_eq!(joypad.delay.calls(), 0);

        display.clear();
        menu.poll(&mut joypad, &mut display);
        assert!(display.ops.is_empty());
    }

    #[test]
    fn test_down_clamps_at_sound_row() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::new();
        for _ in 0..3 {
            script(&mut joypad, 0, DOWN);
            menu.poll(&mut joypad, &mut display);
        }
        assert_eq!(menu.position(), 2);
        // Only the two effective moves paused
        assert_eq!(joypad.delay.ms_calls, 2);
    }

    #[test]
    fn test_up_clamps_at_top() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::new();
        script(&mut joypad, UP, 0);
        menu.poll(&mut joypad, &mut display);
        assert_eq!(menu.position(), 0);
        assert_eq!(joypad.delay.ms_calls, 0);
    }

    #[test]
    fn test_up_and_down_in_same_poll() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::restore(1, true);
        script(&mut joypad, UP, DOWN);
        menu.poll(&mut joypad, &mut display);
        assert_eq!(menu.position(), 1);
        assert_eq!(joypad.delay.ms_calls, 2);
    }

    #[test]
    fn test_diagonal_counts_as_up() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::restore(2, true);
        let ne = Calibration::default().ne;
        script(&mut joypad, ne, 0);
        menu.poll(&mut joypad, &mut display);
        assert_eq!(menu.position(), 1);
    }

    #[test]
    fn test_move_redraws_cursor_row() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::new();
        menu.poll(&mut joypad, &mut display);
        display.clear();
        script(&mut joypad, 0, DOWN);
        menu.poll(&mut joypad, &mut display);
        assert_eq!(display.pages_started(), vec![1, 3, 6, 3]);
        let cursor = display.transactions().pop().unwrap();
        assert_eq!(cursor.1, vec![0xFF, 0xBE, 0xDD, 0xEB, 0xF7]);
    }

    #[test]
    fn test_move_with_sound_off_still_redraws_on_position_change() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::restore(0, false);
        menu.poll(&mut joypad, &mut display);
        display.clear();
        script(&mut joypad, 0, DOWN);
        menu.poll(&mut joypad, &mut display);
        assert_eq!(display.pages_started(), vec![1, 3, 6, 3]);
    }

    #[test]
    fn test_confirm_first_game() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::new();
        press(&mut joypad);
        let picked = menu.poll(&mut joypad, &mut display);
        assert_eq!(picked, Some(Game::Tetris));
        assert_eq!(picked.map(Game::state), Some(OverallState::Tetris));
        assert!(menu.sound_enabled());
        // two tones, then the pause
        assert_eq!(joypad.delay.ms_calls, 1);
        assert_eq!(joypad.delay.us_calls, 2 * (150 + 150));
        let expected = CONFIRM_LOW.duration_us() + CONFIRM_HIGH.duration_us() + 200_000;
        assert_eq!(joypad.delay.clock().now_us(), expected);
    }

    #[test]
    fn test_confirm_second_game() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::restore(1, true);
        press(&mut joypad);
        let picked = menu.poll(&mut joypad, &mut display);
        assert_eq!(picked, Some(Game::Pacman));
        assert_eq!(picked.map(|g| g.index()), Some(1));
        assert_eq!(picked.map(Game::state), Some(OverallState::Pacman));
        assert!(menu.sound_enabled());
    }

    #[test]
    fn test_confirm_with_sound_off_is_silent() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::restore(0, false);
        press(&mut joypad);
        assert_eq!(menu.poll(&mut joypad, &mut display), Some(Game::Tetris));
        assert_eq!(joypad.buzzer.pin_mut().writes, 0);
        assert_eq!(joypad.delay.us_calls, 0);
        assert_eq!(joypad.delay.ms_calls, 1);
    }

    #[test]
    fn test_toggle_sound_off_then_on() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::restore(2, true);
        menu.poll(&mut joypad, &mut display);
        display.clear();

        press(&mut joypad);
        assert_eq!(menu.poll(&mut joypad, &mut display), None);
        assert!(!menu.sound_enabled());
        // New flag is off, so neither tone sounds
        assert_eq!(joypad.delay.us_calls, 0);
        assert_eq!(joypad.buzzer.pin_mut().writes, 0);
        // Forced redraw even though the position is unchanged
        assert_eq!(display.pages_started(), vec![1, 3, 6, 6]);

        display.clear();
        assert_eq!(menu.poll(&mut joypad, &mut display), None);
        release(&mut joypad);
        assert!(menu.sound_enabled());
        assert_eq!(joypad.delay.us_calls, 2 * (150 + 150));
        assert_eq!(joypad.delay.ms_calls, 2);
        assert_eq!(display.pages_started(), vec![1, 3, 6, 6]);
    }

    #[test]
    fn test_sound_row_label_follows_flag() {
        let mut on = RecordingDisplay::new();
        draw_menu(&mut on, true);
        let mut off = RecordingDisplay::new();
        draw_menu(&mut off, false);
        let on_row = &on.transactions()[2].1;
        let off_row = &off.transactions()[2].1;
        // Both variants cover the same columns so "ON" erases "OFF"
        assert_eq!(on_row.len(), off_row.len());
        assert_eq!(on_row.len(), 6 + 9 * 6);
        assert_ne!(on_row, off_row);
        assert_eq!(&on_row[on_row.len() - 6..], &[0xFF; 6]);
    }

    #[test]
    fn test_startup_logo_fills_right_half() {
        let mut logo = [0u8; LOGO_BYTES];
        logo[0] = 0x12;
        logo[LOGO_BYTES - 1] = 0x34;
        let mut display = RecordingDisplay::new();
        draw_startup_logo(&mut display, &logo);
        let rows = display.transactions();
        assert_eq!(rows.len(), 8);
        for (page, (p, bytes)) in rows.iter().enumerate() {
            assert_eq!(*p as usize, page);
            assert_eq!(bytes.len(), SCREEN_WIDTH);
            assert!(bytes[..64].iter().all(|&b| b == 0xFF));
        }
        assert_eq!(rows[0].1[64], 0x12);
        assert_eq!(rows[0].1[65], 0x00);
        assert_eq!(rows[7].1[127], 0x34);
    }

    #[test]
    fn test_restore_clamps_position() {
        assert_eq!(MenuContext::restore(9, true).position(), 2);
    }

    #[test]
    fn test_invalidate_forces_repaint() {
        let (mut joypad, mut display) = rig();
        let mut menu = MenuContext::new();
        menu.poll(&mut joypad, &mut display);
        menu.invalidate();
        display.clear();
        menu.poll(&mut joypad, &mut display);
        assert_eq!(display.pages_started(), vec![1, 3, 6, 1]);
    }
}
