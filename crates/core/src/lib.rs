//! # joypad-core
//!
//! Input, sound and menu core of the Tiny Joypad, a small handheld built
//! around a CH32V003 with a 128×64 OLED, one analog direction pad, one
//! action button and a piezo buzzer.
//!
//! The hardware is reached only through the traits in [`hal`], so the same
//! code runs on the device, in the desktop simulator and under `cargo test`.
//!
//! ## Architecture
//!
//! - [`Joypad`] - Bundles the pad, button, buzzer and delay of one console
//! - [`joystick`] - Resistor-ladder direction decoder and action button
//! - [`sound`] - Blocking bit-banged buzzer tones and the start jingle
//! - [`menu`] - Game selection menu ([`MenuContext`]) and its rendering
//! - [`random`] - 16-bit Galois LFSR for game logic
//! - [`font`] - 5×7 column glyphs for the menu labels
//! - [`display`] - Page-addressed framebuffer implementing [`hal::DisplaySurface`]
//! - [`png`] - Screenshot encoder
//! - [`settings`] - Persisted sound flag, menu position and RNG state
//! - [`sim`] - Deterministic peripheral doubles
//! - [`waveform`] - Buzzer edge log to PCM conversion
//!
//! ## Execution model
//!
//! Everything runs on one thread driven by an outer polling loop. Tones and
//! menu pauses block that thread until they finish; nothing is cancellable
//! and nothing needs locking.

pub mod hal;
pub mod joystick;
pub mod sound;
pub mod menu;
pub mod random;
pub mod font;
pub mod display;
pub mod png;
pub mod settings;
pub mod sim;
pub mod waveform;

pub use display::PageDisplay;
pub use joystick::{direction, ActionButton, Calibration, Direction, DirectionPad, DirectionSet};
pub use menu::{Game, MenuContext, OverallState};
pub use random::Random;
pub use sound::{Buzzer, Tone};

use hal::{AnalogInput, DelayProvider, DigitalPin};

/// Display width in pixels
pub const SCREEN_WIDTH: usize = 128;
/// Display height in pixels
pub const SCREEN_HEIGHT: usize = 64;
/// Number of 8-pixel row pages
pub const SCREEN_PAGES: usize = SCREEN_HEIGHT / 8;

/// The console's input and sound peripherals.
pub struct Joypad<A, B, S, D> {
    pub pad: DirectionPad<A>,
    pub action: ActionButton<B>,
    pub buzzer: Buzzer<S>,
    pub delay: D,
}

impl<A, B, S, D> Joypad<A, B, S, D>
where
    A: AnalogInput,
    B: DigitalPin,
    S: DigitalPin,
    D: DelayProvider,
{
    /// Wire up a joypad with the factory calibration.
    pub fn new(adc: A, action_pin: B, buzzer_pin: S, delay: D) -> Self {
        Self::with_calibration(adc, action_pin, buzzer_pin, delay, Calibration::default())
    }

    pub fn with_calibration(adc: A, action_pin: B, buzzer_pin: S, delay: D, calibration: Calibration) -> Self {
        Joypad {
            pad: DirectionPad::with_calibration(adc, calibration),
            action: ActionButton::new(action_pin),
            buzzer: Buzzer::new(buzzer_pin),
            delay,
        }
    }

    /// Power-on pin setup: buzzer line idles high.
    pub fn init(&mut self) {
        self.buzzer.idle();
    }

    /// Neither the action button nor the pad is touched.
    pub fn all_released(&mut self) -> bool {
        self.action.released() && self.pad.released()
    }

    pub fn play_start_jingle(&mut self, sound_enabled: bool) {
        self.buzzer.play_start_jingle(&mut self.delay, sound_enabled);
    }

    /// Block until everything is let go.
    pub fn wait_all_released(&mut self) {
        while !self.all_released() {
            self.delay.delay_ms(1);
        }
    }
}

/// Integer linear re-mapping of `x` from one range onto another.
///
/// Truncates toward zero like the firmware helper it replaces. An empty input
/// range maps everything to `out_min`; results outside `i32` saturate.
pub fn map_range(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    // Spans of two i32 ranges multiply past i64
    let (x, in_min, in_max, out_min, out_max) =
        (x as i128, in_min as i128, in_max as i128, out_min as i128, out_max as i128);
    let mapped = (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min;
    i32::try_from(mapped).unwrap_or(if mapped < 0 { i32::MIN } else { i32::MAX })
}
