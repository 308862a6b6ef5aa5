//! Bit-banged piezo buzzer.
//!
//! There is no PWM involved: the tone generator toggles the buzzer line by
//! hand and busy-waits between edges. One call to [`Buzzer::play`] emits
//! `duration` full cycles, each one low for `255 - freq` µs and high for
//! `255 - freq` µs, so larger `freq` values give a *higher* pitch.
//!
//! **Blocking contract:** `play` owns the thread until the last cycle has been
//! emitted. No input is sampled and nothing is drawn in the meantime, and
//! there is no way to cut a tone short. On a host with real threads, keep it
//! that way by calling it on the same context that polls the menu.

use log::trace;

use crate::hal::{DelayProvider, DigitalPin};

/// One `(frequency, duration)` pair in buzzer units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub freq: u8,
    pub dur: u8,
}

impl Tone {
    pub const fn new(freq: u8, dur: u8) -> Self {
        Tone { freq, dur }
    }

    /// Half-period in microseconds.
    pub const fn half_period_us(&self) -> u32 {
        255 - self.freq as u32
    }

    /// Wall time the tone blocks for, in microseconds.
    pub const fn duration_us(&self) -> u64 {
        2 * self.half_period_us() as u64 * self.dur as u64
    }
}

/// Low half of the confirmation chirp.
pub const CONFIRM_LOW: Tone = Tone::new(20, 150);
/// High half of the confirmation chirp.
pub const CONFIRM_HIGH: Tone = Tone::new(100, 150);

/// Start-up jingle, each note followed by a 100 ms pause.
pub const START_JINGLE: [Tone; 3] = [Tone::new(20, 150), Tone::new(60, 150), Tone::new(100, 150)];
const JINGLE_GAP_MS: u32 = 100;

/// Buzzer output line.
pub struct Buzzer<P> {
    pin: P,
}

impl<P: DigitalPin> Buzzer<P> {
    pub fn new(pin: P) -> Self {
        Buzzer { pin }
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    /// Park the line at its idle (high) level.
    pub fn idle(&mut self) {
        self.pin.set_high();
    }

    /// Emit `dur` cycles of a square wave. Blocks for the whole tone.
    ///
    /// With `sound_enabled == false` this returns at once without touching
    /// the pin or the delay provider. `freq == 0` never pulls the line low,
    /// which turns the call into a timed silent hold.
    pub fn play<D: DelayProvider>(&mut self, delay: &mut D, sound_enabled: bool, freq: u8, dur: u8) {
        if !sound_enabled {
            return;
        }
        let half = 255 - freq as u32;
        trace!("tone freq={} dur={} half={}us", freq, dur, half);
        for _ in 0..dur {
            if cfg!(feature = "buzzer") && freq != 0 {
                self.pin.set_low();
            }
            delay.delay_us(half);
            self.pin.set_high();
            delay.delay_us(half);
        }
    }

    pub fn play_tone<D: DelayProvider>(&mut self, delay: &mut D, sound_enabled: bool, tone: Tone) {
        self.play(delay, sound_enabled, tone.freq, tone.dur);
    }

    /// The rising three-note power-on jingle.
    pub fn play_start_jingle<D: DelayProvider>(&mut self, delay: &mut D, sound_enabled: bool) {
        for tone in START_JINGLE {
            self.play_tone(delay, sound_enabled, tone);
            delay.delay_ms(JINGLE_GAP_MS);
        }
        delay.delay_ms(JINGLE_GAP_MS);
    }
}
