//! Direction pad and action button.
//!
//! The joypad wires all eight pad directions into one ADC channel through a
//! resistor ladder, so each direction (including the four diagonals) lands
//! on its own voltage. A direction is "pressed" when the sample falls
//! strictly inside `center ± deviation` of its calibration point:
//!
//! ```text
//!   E     N     NE    S     SE    W     NW    SW
//!   90   197   259   346   388   511   567   616
//! ```
//!
//! Each of up/down/left/right is the union of three windows, so a diagonal
//! sample asserts two predicates at once. Samples between windows, and
//! anything at or below the release threshold, assert nothing. There is no
//! hysteresis; a sample sitting on a window edge may flicker between polls.
//!
//! The action button is a pull-up input shorted to ground when pressed.

use serde::{Deserialize, Serialize};

use crate::hal::{AnalogInput, DigitalPin};

/// Eight pad positions of the resistor ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N, Direction::NE, Direction::E, Direction::SE,
        Direction::S, Direction::SW, Direction::W, Direction::NW,
    ];

    /// Predicates asserted by this position.
    pub const fn set(self) -> DirectionSet {
        let (up, down, left, right) = match self {
            Direction::N => (true, false, false, false),
            Direction::NE => (true, false, false, true),
            Direction::E => (false, false, false, true),
            Direction::SE => (false, true, false, true),
            Direction::S => (false, true, false, false),
            Direction::SW => (false, true, true, false),
            Direction::W => (false, false, true, false),
            Direction::NW => (true, false, true, false),
        };
        DirectionSet { up, down, left, right }
    }
}

/// The four predicates decoded from one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionSet {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionSet {
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Number of asserted predicates (0, 1 or 2 for a calibrated ladder).
    pub fn count(&self) -> u32 {
        self.up as u32 + self.down as u32 + self.left as u32 + self.right as u32
    }

    fn merge(&mut self, other: DirectionSet) {
        self.up |= other.up;
        self.down |= other.down;
        self.left |= other.left;
        self.right |= other.right;
    }
}

/// ADC calibration of one joypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    pub n: u16,
    pub ne: u16,
    pub e: u16,
    pub se: u16,
    pub s: u16,
    pub sw: u16,
    pub w: u16,
    pub nw: u16,
    /// Half-width of every acceptance window
    pub deviation: u16,
    /// Samples at or below this count mean "pad released"
    pub release_threshold: u16,
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration {
            n: 197,
            ne: 259,
            e: 90,
            se: 388,
            s: 346,
            sw: 616,
            w: 511,
            nw: 567,
            deviation: 20,
            release_threshold: 10,
        }
    }
}

impl Calibration {
    pub fn center(&self, dir: Direction) -> u16 {
        match dir {
            Direction::N => self.n,
            Direction::NE => self.ne,
            Direction::E => self.e,
            Direction::SE => self.se,
            Direction::S => self.s,
            Direction::SW => self.sw,
            Direction::W => self.w,
            Direction::NW => self.nw,
        }
    }

    /// True if `sample` lies strictly inside the window of `dir`.
    pub fn in_window(&self, dir: Direction, sample: u16) -> bool {
        let c = self.center(dir) as i32;
        let d = self.deviation as i32;
        let v = sample as i32;
        v > c - d && v < c + d
    }

    /// Decode one raw sample.
    pub fn decode(&self, sample: u16) -> DirectionSet {
        let mut set = DirectionSet::default();
        if sample <= self.release_threshold {
            return set;
        }
        for dir in Direction::ALL {
            if self.in_window(dir, sample) {
                set.merge(dir.set());
            }
        }
        set
    }

    /// Sample the ladder produces when `set` is held, if any position asserts
    /// exactly those predicates. A released pad maps to 0.
    pub fn sample_for(&self, set: DirectionSet) -> Option<u16> {
        if !set.any() {
            return Some(0);
        }
        Direction::ALL.iter()
            .find(|d| d.set() == set)
            .map(|&d| self.center(d))
    }
}

/// Decode a sample against the factory calibration.
pub fn direction(sample: u16) -> DirectionSet {
    Calibration::default().decode(sample)
}

/// The direction pad: an ADC channel plus its calibration.
///
/// Every predicate takes a fresh conversion, so two predicates queried in the
/// same poll may observe different samples.
pub struct DirectionPad<A> {
    adc: A,
    pub calibration: Calibration,
}

impl<A: AnalogInput> DirectionPad<A> {
    pub fn new(adc: A) -> Self {
        Self::with_calibration(adc, Calibration::default())
    }

    pub fn with_calibration(adc: A, calibration: Calibration) -> Self {
        DirectionPad { adc, calibration }
    }

    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    pub fn read(&mut self) -> DirectionSet {
        let sample = self.adc.read();
        self.calibration.decode(sample)
    }

    pub fn up_pressed(&mut self) -> bool {
        self.read().up
    }

    pub fn down_pressed(&mut self) -> bool {
        self.read().down
    }

    pub fn left_pressed(&mut self) -> bool {
        self.read().left
    }

    pub fn right_pressed(&mut self) -> bool {
        self.read().right
    }

    /// Any pad contact at all, calibrated or not.
    pub fn pressed(&mut self) -> bool {
        self.adc.read() > self.calibration.release_threshold
    }

    pub fn released(&mut self) -> bool {
        !self.pressed()
    }
}

/// Active-low action button.
pub struct ActionButton<P> {
    pin: P,
}

impl<P: DigitalPin> ActionButton<P> {
    pub fn new(pin: P) -> Self {
        ActionButton { pin }
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    pub fn pressed(&mut self) -> bool {
        !self.pin.is_high()
    }

    pub fn released(&mut self) -> bool {
        self.pin.is_high()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ScriptedAdc, SimClock, SimPin};

    #[test]
    fn test_centers_assert_their_predicates() {
        let cal = Calibration::default();
        for dir in Direction::ALL {
            let c = cal.center(dir);
            assert_eq!(direction(c), dir.set(), "{:?} center {}", dir, c);
        }
    }

    #[test]
    fn test_window_edges_are_exclusive() {
        let cal = Calibration::default();
        for dir in Direction::ALL {
            let c = cal.center(dir);
            assert!(!cal.in_window(dir, c + 20), "{:?} upper edge", dir);
            assert!(!cal.in_window(dir, c - 20), "{:?} lower edge", dir);
            assert!(cal.in_window(dir, c + 19));
            assert!(cal.in_window(dir, c - 19));
            // No other window covers the edges of the factory table
            assert!(!direction(c + 20).any(), "{:?} +20", dir);
            assert!(!direction(c - 20).any(), "{:?} -20", dir);
        }
    }

    #[test]
    fn test_diagonals_assert_two_cardinals_one() {
        let cal = Calibration::default();
        for dir in Direction::ALL {
            let expected = match dir {
                Direction::NE | Direction::SE | Direction::SW | Direction::NW => 2,
                _ => 1,
            };
            let set = direction(cal.center(dir));
            assert_eq!(set.count(), expected, "{:?}", dir);
            assert!(!(set.up && set.down));
            assert!(!(set.left && set.right));
        }
    }

    #[test]
    fn test_dead_zone() {
        assert_eq!(direction(5), DirectionSet::default());
        assert_eq!(direction(0), DirectionSet::default());
        assert_eq!(direction(10), DirectionSet::default());
        // between E and N windows
        assert_eq!(direction(150), DirectionSet::default());
        assert_eq!(direction(1023), DirectionSet::default());
    }

    #[test]
    fn test_release_threshold_overrides_custom_window() {
        let cal = Calibration { e: 15, ..Calibration::default() };
        assert!(!cal.decode(8).any());
        assert!(cal.decode(12).right);
    }

    #[test]
    fn test_sample_for_round_trips_through_decode() {
        let cal = Calibration::default();
        let set = DirectionSet { up: true, left: true, ..Default::default() };
        assert_eq!(cal.sample_for(set), Some(567));
        assert_eq!(cal.sample_for(DirectionSet::default()), Some(0));
        let impossible = DirectionSet { up: true, down: true, ..Default::default() };
        assert_eq!(cal.sample_for(impossible), None);
    }

    #[test]
    fn test_pad_takes_fresh_sample_per_predicate() {
        let mut adc = ScriptedAdc::new(0);
        adc.extend([197, 346, 511, 90, 90]);
        let mut pad = DirectionPad::new(adc);
        assert!(pad.up_pressed());
        assert!(pad.down_pressed());
        assert!(pad.left_pressed());
        assert!(pad.right_pressed());
        // east is not left
        assert!(!pad.left_pressed());
        assert!(pad.released());
        assert_eq!(pad.adc_mut().reads, 6);
    }

    #[test]
    fn test_pad_pressed_threshold() {
        let mut adc = ScriptedAdc::new(0);
        adc.extend([11, 10, 150]);
        let mut pad = DirectionPad::new(adc);
        assert!(pad.pressed());
        assert!(!pad.pressed());
        // Uncalibrated contact still counts as pressed
        assert!(pad.pressed());
    }

    #[test]
    fn test_button_active_low() {
        let mut button = ActionButton::new(SimPin::new(SimClock::new(), true));
        assert!(button.released());
        assert!(!button.pressed());
        button.pin_mut().force(false);
        assert!(button.pressed());
        assert!(!button.released());
    }
}
