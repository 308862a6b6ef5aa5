//! 16-bit Galois LFSR used by the games for cheap randomness.
//!
//! Each step shifts the register right by one; when the bit shifted out was
//! set, the result is xored with the tap mask 0xB400. From the fixed seed the
//! sequence visits all 65535 non-zero states before repeating. Zero is a
//! fixed point of the recurrence and is never reached from a non-zero state.

/// Power-on seed.
pub const SEED: u16 = 0xACE1;
/// Feedback taps (x^16 + x^14 + x^13 + x^11 + 1).
pub const TAPS: u16 = 0xB400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Random {
    state: u16,
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl Random {
    pub const fn new() -> Self {
        Random { state: SEED }
    }

    /// Restore a previously exported register. Zero is rejected because the
    /// generator would stay there forever.
    pub fn from_state(state: u16) -> Option<Self> {
        if state == 0 { None } else { Some(Random { state }) }
    }

    pub fn state(&self) -> u16 {
        self.state
    }

    /// Advance one step and return the new register value.
    #[inline]
    pub fn next(&mut self) -> u16 {
        let lsb = self.state & 1;
        self.state = (self.state >> 1) ^ (0u16.wrapping_sub(lsb) & TAPS);
        self.state
    }

    /// Low byte of the next value.
    pub fn next_u8(&mut self) -> u8 {
        (self.next() & 0xFF) as u8
    }
}
