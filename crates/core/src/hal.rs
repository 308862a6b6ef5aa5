//! Capability interfaces for the handful of peripherals the core touches.
//!
//! The joypad hardware is an ADC channel (resistor-ladder direction pad), one
//! pull-up input (action button), one output (buzzer) and an OLED that is
//! written one 8-pixel row page at a time. Everything in this crate reaches
//! the hardware only through these traits, so the firmware glue, the desktop
//! simulator and the unit tests can each supply their own implementation.

/// Analog sample source (the direction pad ADC channel).
pub trait AnalogInput {
    /// Take one conversion. Typical range is 0..=1023.
    fn read(&mut self) -> u16;
}

/// A single GPIO line.
pub trait DigitalPin {
    /// Current line level.
    fn is_high(&mut self) -> bool;
    fn set_high(&mut self);
    fn set_low(&mut self);
}

/// Blocking delays. Both calls must run to completion before returning.
pub trait DelayProvider {
    fn delay_ms(&mut self, ms: u32);
    fn delay_us(&mut self, us: u32);
}

/// Row-page oriented display sink.
///
/// A transaction is `data_start(page)`, any number of `send(byte)` calls
/// (one byte = 8 vertically stacked pixels, LSB on top, columns advancing
/// left to right), then `data_end()`.
pub trait DisplaySurface {
    fn data_start(&mut self, page: u8);
    fn send(&mut self, byte: u8);
    fn data_end(&mut self);
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    fn read(&mut self) -> u16 {
        (**self).read()
    }
}

impl<T: DelayProvider + ?Sized> DelayProvider for &mut T {
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

impl<T: DisplaySurface + ?Sized> DisplaySurface for &mut T {
    fn data_start(&mut self, page: u8) {
        (**self).data_start(page)
    }

    fn send(&mut self, byte: u8) {
        (**self).send(byte)
    }

    fn data_end(&mut self) {
        (**self).data_end()
    }
}
