//! Operator indicator output and its blink cadence.

use embedded_hal::digital::{OutputPin, PinState};

/// A bank of on/off indicators; bit `i` of the pattern drives indicator `i`.
///
/// Patterns carry no protocol meaning, they only tell the operator which
/// phase the fixture is in.
pub trait Indicator {
    fn set_pattern(&mut self, pattern: u8);
}

impl<T: Indicator + ?Sized> Indicator for &mut T {
    fn set_pattern(&mut self, pattern: u8) {
        (**self).set_pattern(pattern);
    }
}

/// `N` output pins; bit `i` of the pattern drives pin `i`, extra bits are ignored.
///
/// Pin errors are dropped: a stuck LED must not take the fixture down.
pub struct LedBank<P, const N: usize> {
    pins: [P; N],
    pattern: u8,
}

impl<P: OutputPin, const N: usize> LedBank<P, N> {
    /// Wrap `pins` and switch every LED off.
    pub fn new(pins: [P; N]) -> Self {
        let mut bank = Self { pins, pattern: 0 };
        bank.set_pattern(0);
        bank
    }

    /// Last pattern written.
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> u8 {
        self.pattern
    }

    /// Give the pins back.
    pub fn release(self) -> [P; N] {
        self.pins
    }
}

impl<P: OutputPin, const N: usize> Indicator for LedBank<P, N> {
    fn set_pattern(&mut self, pattern: u8) {
        self.pattern = pattern;
        for (i, pin) in self.pins.iter_mut().enumerate() {
            let lit = i < 8 && pattern & (1 << i) != 0;
            if pin.set_state(PinState::from(lit)).is_err() {
                warn!("led {} did not accept state", i);
            }
        }
    }
}

/// Toggles an indicator pattern on a fixed period.
///
/// Compares against the last toggle time instead of spinning on the clock;
/// call [`poll`](Self::poll) once per loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Blinker {
    pattern: u8,
    period_ms: u64,
    lit: bool,
    last_toggle_ms: u64,
}

impl Blinker {
    /// Blinker starting dark at `now_ms`; first toggle lights `pattern`.
    #[must_use]
    pub const fn new(pattern: u8, period_ms: u64, now_ms: u64) -> Self {
        Self {
            pattern,
            period_ms,
            lit: false,
            last_toggle_ms: now_ms,
        }
    }

    /// Toggle if a full period elapsed. Returns `true` when it toggled.
    pub fn poll<I: Indicator + ?Sized>(&mut self, now_ms: u64, indicator: &mut I) -> bool {
        if now_ms.saturating_sub(self.last_toggle_ms) < self.period_ms {
            return false;
        }
        self.last_toggle_ms = now_ms;
        self.lit = !self.lit;
        indicator.set_pattern(if self.lit { self.pattern } else { 0 });
        true
    }

    #[inline]
    #[must_use]
    pub const fn is_lit(&self) -> bool {
        self.lit
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec;
    use std::vec::Vec;

    struct Recorder(Vec<u8>);

    impl Indicator for Recorder {
        fn set_pattern(&mut self, pattern: u8) {
            self.0.push(pattern);
        }
    }

    #[derive(Default)]
    struct FakePin {
        high: bool,
    }

    impl embedded_hal::digital::ErrorType for FakePin {
        type Error = core::convert::Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    fn lit(bank: LedBank<FakePin, 4>) -> [bool; 4] {
        bank.release().map(|pin| pin.high)
    }

    #[test]
    fn test_led_bank_maps_bits_to_pins() {
        let mut bank = LedBank::new(core::array::from_fn::<FakePin, 4, _>(|_| FakePin { high: true }));
        bank.set_pattern(0b0110);
        assert_eq!(bank.pattern(), 0b0110);
        assert_eq!(lit(bank), [false, true, true, false]);
    }

    #[test]
    fn test_led_bank_ignores_bits_beyond_pins() {
        let mut bank = LedBank::new(<[FakePin; 4]>::default());
        bank.set_pattern(0xFF);
        assert_eq!(lit(bank), [true; 4]);
    }

    #[test]
    fn test_led_bank_starts_dark() {
        let bank = LedBank::new(core::array::from_fn::<FakePin, 4, _>(|_| FakePin { high: true }));
        assert_eq!(lit(bank), [false; 4]);
    }

    #[test]
    fn test_blinker_toggles_once_per_period() {
        let mut leds = Recorder(Vec::new());
        let mut blinker = Blinker::new(0b0110, 1000, 0);

        assert!(!blinker.poll(999, &mut leds));
        assert!(blinker.poll(1000, &mut leds));
        assert!(blinker.is_lit());
        assert!(!blinker.poll(1500, &mut leds));
        assert!(blinker.poll(2100, &mut leds));
        assert!(!blinker.is_lit());
        assert!(blinker.poll(3100, &mut leds));

        assert_eq!(leds.0, vec![0b0110, 0, 0b0110]);
    }

    #[test]
    fn test_blinker_tolerates_clock_behind_start() {
        let mut leds = Recorder(Vec::new());
        let mut blinker = Blinker::new(0xFF, 1000, 5000);
        assert!(!blinker.poll(10, &mut leds));
        assert!(leds.0.is_empty());
    }
}
