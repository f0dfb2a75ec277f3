//! Interrupt-driven bit sampler for the shift-register bus.
//!
//! The two edge handlers are meant to be called straight from GPIO interrupt
//! context (or from a task on a high-priority interrupt executor): they never
//! block, never fail, and touch only the accumulator and the [`PacketStore`].
//!
//! CLOCK and LATCH edges must be delivered in arrival order from a single
//! context, so the accumulator has exactly one writer.

use crate::bus::GamepadBus;
use crate::store::PacketStore;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use sipo_proto::{Frame, ShiftRegister};

/// Reconstructs frames from CLOCK/DATA/LATCH edges.
///
/// Lives in a `static` so the interrupt side and the foreground can share it:
///
/// ```
/// use fixture_core::{BitSampler, GamepadBus};
/// use sipo_proto::Frame;
///
/// static SAMPLER: BitSampler = BitSampler::new();
///
/// let mut bus = &SAMPLER;
/// bus.enable();
///
/// // interrupt side
/// SAMPLER.on_clock_rising(true);
/// SAMPLER.on_clock_rising(false);
/// SAMPLER.on_clock_rising(true);
/// SAMPLER.on_latch_rising();
///
/// // foreground side
/// assert!(bus.new_packet());
/// assert_eq!(bus.captured_packet(), Frame(0b101));
/// ```
pub struct BitSampler {
    shift: AtomicU32,
    enabled: AtomicBool,
    store: PacketStore,
}

impl BitSampler {
    /// Disabled sampler with an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_frame_bits(32)
    }

    /// Disabled sampler for a bus that carries `bits` bits per frame.
    #[must_use]
    pub const fn with_frame_bits(bits: u8) -> Self {
        Self {
            shift: AtomicU32::new(0),
            enabled: AtomicBool::new(false),
            store: PacketStore::with_frame_bits(bits),
        }
    }

    /// CLOCK rising edge handler; `data` is the DATA level at the edge.
    #[inline]
    pub fn on_clock_rising(&self, data: bool) {
        if !self.enabled.load(Ordering::Acquire) {
            return;
        }
        let reg = ShiftRegister::from_raw(self.shift.load(Ordering::Relaxed)).clock(data);
        self.shift.store(reg.raw(), Ordering::Relaxed);
    }

    /// LATCH rising edge handler: closes the frame and hands it to the store.
    #[inline]
    pub fn on_latch_rising(&self) {
        if !self.enabled.load(Ordering::Acquire) {
            return;
        }
        let (frame, next) = ShiftRegister::from_raw(self.shift.load(Ordering::Relaxed)).latch();
        self.shift.store(next.raw(), Ordering::Relaxed);
        self.store.publish(frame);
    }

    /// Start accepting edges, from an empty accumulator and an empty store.
    pub fn enable(&self) {
        self.shift.store(0, Ordering::Relaxed);
        self.store.reset();
        self.enabled.store(true, Ordering::Release);
        debug!("bit sampler enabled");
    }

    /// Ignore all further edges.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
        debug!("bit sampler disabled");
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Frame store fed by the latch handler.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &PacketStore {
        &self.store
    }
}

impl Default for BitSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl GamepadBus for &BitSampler {
    fn enable(&mut self) {
        BitSampler::enable(*self);
    }

    fn disable(&mut self) {
        BitSampler::disable(*self);
    }

    fn new_packet(&mut self) -> bool {
        self.store.new_packet()
    }

    fn captured_packet(&self) -> Frame {
        self.store.captured_packet()
    }

    fn changed_value(&self) -> bool {
        self.store.changed_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_bits(sampler: &BitSampler, bits: &[u8]) {
        for &bit in bits {
            sampler.on_clock_rising(bit != 0);
        }
    }

    #[test]
    fn test_frame_is_bits_since_previous_latch() {
        let sampler = BitSampler::new();
        sampler.enable();
        clock_bits(&sampler, &[1, 0, 1]);
        sampler.on_latch_rising();
        assert!(sampler.store().new_packet());
        assert_eq!(sampler.store().captured_packet(), Frame(5));

        clock_bits(&sampler, &[1, 1, 0, 0]);
        sampler.on_latch_rising();
        assert_eq!(sampler.store().captured_packet(), Frame(0b1100));
    }

    #[test]
    fn test_empty_latch_is_a_valid_frame() {
        let sampler = BitSampler::new();
        sampler.enable();
        clock_bits(&sampler, &[1]);
        sampler.on_latch_rising();
        assert!(sampler.store().new_packet());

        sampler.on_latch_rising();
        assert!(sampler.store().new_packet());
        assert_eq!(sampler.store().captured_packet(), Frame(0));
        assert!(sampler.store().changed_value());

        // Accumulator is clean for the next frame
        clock_bits(&sampler, &[0, 1]);
        sampler.on_latch_rising();
        assert_eq!(sampler.store().captured_packet(), Frame(1));
    }

    #[test]
    fn test_disabled_sampler_ignores_bus() {
        let sampler = BitSampler::new();
        clock_bits(&sampler, &[1, 1]);
        sampler.on_latch_rising();
        assert!(!sampler.store().new_packet());
        assert_eq!(sampler.store().captured_packet(), Frame(0));

        sampler.enable();
        clock_bits(&sampler, &[1]);
        sampler.on_latch_rising();
        sampler.disable();
        clock_bits(&sampler, &[1, 1, 1]);
        sampler.on_latch_rising();
        assert!(sampler.store().new_packet());
        assert!(!sampler.store().new_packet());
        assert_eq!(sampler.store().captured_packet(), Frame(1));
    }

    #[test]
    fn test_enable_drops_partial_frame() {
        let sampler = BitSampler::new();
        sampler.enable();
        clock_bits(&sampler, &[1, 1, 1]);
        sampler.disable();
        sampler.enable();
        clock_bits(&sampler, &[1, 0]);
        sampler.on_latch_rising();
        assert_eq!(sampler.store().captured_packet(), Frame(0b10));
    }

    #[test]
    fn test_enable_drops_unread_frames() {
        let sampler = BitSampler::new();
        sampler.enable();
        clock_bits(&sampler, &[1, 1]);
        sampler.on_latch_rising();
        sampler.disable();

        sampler.enable();
        assert!(!sampler.store().new_packet());
        assert_eq!(sampler.store().snapshot(), (Frame(0), Frame(0)));
    }

    #[test]
    fn test_narrow_bus_masks_frames() {
        let sampler = BitSampler::with_frame_bits(4);
        sampler.enable();
        clock_bits(&sampler, &[1, 0, 1, 1, 0]);
        sampler.on_latch_rising();
        assert_eq!(sampler.store().captured_packet(), Frame(0b0110));
    }

    #[test]
    fn test_bus_facade() {
        let sampler = BitSampler::new();
        let mut bus = &sampler;
        bus.enable();
        assert!(sampler.is_enabled());

        clock_bits(&sampler, &[1, 0]);
        sampler.on_latch_rising();
        clock_bits(&sampler, &[1, 0]);
        sampler.on_latch_rising();
        assert!(bus.new_packet());
        assert!(!bus.new_packet());
        assert_eq!(bus.captured_packet(), Frame(2));
        assert!(!bus.changed_value());

        bus.disable();
        assert!(!sampler.is_enabled());
    }
}
