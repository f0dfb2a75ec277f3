//! Gamepad bus facade consumed by the test phase.

use sipo_proto::Frame;

/// Polling view of a sampled gamepad bus.
///
/// Implemented by the interrupt-driven [`BitSampler`](crate::BitSampler) and
/// by hardware sequencers that capture frames on their own. Every method must
/// return immediately; none of them may wait for bus activity.
pub trait GamepadBus {
    /// Start sampling. The bus pins belong to the sampler from here on.
    fn enable(&mut self);

    /// Stop sampling. Bus activity after this call leaves stored frames alone.
    fn disable(&mut self);

    /// `true` once per batch of frames captured since the previous call.
    fn new_packet(&mut self) -> bool;

    /// Most recent captured frame.
    fn captured_packet(&self) -> Frame;

    /// `true` iff the most recent frame differs from the one before it.
    fn changed_value(&self) -> bool;
}

impl<T: GamepadBus + ?Sized> GamepadBus for &mut T {
    fn enable(&mut self) {
        (**self).enable();
    }

    fn disable(&mut self) {
        (**self).disable();
    }

    fn new_packet(&mut self) -> bool {
        (**self).new_packet()
    }

    fn captured_packet(&self) -> Frame {
        (**self).captured_packet()
    }

    fn changed_value(&self) -> bool {
        (**self).changed_value()
    }
}
