//! Edge-armed trigger latches (GO and RESET).
//!
//! An edge interrupt arms the latch; the foreground notices it on its next
//! poll and clears it explicitly. Nothing else ever resets a latch, so a
//! press can never be lost between two polls.

use portable_atomic::{AtomicBool, Ordering};

/// A boolean set from interrupt context and cleared by the consumer.
pub struct TriggerLatch(AtomicBool);

impl TriggerLatch {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Edge handler side: mark the trigger as seen.
    #[inline]
    pub fn arm(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the latch. Clearing an idle latch is a no-op.
    #[inline]
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for TriggerLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Which trigger fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Operator asked to proceed (rising edge).
    Go,
    /// Operator asked to stop (falling edge).
    Reset,
}

/// The fixture's two operator inputs.
pub struct Triggers {
    pub go: TriggerLatch,
    pub reset: TriggerLatch,
}

impl Triggers {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            go: TriggerLatch::new(),
            reset: TriggerLatch::new(),
        }
    }

    /// Latch the given trigger.
    pub fn arm(&self, trigger: Trigger) {
        match trigger {
            Trigger::Go => self.go.arm(),
            Trigger::Reset => self.reset.arm(),
        }
    }

    /// Clear both latches once a request has been acted on.
    pub fn request_handled(&self) {
        self.go.clear();
        self.reset.clear();
    }
}

impl Default for Triggers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_stays_set_until_cleared() {
        let latch = TriggerLatch::new();
        assert!(!latch.is_set());
        latch.arm();
        assert!(latch.is_set());
        latch.arm();
        assert!(latch.is_set());
        latch.clear();
        assert!(!latch.is_set());
        latch.clear();
        assert!(!latch.is_set());
    }

    #[test]
    fn test_triggers_are_independent() {
        let triggers = Triggers::new();
        triggers.arm(Trigger::Reset);
        assert!(!triggers.go.is_set());
        assert!(triggers.reset.is_set());

        triggers.arm(Trigger::Go);
        assert!(triggers.go.is_set());

        triggers.request_handled();
        assert!(!triggers.go.is_set());
        assert!(!triggers.reset.is_set());
    }
}
