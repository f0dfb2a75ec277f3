//! Time source for the foreground loop.

use core::future::Future;

/// Monotonic clock plus a cooperative delay.
///
/// The session never spins: every loop iteration ends in
/// [`delay_ms`](Self::delay_ms) with the configured poll interval, which
/// lets the executor run other work (USB, logging) in between.
pub trait Timebase {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;

    /// Suspend the caller for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32) -> impl Future<Output = ()>;
}
