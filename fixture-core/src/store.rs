//! Double-buffered frame store shared between the bus producer and the
//! polling consumer.
//!
//! The producer (a bus interrupt handler, or the PIO FIFO drain) is the only
//! writer of the frames and the only one to set `pending`; the consumer only
//! ever clears `pending`. [`PacketStore::reset`] is the one exception and
//! runs only while the producer is stopped. The last/current pair lives in a
//! single 64-bit word so a reader can never see one half of an update.

use portable_atomic::{AtomicBool, AtomicU64, Ordering};
use sipo_proto::Frame;

#[inline]
const fn pack(last: u32, current: u32) -> u64 {
    ((last as u64) << 32) | current as u64
}

#[inline]
const fn unpack(word: u64) -> (Frame, Frame) {
    (Frame((word >> 32) as u32), Frame(word as u32))
}

/// Holder of the two most recent frames plus a "new frame" flag.
///
/// # Example
///
/// ```
/// use fixture_core::PacketStore;
/// use sipo_proto::Frame;
///
/// let store = PacketStore::new();
/// store.publish(Frame(5));
/// assert!(store.new_packet());
/// assert!(!store.new_packet());
/// assert_eq!(store.captured_packet(), Frame(5));
/// assert!(store.changed_value());
/// ```
pub struct PacketStore {
    frames: AtomicU64,
    pending: AtomicBool,
    frame_bits: u8,
}

impl PacketStore {
    /// Store keeping all 32 bits of every frame.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_frame_bits(32)
    }

    /// Store that keeps only the low `bits` bits of every frame, so bits
    /// beyond the bus width never count as a change.
    #[must_use]
    pub const fn with_frame_bits(bits: u8) -> Self {
        Self {
            frames: AtomicU64::new(0),
            pending: AtomicBool::new(false),
            frame_bits: bits,
        }
    }

    /// Width applied on [`publish`](Self::publish).
    #[inline]
    #[must_use]
    pub const fn frame_bits(&self) -> u8 {
        self.frame_bits
    }

    /// Record a freshly closed frame. Producer side only; never blocks.
    #[inline]
    pub fn publish(&self, frame: Frame) {
        let frame = frame.masked(self.frame_bits);
        // Single writer: nobody else can change `current` under us
        let current = self.frames.load(Ordering::Relaxed) as u32;
        self.frames.store(pack(current, frame.0), Ordering::Release);
        self.pending.store(true, Ordering::Release);
    }

    /// Forget both frames and any unread arrival.
    ///
    /// Only call while the producer is stopped.
    pub fn reset(&self) {
        self.frames.store(0, Ordering::Release);
        self.pending.store(false, Ordering::Release);
    }

    /// Read and clear the "new frame" flag.
    ///
    /// Several frames published between two calls are reported once; only
    /// the latest stays visible.
    #[inline]
    pub fn new_packet(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Most recent frame.
    #[inline]
    #[must_use]
    pub fn captured_packet(&self) -> Frame {
        self.snapshot().1
    }

    /// `true` iff the most recent frame differs from the one before it.
    #[inline]
    #[must_use]
    pub fn changed_value(&self) -> bool {
        let (last, current) = self.snapshot();
        last != current
    }

    /// Consistent (previous, current) pair.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> (Frame, Frame) {
        unpack(self.frames.load(Ordering::Acquire))
    }
}

impl Default for PacketStore {
    fn default() -> Self {
        Self::new()
    }
}
