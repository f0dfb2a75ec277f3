//! Firmware flasher contract and scoped ownership of the programming lines.
//!
//! The programming protocol itself lives outside this crate. The fixture only
//! needs to acquire a flasher, ask it to write an image, and give the
//! hardware back before the gamepad bus is sampled, because the debug line and
//! the bus pins may share the same GPIOs.

use core::future::Future;
use core::ops::{Deref, DerefMut};

/// Firmware image to write, identified by its path on the image store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareImage<'a> {
    path: &'a str,
}

impl<'a> FirmwareImage<'a> {
    #[must_use]
    pub const fn new(path: &'a str) -> Self {
        Self { path }
    }

    #[inline]
    #[must_use]
    pub const fn path(&self) -> &'a str {
        self.path
    }
}

/// Error type for flashing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// No programmer attached, or its hardware is held elsewhere.
    Unavailable,
    /// Target did not answer on the debug line.
    NotResponding,
    /// Transfer error on the debug line.
    Io,
    /// Read-back did not match the image.
    Verify,
    /// Target did not finish an operation in time.
    Timeout,
    /// Image could not be opened or is malformed.
    Image,
}

impl core::fmt::Display for FlashError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "programmer unavailable"),
            Self::NotResponding => write!(f, "target not responding"),
            Self::Io => write!(f, "debug link error"),
            Self::Verify => write!(f, "verification failed"),
            Self::Timeout => write!(f, "target timed out"),
            Self::Image => write!(f, "bad firmware image"),
        }
    }
}

/// An acquired flasher that holds the programming hardware exclusively.
pub trait Flasher {
    /// Write `image` to the target.
    fn flash(&mut self, image: &FirmwareImage<'_>) -> impl Future<Output = Result<(), FlashError>>;

    /// Give the programming hardware back. Must be safe to call twice.
    fn release(&mut self);
}

/// Source of flashers, asked once per burn phase.
pub trait FlasherProvider {
    type Flasher: Flasher;

    /// Take ownership of the programming hardware.
    fn acquire(&mut self) -> Result<Self::Flasher, FlashError>;
}

/// Releases the wrapped flasher when dropped.
///
/// Holding the flasher in a guard makes every way out of the burn phase
/// (success, exhausted retries, operator abort, a dropped future) give the
/// programming lines back.
pub struct FlasherGuard<F: Flasher> {
    flasher: F,
}

impl<F: Flasher> FlasherGuard<F> {
    #[must_use]
    pub fn new(flasher: F) -> Self {
        Self { flasher }
    }
}

impl<F: Flasher> Deref for FlasherGuard<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.flasher
    }
}

impl<F: Flasher> DerefMut for FlasherGuard<F> {
    fn deref_mut(&mut self) -> &mut F {
        &mut self.flasher
    }
}

impl<F: Flasher> Drop for FlasherGuard<F> {
    fn drop(&mut self) {
        self.flasher.release();
        debug!("flasher released");
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingFlasher {
        releases: Rc<Cell<u32>>,
    }

    impl Flasher for CountingFlasher {
        fn flash(&mut self, _image: &FirmwareImage<'_>) -> impl Future<Output = Result<(), FlashError>> {
            core::future::ready(Ok(()))
        }

        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let releases = Rc::new(Cell::new(0));
        {
            let _guard = FlasherGuard::new(CountingFlasher {
                releases: releases.clone(),
            });
            assert_eq!(releases.get(), 0);
        }
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_guard_releases_on_early_return() {
        fn bail(releases: Rc<Cell<u32>>) -> Result<(), FlashError> {
            let _guard = FlasherGuard::new(CountingFlasher { releases });
            Err::<(), _>(FlashError::Verify)?;
            Ok(())
        }

        let releases = Rc::new(Cell::new(0));
        assert_eq!(bail(releases.clone()), Err(FlashError::Verify));
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_image_path() {
        let image = FirmwareImage::new("gamepad_pmod.bin");
        assert_eq!(image.path(), "gamepad_pmod.bin");
    }
}
