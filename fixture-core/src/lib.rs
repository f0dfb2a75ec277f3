//! Platform-agnostic burn-and-test fixture logic.
//!
//! This crate holds everything between the GPIO edges and the operator
//! console that does not depend on a chip, so it can run in embedded
//! `no_std` firmware and in host tests alike.
//!
//! # Overview
//!
//! - [`store`]: Lock-free last/current frame pair ([`PacketStore`])
//! - [`sampler`]: Edge-driven shift-register sampler ([`BitSampler`])
//! - [`bus`]: What the session needs from a sampler ([`GamepadBus`])
//! - [`trigger`]: Operator button latches ([`Triggers`], [`TriggerLatch`])
//! - [`flasher`]: Firmware writer contract ([`Flasher`], [`FlasherProvider`], [`FlasherGuard`])
//! - [`output`]: Indicator trait, LED bank and blink cadence ([`Indicator`], [`LedBank`], [`Blinker`])
//! - [`timebase`]: Clock and cooperative delay ([`Timebase`])
//! - [`config`]: Tunables ([`FixtureConfig`])
//! - [`session`]: The state machine tying it together ([`FixtureSession`])
//!
//! # Concurrency
//!
//! Interrupt context only touches [`BitSampler`] edge handlers and
//! [`TriggerLatch::arm`]. Both are plain atomics, so the foreground loop can
//! read them without locks. On `thumbv6m` the firmware enables the
//! `critical-section` backend of `portable-atomic` for the 64-bit store.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt logging (for embedded builds)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bus;
pub mod config;
pub mod flasher;
pub mod output;
pub mod sampler;
pub mod session;
pub mod store;
pub mod timebase;
pub mod trigger;

// Re-export main types at crate root
pub use bus::GamepadBus;
pub use config::{FixtureConfig, IndicatorPatterns};
pub use flasher::{FirmwareImage, FlashError, Flasher, FlasherGuard, FlasherProvider};
pub use output::{Blinker, Indicator, LedBank};
pub use sampler::BitSampler;
pub use session::{FixtureSession, Phase, SessionError, TestSummary};
pub use store::PacketStore;
pub use timebase::Timebase;
pub use trigger::{Trigger, TriggerLatch, Triggers};
