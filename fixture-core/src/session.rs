//! FixtureSession: the burn-then-test state machine.
//!
//! ```text
//!  AwaitGo ──GO──▶ Burning ──ok──▶ AwaitGoForTest ──GO──▶ Testing ──RESET──▶ Ok
//!     │               │                  │
//!   RESET          retries            RESET
//!     ▼            exhausted             ▼
//!  Aborted            ▼               Aborted
//!                FlashFailed
//! ```
//!
//! With `skip_burn` the session goes straight to `Testing`; without
//! `confirm_before_test` flashing flows directly into it.
//!
//! Everything here runs in the foreground. Interrupt handlers only ever arm
//! [`Triggers`] or feed the [`GamepadBus`]; the session polls both once per
//! loop iteration and yields through [`Timebase::delay_ms`] in between.

use core::fmt::Write;

use sipo_proto::PacketReader;

use crate::bus::GamepadBus;
use crate::config::FixtureConfig;
use crate::flasher::{FirmwareImage, FlashError, Flasher, FlasherGuard, FlasherProvider};
use crate::output::{Blinker, Indicator};
use crate::timebase::Timebase;
use crate::trigger::Triggers;

/// Where the session currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Not started yet, or finished.
    Idle,
    AwaitGo,
    Burning,
    AwaitGoForTest,
    Testing,
}

/// Outcome of a session that reached the end of the test phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TestSummary {
    /// Firmware was written during this session.
    pub burned: bool,
    /// Frames seen while testing (coalesced arrivals count once).
    pub packets_received: u32,
}

/// Why a session ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// Operator pressed RESET before testing started.
    Aborted,
    /// Every flash attempt failed; testing was not started.
    FlashFailed {
        attempts: u8,
        last: FlashError,
    },
}

impl core::fmt::Display for SessionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Aborted => write!(f, "aborted by operator"),
            Self::FlashFailed { attempts, last } => {
                write!(f, "flashing failed after {} attempt(s): {}", attempts, last)
            }
        }
    }
}

/// Everything one fixture needs to burn and test a unit.
///
/// The console is any `core::fmt::Write`; write errors are ignored, the
/// operator stream is best effort.
pub struct FixtureSession<'t, B, P, L, T, W> {
    bus: B,
    flasher: P,
    indicator: L,
    timebase: T,
    console: W,
    triggers: &'t Triggers,
    config: FixtureConfig,
    reader: PacketReader,
    phase: Phase,
}

impl<'t, B, P, L, T, W> FixtureSession<'t, B, P, L, T, W>
where
    B: GamepadBus,
    P: FlasherProvider,
    L: Indicator,
    T: Timebase,
    W: Write,
{
    pub fn new(
        bus: B,
        flasher: P,
        indicator: L,
        timebase: T,
        console: W,
        triggers: &'t Triggers,
        config: FixtureConfig,
    ) -> Self {
        Self {
            bus,
            flasher,
            indicator,
            timebase,
            console,
            triggers,
            reader: PacketReader::new(config.frame_bits),
            config,
            phase: Phase::Idle,
        }
    }

    /// Run one full session: wait, burn, test.
    ///
    /// Returns after the operator ends the test phase with RESET, or early
    /// with a [`SessionError`]. The caller decides whether to start another.
    pub async fn burn_and_test(
        &mut self,
        image: &FirmwareImage<'_>,
    ) -> Result<TestSummary, SessionError> {
        let result = self.run(image).await;
        self.enter(Phase::Idle);
        result
    }

    async fn run(&mut self, image: &FirmwareImage<'_>) -> Result<TestSummary, SessionError> {
        let burned = !self.config.skip_burn;

        if burned {
            self.enter(Phase::AwaitGo);
            let _ = writeln!(self.console, "Press GO to start burning.");
            self.wait_for_go(self.config.go_only).await?;

            self.enter(Phase::Burning);
            self.burn(image).await?;

            if self.config.confirm_before_test {
                self.enter(Phase::AwaitGoForTest);
                self.indicator.set_pattern(self.config.patterns.ready);
                // Presses during flashing and bounce of the first GO are not a confirmation
                self.timebase.delay_ms(self.config.go_settle_ms).await;
                self.triggers.go.clear();
                let _ = writeln!(self.console, "Press GO to start testing.");
                self.wait_for_go(false).await?;
            }
        }

        self.indicator.set_pattern(self.config.patterns.ready);
        let _ = writeln!(
            self.console,
            "Connect controller and test buttons.  Press RESET when done."
        );
        self.enter(Phase::Testing);
        let packets_received = self.run_test().await;

        Ok(TestSummary {
            burned,
            packets_received,
        })
    }

    /// Block (cooperatively) until GO. RESET aborts unless `go_only`.
    async fn wait_for_go(&mut self, go_only: bool) -> Result<(), SessionError> {
        let mut blinker = Blinker::new(
            self.config.patterns.idle,
            self.config.blink_period_ms,
            self.timebase.now_ms(),
        );

        loop {
            if self.triggers.go.is_set() {
                self.triggers.request_handled();
                return Ok(());
            }

            if self.triggers.reset.is_set() {
                self.triggers.request_handled();
                if !go_only {
                    info!("reset while waiting for go");
                    return Err(SessionError::Aborted);
                }
            }

            blinker.poll(self.timebase.now_ms(), &mut self.indicator);
            self.timebase.delay_ms(self.config.poll_interval_ms).await;
        }
    }

    /// Flash `image`, retrying up to the configured bound.
    async fn burn(&mut self, image: &FirmwareImage<'_>) -> Result<(), SessionError> {
        // Debug line and bus pins may alias: keep the sampler off while flashing
        self.bus.disable();
        self.indicator.set_pattern(self.config.patterns.burning);
        let _ = writeln!(self.console, "Burning firmware '{}'...", image.path());
        info!("burning {}", image.path());

        let attempts = self.config.flash_attempts.max(1);
        let mut guard = None;
        let mut last = FlashError::Unavailable;

        for attempt in 1..=attempts {
            if self.triggers.reset.is_set() {
                self.triggers.request_handled();
                let _ = writeln!(self.console, "Burn aborted.");
                info!("reset during burn");
                return Err(SessionError::Aborted);
            }

            let result = match Self::flasher_slot(&mut guard, &mut self.flasher) {
                Ok(flasher) => flasher.flash(image).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    // Release before anything else may touch the shared pins
                    drop(guard);
                    let _ = writeln!(self.console, "Done.");
                    info!("flashed on attempt {}", attempt);
                    return Ok(());
                }
                Err(e) => {
                    last = e;
                    warn!("flash attempt {} failed: {}", attempt, e);
                    let _ = writeln!(self.console, "Issue burning fw (attempt {})!", attempt);
                    let _ = writeln!(self.console, "{}", e);
                    if attempt < attempts {
                        self.timebase.delay_ms(self.config.retry_delay_ms).await;
                    }
                }
            }
        }

        drop(guard);
        error!("giving up after {} flash attempts", attempts);
        let _ = writeln!(self.console, "\n*** Could not write firmware! ***");
        Err(SessionError::FlashFailed { attempts, last })
    }

    /// Flasher held for the rest of the burn phase, acquired on first use.
    fn flasher_slot<'g>(
        slot: &'g mut Option<FlasherGuard<P::Flasher>>,
        provider: &mut P,
    ) -> Result<&'g mut FlasherGuard<P::Flasher>, FlashError> {
        let guard = match slot.take() {
            Some(guard) => guard,
            None => FlasherGuard::new(provider.acquire()?),
        };
        Ok(slot.insert(guard))
    }

    /// Sample the bus and echo controller changes until RESET.
    async fn run_test(&mut self) -> u32 {
        self.bus.enable();

        let start = self.timebase.now_ms();
        let mut blinker = Blinker::new(self.config.patterns.testing, self.config.blink_period_ms, start);
        let mut last_packet_ms = start;
        let mut packets: u32 = 0;

        loop {
            if self.triggers.reset.is_set() {
                self.triggers.request_handled();
                self.bus.disable();
                let _ = writeln!(self.console);
                info!("test ended by reset after {} packets", packets);
                return packets;
            }

            let now = self.timebase.now_ms();
            if now.saturating_sub(last_packet_ms) > self.config.watchdog_ms {
                last_packet_ms = now;
                warn!("no packets for {} ms", self.config.watchdog_ms);
                let _ = write!(self.console, "\nShould have received packets by now...");
            }

            if self.bus.new_packet() {
                last_packet_ms = now;
                packets = packets.wrapping_add(1);
                if self.bus.changed_value() {
                    let (ctrl1, ctrl2) = self.reader.states(self.bus.captured_packet());
                    let _ = write!(self.console, "\n{}\t{} | {}", packets, ctrl1, ctrl2);
                } else {
                    let _ = write!(self.console, ".");
                }
            }

            blinker.poll(now, &mut self.indicator);
            self.timebase.delay_ms(self.config.poll_interval_ms).await;
        }
    }

    fn enter(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!("phase {} -> {}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Get a reference to the indicator.
    pub fn indicator(&self) -> &L {
        &self.indicator
    }

    /// Get a reference to the operator console.
    pub fn console(&self) -> &W {
        &self.console
    }
}
