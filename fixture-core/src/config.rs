//! Fixture timing, retry and indicator configuration.

/// Indicator patterns shown in each phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndicatorPatterns {
    /// Blinked while waiting for GO.
    pub idle: u8,
    /// Held while flashing.
    pub burning: u8,
    /// Held between flashing and the test phase.
    pub ready: u8,
    /// Blinked while the bus is under test.
    pub testing: u8,
}

impl IndicatorPatterns {
    pub const DEFAULT: Self = Self {
        idle: 0xFF,
        burning: 0b0001,
        ready: 0b0010,
        testing: 0b0110,
    };
}

impl Default for IndicatorPatterns {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Everything the session state machine can be tuned with.
///
/// # Example
///
/// ```
/// use fixture_core::FixtureConfig;
///
/// const CONFIG: FixtureConfig = FixtureConfig::new()
///     .with_skip_burn(true)
///     .with_watchdog_ms(5_000);
/// assert_eq!(CONFIG.flash_attempts, 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixtureConfig {
    /// Indicator toggle period in both waiting and test phases.
    pub blink_period_ms: u64,
    /// Silence on the bus longer than this prints a warning.
    pub watchdog_ms: u64,
    /// Flash attempts before the session gives up (at least 1 is made).
    pub flash_attempts: u8,
    /// Pause between two flash attempts.
    pub retry_delay_ms: u32,
    /// Pause at the end of every foreground loop iteration.
    pub poll_interval_ms: u32,
    /// Go straight to the test phase.
    pub skip_burn: bool,
    /// RESET does not abort the initial wait for GO.
    pub go_only: bool,
    /// Wait for GO again between flashing and testing.
    pub confirm_before_test: bool,
    /// GO edges within this long after flashing are discarded as bounce.
    pub go_settle_ms: u32,
    /// Significant bits per captured frame (capped at 32).
    pub frame_bits: u8,
    pub patterns: IndicatorPatterns,
}

impl FixtureConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            blink_period_ms: 1_000,
            watchdog_ms: 3_000,
            flash_attempts: 2,
            retry_delay_ms: 500,
            poll_interval_ms: 1,
            skip_burn: false,
            go_only: false,
            confirm_before_test: true,
            go_settle_ms: 50,
            frame_bits: 32,
            patterns: IndicatorPatterns::DEFAULT,
        }
    }

    #[must_use]
    pub const fn with_skip_burn(mut self, skip: bool) -> Self {
        self.skip_burn = skip;
        self
    }

    #[must_use]
    pub const fn with_go_only(mut self, go_only: bool) -> Self {
        self.go_only = go_only;
        self
    }

    #[must_use]
    pub const fn with_confirm_before_test(mut self, confirm: bool) -> Self {
        self.confirm_before_test = confirm;
        self
    }

    #[must_use]
    pub const fn with_go_settle_ms(mut self, ms: u32) -> Self {
        self.go_settle_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_flash_attempts(mut self, attempts: u8) -> Self {
        self.flash_attempts = attempts;
        self
    }

    #[must_use]
    pub const fn with_retry_delay_ms(mut self, ms: u32) -> Self {
        self.retry_delay_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_watchdog_ms(mut self, ms: u64) -> Self {
        self.watchdog_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_blink_period_ms(mut self, ms: u64) -> Self {
        self.blink_period_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_frame_bits(mut self, bits: u8) -> Self {
        self.frame_bits = bits;
        self
    }

    #[must_use]
    pub const fn with_patterns(mut self, patterns: IndicatorPatterns) -> Self {
        self.patterns = patterns;
        self
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self::new()
    }
}
