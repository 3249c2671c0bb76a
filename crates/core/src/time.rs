use chrono::{DateTime, Duration, Utc};

/// Length of the free trial granted at registration.
pub const TRIAL_PERIOD_DAYS: i64 = 7;

/// Length of one paid premium period.
pub const PREMIUM_PERIOD_DAYS: i64 = 30;

/// Time source shared by services so trial and completion timestamps are testable.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Returns a copy of this clock shifted forward; system clocks are unchanged.
    #[must_use]
    pub fn shifted(self, delta: Duration) -> Self {
        match self {
            Clock::System => Clock::System,
            Clock::Fixed(t) => Clock::Fixed(t + delta),
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// End of the trial window for an account registered at `registered_at`.
#[must_use]
pub fn trial_end_from(registered_at: DateTime<Utc>) -> DateTime<Utc> {
    registered_at + Duration::days(TRIAL_PERIOD_DAYS)
}

/// End of a premium period starting at `start`.
#[must_use]
pub fn premium_end_from(start: DateTime<Utc>) -> DateTime<Utc> {
    start + Duration::days(PREMIUM_PERIOD_DAYS)
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
