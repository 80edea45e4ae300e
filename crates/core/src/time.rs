use chrono::{DateTime, Duration, Utc};

/// Source of "now" for sessions, answers and profiles.
///
/// Services take a `Clock` by value so tests can pin timestamps and step them
/// forward between answers.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Move a fixed clock forward. No-op for the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Milliseconds elapsed between `since` and the clock's current time.
    ///
    /// Clamps to zero when `since` lies in the future, so callers can feed the
    /// value straight into a response time.
    #[must_use]
    pub fn millis_since(&self, since: DateTime<Utc>) -> u64 {
        let elapsed = self.now().signed_duration_since(since).num_milliseconds();
        u64::try_from(elapsed).unwrap_or(0)
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
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

/// Returns a `Clock` pinned at [`fixed_now`].
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::seconds(3));
        assert_eq!(clock.now(), fixed_now() + Duration::seconds(3));
    }

    #[test]
    fn millis_since_clamps_future_to_zero() {
        let clock = fixed_clock();
        assert_eq!(clock.millis_since(fixed_now() + Duration::seconds(1)), 0);
        assert_eq!(clock.millis_since(fixed_now() - Duration::milliseconds(1500)), 1500);
    }
}
