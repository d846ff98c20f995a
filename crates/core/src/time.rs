use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
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

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

//
// ─── COUNTDOWN HELPERS ─────────────────────────────────────────────────────────
//

/// Time left until `deadline`, clamped at zero once the deadline has passed.
#[must_use]
pub fn remaining_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (deadline - now).max(Duration::zero())
}

/// Elapsed attempt time in whole minutes, floored. Never negative, even if
/// the caller's clock reads earlier than the start.
#[must_use]
pub fn elapsed_whole_minutes(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_minutes().max(0)
}

/// Formats a remaining duration as an `MM:SS` countdown label.
///
/// Minutes are not wrapped at the hour: a 90-minute exam starts at `90:00`.
#[must_use]
pub fn format_remaining(remaining: Duration) -> String {
    let total_secs = remaining.num_seconds().max(0);
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
