//! Timestamp freshness window.
//!
//! This is a coarse guard: it keeps no state, so the same signed payload
//! replayed inside the window is not detected here.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Default maximum age of a signed submission.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// How far ahead of the server clock a timestamp may be.
pub const CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Acceptance window for request timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayWindow {
    pub max_age: Duration,
    pub clock_skew: Duration,
}

impl Default for ReplayWindow {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            clock_skew: CLOCK_SKEW,
        }
    }
}

impl ReplayWindow {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            ..Self::default()
        }
    }

    /// Check `timestamp_ms` against `now_ms`. A timestamp exactly `max_age`
    /// old is still accepted.
    pub fn check(&self, timestamp_ms: i64, now_ms: i64) -> Result<()> {
        let skew_ms = duration_ms(self.clock_skew);
        let max_age_ms = duration_ms(self.max_age);

        if timestamp_ms > now_ms.saturating_add(skew_ms) {
            return Err(Error::FromFuture {
                ahead_ms: timestamp_ms - now_ms,
            });
        }

        let age_ms = now_ms.saturating_sub(timestamp_ms);
        if age_ms > max_age_ms {
            return Err(Error::Expired { age_ms, max_age_ms });
        }

        Ok(())
    }

    /// [`check`](Self::check) against the system clock.
    pub fn check_now(&self, timestamp_ms: i64) -> Result<()> {
        self.check(timestamp_ms, now_millis())
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
