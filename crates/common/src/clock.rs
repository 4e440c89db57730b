//! Wall-clock helpers.
//!
//! Chat platforms stamp events with milliseconds since the Unix epoch, so the
//! relay keeps its own reference points in the same unit.

use std::time::Duration;

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Exponential backoff delay for the given zero-based attempt, capped at `max`.
#[must_use]
pub fn backoff_delay(base: Duration, attempt: u32, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    base.checked_mul(factor).map_or(max, |d| d.min(max))
}
