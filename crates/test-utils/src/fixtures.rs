//! Common test fixtures for satellite pipeline tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios in satellite data processing.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Common frame sizes for testing.
pub mod frame {
    /// A tiny frame, enough to tell pixels apart.
    pub const TINY: (usize, usize) = (2, 2);

    /// A small non-square frame (width, height).
    pub const SMALL: (usize, usize) = (4, 3);
}

/// Forecast issue time used throughout the test suite: 2023-01-01T03:00Z.
pub fn test_t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 3, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Timestamps covering the `hours` before `t0`, ending `delay_minutes` before
/// it, at the given spacing.
pub fn history_before(
    t0: DateTime<Utc>,
    hours: i64,
    delay_minutes: i64,
    step_minutes: i64,
) -> Vec<DateTime<Utc>> {
    crate::time_range(
        t0 - Duration::hours(hours),
        t0 - Duration::minutes(delay_minutes),
        step_minutes,
    )
}
