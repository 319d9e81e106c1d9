//! Time axis arithmetic for satellite stores.
//!
//! All grids are aligned to the Unix epoch: a timestamp is "on the grid" for a
//! step when its seconds since 1970-01-01T00:00:00Z are a whole multiple of the
//! step. With a 5 minute step the grid is therefore `:00, :05, :10, ...` for
//! every hour, independent of where a store happens to start.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Spacing of the canonical time axis, in minutes.
pub const CANONICAL_CADENCE_MINUTES: i64 = 5;

/// Spacing of the canonical time axis.
pub fn canonical_cadence() -> Duration {
    Duration::minutes(CANONICAL_CADENCE_MINUTES)
}

fn step_seconds(step: Duration) -> i64 {
    let secs = step.num_seconds();
    debug_assert!(secs > 0, "grid step must be at least one second");
    secs.max(1)
}

/// Round `t` down to the nearest grid point.
pub fn floor_to_grid(t: DateTime<Utc>, step: Duration) -> DateTime<Utc> {
    let rem = t.timestamp().rem_euclid(step_seconds(step));
    t - Duration::seconds(rem) - Duration::nanoseconds(i64::from(t.timestamp_subsec_nanos()))
}

/// Round `t` up to the nearest grid point.
pub fn ceil_to_grid(t: DateTime<Utc>, step: Duration) -> DateTime<Utc> {
    let floored = floor_to_grid(t, step);
    if floored == t {
        t
    } else {
        floored + Duration::seconds(step_seconds(step))
    }
}

/// Whether `t` lies exactly on the grid.
pub fn is_on_grid(t: DateTime<Utc>, step: Duration) -> bool {
    floor_to_grid(t, step) == t
}

/// All grid points in the closed interval `[start, end]`.
///
/// Returns an empty vector when no grid point falls inside the interval.
pub fn grid_range(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Vec<DateTime<Utc>> {
    let step = Duration::seconds(step_seconds(step));
    let mut points = Vec::new();
    let mut t = ceil_to_grid(start, step);
    while t <= end {
        points.push(t);
        t += step;
    }
    points
}

/// Most common positive spacing between consecutive timestamps.
///
/// Ties resolve to the smaller spacing. Returns `None` for fewer than two
/// timestamps.
pub fn infer_cadence(times: &[DateTime<Utc>]) -> Option<Duration> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for pair in times.windows(2) {
        let secs = (pair[1] - pair[0]).num_seconds();
        if secs > 0 {
            *counts.entry(secs).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|(a_secs, a_n), (b_secs, b_n)| a_n.cmp(b_n).then(b_secs.cmp(a_secs)))
        .map(|(secs, _)| Duration::seconds(secs))
}

/// Convert a timestamp to whole seconds since the Unix epoch.
pub fn to_epoch_seconds(t: DateTime<Utc>) -> i64 {
    t.timestamp()
}

/// How integers on a stored time axis map to timestamps, parsed from a
/// `units` attribute of the form `"<unit> since <epoch>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    unit_seconds: i64,
    epoch: DateTime<Utc>,
}

impl TimeUnits {
    /// Parse e.g. `"seconds since 1970-01-01T00:00:00Z"` or
    /// `"minutes since 1970-01-01"`.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let invalid = || TimeParseError::InvalidUnits(s.to_string());

        let (unit, epoch) = s.trim().split_once(" since ").ok_or_else(invalid)?;
        let unit_seconds = match unit.trim().to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => 1,
            "minutes" | "minute" | "mins" | "min" => 60,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3_600,
            "days" | "day" | "d" => 86_400,
            _ => return Err(invalid()),
        };

        let epoch = epoch.trim();
        let epoch = match parse_time(epoch) {
            Ok(t) => t,
            Err(_) => NaiveDate::parse_from_str(epoch, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|ndt| Utc.from_utc_datetime(&ndt))
                .ok_or_else(invalid)?,
        };

        Ok(Self { unit_seconds, epoch })
    }

    /// Timestamp for a stored value, `None` when it does not fit.
    pub fn decode(&self, value: i64) -> Option<DateTime<Utc>> {
        let secs = value.checked_mul(self.unit_seconds)?;
        let offset = Duration::try_seconds(secs)?;
        self.epoch.checked_add_signed(offset)
    }
}

/// Errors from parsing a time string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("invalid time format: {0}")]
    InvalidFormat(String),

    #[error("unsupported time units: {0:?}")]
    InvalidUnits(String),
}

/// Parse a timestamp given on the command line or in configuration.
///
/// Accepts RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS]` / `YYYY-MM-DD HH:MM[:SS]`
/// which is interpreted as UTC.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .ok_or_else(|| TimeParseError::InvalidFormat(s.to_string()))
}
