//! Certification that enough real satellite history exists for a model.
//!
//! The check runs against the timestamps of frames that were actually
//! observed, before any interpolation or padding, so synthesized frames can
//! never stand in for real ones.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// How much satellite history a model needs, relative to the issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityRequirement {
    /// Look-back window; the oldest expected frame is strictly after `t0 - history`.
    pub history: Duration,
    /// Spacing of the expected frames.
    pub cadence: Duration,
    /// How far before `t0` the most recent expected frame may be.
    pub live_delay: Duration,
}

impl AvailabilityRequirement {
    /// A requirement with no live delay.
    pub fn new(history: Duration, cadence: Duration) -> Self {
        Self {
            history,
            cadence,
            live_delay: Duration::zero(),
        }
    }

    pub fn with_live_delay(mut self, live_delay: Duration) -> Self {
        self.live_delay = live_delay;
        self
    }

    /// Timestamps that must be present for an issue time of `t0`.
    ///
    /// These are `t0 - k * cadence` for `k >= 1`, newer than `t0 - history` and
    /// at least `max(cadence, live_delay)` before `t0`. With no live delay this
    /// is every cadence step in the open interval `(t0 - history, t0)`.
    pub fn expected_timestamps(&self, t0: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        if self.cadence <= Duration::zero() {
            return Vec::new();
        }

        let oldest_excluded = t0 - self.history;
        let newest = t0 - self.live_delay.max(self.cadence);

        let mut expected = Vec::new();
        let mut t = t0 - self.cadence;
        while t > oldest_excluded {
            if t <= newest {
                expected.push(t);
            }
            t -= self.cadence;
        }
        expected.reverse();
        expected
    }
}

/// Expected timestamps absent from `actual`.
pub fn missing_timestamps(
    requirement: &AvailabilityRequirement,
    t0: DateTime<Utc>,
    actual: &[DateTime<Utc>],
) -> Vec<DateTime<Utc>> {
    let present: HashSet<&DateTime<Utc>> = actual.iter().collect();
    requirement
        .expected_timestamps(t0)
        .into_iter()
        .filter(|t| !present.contains(t))
        .collect()
}

/// Whether `actual` holds every frame `requirement` expects for `t0`.
pub fn is_available(
    requirement: &AvailabilityRequirement,
    t0: DateTime<Utc>,
    actual: &[DateTime<Utc>],
) -> bool {
    let missing = missing_timestamps(requirement, t0, actual);
    if missing.is_empty() {
        debug!(%t0, history_minutes = requirement.history.num_minutes(), "Satellite inputs available");
        true
    } else {
        info!(
            %t0,
            missing_count = missing.len(),
            missing = ?missing,
            "Some satellite timesteps are missing"
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{test_t0, time_range, time_range_without};

    fn requirement() -> AvailabilityRequirement {
        AvailabilityRequirement::new(Duration::minutes(90), Duration::minutes(5))
    }

    #[test]
    fn test_expected_is_open_interval() {
        let t0 = test_t0();
        let expected = requirement().expected_timestamps(t0);
        assert_eq!(expected.len(), 17);
        assert_eq!(expected.first().copied(), Some(t0 - Duration::minutes(85)));
        assert_eq!(expected.last().copied(), Some(t0 - Duration::minutes(5)));
    }

    #[test]
    fn test_live_delay_trims_newest() {
        let t0 = test_t0();
        let req = requirement().with_live_delay(Duration::minutes(20));
        let expected = req.expected_timestamps(t0);
        assert_eq!(expected.last().copied(), Some(t0 - Duration::minutes(20)));
        assert_eq!(expected.len(), 14);
    }

    #[test]
    fn test_full_history_is_available() {
        let t0 = test_t0();
        let actual = time_range(t0 - Duration::minutes(120), t0 - Duration::minutes(5), 5);
        assert!(is_available(&requirement(), t0, &actual));
    }

    #[test]
    fn test_history_ending_early_is_not_available() {
        let t0 = test_t0();
        let actual = time_range(t0 - Duration::minutes(120), t0 - Duration::minutes(15), 5);
        assert!(!is_available(&requirement(), t0, &actual));

        let delayed = requirement().with_live_delay(Duration::minutes(15));
        assert!(is_available(&delayed, t0, &actual));

        let stale = time_range(t0 - Duration::minutes(120), t0 - Duration::minutes(35), 5);
        assert!(!is_available(&delayed, t0, &stale));
    }

    #[test]
    fn test_single_interior_gap_is_not_available() {
        let t0 = test_t0();
        let delayed = requirement().with_live_delay(Duration::minutes(15));
        for gap in [30, 60] {
            let actual = time_range_without(
                t0 - Duration::minutes(120),
                t0 - Duration::minutes(5),
                5,
                &[t0 - Duration::minutes(gap)],
            );
            assert!(!is_available(&delayed, t0, &actual), "gap at -{gap} minutes");
            assert_eq!(missing_timestamps(&delayed, t0, &actual), vec![t0 - Duration::minutes(gap)]);
        }
    }

    #[test]
    fn test_oldest_boundary_is_required() {
        let t0 = test_t0();
        let actual = time_range(t0 - Duration::minutes(80), t0 - Duration::minutes(5), 5);
        assert_eq!(
            missing_timestamps(&requirement(), t0, &actual),
            vec![t0 - Duration::minutes(85)]
        );
    }

    #[test]
    fn test_unordered_actual_set() {
        let t0 = test_t0();
        let mut actual = time_range(t0 - Duration::minutes(85), t0 - Duration::minutes(5), 5);
        actual.reverse();
        assert!(is_available(&requirement(), t0, &actual));
    }

    #[test]
    fn test_15_minute_cadence_requirement() {
        let t0 = test_t0();
        let req = AvailabilityRequirement::new(Duration::minutes(60), Duration::minutes(15));
        assert_eq!(
            req.expected_timestamps(t0),
            vec![
                t0 - Duration::minutes(45),
                t0 - Duration::minutes(30),
                t0 - Duration::minutes(15)
            ]
        );
    }
}
