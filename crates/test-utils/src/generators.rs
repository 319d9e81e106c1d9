//! Test data generators for synthetic satellite imagery.
//!
//! These generators create predictable, verifiable frame and time axis
//! patterns that can be used across the test suite. Pixel values stay well
//! inside the `int16` range so they also survive packing with a unit scale
//! factor.

use chrono::{DateTime, Duration, Utc};

/// Creates a frame with predictable values.
///
/// Each pixel value is calculated as: `base + row * width + col`
///
/// # Example
///
/// ```
/// use test_utils::create_test_frame;
///
/// let frame = create_test_frame(4, 3, 100.0);
/// assert_eq!(frame.len(), 12);
/// assert_eq!(frame[0], 100.0);
/// assert_eq!(frame[5], 105.0); // row 1, col 1
/// ```
pub fn create_test_frame(width: usize, height: usize, base: f32) -> Vec<f32> {
    (0..width * height).map(|i| base + i as f32).collect()
}

/// Creates a frame filled with a single value.
pub fn create_constant_frame(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a stack of `frames` frames, frame `i` offset by `i * step`.
///
/// Returned in time-major order, ready for a dataset constructor.
pub fn create_frame_stack(frames: usize, width: usize, height: usize, step: f32) -> Vec<f32> {
    (0..frames)
        .flat_map(|i| create_test_frame(width, height, 100.0 + i as f32 * step))
        .collect()
}

/// Creates a stack where every other frame is entirely `value`.
///
/// Frames with an even index are filled with `value`; odd frames carry the
/// usual test pattern. Useful for exercising degenerate-data checks.
pub fn create_alternating_stack(frames: usize, width: usize, height: usize, value: f32) -> Vec<f32> {
    (0..frames)
        .flat_map(|i| {
            if i % 2 == 0 {
                create_constant_frame(width, height, value)
            } else {
                create_test_frame(width, height, 100.0 + i as f32)
            }
        })
        .collect()
}

/// Timestamps from `start` to `end` inclusive at a fixed spacing in minutes.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use test_utils::time_range;
///
/// let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// let times = time_range(start, start + Duration::minutes(30), 15);
/// assert_eq!(times.len(), 3);
/// ```
pub fn time_range(start: DateTime<Utc>, end: DateTime<Utc>, step_minutes: i64) -> Vec<DateTime<Utc>> {
    let step = Duration::minutes(step_minutes);
    let mut times = Vec::new();
    let mut t = start;
    while t <= end {
        times.push(t);
        t += step;
    }
    times
}

/// Like [`time_range`] but with the listed timestamps removed.
pub fn time_range_without(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step_minutes: i64,
    removed: &[DateTime<Utc>],
) -> Vec<DateTime<Utc>> {
    time_range(start, end, step_minutes)
        .into_iter()
        .filter(|t| !removed.contains(t))
        .collect()
}
