//! Integration test: write satellite stores and read them back.
//!
//! Covers both on-disk encodings, partial reads of the most recent frames,
//! the consolidated summary, and in-place replacement of an existing store.

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use sat_store::{
    default_dimensions, DataEncoding, SatelliteDataset, SatelliteStore, StoreConfig, StoreError,
    StoreWriter,
};
use test_utils::{assert_approx_eq, create_frame_stack, fixtures, test_t0, time_range};
use zarrs::array::{ArrayBuilder, ChunkGrid, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

fn five_minute_dataset(frames: usize) -> SatelliteDataset {
    let (width, height) = fixtures::frame::SMALL;
    let t0 = test_t0();
    let times = time_range(t0 - Duration::minutes(5 * (frames as i64 - 1)), t0, 5);
    let data = create_frame_stack(frames, width, height, 10.0);
    SatelliteDataset::new(
        times,
        vec![height as u64, width as u64],
        default_dimensions(),
        data,
    )
    .expect("valid dataset")
}

/// Replace the time array of the store at `path`, as a third-party producer
/// might write it.
fn rewrite_time_axis(path: &Path, units: Option<&str>, values: &[i64]) {
    let storage = Arc::new(FilesystemStore::new(path).expect("Failed to open storage"));
    let mut attrs = serde_json::Map::new();
    if let Some(units) = units {
        attrs.insert("units".to_string(), serde_json::json!(units));
    }
    let chunk_grid: ChunkGrid = vec![1024u64].try_into().expect("valid chunk grid");
    let array = ArrayBuilder::new(
        vec![values.len() as u64],
        DataType::Int64,
        chunk_grid,
        FillValue::from(0i64),
    )
    .attributes(attrs)
    .build(storage, "/time")
    .expect("Failed to build time array");
    array.store_metadata().expect("Failed to store metadata");
    let subset = ArraySubset::new_with_start_shape(vec![0], vec![values.len() as u64]).unwrap();
    array
        .store_array_subset_elements(&subset, values)
        .expect("Failed to store times");
}

#[test]
fn test_float32_roundtrip() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("sat.zarr");
    let original = five_minute_dataset(6);

    StoreWriter::new(StoreConfig::default())
        .write(&path, &original, DataEncoding::Float32)
        .expect("Failed to write");

    let store = SatelliteStore::open(&path).expect("Failed to open");
    assert_eq!(store.encoding(), DataEncoding::Float32);
    assert_eq!(store.len(), 6);
    assert_eq!(store.frame_shape(), vec![3, 4]);
    assert_eq!(store.dimensions(), &default_dimensions()[..]);

    let restored = store.read().expect("Failed to read");
    assert_eq!(restored, original);
}

#[test]
fn test_int16_roundtrip_preserves_missing() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("sat.zarr");

    let mut original = five_minute_dataset(3);
    original
        .push_missing_frame(test_t0() + Duration::minutes(5))
        .expect("append");

    let config = StoreConfig {
        scale_factor: Some(0.5),
        add_offset: 0.0,
        ..Default::default()
    };
    let encoding = config.canonical_encoding(DataEncoding::Float32);
    StoreWriter::new(config)
        .write(&path, &original, encoding)
        .expect("Failed to write");

    let store = SatelliteStore::open(&path).expect("Failed to open");
    assert_eq!(store.encoding(), encoding);

    let restored = store.read().expect("Failed to read");
    assert_eq!(restored.times(), original.times());
    assert!(restored.is_frame_missing(3));
    for (a, b) in restored.data().iter().zip(original.data()).take(36) {
        assert_approx_eq!(*a, *b, 0.25);
    }
}

#[test]
fn test_latest_time_and_recent_frames() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("sat.zarr");
    let original = five_minute_dataset(10);

    StoreWriter::new(StoreConfig::default())
        .write(&path, &original, DataEncoding::Float32)
        .expect("Failed to write");

    let store = SatelliteStore::open(&path).expect("Failed to open");
    assert_eq!(store.latest_time().unwrap(), Some(test_t0()));

    let recent = store.read_recent(4).expect("Failed to read recent");
    assert_eq!(recent.len(), 4);
    assert_eq!(recent.times(), &original.times()[6..]);
    assert_eq!(recent.data(), original.recent_data(4));

    let all = store.read_recent(100).expect("Failed to read recent");
    assert_eq!(all.len(), 10);
}

#[test]
fn test_summary_is_consolidated() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("sat.zarr");
    let original = five_minute_dataset(5);

    let written = StoreWriter::new(StoreConfig::default())
        .write(&path, &original, DataEncoding::Float32)
        .expect("Failed to write");

    let store = SatelliteStore::open(&path).expect("Failed to open");
    let summary = store.summary().expect("summary").expect("present");
    assert_eq!(summary, written);
    assert_eq!(summary.frames, 5);
    assert_eq!(summary.cadence_minutes, Some(5));
    assert_eq!(summary.last_time, Some(test_t0()));
}

#[test]
fn test_rewrite_in_place() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("sat.zarr");
    let writer = StoreWriter::new(StoreConfig::default());

    writer
        .write(&path, &five_minute_dataset(8), DataEncoding::Float32)
        .expect("first write");
    writer
        .write(&path, &five_minute_dataset(3), DataEncoding::Float32)
        .expect("second write");

    let store = SatelliteStore::open(&path).expect("Failed to open");
    assert_eq!(store.len(), 3);
    assert_eq!(store.times().unwrap().len(), 3);
}

#[test]
fn test_empty_store() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("empty.zarr");
    let dataset = SatelliteDataset::empty(vec![3, 4], default_dimensions()).unwrap();

    StoreWriter::new(StoreConfig::default())
        .write(&path, &dataset, DataEncoding::Float32)
        .expect("Failed to write");

    let store = SatelliteStore::open(&path).expect("Failed to open");
    assert!(store.is_empty());
    assert_eq!(store.latest_time().unwrap(), None);
    assert!(store.read().unwrap().is_empty());
}

#[test]
fn test_open_missing_store() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let result = SatelliteStore::open(&temp_dir.path().join("missing.zarr"));
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_time_axis_in_minutes() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("sat.zarr");
    let original = five_minute_dataset(6);
    StoreWriter::new(StoreConfig::default())
        .write(&path, &original, DataEncoding::Float32)
        .expect("Failed to write");

    // 2023-01-01T02:35Z to 03:00Z in minutes since the epoch.
    let minutes: Vec<i64> = (0..6).map(|i| 27_875_675 + 5 * i).collect();
    rewrite_time_axis(&path, Some("minutes since 1970-01-01"), &minutes);

    let store = SatelliteStore::open(&path).expect("Failed to open");
    assert_eq!(store.latest_time().unwrap(), Some(test_t0()));
    assert_eq!(store.read().unwrap(), original);
}

#[test]
fn test_time_axis_without_known_units_rejected() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("sat.zarr");
    StoreWriter::new(StoreConfig::default())
        .write(&path, &five_minute_dataset(2), DataEncoding::Float32)
        .expect("Failed to write");

    rewrite_time_axis(&path, None, &[0, 300]);
    let missing = SatelliteStore::open(&path);
    assert!(matches!(missing, Err(StoreError::InvalidLayout(ref msg)) if msg.contains("units")));

    rewrite_time_axis(&path, Some("fortnights since 1970-01-01"), &[0, 1]);
    let unknown = SatelliteStore::open(&path);
    assert!(matches!(unknown, Err(StoreError::InvalidLayout(ref msg)) if msg.contains("fortnights")));
}

#[test]
fn test_open_zipped_store() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("latest.zarr.zip");
    std::fs::write(&path, b"PK").unwrap();

    let err = SatelliteStore::open(&path).err().expect("zipped store must not open");
    assert!(matches!(err, StoreError::ZippedStore(ref p) if p == &path));
    assert!(err.to_string().contains("unzip"));
}
