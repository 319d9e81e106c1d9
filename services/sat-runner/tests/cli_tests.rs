//! Integration test: run the binary against staged stores.

use std::fs;
use std::path::Path;
use std::process::Command;

use chrono::Duration;
use sat_store::{default_dimensions, DataEncoding, SatelliteDataset, SatelliteStore, StoreConfig, StoreWriter};
use test_utils::{create_frame_stack, fixtures, history_before, test_t0};

fn write_upstream(path: &Path, step_minutes: i64) {
    let (width, height) = fixtures::frame::TINY;
    let times = history_before(test_t0(), 2, step_minutes, step_minutes);
    let data = create_frame_stack(times.len(), width, height, 1.0);
    let dataset = SatelliteDataset::new(
        times,
        vec![height as u64, width as u64],
        default_dimensions(),
        data,
    )
    .expect("valid dataset");
    StoreWriter::new(StoreConfig::default())
        .write(path, &dataset, DataEncoding::Float32)
        .expect("Failed to write upstream store");
}

fn runner() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sat-runner"));
    cmd.env_remove("SAT_T0")
        .env_remove("SAT_UPSTREAM_DIR")
        .env_remove("SAT_MODELS_DIR")
        .arg("--t0")
        .arg("2023-01-01T03:00:00Z")
        .arg("--log-level")
        .arg("error");
    cmd
}

#[test]
fn test_end_to_end_report() {
    let upstream = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let models = tempfile::tempdir().unwrap();

    write_upstream(&upstream.path().join("latest.zarr"), 5);
    write_upstream(&upstream.path().join("latest_15.zarr"), 15);
    fs::write(
        models.path().join("pvnet.yaml"),
        "input_data:\n  satellite:\n    history_minutes: 90\n    live_delay_minutes: 5\n",
    )
    .unwrap();
    fs::write(
        models.path().join("strict.yaml"),
        "input_data:\n  satellite:\n    history_minutes: 30\n    time_resolution_minutes: 5\n",
    )
    .unwrap();

    let report_path = work.path().join("report.json");
    let output = runner()
        .arg("--work-dir")
        .arg(work.path())
        .arg("--upstream-dir")
        .arg(upstream.path())
        .arg("--models-dir")
        .arg(models.path())
        .arg("--staleness-tolerance-minutes")
        .arg("60")
        .arg("--report")
        .arg(&report_path)
        .output()
        .expect("Failed to run sat-runner");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["decision"], "both_fresh");
    assert_eq!(report["source"], "five_minute");
    assert_eq!(report["staging"]["fifteen_minute"], true);
    assert_eq!(report["appended_frames"], 1);
    assert_eq!(report["models"][0]["name"], "pvnet");
    assert_eq!(report["models"][0]["available"], true);
    assert_eq!(report["models"][1]["name"], "strict");
    assert_eq!(report["models"][1]["available"], true);

    let canonical = SatelliteStore::open(&work.path().join("sat.zarr")).unwrap();
    let last = canonical.latest_time().unwrap();
    assert_eq!(last, Some(test_t0()));
    assert_eq!(canonical.len(), 25);
    assert_eq!(
        canonical.times().unwrap().first().copied(),
        Some(test_t0() - Duration::hours(2))
    );
}

#[test]
fn test_missing_sources_exit_non_zero() {
    let upstream = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();

    let status = runner()
        .arg("--work-dir")
        .arg(work.path())
        .arg("--upstream-dir")
        .arg(upstream.path())
        .arg("--staleness-tolerance-minutes")
        .arg("60")
        .status()
        .expect("Failed to run sat-runner");

    assert!(!status.success());
    assert!(!work.path().join("sat.zarr").exists());
}
