use std::fs;
use std::path::Path;
use std::sync::Arc;

use aqi_core::config::DashboardConfig;
use aqi_core::pipeline::{load_dataset, DashboardPipeline};
use aqi_core::source::{resolve_source, SourceKind, SourceLayout};
use aqi_core::PipelineError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

const LIVE_CSV: &str = "date,city,pollutant,level,index\n\
2024-03-15,Delhi,\"PM2.5, PM10\",Poor,243\n\
2024-03-15,Mumbai,O3,Satisfactory,88\n";

const ARCHIVE_TSV: &str = "date\tcity\tpollutant\tlevel\tindex\n\
2023-03-01\tDelhi\tPM10\tModerate\t180\n\
2023-03-02\tKolkata\tnan\tGood\t41\n";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn layout(dir: &TempDir) -> SourceLayout {
    SourceLayout::new(dir.path().join("data"), dir.path().join("combined_air_quality.txt"))
}

#[test]
fn live_snapshot_is_preferred_and_reports_its_mtime() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    let live_path = layout.live_path(today());
    write(&live_path, LIVE_CSV);
    write(&layout.archive_path, ARCHIVE_TSV);

    let resolved = resolve_source(&layout, today()).expect("live resolves");

    assert_eq!(resolved.kind, SourceKind::Live);
    assert_eq!(resolved.path, live_path);
    assert_eq!(resolved.snapshot.height(), 2);
    assert!(resolved.advisory.is_none());

    let expected: DateTime<Utc> = fs::metadata(&live_path).unwrap().modified().unwrap().into();
    assert_eq!(resolved.modified, Some(expected));
}

#[test]
fn live_file_without_date_column_falls_back_with_advisory() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    write(&layout.live_path(today()), "city,pollutant\nDelhi,PM10\n");
    write(&layout.archive_path, ARCHIVE_TSV);

    let resolved = resolve_source(&layout, today()).expect("archive resolves");

    assert_eq!(resolved.kind, SourceKind::Archive);
    let advisory = resolved.advisory.expect("degraded live source is reported");
    assert!(!advisory.is_empty());
    assert!(advisory.contains("2024-03-15"));
}

#[test]
fn header_only_live_file_falls_back_with_advisory() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    write(&layout.live_path(today()), "date,city,pollutant,level,index\n");
    write(&layout.archive_path, ARCHIVE_TSV);

    let resolved = resolve_source(&layout, today()).expect("archive resolves");

    assert_eq!(resolved.kind, SourceKind::Archive);
    assert_eq!(resolved.snapshot.height(), 2);
    let advisory = resolved.advisory.expect("empty live snapshot is reported");
    assert!(advisory.contains("no rows"));
}

#[test]
fn header_only_archive_is_data_unavailable() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    write(&layout.archive_path, "date\tcity\tindex\n");

    let err = resolve_source(&layout, today()).unwrap_err();
    match err {
        PipelineError::DataUnavailable { archive, .. } => assert!(archive.contains("no rows")),
        other => panic!("expected DataUnavailable, got {other:?}"),
    }
}

#[test]
fn missing_live_file_falls_back_quietly() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    write(&layout.archive_path, ARCHIVE_TSV);

    let resolved = resolve_source(&layout, today()).unwrap();

    assert_eq!(resolved.kind, SourceKind::Archive);
    assert!(resolved.advisory.is_none());
    assert!(layout.data_dir.is_dir(), "data directory is created on demand");
}

#[test]
fn no_sources_is_data_unavailable() {
    let dir = TempDir::new().unwrap();
    let err = resolve_source(&layout(&dir), today()).unwrap_err();

    match err {
        PipelineError::DataUnavailable { live, archive } => {
            assert!(live.contains("not found"));
            assert!(archive.contains("not found"));
        }
        other => panic!("expected DataUnavailable, got {other:?}"),
    }
}

#[test]
fn unparseable_archive_is_data_unavailable() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    write(&layout.archive_path, "city\tindex\nDelhi\t200\n");

    let err = resolve_source(&layout, today()).unwrap_err();
    assert!(matches!(err, PipelineError::DataUnavailable { .. }));
}

#[test]
fn loaded_dataset_carries_status_and_local_timestamp() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    write(&layout.live_path(today()), LIVE_CSV);

    let dataset = load_dataset(&layout, today(), chrono_tz::Asia::Kolkata).unwrap();

    assert_eq!(dataset.source, SourceKind::Live);
    assert!(dataset.message.is_empty());
    let stamp = dataset.last_updated.expect("mtime is available");
    assert_eq!(stamp.timezone(), chrono_tz::Asia::Kolkata);
    assert_ne!(dataset.last_updated_label(), "Not available");

    let pollutant = dataset.df.column("pollutant").unwrap().str().unwrap();
    assert_eq!(pollutant.get(0), Some("PM2.5"));
}

fn pipeline(dir: &TempDir) -> DashboardPipeline {
    let config = DashboardConfig {
        data_dir: dir.path().join("data"),
        archive_path: dir.path().join("combined_air_quality.txt"),
        ..DashboardConfig::default()
    };
    DashboardPipeline::new(&config).unwrap()
}

#[test]
fn pipeline_picks_today_in_display_timezone() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(&dir);
    write(&pipeline.layout().live_path(today()), LIVE_CSV);
    write(&pipeline.layout().archive_path, ARCHIVE_TSV);

    // 20:00 UTC on the 14th is already the 15th in Kolkata.
    let now = Utc.with_ymd_and_hms(2024, 3, 14, 20, 0, 0).unwrap();
    let dataset = pipeline.load_at(now).unwrap();

    assert_eq!(dataset.source, SourceKind::Live);
}

#[test]
fn pipeline_reuses_dataset_within_the_hour() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(&dir);
    write(&pipeline.layout().archive_path, ARCHIVE_TSV);

    let start = Utc.with_ymd_and_hms(2024, 3, 15, 6, 0, 0).unwrap();
    let first = pipeline.load_at(start).unwrap();
    assert_eq!(first.source, SourceKind::Archive);

    // A live file appearing mid-window is not seen until the entry expires.
    write(&pipeline.layout().live_path(today()), LIVE_CSV);
    let cached = pipeline.load_at(start + chrono::Duration::minutes(59)).unwrap();
    assert!(Arc::ptr_eq(&first, &cached));

    let refreshed = pipeline.load_at(start + chrono::Duration::hours(1)).unwrap();
    assert!(!Arc::ptr_eq(&first, &refreshed));
    assert_eq!(refreshed.source, SourceKind::Live);
}

#[test]
fn pipeline_surfaces_data_unavailable() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(&dir);

    let err = pipeline
        .load_at(Utc.with_ymd_and_hms(2024, 3, 15, 6, 0, 0).unwrap())
        .unwrap_err();
    assert!(matches!(err, PipelineError::DataUnavailable { .. }));
}

#[test]
fn pipeline_rejects_out_of_range_ttl() {
    let config = DashboardConfig {
        cache_ttl_secs: 10_000_000_000_000_000,
        ..DashboardConfig::default()
    };
    let err = DashboardPipeline::new(&config).err().expect("ttl is rejected");
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn pipeline_can_be_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DashboardPipeline>();
}
