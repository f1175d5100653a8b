use std::path::Path;

use traffic_insights::analyzers::aggregate::summarize;
use traffic_insights::analyzers::types::PeakHour;
use traffic_insights::charts::{chart_paths, render_all};
use traffic_insights::output::insight_lines;
use traffic_insights::parser::{ColumnLayout, DEFAULT_SAMPLE_LIMIT, IngestError, load_file};

const FIXTURE: &str = "tests/fixtures/sample_traffic.csv";

#[test]
fn test_full_pipeline() {
    let ingested = load_file(Path::new(FIXTURE), &ColumnLayout::default(), DEFAULT_SAMPLE_LIMIT)
        .expect("Failed to load fixture");

    assert_eq!(ingested.rows_read, 10);
    assert_eq!(ingested.records.len(), 8);
    assert_eq!(ingested.rejected, 2);

    let summary = summarize(FIXTURE, ingested);

    // The slash-dated row is kept for weather groups only
    assert_eq!(summary.undated, 1);
    assert_eq!(summary.hourly.total_count(), 7);
    assert_eq!(summary.peak_hour, PeakHour::Hour(17));
    assert_eq!(summary.hourly.averages()[8], 5700.0);
    assert_eq!(summary.day_type.weekday.count, 5);
    assert_eq!(summary.day_type.weekend.count, 2);
    assert_eq!(summary.rain.wet.count, 2);
    assert_eq!(summary.rain.wet.average(), 5000.0);
    assert_eq!(summary.snow.wet.average(), 3100.0);

    let lines = insight_lines(&summary);
    assert_eq!(lines[0], "Loaded 8 rows successfully.");
    assert_eq!(lines[1], "Warning: 2 rows were skipped due to formatting errors.");
    assert!(lines.contains(&"Peak Traffic Hour: 17:00".to_string()));
    assert!(lines.contains(&"Avg Traffic on Weekends: 3000.00".to_string()));
}

#[test]
fn test_charts_written_to_output_dir() {
    let ingested =
        load_file(Path::new(FIXTURE), &ColumnLayout::default(), DEFAULT_SAMPLE_LIMIT).unwrap();
    let summary = summarize(FIXTURE, ingested);
    let dir = tempfile::tempdir().unwrap();

    let written = render_all(&summary, dir.path(), false).unwrap();

    assert_eq!(written, chart_paths(dir.path()));
    for path in &written {
        assert!(path.exists());
    }
}

#[test]
fn test_missing_file_is_fatal() {
    let result = load_file(
        Path::new("tests/fixtures/TrafficVolumeData.csv"),
        &ColumnLayout::default(),
        DEFAULT_SAMPLE_LIMIT,
    );
    assert!(matches!(result, Err(IngestError::NotFound { .. })));
}

#[test]
fn test_binary_garbage_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.csv");
    std::fs::write(&path, [0xC3u8, 0x28, 0xFF, b',', 0xFE, b'\n', 0x80, 0x81, b'\n']).unwrap();

    let result = load_file(&path, &ColumnLayout::default(), DEFAULT_SAMPLE_LIMIT);
    assert!(matches!(result, Err(IngestError::Corrupt { .. })));
}
