use aqi_core::normalize::{normalize_records, Normalized};
use aqi_core::records::collect_records;
use aqi_parser::{LiveCsvParser, SnapshotParser};
use polars::prelude::*;

fn normalize(csv: &str) -> Normalized {
    let raw = LiveCsvParser.parse(csv).expect("fixture parses").df;
    normalize_records(&raw).expect("normalizes")
}

#[test]
fn missing_pollutant_and_level_columns_are_synthesized() {
    let normalized = normalize("date,city,index\n2024-01-01,Delhi,300\n2024-01-02,Delhi,310\n");

    let pollutant = normalized.df.column("pollutant").unwrap().str().unwrap();
    assert!(pollutant.into_iter().all(|value| value == Some("Other")));
    let level = normalized.df.column("level").unwrap().str().unwrap();
    assert!(level.into_iter().all(|value| value == Some("Unknown")));

    assert_eq!(normalized.report.synthesized_columns, ["pollutant", "level"]);
    assert_eq!(normalized.report.pollutant_defaulted, 2);
}

#[test]
fn values_are_canonicalized() {
    let normalized = normalize(
        "date,city,pollutant,level,index\n\
         2024-01-01,Delhi,\"PM2.5, PM10\",very poor,355\n\
         2024-01-02,Delhi,nan,Hazardous,n/a\n\
         2024-01-03,Delhi,None,,\n\
         2024-01-04,Delhi,ozone,GOOD,42.5\n",
    );
    let records = collect_records(&normalized.df).unwrap();

    let pollutants: Vec<&str> = records.iter().map(|r| r.pollutant.as_str()).collect();
    assert_eq!(pollutants, ["PM2.5", "Other", "Other", "O3"]);

    let levels: Vec<&str> = records.iter().map(|r| r.level.as_str()).collect();
    assert_eq!(levels, ["Very Poor", "Unknown", "Unknown", "Good"]);

    let indexes: Vec<Option<f64>> = records.iter().map(|r| r.index).collect();
    assert_eq!(indexes, [Some(355.0), None, None, Some(42.5)]);

    assert_eq!(normalized.report.index_nulled, 1, "empty cells are not counted");
    assert_eq!(normalized.report.level_defaulted, 2);
}

#[test]
fn index_column_is_numeric_after_normalization() {
    let normalized = normalize("date,city,index\n2024-01-01,Delhi,abc\n");
    let index = normalized.df.column("index").unwrap();
    assert_eq!(index.dtype(), &DataType::Float64);
    assert_eq!(index.null_count(), 1);
}

#[test]
fn absent_columns_stay_absent_and_extras_pass_through() {
    let normalized = normalize("date,pollutant,stations\n2024-01-01,SO2,4\n");
    let names: Vec<&str> = normalized
        .df
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();

    assert!(!names.contains(&"index"));
    assert!(!names.contains(&"city"));
    assert!(names.contains(&"stations"));
    assert_eq!(normalized.df.column("date").unwrap().dtype(), &DataType::Date);
}

#[test]
fn empty_frame_normalizes_to_empty_frame() {
    let normalized = normalize("date,city,pollutant,level,index\n");
    assert_eq!(normalized.df.height(), 0);
    assert_eq!(normalized.report.rows, 0);
}
