use aqi_core::normalize::normalize_records;
use aqi_core::period::{
    available_cities, available_years, filter_cities, filter_period, MonthFilter, PeriodSelection,
};
use aqi_core::records::collect_records;
use aqi_parser::{LiveCsvParser, SnapshotParser};
use chrono::Datelike;
use polars::prelude::*;

fn dataset() -> DataFrame {
    let raw = LiveCsvParser
        .parse(
            "date,city,pollutant,level,index\n\
             2022-03-10,Delhi,PM10,Poor,260\n\
             2022-11-02,Mumbai,PM2.5,Moderate,150\n\
             2023-01-05,Delhi,PM2.5,Very Poor,390\n\
             2023-03-01,Delhi,PM10,Poor,280\n\
             2023-03-20,Kolkata,NO2,Moderate,170\n\
             2023-07-14,Mumbai,O3,Good,35\n",
        )
        .unwrap();
    normalize_records(&raw.df).unwrap().df
}

fn selection(year: Option<i32>, month: &str) -> PeriodSelection {
    PeriodSelection {
        year,
        month: month.parse().unwrap(),
        cities: Vec::new(),
    }
}

#[test]
fn year_filter_keeps_only_that_year() {
    let df = dataset();
    let view = filter_period(&df, &selection(Some(2023), "All Months")).unwrap();

    assert!(view.selectable);
    let records = collect_records(&view.df).unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.date.year() == 2023));
    assert_eq!(df.height(), 6, "input frame is untouched");
}

#[test]
fn month_filter_narrows_within_year() {
    let view = filter_period(&dataset(), &selection(Some(2023), "Mar")).unwrap();

    let records = collect_records(&view.df).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.date.year() == 2023 && r.date.month() == 3));
}

#[test]
fn month_without_rows_is_empty_but_selectable() {
    let view = filter_period(&dataset(), &selection(Some(2022), "December")).unwrap();
    assert!(view.selectable);
    assert!(view.is_empty());
}

#[test]
fn empty_dataset_is_not_selectable() {
    let empty = dataset().head(Some(0));
    let view = filter_period(&empty, &selection(Some(2023), "All Months")).unwrap();

    assert!(!view.selectable);
    assert_eq!(view.df.height(), 0);
    assert_eq!(view.df.width(), empty.width());
}

#[test]
fn missing_year_or_date_column_is_not_selectable() {
    let df = dataset();
    assert!(!filter_period(&df, &selection(None, "Mar")).unwrap().selectable);

    let without_dates = df.drop("date").unwrap();
    let view = filter_period(&without_dates, &selection(Some(2023), "All Months")).unwrap();
    assert!(!view.selectable);
    assert!(view.is_empty());
}

#[test]
fn years_and_cities_are_listed() {
    let df = dataset();
    assert_eq!(available_years(&df).unwrap(), [2023, 2022]);
    assert_eq!(available_cities(&df).unwrap(), ["Delhi", "Kolkata", "Mumbai"]);
}

#[test]
fn city_filter_applies_selection() {
    let df = dataset();
    let only = filter_cities(&df, &["Mumbai".to_string()]).unwrap();
    assert_eq!(only.height(), 2);
    assert_eq!(filter_cities(&df, &[]).unwrap().height(), 6);
}

#[test]
fn month_filter_round_trips_label() {
    let month: MonthFilter = "March".parse().unwrap();
    assert_eq!(month.month(), Some(3));
    assert_eq!(month.label(), "Mar");
}
