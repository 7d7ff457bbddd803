use std::collections::{BTreeMap, HashMap};

use aqi_parser::schema::{CITY_COLUMN, DATE_COLUMN, INDEX_COLUMN};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::insights::{city_rows, mean_index, month_of_date, MEAN_INDEX};
use crate::records::{collect_records, AqiCategory};

pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// One day of the annual calendar heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// ISO week, with 0 for early-January days that belong to the previous
    /// ISO year and 53 for late-December days that belong to the next.
    pub week: u32,
    /// Monday = 0.
    pub weekday: u32,
    pub level: AqiCategory,
    pub index: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapRow {
    pub month: u32,
    /// Mean index per day of month; `days[0]` is the 1st.
    pub days: [Option<f64>; 31],
}

/// Every day of `year` for `city`. Days without a record are `Unknown`; when
/// a city has several rows for one day the first one is used.
///
/// Takes the unfiltered frame: the calendar always covers the whole year.
pub fn calendar_grid(df: &DataFrame, city: &str, year: i32) -> PolarsResult<Vec<CalendarCell>> {
    let Some(first_day) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Ok(Vec::new());
    };

    let mut by_date: HashMap<NaiveDate, (AqiCategory, Option<f64>)> = HashMap::new();
    for record in collect_records(df)?
        .iter()
        .filter(|r| r.city == city && r.date.year() == year)
    {
        by_date
            .entry(record.date)
            .or_insert((record.category(), record.index));
    }

    Ok(first_day
        .iter_days()
        .take_while(|date| date.year() == year)
        .map(|date| {
            let (level, index) = by_date
                .get(&date)
                .copied()
                .unwrap_or((AqiCategory::Unknown, None));
            CalendarCell {
                date,
                week: calendar_week(date),
                weekday: date.weekday().num_days_from_monday(),
                level,
                index,
            }
        })
        .collect())
}

fn calendar_week(date: NaiveDate) -> u32 {
    let week = date.iso_week().week();
    match date.month() {
        1 if week > 50 => 0,
        12 if week == 1 => 53,
        _ => week,
    }
}

/// Mean index per (month, day of month) for `city`, months in calendar order
/// and only those with at least one row.
pub fn daily_heatmap(df: &DataFrame, city: &str) -> PolarsResult<Vec<HeatmapRow>> {
    let Some(rows) = city_rows(df, &[INDEX_COLUMN]) else {
        return Ok(Vec::new());
    };
    let daily = rows
        .filter(col(CITY_COLUMN).eq(lit(city)))
        .group_by([
            month_of_date().alias("month"),
            col(DATE_COLUMN).dt().day().cast(DataType::Int32).alias("day"),
        ])
        .agg([mean_index()])
        .collect()?;

    let mut months: BTreeMap<u32, [Option<f64>; 31]> = BTreeMap::new();
    let days = daily.column("day")?.i32()?;
    let values = daily.column(MEAN_INDEX)?.f64()?;
    for ((month, day), mean) in daily
        .column("month")?
        .i32()?
        .into_iter()
        .zip(days.into_iter())
        .zip(values.into_iter())
    {
        let (Some(month), Some(day)) = (month, day) else {
            continue;
        };
        let (Ok(month), Ok(slot)) = (u32::try_from(month), usize::try_from(day - 1)) else {
            continue;
        };
        if let Some(cell) = months.entry(month).or_insert([None; 31]).get_mut(slot) {
            *cell = mean;
        }
    }

    Ok(months
        .into_iter()
        .map(|(month, days)| HeatmapRow { month, days })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn year_boundary_weeks_are_pinned() {
        // 2021-01-01 is a Friday in ISO week 53 of 2020.
        assert_eq!(day(2021, 1, 1).iso_week().week(), 53);
        assert_eq!(calendar_week(day(2021, 1, 1)), 0);
        // 2024-12-30 is a Monday in ISO week 1 of 2025.
        assert_eq!(day(2024, 12, 30).iso_week().week(), 1);
        assert_eq!(calendar_week(day(2024, 12, 30)), 53);
        assert_eq!(calendar_week(day(2024, 6, 15)), 24);
    }
}
