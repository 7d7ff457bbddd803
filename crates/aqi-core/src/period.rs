use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use aqi_parser::schema::{CITY_COLUMN, DATE_COLUMN};
use polars::prelude::*;
use thiserror::Error;

use crate::records::str_values;

pub const ALL_MONTHS_LABEL: &str = "All Months";

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognised month '{0}' (expected \"All Months\", a month name or 1-12)")]
pub struct InvalidMonth(pub String);

/// Either the "All Months" sentinel or a single calendar month (1-12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Month(u32),
}

impl MonthFilter {
    pub fn month(&self) -> Option<u32> {
        match self {
            MonthFilter::All => None,
            MonthFilter::Month(month) => Some(*month),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MonthFilter::All => ALL_MONTHS_LABEL,
            MonthFilter::Month(month) => month_abbreviation(*month),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = InvalidMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case(ALL_MONTHS_LABEL) || value.eq_ignore_ascii_case("all") {
            return Ok(MonthFilter::All);
        }
        if let Ok(number) = value.parse::<u32>() {
            return if (1..=12).contains(&number) {
                Ok(MonthFilter::Month(number))
            } else {
                Err(InvalidMonth(s.to_string()))
            };
        }
        MONTH_ABBREVIATIONS
            .iter()
            .zip(MONTH_NAMES.iter())
            .position(|(abbr, name)| {
                value.eq_ignore_ascii_case(abbr) || value.eq_ignore_ascii_case(name)
            })
            .map(|idx| MonthFilter::Month(idx as u32 + 1))
            .ok_or_else(|| InvalidMonth(s.to_string()))
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Three-letter name for a month number; out-of-range numbers render as `"?"`.
pub fn month_abbreviation(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_ABBREVIATIONS.get(idx as usize))
        .copied()
        .unwrap_or("?")
}

/// What the user picked. `cities` travels with the selection but is applied
/// by the consumers, not by [`filter_period`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodSelection {
    pub year: Option<i32>,
    pub month: MonthFilter,
    pub cities: Vec<String>,
}

impl PeriodSelection {
    pub fn label(&self) -> String {
        match (self.year, self.month) {
            (None, _) => "No period".to_string(),
            (Some(year), MonthFilter::All) => year.to_string(),
            (Some(year), MonthFilter::Month(month)) => {
                let name = month
                    .checked_sub(1)
                    .and_then(|idx| MONTH_NAMES.get(idx as usize))
                    .copied()
                    .unwrap_or("?");
                format!("{name} {year}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeriodView {
    pub df: DataFrame,
    /// `false` when the dataset offered no year to select from.
    pub selectable: bool,
}

impl PeriodView {
    fn unselectable(df: &DataFrame) -> Self {
        Self {
            df: df.head(Some(0)),
            selectable: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }
}

/// Rows of `df` falling in the selected year and, unless "All Months" was
/// picked, the selected month. The input frame is left untouched.
pub fn filter_period(df: &DataFrame, selection: &PeriodSelection) -> PolarsResult<PeriodView> {
    let Some(year) = selection.year else {
        return Ok(PeriodView::unselectable(df));
    };
    let Ok(dates) = df.column(DATE_COLUMN) else {
        return Ok(PeriodView::unselectable(df));
    };
    if dates.null_count() == dates.len() {
        return Ok(PeriodView::unselectable(df));
    }

    let mut predicate = col(DATE_COLUMN).dt().year().eq(lit(year));
    if let Some(month) = selection.month.month() {
        predicate = predicate.and(
            col(DATE_COLUMN)
                .dt()
                .month()
                .cast(DataType::UInt32)
                .eq(lit(month)),
        );
    }

    Ok(PeriodView {
        df: df.clone().lazy().filter(predicate).collect()?,
        selectable: true,
    })
}

/// Restricts to the given cities; an empty list keeps every row.
pub fn filter_cities(df: &DataFrame, cities: &[String]) -> PolarsResult<DataFrame> {
    let Some(predicate) = cities
        .iter()
        .map(|city| col(CITY_COLUMN).eq(lit(city.as_str())))
        .reduce(|any, next| any.or(next))
    else {
        return Ok(df.clone());
    };
    if df.column(CITY_COLUMN).is_err() {
        return Ok(df.head(Some(0)));
    }
    df.clone().lazy().filter(predicate).collect()
}

/// Distinct years present, newest first.
pub fn available_years(df: &DataFrame) -> PolarsResult<Vec<i32>> {
    if df.column(DATE_COLUMN).is_err() {
        return Ok(Vec::new());
    }
    let years = df
        .clone()
        .lazy()
        .select([col(DATE_COLUMN).dt().year().alias("year")])
        .collect()?;
    let years: BTreeSet<i32> = years.column("year")?.i32()?.into_iter().flatten().collect();
    Ok(years.into_iter().rev().collect())
}

/// Distinct non-empty city names, sorted.
pub fn available_cities(df: &DataFrame) -> PolarsResult<Vec<String>> {
    let Some(values) = str_values(df, CITY_COLUMN)? else {
        return Ok(Vec::new());
    };
    let cities: BTreeSet<&str> = values
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .collect();
    Ok(cities.into_iter().map(str::to_string).collect())
}

/// Preferred cities that exist in `available`, or the first available city
/// when none of them do.
pub fn default_cities(available: &[String], preferred: &[String]) -> Vec<String> {
    let chosen: Vec<String> = preferred
        .iter()
        .filter(|city| available.contains(city))
        .cloned()
        .collect();
    if !chosen.is_empty() {
        return chosen;
    }
    available.first().cloned().into_iter().collect()
}
