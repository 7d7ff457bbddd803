//! Aggregations behind the national snapshot, hotspot map and per-city
//! charts. Each function takes an already period-filtered frame unless it
//! says otherwise.

use std::collections::HashMap;

use aqi_parser::schema::{CITY_COLUMN, DATE_COLUMN, INDEX_COLUMN, LEVEL_COLUMN, POLLUTANT_COLUMN};
use chrono::NaiveDate;
use polars::prelude::*;

use crate::coordinates::CityCoordinates;
use crate::normalize::OTHER_POLLUTANT;
use crate::records::{date_values, f64_values, str_values, AqiCategory};

pub(crate) const MEAN_INDEX: &str = "mean_index";
const DAYS: &str = "days";
const MONTH: &str = "month";

#[derive(Debug, Clone, PartialEq)]
pub struct CityAverage {
    pub city: String,
    pub mean_index: f64,
}

impl CityAverage {
    pub fn category(&self) -> AqiCategory {
        AqiCategory::from_index(self.mean_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodInsights {
    pub national_average: f64,
    pub city_count: usize,
    pub best: CityAverage,
    pub worst: CityAverage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub city: String,
    pub mean_index: f64,
    pub dominant_pollutant: String,
    pub category: AqiCategory,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: AqiCategory,
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollutantCount {
    pub pollutant: String,
    pub days: usize,
}

/// Daily series of one city for the trend comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CityTrend {
    pub city: String,
    /// Mean index per date, oldest first. Dates without a numeric value are
    /// left out.
    pub points: Vec<(NaiveDate, f64)>,
}

/// Dated rows, or `None` when the frame lacks `date` or one of `required`.
pub(crate) fn dated_rows(df: &DataFrame, required: &[&str]) -> Option<LazyFrame> {
    let present = std::iter::once(&DATE_COLUMN)
        .chain(required)
        .all(|name| df.column(name).is_ok());
    present.then(|| df.clone().lazy().filter(col(DATE_COLUMN).is_not_null()))
}

/// Dated rows that name a city.
pub(crate) fn city_rows(df: &DataFrame, required: &[&str]) -> Option<LazyFrame> {
    let mut columns = vec![CITY_COLUMN];
    columns.extend_from_slice(required);
    dated_rows(df, &columns).map(|rows| {
        rows.filter(
            col(CITY_COLUMN)
                .is_not_null()
                .and(col(CITY_COLUMN).neq(lit(""))),
        )
    })
}

pub(crate) fn mean_index() -> Expr {
    col(INDEX_COLUMN)
        .cast(DataType::Float64)
        .mean()
        .alias(MEAN_INDEX)
}

pub(crate) fn month_of_date() -> Expr {
    col(DATE_COLUMN).dt().month().cast(DataType::Int32)
}

/// Mean index per metro over `year`, in the order of `metros`. Takes the
/// unfiltered frame: any month selection is ignored. Metros without a numeric
/// value are left out.
pub fn metro_annual_averages(
    df: &DataFrame,
    year: i32,
    metros: &[String],
) -> PolarsResult<Vec<CityAverage>> {
    let Some(rows) = city_rows(df, &[INDEX_COLUMN]) else {
        return Ok(Vec::new());
    };
    let means: HashMap<String, f64> =
        city_means(rows.filter(col(DATE_COLUMN).dt().year().eq(lit(year))))?
            .into_iter()
            .filter_map(|(city, mean)| Some((city, mean?)))
            .collect();

    Ok(metros
        .iter()
        .filter_map(|metro| {
            Some(CityAverage {
                city: metro.clone(),
                mean_index: *means.get(metro)?,
            })
        })
        .collect())
}

/// National mean plus the best and worst city by mean index. `None` when no
/// city has a numeric mean.
pub fn period_insights(df: &DataFrame) -> PolarsResult<Option<PeriodInsights>> {
    let (Some(dated), Some(rows)) = (
        dated_rows(df, &[INDEX_COLUMN]),
        city_rows(df, &[INDEX_COLUMN]),
    ) else {
        return Ok(None);
    };

    let national = dated.select([mean_index()]).collect()?;
    let national_average = national.column(MEAN_INDEX)?.f64()?.get(0);

    let city_means = city_means(rows)?;
    let city_count = city_means.len();

    // Sorted by name, so the alphabetically first city wins ties.
    let mut best: Option<(&str, f64)> = None;
    let mut worst: Option<(&str, f64)> = None;
    for (city, mean) in &city_means {
        let Some(mean) = *mean else {
            continue;
        };
        if best.map_or(true, |(_, value)| mean < value) {
            best = Some((city.as_str(), mean));
        }
        if worst.map_or(true, |(_, value)| mean > value) {
            worst = Some((city.as_str(), mean));
        }
    }

    let (Some(best), Some(worst), Some(national_average)) = (best, worst, national_average) else {
        return Ok(None);
    };
    Ok(Some(PeriodInsights {
        national_average,
        city_count,
        best: CityAverage {
            city: best.0.to_string(),
            mean_index: best.1,
        },
        worst: CityAverage {
            city: worst.0.to_string(),
            mean_index: worst.1,
        },
    }))
}

/// Per-city mean, dominant pollutant and category, for cities that have
/// coordinates and a numeric mean. Sorted by city name.
pub fn city_hotspots(df: &DataFrame, coordinates: &CityCoordinates) -> PolarsResult<Vec<Hotspot>> {
    let Some(rows) = city_rows(df, &[INDEX_COLUMN, POLLUTANT_COLUMN]) else {
        return Ok(Vec::new());
    };
    let means = city_means(rows.clone())?;

    let counts = rows
        .group_by([col(CITY_COLUMN), col(POLLUTANT_COLUMN)])
        .agg([len().alias(DAYS)])
        .collect()?;
    let mut pollutants: HashMap<String, Vec<(String, usize)>> = HashMap::new();
    for ((city, pollutant), days) in text_column(&counts, CITY_COLUMN)?
        .into_iter()
        .zip(text_column(&counts, POLLUTANT_COLUMN)?)
        .zip(count_column(&counts, DAYS)?)
    {
        if let (Some(city), Some(pollutant)) = (city, pollutant) {
            pollutants.entry(city).or_default().push((pollutant, days));
        }
    }

    let mut hotspots = Vec::new();
    for (city, mean_index) in means {
        let Some(mean_index) = mean_index else {
            continue;
        };
        let Some(&(latitude, longitude)) = coordinates.get(&city) else {
            continue;
        };
        let dominant_pollutant = pollutants
            .get(&city)
            .and_then(|counts| dominant(counts))
            .unwrap_or("N/A")
            .to_string();
        hotspots.push(Hotspot {
            category: AqiCategory::from_index(mean_index),
            city,
            mean_index,
            dominant_pollutant,
            latitude,
            longitude,
        });
    }
    Ok(hotspots)
}

/// Monthly means of `city` within `year`, January first; months without a
/// numeric value are `None`. Takes the unfiltered frame.
pub fn monthly_profile(df: &DataFrame, year: i32, city: &str) -> PolarsResult<[Option<f64>; 12]> {
    let mut profile = [None; 12];
    let Some(rows) = city_rows(df, &[INDEX_COLUMN]) else {
        return Ok(profile);
    };

    let means = rows
        .filter(
            col(CITY_COLUMN)
                .eq(lit(city))
                .and(col(DATE_COLUMN).dt().year().eq(lit(year))),
        )
        .group_by([month_of_date().alias(MONTH)])
        .agg([mean_index()])
        .collect()?;

    let months = means.column(MONTH)?.i32()?;
    let values = means.column(MEAN_INDEX)?.f64()?;
    for (month, mean) in months.into_iter().zip(values.into_iter()) {
        let slot = month
            .and_then(|month| usize::try_from(month - 1).ok())
            .and_then(|idx| profile.get_mut(idx));
        if let Some(slot) = slot {
            *slot = mean;
        }
    }
    Ok(profile)
}

/// Day counts per category for `city`, every category present in canonical
/// order.
pub fn category_distribution(df: &DataFrame, city: &str) -> PolarsResult<Vec<CategoryCount>> {
    let mut counts: HashMap<AqiCategory, usize> = HashMap::new();
    if let Some(rows) = city_rows(df, &[LEVEL_COLUMN]) {
        let levels = rows
            .filter(col(CITY_COLUMN).eq(lit(city)))
            .group_by([col(LEVEL_COLUMN)])
            .agg([len().alias(DAYS)])
            .collect()?;
        for (level, days) in text_column(&levels, LEVEL_COLUMN)?
            .into_iter()
            .zip(count_column(&levels, DAYS)?)
        {
            let category = level
                .as_deref()
                .and_then(AqiCategory::from_label)
                .unwrap_or(AqiCategory::Unknown);
            *counts.entry(category).or_default() += days;
        }
    }

    Ok(AqiCategory::ALL
        .iter()
        .map(|category| CategoryCount {
            category: *category,
            days: counts.get(category).copied().unwrap_or(0),
        })
        .collect())
}

/// Day counts per dominant pollutant for `city`, excluding `Other`. Largest
/// count first, ties by name.
pub fn pollutant_breakdown(df: &DataFrame, city: &str) -> PolarsResult<Vec<PollutantCount>> {
    let Some(rows) = city_rows(df, &[POLLUTANT_COLUMN]) else {
        return Ok(Vec::new());
    };
    let counts = rows
        .filter(
            col(CITY_COLUMN)
                .eq(lit(city))
                .and(col(POLLUTANT_COLUMN).neq(lit(OTHER_POLLUTANT))),
        )
        .group_by([col(POLLUTANT_COLUMN)])
        .agg([len().alias(DAYS)])
        .collect()?;

    let mut breakdown: Vec<PollutantCount> = text_column(&counts, POLLUTANT_COLUMN)?
        .into_iter()
        .zip(count_column(&counts, DAYS)?)
        .filter_map(|(pollutant, days)| Some(PollutantCount { pollutant: pollutant?, days }))
        .collect();
    breakdown.sort_by(|a, b| b.days.cmp(&a.days).then_with(|| a.pollutant.cmp(&b.pollutant)));
    Ok(breakdown)
}

/// Daily mean index of each of `cities` over the period, in the order the
/// cities were given. Cities without any numeric value are left out.
pub fn city_trends(df: &DataFrame, cities: &[String]) -> PolarsResult<Vec<CityTrend>> {
    let Some(wanted) = cities
        .iter()
        .map(|city| col(CITY_COLUMN).eq(lit(city.as_str())))
        .reduce(|any, next| any.or(next))
    else {
        return Ok(Vec::new());
    };
    let Some(rows) = city_rows(df, &[INDEX_COLUMN]) else {
        return Ok(Vec::new());
    };

    let daily = rows
        .filter(wanted)
        .group_by([col(CITY_COLUMN), col(DATE_COLUMN)])
        .agg([mean_index()])
        .filter(col(MEAN_INDEX).is_not_null())
        .sort([CITY_COLUMN, DATE_COLUMN], SortMultipleOptions::default())
        .collect()?;

    let names = str_values(&daily, CITY_COLUMN)?.unwrap_or_default();
    let dates = date_values(&daily)?.unwrap_or_default();
    let values = f64_values(&daily, MEAN_INDEX)?.unwrap_or_default();

    let mut series: HashMap<&str, Vec<(NaiveDate, f64)>> = HashMap::new();
    for ((city, date), value) in names.into_iter().zip(dates).zip(values) {
        if let (Some(city), Some(date), Some(value)) = (city, date, value) {
            series.entry(city).or_default().push((date, value));
        }
    }

    Ok(cities
        .iter()
        .filter_map(|city| {
            let points = series.remove(city.as_str())?;
            Some(CityTrend {
                city: city.clone(),
                points,
            })
        })
        .collect())
}

/// Mean index per city, sorted by name. Cities whose rows carry no numeric
/// index keep a `None` mean.
fn city_means(rows: LazyFrame) -> PolarsResult<Vec<(String, Option<f64>)>> {
    let means = rows
        .group_by([col(CITY_COLUMN)])
        .agg([mean_index()])
        .sort([CITY_COLUMN], SortMultipleOptions::default())
        .collect()?;

    let cities = text_column(&means, CITY_COLUMN)?;
    let values = means.column(MEAN_INDEX)?.f64()?;
    Ok(cities
        .into_iter()
        .zip(values.into_iter())
        .filter_map(|(city, mean)| Some((city?, mean)))
        .collect())
}

fn text_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    Ok(df
        .column(name)?
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

fn count_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<usize>> {
    let counts = df.column(name)?.cast(&DataType::UInt64)?;
    Ok(counts
        .u64()?
        .into_iter()
        .map(|count| count.map_or(0, |count| count as usize))
        .collect())
}

/// Most frequent name; ties go to the alphabetically smallest.
fn dominant(counts: &[(String, usize)]) -> Option<&str> {
    counts
        .iter()
        .max_by(|(a_name, a_count), (b_name, b_count)| {
            a_count.cmp(b_count).then_with(|| b_name.cmp(a_name))
        })
        .map(|(name, _)| name.as_str())
}
