use std::fmt;

use aqi_parser::epoch_days_to_date;
use aqi_parser::schema::{CITY_COLUMN, DATE_COLUMN, INDEX_COLUMN, LEVEL_COLUMN, POLLUTANT_COLUMN};
use chrono::NaiveDate;
use polars::prelude::*;

use crate::normalize::{OTHER_POLLUTANT, UNKNOWN_LEVEL};

/// CPCB air-quality bands, plus `Unknown` for missing or unrecognised labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AqiCategory {
    Severe,
    VeryPoor,
    Poor,
    Moderate,
    Satisfactory,
    Good,
    Unknown,
}

impl AqiCategory {
    /// Display order used by every category chart.
    pub const ALL: [AqiCategory; 7] = [
        AqiCategory::Severe,
        AqiCategory::VeryPoor,
        AqiCategory::Poor,
        AqiCategory::Moderate,
        AqiCategory::Satisfactory,
        AqiCategory::Good,
        AqiCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AqiCategory::Severe => "Severe",
            AqiCategory::VeryPoor => "Very Poor",
            AqiCategory::Poor => "Poor",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Satisfactory => "Satisfactory",
            AqiCategory::Good => "Good",
            AqiCategory::Unknown => UNKNOWN_LEVEL,
        }
    }

    /// Case- and separator-insensitive match (`"very_poor"`, `"VERY POOR"`).
    pub fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "severe" => Some(AqiCategory::Severe),
            "verypoor" => Some(AqiCategory::VeryPoor),
            "poor" => Some(AqiCategory::Poor),
            "moderate" => Some(AqiCategory::Moderate),
            "satisfactory" => Some(AqiCategory::Satisfactory),
            "good" => Some(AqiCategory::Good),
            "unknown" => Some(AqiCategory::Unknown),
            _ => None,
        }
    }

    /// Bands a numeric AQI value. Upper bounds are inclusive so fractional
    /// averages (e.g. 50.4) land in a band instead of falling between two.
    pub fn from_index(value: f64) -> Self {
        if !value.is_finite() || value < 0.0 {
            AqiCategory::Unknown
        } else if value <= 50.0 {
            AqiCategory::Good
        } else if value <= 100.0 {
            AqiCategory::Satisfactory
        } else if value <= 200.0 {
            AqiCategory::Moderate
        } else if value <= 300.0 {
            AqiCategory::Poor
        } else if value <= 400.0 {
            AqiCategory::VeryPoor
        } else {
            AqiCategory::Severe
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of one normalized row.
#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityRecord {
    pub date: NaiveDate,
    pub city: String,
    pub pollutant: String,
    pub level: String,
    pub index: Option<f64>,
}

impl AirQualityRecord {
    pub fn category(&self) -> AqiCategory {
        AqiCategory::from_label(&self.level).unwrap_or(AqiCategory::Unknown)
    }
}

/// Materializes the rows of a normalized frame. Rows without a date are
/// skipped; a frame without a `date` column yields no records.
pub fn collect_records(df: &DataFrame) -> PolarsResult<Vec<AirQualityRecord>> {
    let Some(dates) = date_values(df)? else {
        return Ok(Vec::new());
    };
    let cities = str_values(df, CITY_COLUMN)?;
    let pollutants = str_values(df, POLLUTANT_COLUMN)?;
    let levels = str_values(df, LEVEL_COLUMN)?;
    let indexes = f64_values(df, INDEX_COLUMN)?;

    let mut records = Vec::with_capacity(dates.len());
    for (idx, date) in dates.iter().enumerate() {
        let Some(date) = *date else {
            continue;
        };
        records.push(AirQualityRecord {
            date,
            city: text_at(&cities, idx).unwrap_or_default(),
            pollutant: text_at(&pollutants, idx).unwrap_or_else(|| OTHER_POLLUTANT.to_string()),
            level: text_at(&levels, idx).unwrap_or_else(|| UNKNOWN_LEVEL.to_string()),
            index: indexes
                .as_ref()
                .and_then(|v| v.get(idx).copied().flatten()),
        });
    }
    Ok(records)
}

fn text_at(values: &Option<Vec<Option<&str>>>, idx: usize) -> Option<String> {
    values
        .as_ref()
        .and_then(|v| v.get(idx).copied().flatten())
        .map(str::to_string)
}

pub(crate) fn date_values(df: &DataFrame) -> PolarsResult<Option<Vec<Option<NaiveDate>>>> {
    let Ok(column) = df.column(DATE_COLUMN) else {
        return Ok(None);
    };
    let dates = column.date()?;
    Ok(Some(
        (0..dates.len())
            .map(|idx| dates.get(idx).and_then(epoch_days_to_date))
            .collect(),
    ))
}

pub(crate) fn str_values<'a>(df: &'a DataFrame, name: &str) -> PolarsResult<Option<Vec<Option<&'a str>>>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    Ok(Some(column.str()?.into_iter().collect()))
}

pub(crate) fn f64_values(df: &DataFrame, name: &str) -> PolarsResult<Option<Vec<Option<f64>>>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let values = column.cast(&DataType::Float64)?;
    Ok(Some(values.f64()?.into_iter().collect()))
}
