use std::collections::HashMap;

use aqi_parser::schema::{INDEX_COLUMN, LEVEL_COLUMN, POLLUTANT_COLUMN};
use once_cell::sync::Lazy;
use polars::prelude::*;
use tracing::debug;

use crate::records::AqiCategory;

pub const OTHER_POLLUTANT: &str = "Other";
pub const UNKNOWN_LEVEL: &str = "Unknown";

/// Canonical pollutant codes; anything else normalizes to `Other`.
pub const KNOWN_POLLUTANTS: [&str; 7] = ["PM2.5", "PM10", "NO2", "SO2", "CO", "O3", "NH3"];

static POLLUTANT_ALIASES: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    let mut aliases: HashMap<String, &'static str> = KNOWN_POLLUTANTS
        .iter()
        .map(|code| (code.to_ascii_uppercase(), *code))
        .collect();
    aliases.insert("OZONE".to_string(), "O3");
    aliases.insert("PM25".to_string(), "PM2.5");
    aliases.insert("PM2_5".to_string(), "PM2.5");
    aliases
});

/// Counts of values that were defaulted or dropped while normalizing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub rows: usize,
    pub pollutant_defaulted: usize,
    pub level_defaulted: usize,
    pub index_nulled: usize,
    pub synthesized_columns: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub df: DataFrame,
    pub report: NormalizationReport,
}

/// Brings a raw snapshot frame to the working schema.
///
/// Never fails on bad values: pollutants fall back to `Other`, levels to
/// `Unknown`, and indexes that are not numbers become null. Only a polars
/// error while swapping columns is propagated. Missing
/// `pollutant`/`level` columns are synthesized; every other column is kept
/// as-is and in place.
pub fn normalize_records(raw: &DataFrame) -> PolarsResult<Normalized> {
    let height = raw.height();
    let mut df = raw.clone();
    let mut report = NormalizationReport {
        rows: height,
        ..NormalizationReport::default()
    };

    let pollutants: Vec<&'static str> = match string_values(raw, POLLUTANT_COLUMN) {
        Some(values) => values
            .iter()
            .map(|value| {
                let (code, known) = canonical_pollutant(value.as_deref());
                if !known {
                    report.pollutant_defaulted += 1;
                }
                code
            })
            .collect(),
        None => {
            report.synthesized_columns.push(POLLUTANT_COLUMN);
            report.pollutant_defaulted += height;
            vec![OTHER_POLLUTANT; height]
        }
    };
    df.with_column(Series::new(POLLUTANT_COLUMN.into(), pollutants))?;

    let levels: Vec<&'static str> = match string_values(raw, LEVEL_COLUMN) {
        Some(values) => values
            .iter()
            .map(|value| {
                let category = canonical_level(value.as_deref());
                if category.is_none() {
                    report.level_defaulted += 1;
                }
                category.unwrap_or(AqiCategory::Unknown).as_str()
            })
            .collect(),
        None => {
            report.synthesized_columns.push(LEVEL_COLUMN);
            report.level_defaulted += height;
            vec![UNKNOWN_LEVEL; height]
        }
    };
    df.with_column(Series::new(LEVEL_COLUMN.into(), levels))?;

    if let Some(values) = string_values(raw, INDEX_COLUMN) {
        let indexes: Vec<Option<f64>> = values
            .iter()
            .map(|value| {
                let parsed = coerce_index(value.as_deref());
                if parsed.is_none() && value.is_some() {
                    report.index_nulled += 1;
                }
                parsed
            })
            .collect();
        df.with_column(Series::new(INDEX_COLUMN.into(), indexes))?;
    }

    debug!(
        rows = report.rows,
        pollutant_defaulted = report.pollutant_defaulted,
        level_defaulted = report.level_defaulted,
        index_nulled = report.index_nulled,
        synthesized = ?report.synthesized_columns,
        "normalized air-quality records"
    );

    Ok(Normalized { df, report })
}

/// First entry of a comma-separated pollutant list, mapped to its canonical
/// code. The flag is `false` when the value was defaulted to `Other`.
pub fn canonical_pollutant(raw: Option<&str>) -> (&'static str, bool) {
    let first = raw
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !is_textual_null(value));

    let Some(first) = first else {
        return (OTHER_POLLUTANT, false);
    };
    if first.eq_ignore_ascii_case(OTHER_POLLUTANT) {
        return (OTHER_POLLUTANT, true);
    }
    match POLLUTANT_ALIASES.get(&first.to_ascii_uppercase()) {
        Some(code) => (*code, true),
        None => (OTHER_POLLUTANT, false),
    }
}

/// `None` when the level is absent or outside the known categories.
pub fn canonical_level(raw: Option<&str>) -> Option<AqiCategory> {
    raw.map(str::trim)
        .filter(|value| !is_textual_null(value))
        .and_then(AqiCategory::from_label)
}

/// Numeric coercion of a single AQI cell; anything that is not a finite
/// number becomes `None`.
pub fn coerce_index(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|value| !is_textual_null(value))
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn is_textual_null(value: &str) -> bool {
    value.is_empty()
        || value.eq_ignore_ascii_case("nan")
        || value.eq_ignore_ascii_case("none")
        || value.eq_ignore_ascii_case("null")
}

/// Column values rendered as strings, or `None` when the column is absent.
/// A column that cannot be rendered as text is treated as all-null.
fn string_values(df: &DataFrame, name: &str) -> Option<Vec<Option<String>>> {
    let column = df.column(name).ok()?;
    let values = column
        .cast(&DataType::String)
        .ok()
        .and_then(|text| {
            text.str()
                .ok()
                .map(|ca| ca.into_iter().map(|v| v.map(str::to_string)).collect())
        })
        .unwrap_or_else(|| vec![None; df.height()]);
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pollutant_takes_first_listed_code() {
        assert_eq!(canonical_pollutant(Some("PM2.5, PM10")), ("PM2.5", true));
        assert_eq!(canonical_pollutant(Some(" no2 ")), ("NO2", true));
        assert_eq!(canonical_pollutant(Some("Ozone")), ("O3", true));
    }

    #[test]
    fn pollutant_textual_nulls_become_other() {
        for raw in [Some("nan"), Some("NaN"), Some("None"), Some(""), Some("  "), None] {
            assert_eq!(canonical_pollutant(raw).0, OTHER_POLLUTANT, "{raw:?}");
        }
        assert_eq!(canonical_pollutant(Some("Benzene")), (OTHER_POLLUTANT, false));
    }

    #[test]
    fn level_defaults_to_unknown() {
        assert_eq!(canonical_level(Some("Very Poor")), Some(AqiCategory::VeryPoor));
        assert_eq!(canonical_level(Some("nan")), None);
        assert_eq!(canonical_level(Some("Hazardous")), None);
    }

    #[test]
    fn index_coercion_drops_non_numbers() {
        assert_eq!(coerce_index(Some(" 143 ")), Some(143.0));
        assert_eq!(coerce_index(Some("97.5")), Some(97.5));
        assert_eq!(coerce_index(Some("n/a")), None);
        assert_eq!(coerce_index(Some("inf")), None);
        assert_eq!(coerce_index(None), None);
    }
}
