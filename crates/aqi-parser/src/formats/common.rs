use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Trim};
use polars::prelude::*;

use crate::dates::{date_to_epoch_days, is_textual_null, parse_date};
use crate::errors::ParserError;
use crate::model::{RawSnapshot, SnapshotFormat};

use super::schema::DATE_COLUMN;

/// Reads a delimited snapshot into a `RawSnapshot`.
///
/// The `date` column becomes a polars `Date`; every other column is kept as a
/// nullable string so unknown columns pass through untouched.
pub(crate) fn parse_delimited(
    parser: &'static str,
    format: SnapshotFormat,
    content: &str,
) -> Result<RawSnapshot, ParserError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter())
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|source| ParserError::Csv { parser, source })?
        .clone();
    let names = normalize_headers(&headers);
    check_delimiter(parser, format, &names)?;

    let date_idx = names
        .iter()
        .position(|name| name == DATE_COLUMN)
        .ok_or(ParserError::MissingColumn {
            parser,
            column: DATE_COLUMN,
        })?;

    let mut dates: Vec<Option<i32>> = Vec::new();
    let mut text_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    let mut rows_read = 0usize;
    let mut parsed_dates = 0usize;
    let mut unparsed_dates = 0usize;

    for result in reader.records() {
        let record = result.map_err(|source| ParserError::Csv { parser, source })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows_read += 1;

        for (idx, column) in text_columns.iter_mut().enumerate() {
            if idx != date_idx {
                column.push(clean_cell(record.get(idx)));
            }
        }

        let raw_date = record.get(date_idx).unwrap_or_default();
        match parse_date(raw_date) {
            Some(date) => {
                parsed_dates += 1;
                dates.push(Some(date_to_epoch_days(date)));
            }
            None => {
                if !raw_date.is_empty() && !is_textual_null(raw_date) {
                    unparsed_dates += 1;
                }
                dates.push(None);
            }
        }
    }

    if rows_read > 0 && parsed_dates == 0 {
        return Err(ParserError::Validation {
            parser,
            message: format!(
                "none of {rows_read} rows had a parseable '{DATE_COLUMN}' value"
            ),
        });
    }

    let mut columns: Vec<Column> = Vec::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        if idx == date_idx {
            let series = Series::new(DATE_COLUMN.into(), std::mem::take(&mut dates))
                .cast(&DataType::Date)
                .map_err(|source| ParserError::Polars { parser, source })?;
            columns.push(series.into());
        } else {
            let values: Vec<Option<&str>> =
                text_columns[idx].iter().map(|v| v.as_deref()).collect();
            columns.push(Series::new(name.as_str().into(), values).into());
        }
    }

    let df = DataFrame::new(columns).map_err(|source| ParserError::Polars { parser, source })?;

    Ok(RawSnapshot {
        format,
        df,
        rows_read,
        unparsed_dates,
    })
}

/// Lower-cases and trims header names, strips a UTF-8 BOM, names blank
/// headers positionally and suffixes duplicates (`index`, `index.1`, ...).
fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let trimmed = raw.trim().trim_start_matches('\u{feff}').trim();
            let base = if trimmed.is_empty() {
                format!("unnamed_{idx}")
            } else {
                trimmed.to_ascii_lowercase()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

/// A single header field that still contains the other format's delimiter
/// means the file was written in the other format.
fn check_delimiter(
    parser: &'static str,
    format: SnapshotFormat,
    names: &[String],
) -> Result<(), ParserError> {
    let foreign = match format {
        SnapshotFormat::LiveCsv => '\t',
        SnapshotFormat::ArchiveTsv => ',',
    };
    match names {
        [only] if only != DATE_COLUMN && only.contains(foreign) => {
            Err(ParserError::FormatMismatch {
                parser,
                reason: format!("header is not {}-delimited", delimiter_label(format)),
            })
        }
        _ => Ok(()),
    }
}

fn delimiter_label(format: SnapshotFormat) -> &'static str {
    match format {
        SnapshotFormat::LiveCsv => "comma",
        SnapshotFormat::ArchiveTsv => "tab",
    }
}

fn clean_cell(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}
