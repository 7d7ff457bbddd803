use crate::errors::ParserError;
use crate::model::{RawSnapshot, SnapshotFormat};
use crate::registry::SnapshotParser;

use super::parse_delimited;

/// Daily snapshot written as `<data_dir>/<YYYY-MM-DD>.csv`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveCsvParser;

impl LiveCsvParser {
    const NAME: &'static str = "LIVE_CSV";
}

impl SnapshotParser for LiveCsvParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn format(&self) -> SnapshotFormat {
        SnapshotFormat::LiveCsv
    }

    fn parse(&self, content: &str) -> Result<RawSnapshot, ParserError> {
        parse_delimited(Self::NAME, SnapshotFormat::LiveCsv, content)
    }
}
