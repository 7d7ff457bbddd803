use crate::errors::ParserError;
use crate::model::{RawSnapshot, SnapshotFormat};
use crate::registry::SnapshotParser;

use super::parse_delimited;

/// Long-lived tab-separated archive used when no live snapshot is usable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveTsvParser;

impl ArchiveTsvParser {
    const NAME: &'static str = "ARCHIVE_TSV";
}

impl SnapshotParser for ArchiveTsvParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn format(&self) -> SnapshotFormat {
        SnapshotFormat::ArchiveTsv
    }

    fn parse(&self, content: &str) -> Result<RawSnapshot, ParserError> {
        parse_delimited(Self::NAME, SnapshotFormat::ArchiveTsv, content)
    }
}
