use crate::errors::{ParserAttempt, ParserError};
use crate::formats::{ArchiveTsvParser, LiveCsvParser};
use crate::model::{RawSnapshot, SnapshotFormat};

pub trait SnapshotParser: Send + Sync {
    fn name(&self) -> &'static str;
    fn format(&self) -> SnapshotFormat;
    fn parse(&self, content: &str) -> Result<RawSnapshot, ParserError>;
}

pub fn parser_for(format: SnapshotFormat) -> &'static dyn SnapshotParser {
    match format {
        SnapshotFormat::LiveCsv => &LiveCsvParser,
        SnapshotFormat::ArchiveTsv => &ArchiveTsvParser,
    }
}

/// Parses a snapshot of unknown format, trying the live CSV layout first.
pub fn parse_snapshot(content: &str) -> Result<RawSnapshot, ParserError> {
    let live = LiveCsvParser;
    let archive = ArchiveTsvParser;
    let parsers: [&dyn SnapshotParser; 2] = [&live, &archive];
    parse_with_parsers(content, &parsers)
}

pub fn parse_with_parsers(
    content: &str,
    parsers: &[&dyn SnapshotParser],
) -> Result<RawSnapshot, ParserError> {
    let mut attempts = Vec::new();

    for parser in parsers {
        match parser.parse(content) {
            Ok(parsed) => return Ok(parsed),
            Err(ParserError::FormatMismatch { reason, .. }) => {
                attempts.push(ParserAttempt::new(parser.name(), reason));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ParserError::NoMatchingParser { attempts })
}
