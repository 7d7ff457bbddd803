use std::fmt;

use polars::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotFormat {
    /// Comma-separated daily snapshot written under the data directory.
    LiveCsv,
    /// Tab-separated long-lived archive.
    ArchiveTsv,
}

impl SnapshotFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotFormat::LiveCsv => "live_csv",
            SnapshotFormat::ArchiveTsv => "archive_tsv",
        }
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            SnapshotFormat::LiveCsv => b',',
            SnapshotFormat::ArchiveTsv => b'\t',
        }
    }
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw tabular content of a snapshot file.
///
/// `df` holds a polars `Date` column named `date` plus every other header as
/// a nullable string column, in file order.
#[derive(Debug, Clone)]
pub struct RawSnapshot {
    pub format: SnapshotFormat,
    pub df: DataFrame,
    pub rows_read: usize,
    /// Non-blank `date` cells that did not parse and were left null.
    pub unparsed_dates: usize,
}

impl RawSnapshot {
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }
}
