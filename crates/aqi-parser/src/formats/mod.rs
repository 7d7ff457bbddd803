mod archive_tsv;
mod common;
mod live_csv;
pub mod schema;

pub use archive_tsv::ArchiveTsvParser;
pub use live_csv::LiveCsvParser;

pub(crate) use common::parse_delimited;
