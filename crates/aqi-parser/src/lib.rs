pub mod dates;
pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use dates::{date_to_epoch_days, epoch_days_to_date, parse_date};
pub use errors::{ParserAttempt, ParserError};
pub use formats::schema;
pub use formats::{ArchiveTsvParser, LiveCsvParser};
pub use model::{RawSnapshot, SnapshotFormat};
pub use registry::{parse_snapshot, parse_with_parsers, parser_for, SnapshotParser};
