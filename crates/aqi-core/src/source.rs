use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use aqi_parser::{parser_for, RawSnapshot, SnapshotFormat};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::{PipelineError, Result, SourceError};

/// File-name format of daily snapshots.
pub const LIVE_FILE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Live,
    Archive,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Live => "live",
            SourceKind::Archive => "archive",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceLayout {
    pub data_dir: PathBuf,
    pub archive_path: PathBuf,
}

impl SourceLayout {
    pub fn new(data_dir: impl Into<PathBuf>, archive_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            archive_path: archive_path.into(),
        }
    }

    pub fn live_path(&self, day: NaiveDate) -> PathBuf {
        self.data_dir
            .join(format!("{}.csv", day.format(LIVE_FILE_DATE_FORMAT)))
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub snapshot: RawSnapshot,
    /// `None` when the platform does not report modification times.
    pub modified: Option<DateTime<Utc>>,
    /// Set when the live snapshot existed but could not be used.
    pub advisory: Option<String>,
}

/// Picks today's live snapshot when it exists, parses and has at least one
/// row, otherwise the archive. Fails with `DataUnavailable` only when the archive is unusable
/// too.
pub fn resolve_source(layout: &SourceLayout, today: NaiveDate) -> Result<ResolvedSource> {
    ensure_data_dir(&layout.data_dir);

    let live_path = layout.live_path(today);
    let mut advisory = None;

    let live_reason = match load_file(&live_path, SnapshotFormat::LiveCsv) {
        Ok(Some((snapshot, modified))) => {
            info!(
                path = %live_path.display(),
                rows = snapshot.height(),
                "using live snapshot"
            );
            return Ok(ResolvedSource {
                kind: SourceKind::Live,
                path: live_path,
                snapshot,
                modified,
                advisory: None,
            });
        }
        Ok(None) => {
            info!(path = %live_path.display(), "no live snapshot for today");
            format!("{} not found", live_path.display())
        }
        Err(err) => {
            warn!(
                path = %live_path.display(),
                error = %err,
                "live snapshot unusable; falling back to archive"
            );
            advisory = Some(format!(
                "Live data for {} could not be used ({err}); showing archival data.",
                today.format(LIVE_FILE_DATE_FORMAT)
            ));
            err.to_string()
        }
    };

    let archive_path = &layout.archive_path;
    match load_file(archive_path, SnapshotFormat::ArchiveTsv) {
        Ok(Some((snapshot, modified))) => {
            info!(
                path = %archive_path.display(),
                rows = snapshot.height(),
                "using archival dataset"
            );
            Ok(ResolvedSource {
                kind: SourceKind::Archive,
                path: archive_path.clone(),
                snapshot,
                modified,
                advisory,
            })
        }
        Ok(None) => Err(PipelineError::DataUnavailable {
            live: live_reason,
            archive: format!("{} not found", archive_path.display()),
        }),
        Err(err) => Err(PipelineError::DataUnavailable {
            live: live_reason,
            archive: err.to_string(),
        }),
    }
}

/// `Ok(None)` when the file does not exist. A header-only file is an error so
/// that an empty live snapshot never hides the archive.
fn load_file(
    path: &Path,
    format: SnapshotFormat,
) -> std::result::Result<Option<(RawSnapshot, Option<DateTime<Utc>>)>, SourceError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SourceError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let snapshot = parser_for(format).parse(&content)?;
    if snapshot.is_empty() {
        return Err(SourceError::Empty {
            path: path.display().to_string(),
        });
    }
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Utc>::from);

    Ok(Some((snapshot, modified)))
}

fn ensure_data_dir(dir: &Path) {
    if dir.as_os_str().is_empty() {
        return;
    }
    if let Err(err) = fs::create_dir_all(dir) {
        warn!(path = %dir.display(), error = %err, "could not create data directory");
    }
}
