//! Resolve → normalize, wrapped in the hourly cache.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use polars::prelude::DataFrame;
use tracing::info;

use crate::cache::TtlCache;
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::normalize::{normalize_records, NormalizationReport};
use crate::source::{resolve_source, SourceKind, SourceLayout};

/// Everything the presentation layer receives from a load.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub df: DataFrame,
    /// Human-readable load status; empty when nothing noteworthy happened.
    pub message: String,
    pub last_updated: Option<DateTime<Tz>>,
    pub source: SourceKind,
    pub source_path: PathBuf,
    pub report: NormalizationReport,
}

impl LoadedDataset {
    pub fn last_updated_label(&self) -> String {
        self.last_updated
            .map(|ts| ts.format("%B %d, %Y, %H:%M %Z").to_string())
            .unwrap_or_else(|| "Not available".to_string())
    }
}

/// Uncached load for a given day.
pub fn load_dataset(layout: &SourceLayout, today: NaiveDate, timezone: Tz) -> Result<LoadedDataset> {
    let resolved = resolve_source(layout, today)?;
    let normalized = normalize_records(&resolved.snapshot.df)?;

    Ok(LoadedDataset {
        df: normalized.df,
        message: resolved.advisory.unwrap_or_default(),
        last_updated: resolved.modified.map(|ts| ts.with_timezone(&timezone)),
        source: resolved.kind,
        source_path: resolved.path,
        report: normalized.report,
    })
}

pub struct DashboardPipeline {
    layout: SourceLayout,
    timezone: Tz,
    cache: TtlCache<LoadedDataset>,
}

impl DashboardPipeline {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        Ok(Self {
            layout: SourceLayout::new(&config.data_dir, &config.archive_path),
            timezone: config.timezone()?,
            cache: TtlCache::new(config.cache_ttl()?),
        })
    }

    pub fn layout(&self) -> &SourceLayout {
        &self.layout
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn load(&self) -> Result<Arc<LoadedDataset>> {
        self.load_at(Utc::now())
    }

    /// Returns the cached dataset, reloading when the entry is older than the
    /// TTL. "Today" is taken in the display time zone.
    pub fn load_at(&self, now: DateTime<Utc>) -> Result<Arc<LoadedDataset>> {
        let today = now.with_timezone(&self.timezone).date_naive();
        self.cache.get_or_refresh_at(now, || {
            info!(%today, "refreshing air-quality dataset");
            load_dataset(&self.layout, today, self.timezone)
        })
    }
}
