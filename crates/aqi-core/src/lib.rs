//! Data pipeline behind the AQI dashboard: source resolution, normalization,
//! caching, period filtering and the aggregations the charts are drawn from.

pub mod cache;
pub mod calendar;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod insights;
pub mod normalize;
pub mod period;
pub mod pipeline;
pub mod records;
pub mod source;
pub mod theme;

pub use aqi_parser::schema;
pub use cache::TtlCache;
pub use config::DashboardConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{DashboardPipeline, LoadedDataset};
pub use period::{filter_period, MonthFilter, PeriodSelection, PeriodView};
pub use records::{AirQualityRecord, AqiCategory};
pub use source::SourceKind;
