// crates/aqi-core/src/error.rs

use aqi_parser::ParserError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no air-quality data available (live: {live}; archive: {archive})")]
    DataUnavailable { live: String, archive: String },

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why a single source file could not be used.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParserError),

    #[error("{path} has a header but no rows")]
    Empty { path: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
