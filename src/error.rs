//! Error types for dataset acquisition

use std::path::PathBuf;

use thiserror::Error;

/// Failures while obtaining a dataset snapshot.
///
/// Lookups themselves never fail; these only surface before the repository
/// exists.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("dataset request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("dataset fetch from {url} returned {status}")]
    Status { url: String, status: u16 },

    #[error("unsupported dataset location: {0}")]
    UnsupportedSource(String),
}
