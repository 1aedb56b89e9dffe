//! Dataset loaders

pub mod file;
pub mod http;

use async_trait::async_trait;
use url::Url;

use crate::error::DatasetError;
use crate::models::Dataset;

pub use file::FileSource;
pub use http::HttpSource;

/// Trait for dataset sources
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Source name, for logs
    fn name(&self) -> &'static str;

    /// Human-readable location of the snapshot
    fn location(&self) -> String;

    /// Fetch and parse the snapshot
    async fn load(&self) -> Result<Dataset, DatasetError>;
}

/// Pick a loader for a path or URL.
///
/// `http`/`https` URLs are fetched over the network; anything that does not
/// parse as a URL is treated as a filesystem path.
pub fn source_for(location: &str) -> Result<Box<dyn DatasetSource>, DatasetError> {
    match Url::parse(location) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Box::new(HttpSource::new(url)?)),
        Ok(url) if url.scheme() == "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| DatasetError::UnsupportedSource(location.to_string()))?;
            Ok(Box::new(FileSource::new(path)))
        }
        // Windows drive letters ("C:\data.json") parse as a one-letter scheme
        Ok(url) if url.scheme().len() == 1 => Ok(Box::new(FileSource::new(location))),
        Ok(_) => Err(DatasetError::UnsupportedSource(location.to_string())),
        Err(_) => Ok(Box::new(FileSource::new(location))),
    }
}

/// Load a snapshot once, logging what arrived
pub async fn load_dataset(source: &dyn DatasetSource) -> Result<Dataset, DatasetError> {
    let dataset = source.load().await?;

    tracing::info!(
        source = source.name(),
        location = %source.location(),
        advisories = dataset.advisories.len(),
        iocs = dataset.iocs.len(),
        "Dataset loaded"
    );

    if dataset.stats.advisory_count != dataset.advisories.len() as u64
        || dataset.stats.ioc_count != dataset.iocs.len() as u64
    {
        tracing::warn!(
            advisory_count = dataset.stats.advisory_count,
            ioc_count = dataset.stats.ioc_count,
            "Dataset bookkeeping counts differ from record counts"
        );
    }

    Ok(dataset)
}
