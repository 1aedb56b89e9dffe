//! Local JSON file loader

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::DatasetError;
use crate::loaders::DatasetSource;
use crate::models::Dataset;

/// Reads an exported `data.json` from disk
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DatasetSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn location(&self) -> String {
        self.path().display().to_string()
    }

    async fn load(&self) -> Result<Dataset, DatasetError> {
        let raw = tokio::fs::read(&self.path).await.map_err(|source| DatasetError::Io {
            path: self.path.clone(),
            source,
        })?;

        Dataset::from_slice(&raw)
    }
}
