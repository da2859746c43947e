//! File-based page source.
//!
//! Re-reads a saved copy of the quotes page on every refresh. Useful for
//! replaying captured pages and for running without network access.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::PageFetcher;
use crate::error::FetchError;

/// A page source that reads the page from a local file.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    path: PathBuf,
    description: String,
}

impl FileFetcher {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PageFetcher for FileFetcher {
    async fn refresh(&mut self) -> Result<String, FetchError> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
