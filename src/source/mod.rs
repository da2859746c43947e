//! Page source abstraction.
//!
//! A [`PageFetcher`] stands in for the browser session of a manual
//! workflow: it can refresh the quotes page and hand back its raw text.

mod file;
mod http;

pub use file::FileFetcher;
pub use http::{HttpFetcher, HttpFetcherBuilder, DEFAULT_URL};

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::FetchError;

/// Trait for obtaining a fresh copy of the quotes page.
///
/// # Example
///
/// ```no_run
/// use rate_alarm::{FileFetcher, PageFetcher};
///
/// # tokio_test::block_on(async {
/// let mut fetcher = FileFetcher::new("cauciones.html");
/// let text = fetcher.refresh().await.unwrap();
/// println!("{} bytes from {}", text.len(), fetcher.description());
/// # });
/// ```
#[async_trait]
pub trait PageFetcher: Send + Debug {
    /// Reload the page and return its current text.
    async fn refresh(&mut self) -> Result<String, FetchError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI header.
    fn description(&self) -> &str;
}
