//! HTTP page source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::PageFetcher;
use crate::error::FetchError;

/// Default quotes page.
pub const DEFAULT_URL: &str = "https://iol.invertironline.com/mercado/cotizaciones/argentina/cauciones";

/// Fetches the quotes page over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    url: String,
    description: String,
}

impl HttpFetcher {
    /// Create a new builder for configuring the fetcher.
    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::default()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn refresh(&mut self) -> Result<String, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let text = response.text().await?;
        debug!(url = %self.url, bytes = text.len(), "Page fetched");
        Ok(text)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for HttpFetcher.
#[derive(Debug, Default)]
pub struct HttpFetcherBuilder {
    url: Option<String>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl HttpFetcherBuilder {
    /// Set the page URL (default: [`DEFAULT_URL`]).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the User-Agent header sent with each request.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the request timeout (default: 15 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the fetcher.
    pub fn build(self) -> Result<HttpFetcher, FetchError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(15));
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| concat!("rate-alarm/", env!("CARGO_PKG_VERSION")).to_string());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        let url = self.url.unwrap_or_else(|| DEFAULT_URL.to_string());
        let description = format!("http: {}", url);

        Ok(HttpFetcher {
            client,
            url,
            description,
        })
    }
}
