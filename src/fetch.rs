//! Retrieval of remote inputs given as URLs

use crate::config::{DEFAULT_FETCHED_FILENAME, USER_AGENT};
use crate::error::{MergeError, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// The bytes behind a URL and the filename its path suggests
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Something that can retrieve the bytes behind a URL
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Fetched>;
}

/// The last non-empty segment of the URL path, or [`DEFAULT_FETCHED_FILENAME`]
pub fn filename_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|name| !name.is_empty()).last())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_FETCHED_FILENAME.to_string())
}

fn fetch_error(url: &str, reason: impl ToString) -> MergeError {
    MergeError::Fetch {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Plain HTTP GET fetcher. One client is shared by all requests
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(HttpFetcher { client, max_bytes })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Fetched> {
        let parsed = Url::parse(url).map_err(|e| fetch_error(url, e))?;
        let filename = filename_from_url(&parsed);

        debug!("fetching {parsed}");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| fetch_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(url, format!("HTTP {status}")));
        }

        if response
            .content_length()
            .map_or(false, |len| len > self.max_bytes as u64)
        {
            return Err(fetch_error(url, "response is too large"));
        }

        let bytes = response.bytes().await.map_err(|e| fetch_error(url, e))?;
        if bytes.len() > self.max_bytes {
            return Err(fetch_error(url, "response is too large"));
        }

        debug!("fetched {} bytes from {url}", bytes.len());
        Ok(Fetched {
            bytes: bytes.to_vec(),
            filename,
        })
    }
}
