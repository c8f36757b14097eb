// src/map/transport.rs
//! Network transport for tile requests

use crate::error::{BuildingsError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::future::Future;
use std::time::Duration;

const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fetches the raw body behind a URL. Implementations must surface a bounded
/// failure instead of hanging; the loader has no timeout of its own.
pub trait Transport: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// HTTP transport expecting JSON responses
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self> {
        let user_agent = match user_agent {
            Some(agent) => agent.to_string(),
            None => format!("osm-buildings/{}", CRATE_VERSION),
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent)
                .map_err(|e| BuildingsError::Config(format!("Invalid user agent: {}", e)))?,
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BuildingsError::Transport(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(BuildingsError::Transport(format!(
                "HTTP error {} for {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BuildingsError::Transport(format!("Failed to read response: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
