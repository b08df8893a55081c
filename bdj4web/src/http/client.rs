//! HTTP client implementation

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::errors::WebError;

/// HTTP client for outbound lookups
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WebError> {
        let client = Client::builder().timeout(timeout).build()?;

        // keep a trailing slash so joins append instead of replacing
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| WebError::ConfigError(format!("invalid base url {}: {}", base_url, e)))?;

        Ok(Self { client, base_url })
    }

    /// Resolve `path` against the base URL
    pub fn url(&self, path: &str) -> Result<Url, WebError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| WebError::ConfigError(format!("invalid path {}: {}", path, e)))
    }

    /// Make a GET request and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, WebError> {
        let url = self.url(path)?;
        debug!("GET {}", url);

        // the query may carry a token
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("HTTP GET failed: {} - {}", status, body);
            return Err(WebError::ServerError(format!("{}: {}", status, body)));
        }

        let body = response.json().await.map_err(|e| e.without_url())?;
        Ok(body)
    }
}
