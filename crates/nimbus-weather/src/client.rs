//! Upstream weather provider access.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;

/// Source of raw weather payloads for a coordinate pair.
///
/// Implementations own their transport concerns (timeouts, and retry or
/// backoff if they want any); the core does not retry. An empty result and
/// a failed request are indistinguishable to callers.
pub trait UpstreamClient {
    fn fetch(&self, lat: f64, lon: f64) -> impl Future<Output = Option<String>> + Send;
}

/// OpenWeatherMap-compatible HTTP client.
///
/// Any request failure, including non-success statuses, reads as "no data".
#[derive(Debug, Clone)]
pub struct OpenWeatherMapClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherMapClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

impl UpstreamClient for OpenWeatherMapClient {
    async fn fetch(&self, lat: f64, lon: f64) -> Option<String> {
        let response = match self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("upstream request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "upstream returned non-success");
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::debug!("failed to read upstream body: {}", e);
                None
            }
        }
    }
}
