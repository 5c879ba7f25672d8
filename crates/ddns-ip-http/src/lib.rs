// # HTTP IP Source
//
// This crate provides the IP resolver for the DDNS updater.
//
// ## Architecture
//
// Fetches the caller's public IP from a plain-text IP-echo service (default
// `https://checkip.amazonaws.com`). One GET per call, no caching and no
// background polling: the engine decides when to call.
//
// ## Response Handling
//
// - Transport errors, timeouts and non-success statuses → `Error::Network`
// - The body is trimmed and returned verbatim; validation is the engine's job

use ddns_core::config::IpSourceConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// The client is built with the configured timeout so a hung echo
    /// service cannot stall the scheduler.
    pub fn new(config: &IpSourceConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(Error::config("IP-echo URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: config.url.clone(),
            client,
        })
    }

    /// The configured IP-echo URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn resolve(&self) -> Result<String> {
        tracing::debug!("Getting IP from '{}'", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "{} returned status {}",
                self.url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response from {}: {}", self.url, e)))?;

        let address = body.trim().to_string();
        tracing::debug!("Acquired IP: {}", address);
        Ok(address)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
