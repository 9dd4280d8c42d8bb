use std::time::Duration;

use eyre::{Result, WrapErr};
use reqwest::{Client, ClientBuilder};

const USER_AGENT: &str = concat!("hookwarden/", env!("CARGO_PKG_VERSION"));

/// Builds the pooled HTTP client shared by every outbound integration
pub struct HttpClientFactory {
    default_timeout: Duration,
    max_idle_per_host: usize,
}

impl HttpClientFactory {
    pub fn new() -> Self {
        Self { default_timeout: Duration::from_secs(10), max_idle_per_host: 10 }
    }

    /// Create a new HTTP client with connection pooling
    pub fn create_client(&self) -> Result<Client> {
        ClientBuilder::new()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(self.max_idle_per_host)
            .timeout(self.default_timeout)
            .build()
            .wrap_err("Failed to create HTTP client")
    }
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self::new()
    }
}
