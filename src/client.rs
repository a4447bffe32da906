use crate::error::Result;
use reqwest::blocking::{Client, ClientBuilder};
use std::time::Duration;

/// Base URL of the API method endpoint
pub const API_URL: &str = "https://api.vk.com";
/// Base URL of the OAuth endpoint
pub const OAUTH_URL: &str = "https://oauth.vk.com";
/// API version sent with OAuth exchanges when no `v` default is set
pub const DEFAULT_API_VERSION: &str = "5.1";

/// Create the HTTP client for API requests
/// with connection pooling and the configured timeouts
pub fn create_http_client(config: &Config) -> Result<Client> {
    let client = ClientBuilder::new()
        .pool_max_idle_per_host(50)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()?;
    Ok(client)
}

/// Endpoint and transport configuration for the API client
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL, without trailing slash
    pub api_url: String,
    /// OAuth base URL, without trailing slash
    pub oauth_url: String,
    /// Total timeout per request (uploads included)
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: API_URL.to_string(),
            oauth_url: OAUTH_URL.to_string(),
            timeout: Duration::from_secs(300), // 5 minutes
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Create a configuration pointing at custom endpoints,
    /// e.g. a mock server in tests
    pub fn new(api_url: impl Into<String>, oauth_url: impl Into<String>) -> Self {
        Config {
            api_url: trim_slash(api_url.into()),
            oauth_url: trim_slash(oauth_url.into()),
            ..Config::default()
        }
    }

    /// Set the total request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// URL for an API path such as `/method/users.get?...`
    pub fn api_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// URL for an OAuth endpoint (`authorize`, `access_token`, `token`)
    pub fn oauth_endpoint(&self, endpoint: &str, query: &str) -> String {
        format!("{}/{}?{}", self.oauth_url, endpoint, query)
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
