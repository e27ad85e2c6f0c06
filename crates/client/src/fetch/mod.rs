//! Network access for the fetch router.
//!
//! The router and lifecycle only see the [`Network`] trait, so policies can
//! be exercised against a scripted double. [`FetchClient`] is the reqwest
//! implementation used in production.
//!
//! ### Transport behavior
//! - Non-2xx statuses are returned as responses, not errors
//! - Connection, DNS and timeout failures surface as `Err`
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)

pub mod url;

use std::time::{Duration, Instant};

use freshgate_core::{Error, RequestRecord, ResponseRecord};
use reqwest::{Client, Method};

pub use url::{UrlError, parse_origin, resolve, same_origin, stamp_version};

/// Headers never forwarded upstream.
const SKIPPED_REQUEST_HEADERS: &[&str] = &["host", "connection", "content-length", "transfer-encoding", "keep-alive"];

/// Something that can perform a request against the network.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Perform the request. Transport failures are `Err`; any HTTP status is `Ok`.
    async fn fetch(&self, request: &RequestRecord) -> Result<ResponseRecord, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "freshgate/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "freshgate/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&freshgate_core::AppConfig> for FetchConfig {
    fn from(config: &freshgate_core::AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// HTTP client backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &RequestRecord) -> Result<ResponseRecord, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method().as_bytes())
            .map_err(|e| Error::InvalidRequest(format!("bad method: {e}")))?;

        let mut builder = self.http.request(method, request.url().as_str());
        for (name, value) in request.headers() {
            if SKIPPED_REQUEST_HEADERS.contains(&name.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{}: {e}", request.url()))
            } else {
                Error::FetchFailed(format!("{}: {e}", request.url()))
            }
        })?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::FetchFailed(format!("failed to read response: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            method = request.method(),
            url = %request.url(),
            status,
            fetch_ms,
            bytes = bytes.len(),
            "network fetch complete"
        );

        Ok(ResponseRecord { status, headers, body: bytes })
    }
}
