//! Transport client handle.

use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue};
use once_cell::sync::OnceCell;

use crate::{HttpClientConfig, HttpClientError, Result};

/// Shared handle to the underlying `reqwest` clients.
///
/// Cloning is cheap; clones share connection pools. Asynchronous calls go
/// through a `reqwest::Client`. Synchronous calls go through a
/// `reqwest::blocking::Client` that is built from the same configuration on
/// first use.
///
/// The blocking client owns an internal runtime, so the last handle to a
/// client that has served a synchronous call must not be dropped from
/// inside an async context.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    blocking: Arc<OnceCell<reqwest::blocking::Client>>,
    config: Arc<HttpClientConfig>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized or a default header
    /// in the configuration is invalid. Use [`HttpClient::try_new`] to get
    /// an error instead.
    pub fn new(config: HttpClientConfig) -> Self {
        Self::try_new(config).expect("Failed to build HTTP client")
    }

    /// Create a new HTTP client, reporting configuration failures.
    pub fn try_new(config: HttpClientConfig) -> Result<Self> {
        let default_headers = header_map(&config.default_headers)?;

        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .default_headers(default_headers)
            .gzip(config.gzip)
            .brotli(config.brotli)
            .redirect(redirect_policy(&config));

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let inner = builder
            .build()
            .map_err(|e| HttpClientError::Client(e.to_string()))?;

        Ok(Self {
            inner,
            blocking: Arc::new(OnceCell::new()),
            config: Arc::new(config),
        })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Self {
        Self::new(HttpClientConfig::default())
    }

    /// Get the underlying async reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Get the underlying blocking reqwest client, building it on first use.
    pub fn blocking(&self) -> Result<&reqwest::blocking::Client> {
        self.blocking.get_or_try_init(|| {
            tracing::debug!("Building blocking HTTP client");
            build_blocking(&self.config)
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Whether both handles refer to the same underlying client.
    pub fn ptr_eq(&self, other: &HttpClient) -> bool {
        Arc::ptr_eq(&self.config, &other.config)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::default_client()
    }
}

fn build_blocking(config: &HttpClientConfig) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .default_headers(header_map(&config.default_headers)?)
        .gzip(config.gzip)
        .brotli(config.brotli)
        .redirect(redirect_policy(config))
        .build()
        .map_err(|e| HttpClientError::Client(e.to_string()))
}

fn redirect_policy(config: &HttpClientConfig) -> reqwest::redirect::Policy {
    if config.follow_redirects {
        reqwest::redirect::Policy::limited(config.max_redirects)
    } else {
        reqwest::redirect::Policy::none()
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::try_from(name.as_str())
            .map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::try_from(value.as_str())
            .map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))?;
        map.append(name, value);
    }
    Ok(map)
}
