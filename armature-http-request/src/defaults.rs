//! Fallback client and media type for requests that do not set their own.
//!
//! A request resolves its client and body media type when it is executed,
//! not when it is built. It first looks at its own overrides, then at the
//! [`RequestDefaults`] attached with
//! [`HttpRequestBuilder::defaults`](crate::HttpRequestBuilder::defaults), and
//! finally at the process-wide instance managed by the functions in this
//! module.
//!
//! ```
//! use armature_http_request::{defaults, MediaType};
//!
//! defaults::set_default_media_type(MediaType::parse("text/plain").unwrap());
//! assert_eq!(defaults::default_media_type().as_str(), "text/plain");
//! # defaults::set_default_media_type(MediaType::default());
//! ```

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::{HttpClient, MediaType};

/// Client and media type used when a request does not override them.
#[derive(Debug, Clone, Default)]
pub struct RequestDefaults {
    /// Transport client.
    pub client: HttpClient,
    /// Media type sent with request bodies.
    pub media_type: MediaType,
}

impl RequestDefaults {
    /// Create defaults from explicit values.
    pub fn new(client: HttpClient, media_type: MediaType) -> Self {
        Self { client, media_type }
    }

    /// Replace the client.
    pub fn with_client(mut self, client: HttpClient) -> Self {
        self.client = client;
        self
    }

    /// Replace the media type.
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }
}

static GLOBAL_DEFAULTS: Lazy<RwLock<RequestDefaults>> =
    Lazy::new(|| RwLock::new(RequestDefaults::default()));

/// Snapshot of the process-wide defaults.
pub fn global() -> RequestDefaults {
    GLOBAL_DEFAULTS.read().clone()
}

/// Replace the process-wide defaults.
pub fn set_global(defaults: RequestDefaults) {
    *GLOBAL_DEFAULTS.write() = defaults;
}

/// The process-wide default client.
pub fn default_client() -> HttpClient {
    GLOBAL_DEFAULTS.read().client.clone()
}

/// Replace the process-wide default client.
pub fn set_default_client(client: HttpClient) {
    GLOBAL_DEFAULTS.write().client = client;
}

/// The process-wide default media type.
pub fn default_media_type() -> MediaType {
    GLOBAL_DEFAULTS.read().media_type.clone()
}

/// Replace the process-wide default media type.
pub fn set_default_media_type(media_type: MediaType) {
    GLOBAL_DEFAULTS.write().media_type = media_type;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_builders() {
        let client = HttpClient::default();
        let defaults = RequestDefaults::default()
            .with_client(client.clone())
            .with_media_type(MediaType::parse("text/csv").unwrap());

        assert!(defaults.client.ptr_eq(&client));
        assert_eq!(defaults.media_type.as_str(), "text/csv");
    }

    #[test]
    fn test_global_client_is_shared() {
        let client = HttpClient::default();
        set_default_client(client.clone());
        assert!(default_client().ptr_eq(&client));
        assert!(global().client.ptr_eq(&client));
    }
}
