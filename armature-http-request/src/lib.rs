//! # Armature HTTP Request
//!
//! A fluent request builder on top of `reqwest`. Build a request once, then
//! execute it on the calling thread or on the Tokio runtime, and get back a
//! simplified [`Response`] with the body read into a string and headers
//! flattened to one value per name.
//!
//! ## Features
//!
//! - **Fluent builder**: method, URL, headers, query parameters, body and media type
//! - **Sync and async**: blocking [`HttpRequest::execute`], [`HttpRequest::execute_async`],
//!   eager [`HttpRequest::spawn`] and callback forms
//! - **Defaults**: shared client and body media type, per request or process-wide
//! - **JSON convenience**: parse response or request bodies into `serde_json::Value`
//!
//! Retries, timeouts and connection pooling are left to the transport
//! client; see [`HttpClientConfig`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use armature_http_request::{HttpMethod, HttpRequest};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = HttpRequest::builder("https://api.example.com/users", HttpMethod::Get)
//!         .header("Authorization", "Bearer token")
//!         .param("limit", "10")
//!         .build();
//!
//!     let response = request.execute()?;
//!     println!("Status: {}", response.status_code());
//!     request.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Async
//!
//! ```rust,no_run
//! use armature_http_request::{HttpMethod, HttpRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = HttpRequest::builder("https://api.example.com/orders", HttpMethod::Post)
//!         .json_body(&serde_json::json!({"item": "widget", "quantity": 5}))?
//!         .build();
//!
//!     let response = request.execute_async().await?;
//!     if let Some(json) = response.body_as_json()? {
//!         println!("Created: {}", json["id"]);
//!     }
//!
//!     request.execute_with_callback(|result| match result {
//!         Ok(response) => println!("Status: {}", response.status_code()),
//!         Err(e) => eprintln!("Request failed: {e}"),
//!     })?;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
pub mod defaults;
mod error;
mod executor;
mod media_type;
mod method;
mod request;
mod response;

pub use client::HttpClient;
pub use config::{HttpClientConfig, HttpClientConfigBuilder};
pub use defaults::RequestDefaults;
pub use error::{HttpClientError, Result};
pub use executor::PreparedRequest;
pub use media_type::{DEFAULT_MEDIA_TYPE, MediaType};
pub use method::HttpMethod;
pub use request::{HttpRequest, HttpRequestBuilder};
pub use response::{RawResponse, Response, SENTINEL_STATUS};

// Re-export common types
pub use http::{HeaderMap, HeaderValue, StatusCode, header};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use armature_http_request::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::HttpClient;
    pub use crate::config::{HttpClientConfig, HttpClientConfigBuilder};
    pub use crate::defaults::RequestDefaults;
    pub use crate::error::{HttpClientError, Result};
    pub use crate::media_type::MediaType;
    pub use crate::method::HttpMethod;
    pub use crate::request::{HttpRequest, HttpRequestBuilder};
    pub use crate::response::Response;
}
