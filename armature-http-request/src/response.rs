//! Normalized HTTP response and retained transport metadata.

use std::collections::HashMap;
use std::net::SocketAddr;

use http::{HeaderMap, StatusCode, Version};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;

/// Status code carried by [`Response::sentinel`].
pub const SENTINEL_STATUS: u16 = 520;

/// Simplified HTTP response.
///
/// The body is read fully into memory. Headers are flattened into a single
/// value per name: when the server repeats a header, the last value wins.
/// Map keys are lowercase, so look headers up with [`header`](Self::header),
/// which ignores case, rather than indexing [`headers`](Self::headers). Use [`HttpRequest::raw_response`](crate::HttpRequest::raw_response) for
/// the complete header map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status_code: u16,
    body: Option<String>,
    headers: Option<HashMap<String, String>>,
}

impl Response {
    /// Create a response from its parts.
    pub fn new(
        status_code: u16,
        body: Option<String>,
        headers: Option<HashMap<String, String>>,
    ) -> Self {
        Self {
            status_code,
            body,
            headers,
        }
    }

    /// Synthetic response standing in for a failed transport call.
    ///
    /// Status 520 with no body and no headers. Only produced by
    /// [`HttpRequest::execute_with_sentinel`](crate::HttpRequest::execute_with_sentinel).
    pub fn sentinel() -> Self {
        Self::new(SENTINEL_STATUS, None, None)
    }

    pub(crate) fn from_transport(status: StatusCode, body: String, headers: &HeaderMap) -> Self {
        Self::new(status.as_u16(), Some(body), Some(flatten_headers(headers)))
    }

    /// Get the status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Get the body, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Consume the response and return the body.
    pub fn into_body(self) -> Option<String> {
        self.body
    }

    /// Get the flattened headers, keyed by lowercase header name.
    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        self.headers.as_ref()
    }

    /// Look up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        let headers = self.headers.as_ref()?;
        headers
            .get(name)
            .or_else(|| {
                headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Get the content type if available.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Check if the response was successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Check if the response was a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// Check if the response was a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Check if this looks like the sentinel produced for a failed call.
    ///
    /// A real server may also answer 520; a real response always carries
    /// headers, the sentinel never does.
    pub fn is_sentinel(&self) -> bool {
        self.status_code == SENTINEL_STATUS && self.body.is_none() && self.headers.is_none()
    }

    /// Parse the body as a JSON tree.
    ///
    /// Returns `Ok(None)` when there is no body. The body is parsed again
    /// on every call.
    pub fn body_as_json(&self) -> Result<Option<Value>> {
        self.json()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.body {
            Some(body) => Ok(Some(serde_json::from_str(body)?)),
            None => Ok(None),
        }
    }
}

fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flattened = HashMap::with_capacity(headers.keys_len());
    for (name, value) in headers {
        flattened.insert(
            name.as_str().to_string(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    flattened
}

/// Metadata of the last transport response seen by a request.
///
/// The body has already been drained into the [`Response`]; what remains
/// is what a caller may want to inspect afterwards.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    version: Version,
    url: url::Url,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
    content_length: Option<u64>,
}

impl RawResponse {
    pub(crate) fn from_async(response: &reqwest::Response) -> Self {
        Self {
            status: response.status(),
            version: response.version(),
            url: response.url().clone(),
            headers: response.headers().clone(),
            remote_addr: response.remote_addr(),
            content_length: response.content_length(),
        }
    }

    pub(crate) fn from_blocking(response: &reqwest::blocking::Response) -> Self {
        Self {
            status: response.status(),
            version: response.version(),
            url: response.url().clone(),
            headers: response.headers().clone(),
            remote_addr: response.remote_addr(),
            content_length: response.content_length(),
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get the final URL, after redirects.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Get every header value, including repeated names.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the remote address, if known.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Get the content length announced by the server, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_flatten_keeps_last_value() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let response = Response::from_transport(StatusCode::OK, "{}".to_string(), &headers);
        assert_eq!(response.header("Set-Cookie"), Some("b=2"));
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.headers().map(|h| h.len()), Some(2));
    }

    #[test]
    fn test_header_map_keys_are_lowercase() {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("text/plain"));

        let response = Response::from_transport(StatusCode::OK, String::new(), &headers);
        let map = response.headers().unwrap();
        assert_eq!(map.get("content-type").map(String::as_str), Some("text/plain"));
        assert!(map.get("Content-Type").is_none());
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_body_as_json() {
        let response = Response::new(200, Some(r#"{"message":"success"}"#.to_string()), None);
        let json = response.body_as_json().unwrap().unwrap();
        assert_eq!(json["message"], "success");
    }

    #[test]
    fn test_body_as_json_without_body() {
        let response = Response::new(204, None, None);
        assert!(response.body_as_json().unwrap().is_none());
    }

    #[test]
    fn test_body_as_json_malformed() {
        let response = Response::new(200, Some("not json".to_string()), None);
        assert!(matches!(
            response.body_as_json(),
            Err(crate::HttpClientError::Json(_))
        ));
    }

    #[test]
    fn test_typed_json() {
        #[derive(serde::Deserialize)]
        struct Message {
            message: String,
        }

        let response = Response::new(200, Some(r#"{"message":"hi"}"#.to_string()), None);
        let message: Message = response.json().unwrap().unwrap();
        assert_eq!(message.message, "hi");
    }

    #[test]
    fn test_sentinel() {
        let sentinel = Response::sentinel();
        assert_eq!(sentinel.status_code(), 520);
        assert!(sentinel.body().is_none());
        assert!(sentinel.headers().is_none());
        assert!(sentinel.is_sentinel());
        assert!(sentinel.is_server_error());

        let real = Response::new(520, Some(String::new()), Some(HashMap::new()));
        assert!(!real.is_sentinel());
    }

    #[test]
    fn test_status_classes() {
        assert!(Response::new(201, None, None).is_success());
        assert!(Response::new(404, None, None).is_client_error());
        assert!(!Response::new(404, None, None).is_server_error());
    }
}
