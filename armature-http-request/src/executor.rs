//! Request assembly, dispatch and response normalization.

use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue};
use parking_lot::Mutex;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::request::{RawSlot, RequestParts};
use crate::{
    HttpClient, HttpClientError, HttpMethod, HttpRequest, MediaType, RawResponse, Response, Result,
};

/// A request translated into transport terms, ready to send.
///
/// Produced by [`HttpRequest::prepare`]. Query parameters are already part
/// of the URL and the body rules for the method have been applied.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    method: HttpMethod,
    url: Url,
    headers: HeaderMap,
    body: Option<String>,
}

impl PreparedRequest {
    fn assemble(parts: &RequestParts, media_type: &MediaType) -> Result<Self> {
        let url = url_with_params(&parts.url, parts.params.as_deref())?;

        let mut headers = HeaderMap::new();
        for (name, value) in parts.headers.iter().flatten() {
            let header_name = HeaderName::try_from(name.as_str())
                .map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))?;
            let header_value = HeaderValue::try_from(value.as_str())
                .map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))?;
            headers.append(header_name, header_value);
        }

        let body = if parts.method.sends_body() {
            let content_type = HeaderValue::try_from(media_type.as_str())
                .map_err(|e| HttpClientError::InvalidHeader(format!("{CONTENT_TYPE}: {e}")))?;
            headers.insert(CONTENT_TYPE, content_type);
            Some(parts.body.clone().unwrap_or_default())
        } else {
            None
        };

        Ok(Self {
            method: parts.method,
            url,
            headers,
            body,
        })
    }

    /// The request method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The URL including the encoded query string.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Headers to send, including `Content-Type` when a body is sent.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body to send; `None` for GET and HEAD.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    fn into_async(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let request = client
            .request(self.method.to_http(), self.url)
            .headers(self.headers);
        match self.body {
            Some(body) => request.body(body),
            None => request,
        }
    }

    fn into_blocking(
        self,
        client: &reqwest::blocking::Client,
    ) -> reqwest::blocking::RequestBuilder {
        let request = client
            .request(self.method.to_http(), self.url)
            .headers(self.headers);
        match self.body {
            Some(body) => request.body(body),
            None => request,
        }
    }
}

/// Append form-encoded `params` to `url`, ahead of any fragment.
fn url_with_params(url: &str, params: Option<&[(String, String)]>) -> Result<Url> {
    let full = match params.filter(|p| !p.is_empty()) {
        Some(params) => {
            let query = serde_urlencoded::to_string(params)
                .map_err(|e| HttpClientError::InvalidUrl(format!("{url}: {e}")))?;
            let (base, fragment) = match url.split_once('#') {
                Some((base, fragment)) => (base, Some(fragment)),
                None => (url, None),
            };
            let separator = if !base.contains('?') {
                "?"
            } else if base.ends_with('?') || base.ends_with('&') {
                ""
            } else {
                "&"
            };
            match fragment {
                Some(fragment) => format!("{base}{separator}{query}#{fragment}"),
                None => format!("{base}{separator}{query}"),
            }
        }
        None => url.to_string(),
    };

    Url::parse(&full).map_err(|e| HttpClientError::InvalidUrl(format!("{full}: {e}")))
}

fn runtime() -> Result<Handle> {
    Handle::try_current().map_err(|_| HttpClientError::NoRuntime)
}

async fn send_async(
    client: HttpClient,
    prepared: PreparedRequest,
    raw: Arc<Mutex<RawSlot>>,
    epoch: u64,
) -> Result<Response> {
    debug!(method = %prepared.method, url = %prepared.url, "Sending HTTP request");

    let response = prepared.into_async(client.inner()).send().await?;
    raw.lock().store(epoch, RawResponse::from_async(&response));

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await?;

    debug!(status = %status, "Received HTTP response");
    Ok(Response::from_transport(status, body, &headers))
}

impl HttpRequest {
    /// Translate the request into transport terms without sending it.
    ///
    /// Fails on an unparseable URL or an invalid header name or value.
    pub fn prepare(&self) -> Result<PreparedRequest> {
        let (_, media_type) = self.parts.resolve();
        PreparedRequest::assemble(&self.parts, &media_type)
    }

    fn prepare_with_client(&self) -> Result<(HttpClient, PreparedRequest)> {
        let (client, media_type) = self.parts.resolve();
        let prepared = PreparedRequest::assemble(&self.parts, &media_type)?;
        Ok((client, prepared))
    }

    /// Send the request and block the current thread until the response
    /// body has been read.
    ///
    /// On a worker of a multi-threaded Tokio runtime the call is moved out of
    /// the async context with [`tokio::task::block_in_place`]. A
    /// current-thread runtime cannot block, so there it fails with
    /// [`HttpClientError::BlockingInRuntime`]; use
    /// [`execute_async`](Self::execute_async) instead.
    pub fn execute(&self) -> Result<Response> {
        match Handle::try_current() {
            Err(_) => self.execute_blocking(),
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| self.execute_blocking())
            }
            Ok(_) => Err(HttpClientError::BlockingInRuntime),
        }
    }

    fn execute_blocking(&self) -> Result<Response> {
        let (client, prepared) = self.prepare_with_client()?;
        let epoch = self.raw.lock().epoch();
        debug!(method = %prepared.method, url = %prepared.url, "Sending HTTP request");

        let response = prepared.into_blocking(client.blocking()?).send()?;
        self.raw.lock().store(epoch, RawResponse::from_blocking(&response));

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text()?;

        debug!(status = %status, "Received HTTP response");
        Ok(Response::from_transport(status, body, &headers))
    }

    /// Send the request asynchronously.
    pub async fn execute_async(&self) -> Result<Response> {
        let (client, prepared) = self.prepare_with_client()?;
        let epoch = self.raw.lock().epoch();
        send_async(client, prepared, Arc::clone(&self.raw), epoch).await
    }

    /// Schedule the request on the current Tokio runtime.
    ///
    /// The call starts immediately; the handle resolves to its outcome.
    /// Construction errors are returned here, before anything is scheduled.
    /// If the request is [`close`](Self::close)d before the call completes,
    /// its raw response is not retained.
    pub fn spawn(&self) -> Result<JoinHandle<Result<Response>>> {
        let handle = runtime()?;
        let (client, prepared) = self.prepare_with_client()?;
        let raw = Arc::clone(&self.raw);
        let epoch = raw.lock().epoch();
        Ok(handle.spawn(send_async(client, prepared, raw, epoch)))
    }

    /// Schedule the request and hand its outcome to `callback`.
    ///
    /// The callback runs on a runtime worker thread, not on the caller's.
    pub fn execute_with_callback<F>(&self, callback: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Result<Response>) + Send + 'static,
    {
        let handle = runtime()?;
        let (client, prepared) = self.prepare_with_client()?;
        let raw = Arc::clone(&self.raw);
        let epoch = raw.lock().epoch();
        Ok(handle.spawn(async move {
            callback(send_async(client, prepared, raw, epoch).await);
        }))
    }

    /// Schedule the request and hand `callback` a response in every case.
    ///
    /// A transport failure is replaced by [`Response::sentinel`] (status
    /// 520, no body, no headers), so the callback cannot tell it apart from
    /// a server that really answered 520 except through
    /// [`Response::is_sentinel`]. Prefer
    /// [`execute_with_callback`](Self::execute_with_callback).
    pub fn execute_with_sentinel<F>(&self, callback: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Response) + Send + 'static,
    {
        let url = self.parts.url.clone();
        self.execute_with_callback(move |result| match result {
            Ok(response) => callback(response),
            Err(e) => {
                warn!(url = %url, error = %e, "HTTP request failed, returning sentinel response");
                callback(Response::sentinel())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpRequestBuilder, RequestDefaults};

    fn builder(method: HttpMethod) -> HttpRequestBuilder {
        HttpRequest::builder("http://localhost/data", method).defaults(RequestDefaults::default())
    }

    #[test]
    fn test_params_are_encoded_in_order() {
        let prepared = builder(HttpMethod::Get)
            .param("q", "a b&c")
            .param("limit", "10")
            .build()
            .prepare()
            .unwrap();

        assert_eq!(prepared.url().path(), "/data");
        assert_eq!(prepared.url().query(), Some("q=a+b%26c&limit=10"));
    }

    #[test]
    fn test_no_query_without_params() {
        let prepared = builder(HttpMethod::Get).build().prepare().unwrap();
        assert_eq!(prepared.url().as_str(), "http://localhost/data");
        assert_eq!(prepared.url().query(), None);
    }

    #[test]
    fn test_params_join_existing_query() {
        let prepared = HttpRequest::builder("http://localhost/data?page=2#top", HttpMethod::Get)
            .param("limit", "10")
            .build()
            .prepare()
            .unwrap();

        assert_eq!(prepared.url().query(), Some("page=2&limit=10"));
        assert_eq!(prepared.url().fragment(), Some("top"));
    }

    #[test]
    fn test_get_and_head_never_send_body() {
        for method in [HttpMethod::Get, HttpMethod::Head] {
            let prepared = builder(method).body("ignored").build().prepare().unwrap();
            assert!(prepared.body().is_none());
            assert!(prepared.headers().get(CONTENT_TYPE).is_none());
        }
    }

    #[test]
    fn test_body_methods_default_to_empty_body() {
        for method in [
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Delete,
            HttpMethod::Options,
        ] {
            let prepared = builder(method).build().prepare().unwrap();
            assert_eq!(prepared.body(), Some(""), "{method}");
            assert_eq!(
                prepared.headers().get(CONTENT_TYPE).unwrap(),
                "application/json; charset=utf-8"
            );
        }
    }

    #[test]
    fn test_explicit_media_type_overrides_content_type_header() {
        let prepared = builder(HttpMethod::Post)
            .header("Content-Type", "text/html")
            .body("hello")
            .body_media_type("text/plain; charset=utf-8")
            .unwrap()
            .build()
            .prepare()
            .unwrap();

        let values: Vec<_> = prepared.headers().get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values, vec!["text/plain; charset=utf-8"]);
        assert_eq!(prepared.body(), Some("hello"));
    }

    #[test]
    fn test_invalid_url() {
        let err = HttpRequest::builder("not a url", HttpMethod::Get)
            .build()
            .prepare()
            .unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidUrl(_)));
    }

    #[test]
    fn test_invalid_header_name() {
        let err = builder(HttpMethod::Get)
            .header("bad header", "value")
            .build()
            .prepare()
            .unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidHeader(_)));
    }

    #[test]
    fn test_spawn_requires_runtime() {
        let request = builder(HttpMethod::Get).build();
        assert!(matches!(request.spawn(), Err(HttpClientError::NoRuntime)));
        assert!(matches!(
            request.execute_with_callback(|_| {}),
            Err(HttpClientError::NoRuntime)
        ));
    }
}
