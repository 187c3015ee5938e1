//! Request builder and immutable request value.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::defaults::{self, RequestDefaults};
use crate::{HttpClient, HttpMethod, MediaType, RawResponse, Result};

/// Fluent builder for [`HttpRequest`].
///
/// Headers and query parameters accumulate; adding a key twice replaces the
/// earlier value in place. For the body, media type, client and defaults the
/// last call wins. The builder stays usable after [`build`](Self::build).
///
/// ```
/// use armature_http_request::{HttpMethod, HttpRequestBuilder};
///
/// # fn main() -> armature_http_request::Result<()> {
/// let request = HttpRequestBuilder::create("https://api.example.com/users", HttpMethod::Post)
///     .header("Authorization", "Bearer token")
///     .param("dry_run", "true")
///     .body(r#"{"name":"ada"}"#)
///     .body_media_type("application/json; charset=utf-8")?
///     .build();
///
/// assert_eq!(request.method(), HttpMethod::Post);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequestBuilder {
    url: String,
    method: HttpMethod,
    body: Option<String>,
    body_media_type: Option<MediaType>,
    headers: Option<Vec<(String, String)>>,
    params: Option<Vec<(String, String)>>,
    client: Option<HttpClient>,
    defaults: Option<RequestDefaults>,
}

impl HttpRequestBuilder {
    /// Start a request for `url` with `method`.
    pub fn create(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
            body_media_type: None,
            headers: None,
            params: None,
            client: None,
            defaults: None,
        }
    }

    /// Start a request, parsing the method name case-insensitively.
    pub fn create_with_method_str(url: impl Into<String>, method: &str) -> Result<Self> {
        Ok(Self::create(url, HttpMethod::parse(method)?))
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as JSON and use it as the body.
    ///
    /// The media type is left alone; the default is already JSON.
    pub fn json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = Some(serde_json::to_string(value)?);
        Ok(self)
    }

    /// Set the body media type, validating it immediately.
    pub fn body_media_type(mut self, media_type: &str) -> Result<Self> {
        self.body_media_type = Some(MediaType::parse(media_type)?);
        Ok(self)
    }

    /// Set an already-parsed body media type.
    pub fn body_media_type_value(mut self, media_type: MediaType) -> Self {
        self.body_media_type = Some(media_type);
        self
    }

    /// Add a header. Names are kept exactly as supplied.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(self.headers.get_or_insert_with(Vec::new), name.into(), value.into());
        self
    }

    /// Add multiple headers.
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (k, v)| builder.header(k, v))
    }

    /// Add a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(self.params.get_or_insert_with(Vec::new), key.into(), value.into());
        self
    }

    /// Add multiple query parameters.
    pub fn params<I, K, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        params
            .into_iter()
            .fold(self, |builder, (k, v)| builder.param(k, v))
    }

    /// Use `client` instead of the default client.
    pub fn client(mut self, client: HttpClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Resolve unset fields against `defaults` instead of the process-wide defaults.
    pub fn defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.into()))
    }

    /// Set basic authentication.
    pub fn basic_auth(
        self,
        username: impl Into<String>,
        password: Option<impl Into<String>>,
    ) -> Self {
        use base64::Engine;
        let credentials = match password {
            Some(p) => format!("{}:{}", username.into(), p.into()),
            None => format!("{}:", username.into()),
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.header("Authorization", format!("Basic {}", encoded))
    }

    /// The target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The request method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The body set so far.
    pub fn get_body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// The media type set so far.
    pub fn get_body_media_type(&self) -> Option<&MediaType> {
        self.body_media_type.as_ref()
    }

    /// The headers added so far.
    pub fn get_headers(&self) -> Option<&[(String, String)]> {
        self.headers.as_deref()
    }

    /// The query parameters added so far.
    pub fn get_params(&self) -> Option<&[(String, String)]> {
        self.params.as_deref()
    }

    /// The client override set so far.
    pub fn get_client(&self) -> Option<&HttpClient> {
        self.client.as_ref()
    }

    /// Snapshot the builder into an immutable request.
    pub fn build(&self) -> HttpRequest {
        HttpRequest {
            parts: Arc::new(RequestParts {
                method: self.method,
                url: self.url.clone(),
                body: self.body.clone(),
                body_media_type: self.body_media_type.clone(),
                headers: self.headers.clone(),
                params: self.params.clone(),
                client: self.client.clone(),
                defaults: self.defaults.clone(),
            }),
            raw: Arc::new(Mutex::new(RawSlot::default())),
        }
    }
}

fn upsert(pairs: &mut Vec<(String, String)>, key: String, value: String) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => pairs.push((key, value)),
    }
}

fn lookup<'a>(pairs: Option<&'a [(String, String)]>, key: &str) -> Option<&'a str> {
    pairs?
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[derive(Debug)]
pub(crate) struct RequestParts {
    pub(crate) method: HttpMethod,
    pub(crate) url: String,
    pub(crate) body: Option<String>,
    pub(crate) body_media_type: Option<MediaType>,
    pub(crate) headers: Option<Vec<(String, String)>>,
    pub(crate) params: Option<Vec<(String, String)>>,
    pub(crate) client: Option<HttpClient>,
    pub(crate) defaults: Option<RequestDefaults>,
}

impl RequestParts {
    /// Client and media type to use right now.
    pub(crate) fn resolve(&self) -> (HttpClient, MediaType) {
        match (&self.client, &self.body_media_type) {
            (Some(client), Some(media_type)) => (client.clone(), media_type.clone()),
            _ => {
                let defaults = self.defaults.clone().unwrap_or_else(defaults::global);
                (
                    self.client.clone().unwrap_or(defaults.client),
                    self.body_media_type.clone().unwrap_or(defaults.media_type),
                )
            }
        }
    }
}

/// Holder for the last raw response of a request.
///
/// `close` bumps the epoch; a call dispatched under an older epoch does not
/// store its response.
#[derive(Debug, Default)]
pub(crate) struct RawSlot {
    epoch: u64,
    response: Option<RawResponse>,
}

impl RawSlot {
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn store(&mut self, epoch: u64, response: RawResponse) {
        if self.epoch == epoch {
            self.response = Some(response);
        }
    }

    fn release(&mut self) -> Option<RawResponse> {
        self.epoch = self.epoch.wrapping_add(1);
        self.response.take()
    }
}

/// An immutable HTTP request.
///
/// Built by [`HttpRequestBuilder`]; executed with [`execute`](Self::execute),
/// [`execute_async`](Self::execute_async), [`spawn`](Self::spawn) or one of
/// the callback forms. Metadata of the last transport response is kept until
/// [`close`](Self::close) is called or the request is dropped.
#[derive(Debug)]
pub struct HttpRequest {
    pub(crate) parts: Arc<RequestParts>,
    pub(crate) raw: Arc<Mutex<RawSlot>>,
}

impl HttpRequest {
    /// Start building a request.
    pub fn builder(url: impl Into<String>, method: HttpMethod) -> HttpRequestBuilder {
        HttpRequestBuilder::create(url, method)
    }

    /// The request method.
    pub fn method(&self) -> HttpMethod {
        self.parts.method
    }

    /// The target URL, without query parameters.
    pub fn url(&self) -> &str {
        &self.parts.url
    }

    /// The body, if one was set.
    pub fn body(&self) -> Option<&str> {
        self.parts.body.as_deref()
    }

    /// Parse the body as a JSON tree. Returns `Ok(None)` without a body.
    pub fn body_as_json(&self) -> Result<Option<Value>> {
        match &self.parts.body {
            Some(body) => Ok(Some(serde_json::from_str(body)?)),
            None => Ok(None),
        }
    }

    /// The media type sent with the body, falling back to the defaults.
    pub fn body_media_type(&self) -> MediaType {
        self.parts.resolve().1
    }

    /// The media type set on this request, if any.
    pub fn explicit_body_media_type(&self) -> Option<&MediaType> {
        self.parts.body_media_type.as_ref()
    }

    /// The headers, in insertion order.
    pub fn headers(&self) -> Option<&[(String, String)]> {
        self.parts.headers.as_deref()
    }

    /// Look up a header by its exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(self.headers(), name)
    }

    /// The query parameters, in insertion order.
    pub fn params(&self) -> Option<&[(String, String)]> {
        self.parts.params.as_deref()
    }

    /// Look up a query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        lookup(self.params(), key)
    }

    /// The client the request will use, falling back to the defaults.
    pub fn client(&self) -> HttpClient {
        self.parts.resolve().0
    }

    /// The client set on this request, if any.
    pub fn explicit_client(&self) -> Option<&HttpClient> {
        self.parts.client.as_ref()
    }

    /// Metadata of the last transport response, until released.
    pub fn raw_response(&self) -> Option<RawResponse> {
        self.raw.lock().response.clone()
    }

    /// Release the retained transport response. Calling it again is a no-op.
    ///
    /// Calls still in flight when the request is closed, such as a
    /// [`spawn`](Self::spawn)ed one, complete normally but do not retain
    /// their raw response.
    pub fn close(&self) {
        if self.raw.lock().release().is_some() {
            tracing::trace!(url = %self.parts.url, "Released raw HTTP response");
        }
    }
}
