//! HTTP methods supported by the request builder.

use std::fmt;
use std::str::FromStr;

use crate::{HttpClientError, Result};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// All supported methods.
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Parse a method name, ignoring case.
    pub fn parse(method: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(method))
            .ok_or_else(|| HttpClientError::UnknownMethod(method.to_string()))
    }

    /// Get the canonical method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Whether a body is transmitted for this method.
    ///
    /// GET and HEAD never carry a body, even when one was set on the builder.
    pub fn sends_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }

    /// Convert to the `http` crate's method type.
    pub fn to_http(&self) -> http::Method {
        match self {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Delete => http::Method::DELETE,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Head => http::Method::HEAD,
            HttpMethod::Options => http::Method::OPTIONS,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = HttpClientError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        method.to_http()
    }
}

impl TryFrom<&http::Method> for HttpMethod {
    type Error = HttpClientError;

    fn try_from(method: &http::Method) -> Result<Self> {
        Self::parse(method.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!(HttpMethod::parse("get").unwrap(), HttpMethod::Get);
        assert_eq!(HttpMethod::parse("Patch").unwrap(), HttpMethod::Patch);
        assert_eq!("OPTIONS".parse::<HttpMethod>().unwrap(), HttpMethod::Options);
    }

    #[test]
    fn test_parse_unknown_method() {
        let err = HttpMethod::parse("FETCH").unwrap_err();
        assert!(matches!(err, HttpClientError::UnknownMethod(ref m) if m == "FETCH"));
    }

    #[test]
    fn test_body_rules() {
        assert!(!HttpMethod::Get.sends_body());
        assert!(!HttpMethod::Head.sends_body());
        assert!(HttpMethod::Options.sends_body());
        assert!(HttpMethod::Delete.sends_body());
    }

    #[test]
    fn test_http_conversion() {
        for method in HttpMethod::ALL {
            let converted: http::Method = method.into();
            assert_eq!(converted.as_str(), method.to_string());
            assert_eq!(HttpMethod::try_from(&converted).unwrap(), method);
        }
        assert!(HttpMethod::try_from(&http::Method::CONNECT).is_err());
    }
}
