//! Validated body media types.

use std::fmt;
use std::str::FromStr;

use mime::Mime;

use crate::{HttpClientError, Result};

/// Media type used when neither the request nor its defaults name one.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json; charset=utf-8";

/// A parsed content type.
///
/// The string is validated once, when the value is created, and is sent
/// on the wire exactly as it was given.
#[derive(Debug, Clone)]
pub struct MediaType {
    source: String,
    mime: Mime,
}

impl MediaType {
    /// Parse a media type such as `text/plain; charset=utf-8`.
    pub fn parse(value: &str) -> Result<Self> {
        let source = value.trim();
        let mime = source
            .parse::<Mime>()
            .map_err(|_| HttpClientError::InvalidMediaType(value.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            mime,
        })
    }

    /// `application/json; charset=utf-8`.
    pub fn json() -> Self {
        Self {
            source: DEFAULT_MEDIA_TYPE.to_string(),
            mime: DEFAULT_MEDIA_TYPE
                .parse::<Mime>()
                .unwrap_or(mime::APPLICATION_JSON),
        }
    }

    /// Wrap an already-parsed `Mime`.
    pub fn from_mime(mime: Mime) -> Self {
        Self {
            source: mime.to_string(),
            mime,
        }
    }

    /// The top-level type, e.g. `application`.
    pub fn type_(&self) -> &str {
        self.mime.type_().as_str()
    }

    /// The subtype, e.g. `json`.
    pub fn subtype(&self) -> &str {
        self.mime.subtype().as_str()
    }

    /// The `charset` parameter, if present.
    pub fn charset(&self) -> Option<&str> {
        self.mime.get_param(mime::CHARSET).map(|c| c.as_str())
    }

    /// The media type as it will appear in a `Content-Type` header.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The underlying `Mime`.
    pub fn as_mime(&self) -> &Mime {
        &self.mime
    }
}

impl Default for MediaType {
    fn default() -> Self {
        Self::json()
    }
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        self.mime == other.mime
    }
}

impl Eq for MediaType {}

impl FromStr for MediaType {
    type Err = HttpClientError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_params() {
        let media_type = MediaType::parse("application/json; charset=utf-8").unwrap();
        assert_eq!(media_type.type_(), "application");
        assert_eq!(media_type.subtype(), "json");
        assert_eq!(media_type.charset(), Some("utf-8"));
        assert_eq!(media_type.as_str(), "application/json; charset=utf-8");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["invalid_type", "", "application json"] {
            let err = MediaType::parse(bad).unwrap_err();
            assert!(matches!(err, HttpClientError::InvalidMediaType(_)), "{bad}");
        }
    }

    #[test]
    fn test_default_is_json_utf8() {
        let media_type = MediaType::default();
        assert_eq!(media_type.to_string(), DEFAULT_MEDIA_TYPE);
        assert_eq!(media_type, MediaType::parse(DEFAULT_MEDIA_TYPE).unwrap());
    }
}
