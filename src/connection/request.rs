//! Request types handed through the middleware stack to a transport.

use reqwest::Url;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP methods used by resource operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Read an element, a collection or a singleton.
    Get,
    /// Create an element.
    Post,
    /// Update an element.
    Put,
    /// Destroy an element.
    Delete,
    /// Check an element exists.
    Head,
}

impl HttpMethod {
    /// Returns the uppercase method name as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
            Self::Put => write!(f, "put"),
            Self::Delete => write!(f, "delete"),
            Self::Head => write!(f, "head"),
        }
    }
}

/// A request or response body as it moves through the pipeline.
///
/// Outbound bodies start as [`Body::Data`] or pre-encoded [`Body::Text`];
/// the format stage turns data into text before the transport sees it, and
/// turns response text into data on the way back.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Encoded wire text.
    Text(String),
    /// Structured data.
    Data(Value),
}

impl Body {
    /// Returns `true` for no body, whitespace-only text, or `null` data.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Data(data) => data.is_null(),
        }
    }

    /// Returns the structured data, if decoded.
    #[must_use]
    pub const fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Consumes the body, returning the structured data, if decoded.
    #[must_use]
    pub fn into_data(self) -> Option<Value> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the raw text, if not decoded.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns the size of the body in bytes as it would be sent.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Text(text) => text.len(),
            Self::Data(data) => data.to_string().len(),
        }
    }

    /// Returns `true` if the body has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the body as wire text for a transport.
    #[must_use]
    pub fn to_wire(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(text) => Some(text.clone()),
            Self::Data(data) => Some(data.to_string()),
        }
    }
}

impl From<Value> for Body {
    fn from(data: Value) -> Self {
        Self::Data(data)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A fully resolved request as seen by a [`Transport`](super::Transport).
///
/// Use [`HttpRequest::builder`] to construct one.
///
/// # Example
///
/// ```rust
/// use remote_resource::connection::{HttpMethod, HttpRequest};
/// use reqwest::Url;
///
/// let url = Url::parse("http://37s.sunrise.i:3000/people.json?name=Matz").unwrap();
/// let request = HttpRequest::builder(HttpMethod::Get, url)
///     .header("Accept", "application/json")
///     .build();
///
/// assert_eq!(request.path_and_query(), "/people.json?name=Matz");
/// assert_eq!(request.header("accept"), Some("application/json"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub http_method: HttpMethod,
    /// Absolute URL without credentials.
    pub url: Url,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Encoded request body, if any.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, url: Url) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, url)
    }

    /// Returns the path plus `?query` when a query is present.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{query}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }

    /// Returns a header value, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Builder for [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    http_method: HttpMethod,
    url: Url,
    headers: BTreeMap<String, String>,
    body: Option<String>,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            http_method: method,
            url,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Adds a single header, replacing any header with the same name.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, key.into(), value.into());
        self
    }

    /// Adds all headers from a map.
    #[must_use]
    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        for (key, value) in headers {
            set_header(&mut self.headers, key, value);
        }
        self
    }

    /// Sets the encoded request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Builds the [`HttpRequest`].
    #[must_use]
    pub fn build(self) -> HttpRequest {
        HttpRequest {
            http_method: self.http_method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Finds a header value by case-insensitive name.
pub(crate) fn find_header<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Sets a header, replacing any existing header with the same name in any case.
pub(crate) fn set_header(headers: &mut BTreeMap<String, String>, name: String, value: String) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}
