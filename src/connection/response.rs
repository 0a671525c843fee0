//! Response type returned by transports and the connection pipeline.

use super::request::Body;
use std::collections::HashMap;

/// A response after it has passed through the middleware stack.
///
/// Header names are stored lowercased; use [`HttpResponse::header`] for
/// lookups.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lowercased names to values.
    pub headers: HashMap<String, Vec<String>>,
    /// Response body.
    pub body: Body,
}

impl HttpResponse {
    /// Creates a response, normalizing header names to lowercase.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, Vec<String>>, body: Body) -> Self {
        let mut normalized: HashMap<String, Vec<String>> = HashMap::with_capacity(headers.len());
        for (name, values) in headers {
            normalized
                .entry(name.to_lowercase())
                .or_default()
                .extend(values);
        }
        Self {
            status,
            headers: normalized,
            body,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `Location` header, if present.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Returns the `X-Request-Id` header, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Returns `false` for statuses that never carry a body (1xx, 204, 304).
    #[must_use]
    pub const fn status_allows_body(&self) -> bool {
        !matches!(self.status, 100..=199 | 204 | 304)
    }

    /// Returns `true` if the body should be loaded into a resource.
    ///
    /// The status must allow a body, `Content-Length` must not be `0`, and
    /// the body must not be blank.
    #[must_use]
    pub fn has_loadable_body(&self) -> bool {
        self.status_allows_body()
            && self.header("content-length").map(str::trim) != Some("0")
            && !self.body.is_blank()
    }
}
