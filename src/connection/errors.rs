//! Connection error taxonomy.
//!
//! Every non-success status is mapped to a typed error by
//! [`ConnectionError::from_response`], following this table:
//!
//! | Status | Error |
//! |--------|-------|
//! | 301, 302, 303, 307 | [`ConnectionError::Redirection`] |
//! | 400 | [`ClientError::BadRequest`] |
//! | 401 | [`ClientError::UnauthorizedAccess`] |
//! | 403 | [`ClientError::ForbiddenAccess`] |
//! | 404 | [`ClientError::ResourceNotFound`] |
//! | 405 | [`ClientError::MethodNotAllowed`] |
//! | 409 | [`ClientError::ResourceConflict`] |
//! | 410 | [`ClientError::ResourceGone`] |
//! | 422 | [`ClientError::ResourceInvalid`] |
//! | other 4xx | [`ClientError::Other`] |
//! | 5xx | [`ConnectionError::Server`] |
//! | below 200 or above 599 | [`ConnectionError::UnknownResponse`] |
//!
//! Every other 2xx and 3xx status passes through.
//!
//! # Example
//!
//! ```rust,ignore
//! use remote_resource::{ClientError, ConnectionError, ResourceError};
//!
//! match person_type.find(42, &Params::new()).await {
//!     Ok(person) => println!("found {:?}", person.id()),
//!     Err(ResourceError::Connection(ConnectionError::Client(ClientError::ResourceNotFound(failure)))) => {
//!         println!("missing: {failure}");
//!     }
//!     Err(other) => return Err(other.into()),
//! }
//! ```

use super::request::{Body, HttpMethod};
use super::response::HttpResponse;
use crate::format::FormatError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The response that caused an error: status, headers and (decoded) body.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseFailure {
    /// HTTP status code.
    pub status: u16,
    /// Response headers with lowercased names.
    pub headers: HashMap<String, Vec<String>>,
    /// Response body, decoded when the format could parse it.
    pub body: Body,
}

impl ResponseFailure {
    /// Captures the failing parts of a response.
    #[must_use]
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
        }
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

    /// Extracts validation messages from an error body.
    ///
    /// Understands `{"errors": {"field": ["msg"]}}`, `{"errors": ["msg"]}`,
    /// `{"errors": "msg"}` and the decoded XML shape
    /// `{"errors": {"error": ["msg"]}}`.
    #[must_use]
    pub fn validation_errors(&self) -> Vec<String> {
        let Some(errors) = self.body.as_data().and_then(|data| data.get("errors")) else {
            return Vec::new();
        };

        let mut messages = Vec::new();
        match errors {
            Value::Object(fields) => {
                for (field, value) in fields {
                    for message in messages_in(value) {
                        if field == "error" || field == "base" {
                            messages.push(message);
                        } else {
                            messages.push(format!("{field} {message}"));
                        }
                    }
                }
            }
            other => messages.extend(messages_in(other)),
        }
        messages
    }
}

fn messages_in(value: &Value) -> Vec<String> {
    match value {
        Value::String(message) => vec![message.clone()],
        Value::Array(items) => items.iter().flat_map(messages_in).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

impl fmt::Display for ResponseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed.  Response code = {}.", self.status)
    }
}

fn redirect_message(failure: &ResponseFailure) -> String {
    match failure.location() {
        Some(location) => format!("{failure} => {location}"),
        None => failure.to_string(),
    }
}

/// Errors for 4xx responses.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClientError {
    /// 400 Bad Request.
    #[error("{0}")]
    BadRequest(ResponseFailure),

    /// 401 Unauthorized.
    #[error("{0}")]
    UnauthorizedAccess(ResponseFailure),

    /// 403 Forbidden.
    #[error("{0}")]
    ForbiddenAccess(ResponseFailure),

    /// 404 Not Found.
    #[error("{0}")]
    ResourceNotFound(ResponseFailure),

    /// 405 Method Not Allowed.
    #[error("{failure}")]
    MethodNotAllowed {
        /// The failing response.
        failure: ResponseFailure,
        /// Lowercased methods from the `Allow` header.
        allowed_methods: Vec<String>,
    },

    /// 409 Conflict.
    #[error("{0}")]
    ResourceConflict(ResponseFailure),

    /// 410 Gone.
    #[error("{0}")]
    ResourceGone(ResponseFailure),

    /// 422 Unprocessable Entity.
    #[error("{0}")]
    ResourceInvalid(ResponseFailure),

    /// Any other 4xx status.
    #[error("{0}")]
    Other(ResponseFailure),
}

impl ClientError {
    /// Returns the response that caused the error.
    #[must_use]
    pub const fn response(&self) -> &ResponseFailure {
        match self {
            Self::BadRequest(failure)
            | Self::UnauthorizedAccess(failure)
            | Self::ForbiddenAccess(failure)
            | Self::ResourceNotFound(failure)
            | Self::MethodNotAllowed { failure, .. }
            | Self::ResourceConflict(failure)
            | Self::ResourceGone(failure)
            | Self::ResourceInvalid(failure)
            | Self::Other(failure) => failure,
        }
    }
}

/// Errors raised while sending a request or interpreting its response.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The request did not complete within the configured timeout.
    #[error("Request timed out: {message}")]
    Timeout {
        /// Description of what timed out.
        message: String,
    },

    /// TLS negotiation failed.
    #[error("SSL error: {message}")]
    Ssl {
        /// Description reported by the TLS layer.
        message: String,
    },

    /// 301, 302, 303 or 307.
    #[error("{}", redirect_message(.0))]
    Redirection(ResponseFailure),

    /// A 4xx status.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A 5xx status.
    #[error("{0}")]
    Server(ResponseFailure),

    /// A status outside 200..=599 that has no defined meaning.
    #[error("{}  Unknown response code: {}", .0, .0.status)]
    UnknownResponse(ResponseFailure),

    /// The request path could not be joined onto the site.
    #[error("Invalid request path '{path}'")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// No stub matched a request sent through the test adapter.
    #[error("No stubbed response for {method} {path}")]
    StubNotFound {
        /// Method of the unmatched request.
        method: HttpMethod,
        /// Path and query of the unmatched request.
        path: String,
    },

    /// A success response body could not be decoded.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Network or protocol error from the HTTP client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ConnectionError {
    /// Maps a response status to an error, or `None` if the status passes.
    #[must_use]
    pub fn from_response(response: &HttpResponse) -> Option<Self> {
        let status = response.status;
        let failure = || ResponseFailure::from_response(response);

        let error = match status {
            301 | 302 | 303 | 307 => Self::Redirection(failure()),
            200..=399 => return None,
            400 => ClientError::BadRequest(failure()).into(),
            401 => ClientError::UnauthorizedAccess(failure()).into(),
            403 => ClientError::ForbiddenAccess(failure()).into(),
            404 => ClientError::ResourceNotFound(failure()).into(),
            405 => {
                let allowed_methods = response
                    .header("allow")
                    .map(|allow| {
                        allow
                            .split(',')
                            .map(|method| method.trim().to_lowercase())
                            .filter(|method| !method.is_empty())
                            .collect()
                    })
                    .unwrap_or_default();
                ClientError::MethodNotAllowed {
                    failure: failure(),
                    allowed_methods,
                }
                .into()
            }
            409 => ClientError::ResourceConflict(failure()).into(),
            410 => ClientError::ResourceGone(failure()).into(),
            422 => ClientError::ResourceInvalid(failure()).into(),
            401..=499 => ClientError::Other(failure()).into(),
            500..=599 => Self::Server(failure()),
            _ => Self::UnknownResponse(failure()),
        };
        Some(error)
    }

    /// Returns the failing response for status-derived errors.
    #[must_use]
    pub const fn response(&self) -> Option<&ResponseFailure> {
        match self {
            Self::Redirection(failure)
            | Self::Server(failure)
            | Self::UnknownResponse(failure) => Some(failure),
            Self::Client(error) => Some(error.response()),
            _ => None,
        }
    }

    /// Returns the HTTP status for status-derived errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response().map(|failure| failure.status)
    }

    /// Returns `true` for 404 responses.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Client(ClientError::ResourceNotFound(_)))
    }

    /// Returns `true` for 410 responses.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(self, Self::Client(ClientError::ResourceGone(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16) -> HttpResponse {
        HttpResponse::new(status, HashMap::new(), Body::Empty)
    }

    fn response_with_header(status: u16, name: &str, value: &str) -> HttpResponse {
        let mut headers = HashMap::new();
        headers.insert(name.to_string(), vec![value.to_string()]);
        HttpResponse::new(status, headers, Body::Empty)
    }

    #[test]
    fn test_success_and_other_3xx_pass_through() {
        for status in [200, 201, 204, 299, 300, 304, 305, 306, 308, 399] {
            assert!(
                ConnectionError::from_response(&response(status)).is_none(),
                "status {status} should pass"
            );
        }
    }

    #[test]
    fn test_redirects_map_to_redirection_with_location() {
        for status in [301, 302, 303, 307] {
            let error = ConnectionError::from_response(&response_with_header(
                status,
                "Location",
                "http://example.com/people/1.json",
            ))
            .unwrap();
            assert!(matches!(error, ConnectionError::Redirection(_)));
            assert_eq!(
                error.to_string(),
                format!("Failed.  Response code = {status}. => http://example.com/people/1.json")
            );
        }
    }

    #[test]
    fn test_redirection_without_location() {
        let error = ConnectionError::from_response(&response(302)).unwrap();
        assert_eq!(error.to_string(), "Failed.  Response code = 302.");
    }

    #[test]
    fn test_client_statuses_map_to_specific_errors() {
        let cases: &[(u16, fn(&ClientError) -> bool)] = &[
            (400, |e| matches!(e, ClientError::BadRequest(_))),
            (401, |e| matches!(e, ClientError::UnauthorizedAccess(_))),
            (403, |e| matches!(e, ClientError::ForbiddenAccess(_))),
            (404, |e| matches!(e, ClientError::ResourceNotFound(_))),
            (405, |e| matches!(e, ClientError::MethodNotAllowed { .. })),
            (409, |e| matches!(e, ClientError::ResourceConflict(_))),
            (410, |e| matches!(e, ClientError::ResourceGone(_))),
            (422, |e| matches!(e, ClientError::ResourceInvalid(_))),
            (402, |e| matches!(e, ClientError::Other(_))),
            (406, |e| matches!(e, ClientError::Other(_))),
            (429, |e| matches!(e, ClientError::Other(_))),
            (499, |e| matches!(e, ClientError::Other(_))),
        ];
        for (status, check) in cases {
            match ConnectionError::from_response(&response(*status)) {
                Some(ConnectionError::Client(error)) => {
                    assert!(check(&error), "status {status} mapped to {error:?}");
                    assert_eq!(error.response().status, *status);
                }
                other => panic!("status {status} mapped to {other:?}"),
            }
        }
    }

    #[test]
    fn test_server_statuses_map_to_server_error() {
        for status in [500, 502, 503, 599] {
            assert!(matches!(
                ConnectionError::from_response(&response(status)),
                Some(ConnectionError::Server(_))
            ));
        }
    }

    #[test]
    fn test_unknown_statuses() {
        for status in [100, 199, 600, 999] {
            let error = ConnectionError::from_response(&response(status)).unwrap();
            assert!(matches!(error, ConnectionError::UnknownResponse(_)));
            assert!(error
                .to_string()
                .contains(&format!("Unknown response code: {status}")));
        }
    }

    #[test]
    fn test_method_not_allowed_parses_allow_header() {
        let error =
            ConnectionError::from_response(&response_with_header(405, "allow", "GET, POST ,Head"))
                .unwrap();
        match error {
            ConnectionError::Client(ClientError::MethodNotAllowed {
                allowed_methods, ..
            }) => assert_eq!(allowed_methods, vec!["get", "post", "head"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_failure_message_includes_status() {
        let error = ConnectionError::from_response(&response(404)).unwrap();
        assert_eq!(error.to_string(), "Failed.  Response code = 404.");
        assert_eq!(error.status(), Some(404));
        assert!(error.is_not_found());
        assert!(!error.is_gone());
    }

    #[test]
    fn test_validation_errors_from_field_map() {
        let failure = ResponseFailure {
            status: 422,
            headers: HashMap::new(),
            body: Body::Data(json!({"errors": {"name": ["can't be blank"], "base": "is broken"}})),
        };
        let mut messages = failure.validation_errors();
        messages.sort();
        assert_eq!(messages, vec!["is broken", "name can't be blank"]);
    }

    #[test]
    fn test_validation_errors_from_xml_shape() {
        let failure = ResponseFailure {
            status: 422,
            headers: HashMap::new(),
            body: Body::Data(json!({"errors": {"error": ["Name can't be blank", "Age is not a number"]}})),
        };
        assert_eq!(
            failure.validation_errors(),
            vec!["Name can't be blank", "Age is not a number"]
        );
    }

    #[test]
    fn test_validation_errors_empty_without_errors_key() {
        let failure = ResponseFailure {
            status: 422,
            headers: HashMap::new(),
            body: Body::Text("oops".to_string()),
        };
        assert!(failure.validation_errors().is_empty());
    }
}
