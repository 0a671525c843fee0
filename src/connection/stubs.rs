//! Declarative stub registry used as a test transport.
//!
//! Stubs map `(method, path[?query])` to a canned response or a closure.
//! They are consulted in registration order; a stub registered without a
//! query string also matches requests that carry one. Every request that
//! reaches the registry is recorded so tests can assert on headers and
//! bodies.
//!
//! # Example
//!
//! ```rust
//! use remote_resource::connection::{HttpMethod, StubResponse, Stubs};
//! use serde_json::json;
//!
//! let stubs = Stubs::new();
//! stubs
//!     .get("/people/1.json", StubResponse::json(200, &json!({"person": {"id": 1, "name": "Matz"}})))
//!     .post(
//!         "/people.json",
//!         StubResponse::new(201).header("Location", "/people/5.json"),
//!     );
//!
//! assert_eq!(stubs.len(), 2);
//! ```

use super::errors::ConnectionError;
use super::request::{Body, HttpMethod, HttpRequest};
use super::response::HttpResponse;
use super::transport::Transport;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Closure producing a response for a matched request.
pub type StubHandler =
    dyn Fn(&HttpRequest) -> Result<StubResponse, ConnectionError> + Send + Sync;

/// A canned response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StubResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Raw response body.
    pub body: String,
}

impl StubResponse {
    /// Creates an empty response with the given status.
    #[must_use]
    pub const fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Creates a 200 response with a raw body.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200).body(body)
    }

    /// Creates a response whose body is the serialized JSON value.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status)
            .header("Content-Type", "application/json")
            .body(body.to_string())
    }

    /// Adds a response header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the raw response body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    fn into_response(self) -> HttpResponse {
        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in self.headers {
            headers.entry(name).or_default().push(value);
        }
        let body = if self.body.is_empty() {
            Body::Empty
        } else {
            Body::Text(self.body)
        };
        HttpResponse::new(self.status, headers, body)
    }
}

#[derive(Clone)]
enum Responder {
    Fixed(StubResponse),
    Dynamic(Arc<StubHandler>),
}

#[derive(Clone)]
struct Stub {
    method: HttpMethod,
    path: String,
    query: Option<String>,
    responder: Responder,
}

impl Stub {
    fn matches(&self, request: &HttpRequest) -> bool {
        self.method == request.http_method
            && self.path == request.url.path()
            && self
                .query
                .as_deref()
                .map_or(true, |query| request.url.query() == Some(query))
    }
}

#[derive(Default)]
struct Registry {
    stubs: Vec<Stub>,
    requests: Vec<HttpRequest>,
}

/// Shared, cloneable stub registry.
///
/// Clones share the same registry, so a test can keep a handle while the
/// resource type's connection owns another.
#[derive(Clone, Default)]
pub struct Stubs {
    registry: Arc<RwLock<Registry>>,
}

impl Stubs {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a canned response.
    pub fn on(&self, method: HttpMethod, path: impl Into<String>, response: StubResponse) -> &Self {
        self.register(method, path.into(), Responder::Fixed(response))
    }

    /// Registers a closure that builds the response from the request.
    pub fn on_with<F>(&self, method: HttpMethod, path: impl Into<String>, handler: F) -> &Self
    where
        F: Fn(&HttpRequest) -> Result<StubResponse, ConnectionError> + Send + Sync + 'static,
    {
        self.register(method, path.into(), Responder::Dynamic(Arc::new(handler)))
    }

    /// Registers a canned `GET` response.
    pub fn get(&self, path: impl Into<String>, response: StubResponse) -> &Self {
        self.on(HttpMethod::Get, path, response)
    }

    /// Registers a canned `POST` response.
    pub fn post(&self, path: impl Into<String>, response: StubResponse) -> &Self {
        self.on(HttpMethod::Post, path, response)
    }

    /// Registers a canned `PUT` response.
    pub fn put(&self, path: impl Into<String>, response: StubResponse) -> &Self {
        self.on(HttpMethod::Put, path, response)
    }

    /// Registers a canned `DELETE` response.
    pub fn delete(&self, path: impl Into<String>, response: StubResponse) -> &Self {
        self.on(HttpMethod::Delete, path, response)
    }

    /// Registers a canned `HEAD` response.
    pub fn head(&self, path: impl Into<String>, response: StubResponse) -> &Self {
        self.on(HttpMethod::Head, path, response)
    }

    /// Removes every stub and forgets recorded requests.
    pub fn clear(&self) {
        let mut registry = self.registry.write();
        registry.stubs.clear();
        registry.requests.clear();
    }

    /// Returns the number of registered stubs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.read().stubs.len()
    }

    /// Returns `true` if no stubs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.registry.read().requests.clone()
    }

    /// Returns the most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.registry.read().requests.last().cloned()
    }

    /// Returns `true` if both handles share one registry.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
    }

    fn register(&self, method: HttpMethod, path: String, responder: Responder) -> &Self {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path, None),
        };
        self.registry.write().stubs.push(Stub {
            method,
            path,
            query,
            responder,
        });
        self
    }

    fn respond(&self, request: HttpRequest) -> Result<HttpResponse, ConnectionError> {
        let responder = {
            let mut registry = self.registry.write();
            registry.requests.push(request.clone());
            registry
                .stubs
                .iter()
                .find(|stub| stub.matches(&request))
                .map(|stub| stub.responder.clone())
        };

        match responder {
            Some(Responder::Fixed(response)) => Ok(response.into_response()),
            Some(Responder::Dynamic(handler)) => Ok(handler(&request)?.into_response()),
            None => Err(ConnectionError::StubNotFound {
                method: request.http_method,
                path: request.path_and_query(),
            }),
        }
    }
}

impl fmt::Debug for Stubs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("Stubs")
            .field("stubs", &registry.stubs.len())
            .field("requests", &registry.requests.len())
            .finish()
    }
}

#[async_trait]
impl Transport for Stubs {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ConnectionError> {
        self.respond(request)
    }
}
