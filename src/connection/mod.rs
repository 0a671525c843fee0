//! The request pipeline.
//!
//! A [`Connection`] owns a site URL, a [`MiddlewareStack`] and a
//! [`Transport`]. Each call joins the path onto the site, runs the request
//! hooks outermost first, sends the request (bounded by the configured
//! timeout), then runs the response hooks innermost first.
//!
//! # Example
//!
//! ```rust,ignore
//! use remote_resource::connection::{Connection, StubResponse, Stubs};
//!
//! let stubs = Stubs::new();
//! stubs.get("/people/1.json", StubResponse::ok(r#"{"person":{"id":1}}"#));
//!
//! let connection = Connection::from_settings(&settings)?;
//! let response = connection.get("/people/1.json", &Default::default()).await?;
//! assert_eq!(response.body.as_data(), Some(&serde_json::json!({"id": 1})));
//! ```

mod errors;
mod middleware;
mod request;
mod response;
mod stubs;
mod transport;

pub use errors::{ClientError, ConnectionError, ResponseFailure};
pub use middleware::{
    BasicAuth, Env, FormatCodec, Logger, Middleware, MiddlewareStack, RaiseError, RemoveRoot,
    SetHeader,
};
pub use request::{Body, HttpMethod, HttpRequest, HttpRequestBuilder};
pub use response::HttpResponse;
pub use stubs::{StubHandler, StubResponse, Stubs};
pub use transport::{HttpTransport, Transport};

use crate::config::{Adapter, ConnectionSettings};
use crate::error::ConfigError;
use reqwest::Url;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// A site, a middleware stack and a transport.
///
/// Cloning is cheap; the clone gets its own stack so handlers can be added
/// to it without affecting the original.
#[derive(Clone, Debug)]
pub struct Connection {
    site: Url,
    stack: MiddlewareStack,
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
}

// Verify Connection is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Connection>();
};

impl Connection {
    /// Creates a connection with an empty middleware stack.
    #[must_use]
    pub fn new(site: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            site,
            stack: MiddlewareStack::new(),
            transport,
            timeout: None,
        }
    }

    /// Builds a connection with the standard middleware stack.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the HTTP transport cannot be constructed.
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self, ConfigError> {
        let transport: Arc<dyn Transport> = match &settings.adapter {
            Adapter::Http => Arc::new(HttpTransport::new(settings)?),
            Adapter::Test(stubs) => Arc::new(stubs.clone()),
        };
        tracing::debug!(
            "Building connection for {} at {}",
            settings.resource,
            settings.site
        );

        Ok(Self {
            site: settings.site.without_credentials(),
            stack: MiddlewareStack::standard(settings),
            transport,
            timeout: settings.timeout,
        })
    }

    /// Replaces the middleware stack.
    #[must_use]
    pub fn with_stack(mut self, stack: MiddlewareStack) -> Self {
        self.stack = stack;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the site requests are sent to.
    #[must_use]
    pub const fn site(&self) -> &Url {
        &self.site
    }

    /// Returns the middleware stack.
    #[must_use]
    pub const fn stack(&self) -> &MiddlewareStack {
        &self.stack
    }

    /// Returns the middleware stack for modification.
    pub fn stack_mut(&mut self) -> &mut MiddlewareStack {
        &mut self.stack
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sends a request through the pipeline.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `path` - Absolute path (with optional query) joined onto the site
    /// * `body` - Request body; [`Body::Data`] is encoded by the format stage
    /// * `headers` - Extra request headers
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] if the path is invalid, the transport
    /// fails or times out, or a middleware rejects the request or response.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Body,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse, ConnectionError> {
        let url = self
            .site
            .join(path)
            .map_err(|_| ConnectionError::InvalidPath {
                path: path.to_string(),
            })?;

        let mut env = Env::new(method, url, headers.clone(), body);
        self.stack.run_request(&mut env)?;

        let mut builder = HttpRequest::builder(env.method, env.url.clone()).headers(env.headers.clone());
        if let Some(body) = env.body.to_wire() {
            builder = builder.body(body);
        }
        let request = builder.build();

        let mut response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(request))
                .await
                .map_err(|_| ConnectionError::Timeout {
                    message: format!("{} {} exceeded {limit:?}", env.method.as_str(), env.url),
                })??,
            None => self.transport.send(request).await?,
        };

        self.stack.run_response(&env, &mut response)?;
        Ok(response)
    }

    /// Sends a `GET` request.
    ///
    /// # Errors
    ///
    /// See [`Connection::request`].
    pub async fn get(
        &self,
        path: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse, ConnectionError> {
        self.request(HttpMethod::Get, path, Body::Empty, headers).await
    }

    /// Sends a `DELETE` request.
    ///
    /// # Errors
    ///
    /// See [`Connection::request`].
    pub async fn delete(
        &self,
        path: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse, ConnectionError> {
        self.request(HttpMethod::Delete, path, Body::Empty, headers)
            .await
    }

    /// Sends a `HEAD` request.
    ///
    /// # Errors
    ///
    /// See [`Connection::request`].
    pub async fn head(
        &self,
        path: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse, ConnectionError> {
        self.request(HttpMethod::Head, path, Body::Empty, headers).await
    }

    /// Sends a `POST` request.
    ///
    /// # Errors
    ///
    /// See [`Connection::request`].
    pub async fn post(
        &self,
        path: &str,
        body: Body,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse, ConnectionError> {
        self.request(HttpMethod::Post, path, body, headers).await
    }

    /// Sends a `PUT` request.
    ///
    /// # Errors
    ///
    /// See [`Connection::request`].
    pub async fn put(
        &self,
        path: &str,
        body: Body,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse, ConnectionError> {
        self.request(HttpMethod::Put, path, body, headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthType, Password, SiteUrl, SslOptions};
    use crate::format;
    use serde_json::json;

    fn settings(stubs: &Stubs) -> ConnectionSettings {
        ConnectionSettings {
            resource: "Person".to_string(),
            site: SiteUrl::new("http://37s.sunrise.i:3000").unwrap(),
            proxy: None,
            user: None,
            password: None,
            auth_type: AuthType::Basic,
            timeout: None,
            ssl_options: SslOptions::default(),
            format: format::json(),
            adapter: Adapter::Test(stubs.clone()),
        }
    }

    #[derive(Debug)]
    struct SlowTransport;

    #[async_trait::async_trait]
    impl Transport for SlowTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, ConnectionError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(HttpResponse::new(200, Default::default(), Body::Empty))
        }
    }

    #[test]
    fn test_standard_stack_order() {
        let stubs = Stubs::new();
        let connection = Connection::from_settings(&settings(&stubs)).unwrap();
        assert_eq!(
            connection.stack().names(),
            vec!["remove_root", "raise_error", "format", "logger"]
        );

        let mut authed = settings(&stubs);
        authed.user = Some("david".to_string());
        authed.password = Some(Password::new("test123"));
        let connection = Connection::from_settings(&authed).unwrap();
        assert_eq!(
            connection.stack().names(),
            vec!["remove_root", "basic_auth", "raise_error", "format", "logger"]
        );
    }

    #[tokio::test]
    async fn test_get_decodes_and_strips_root() {
        let stubs = Stubs::new();
        stubs.get(
            "/people/1.json",
            StubResponse::ok(r#"{"person":{"id":1,"name":"Matz"}}"#),
        );
        let connection = Connection::from_settings(&settings(&stubs)).unwrap();

        let response = connection
            .get("/people/1.json", &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(response.body, Body::Data(json!({"id": 1, "name": "Matz"})));
    }

    #[tokio::test]
    async fn test_post_encodes_body_and_sets_content_type() {
        let stubs = Stubs::new();
        stubs.post(
            "/people.json",
            StubResponse::new(201).header("Location", "/people/5.json"),
        );
        let connection = Connection::from_settings(&settings(&stubs)).unwrap();

        let response = connection
            .post(
                "/people.json",
                Body::Data(json!({"person": {"name": "Rick"}})),
                &BTreeMap::new(),
            )
            .await
            .unwrap();
        assert_eq!(response.location(), Some("/people/5.json"));

        let sent = stubs.last_request().unwrap();
        assert_eq!(sent.body.as_deref(), Some(r#"{"person":{"name":"Rick"}}"#));
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_error_status_is_raised() {
        let stubs = Stubs::new();
        stubs.get("/people/99.json", StubResponse::new(404));
        let connection = Connection::from_settings(&settings(&stubs)).unwrap();

        let error = connection
            .get("/people/99.json", &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn test_basic_auth_header_is_sent() {
        let stubs = Stubs::new();
        stubs.get("/people/2.json", StubResponse::ok("{}"));
        let mut authed = settings(&stubs);
        authed.user = Some("david".to_string());
        authed.password = Some(Password::new("test123"));
        let connection = Connection::from_settings(&authed).unwrap();

        connection
            .get("/people/2.json", &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(
            stubs.last_request().unwrap().header("Authorization"),
            Some("Basic ZGF2aWQ6dGVzdDEyMw==")
        );
    }

    #[tokio::test]
    async fn test_extra_headers_are_sent() {
        let stubs = Stubs::new();
        stubs.get("/people/1.json", StubResponse::ok("{}"));
        let connection = Connection::from_settings(&settings(&stubs)).unwrap();
        let mut headers = BTreeMap::new();
        headers.insert("X-Trace".to_string(), "abc".to_string());

        connection.get("/people/1.json", &headers).await.unwrap();
        assert_eq!(stubs.last_request().unwrap().header("x-trace"), Some("abc"));
    }

    #[tokio::test]
    async fn test_scoped_stack_does_not_touch_original() {
        let stubs = Stubs::new();
        stubs.get("/people/1.json", StubResponse::ok("{}"));
        let connection = Connection::from_settings(&settings(&stubs)).unwrap();

        let mut scoped = connection.clone();
        scoped
            .stack_mut()
            .insert(0, SetHeader::new("X-Auth", "token"));
        scoped.get("/people/1.json", &BTreeMap::new()).await.unwrap();
        assert_eq!(stubs.last_request().unwrap().header("X-Auth"), Some("token"));

        connection.get("/people/1.json", &BTreeMap::new()).await.unwrap();
        assert_eq!(stubs.last_request().unwrap().header("X-Auth"), None);
    }

    #[tokio::test]
    async fn test_timeout_is_enforced() {
        let connection = Connection::new(
            Url::parse("http://37s.sunrise.i:3000").unwrap(),
            Arc::new(SlowTransport),
        )
        .with_timeout(Some(Duration::from_millis(20)));

        let error = connection
            .get("/people/1.json", &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(error, ConnectionError::Timeout { .. }));
    }
}
