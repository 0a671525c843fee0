//! Middleware stages of the request pipeline.
//!
//! A [`MiddlewareStack`] is an ordered list of [`Middleware`] handlers. On
//! the way out each handler's [`Middleware::on_request`] runs from first to
//! last; once the transport has answered, [`Middleware::on_response`] runs
//! from last to first. The standard stack built for every connection is:
//!
//! 1. [`RemoveRoot`] unwraps single-key response documents
//! 2. [`BasicAuth`] adds the `Authorization` header, when credentials exist
//! 3. [`RaiseError`] turns error statuses into [`ConnectionError`]s
//! 4. [`FormatCodec`] encodes request data and decodes response text
//! 5. [`Logger`] records the request line and the response summary
//!
//! Scopes prepend their own handlers to a clone of this stack.
//!
//! # Example
//!
//! ```rust
//! use remote_resource::connection::{MiddlewareStack, SetHeader};
//!
//! let mut stack = MiddlewareStack::new();
//! stack.insert(0, SetHeader::new("X-Auth", "secret-token"));
//! assert_eq!(stack.names(), vec!["set_header"]);
//! ```

use super::errors::ConnectionError;
use super::request::{find_header, set_header, Body, HttpMethod};
use super::response::HttpResponse;
use crate::config::{ConnectionSettings, Password};
use crate::format::{remove_root, FormatRef};
use base64::prelude::*;
use reqwest::Url;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// The outbound request as it passes through the stack.
#[derive(Clone, Debug)]
pub struct Env {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Request body.
    pub body: Body,
    /// When the request entered the stack.
    pub started_at: Instant,
}

impl Env {
    /// Creates an environment for a new request.
    #[must_use]
    pub fn new(method: HttpMethod, url: Url, headers: BTreeMap<String, String>, body: Body) -> Self {
        Self {
            method,
            url,
            headers,
            body,
            started_at: Instant::now(),
        }
    }

    /// Returns a request header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Sets a request header, replacing any existing value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_header(&mut self.headers, name.into(), value.into());
    }

    /// Sets a request header unless one with the same name is present.
    pub fn set_header_if_absent(&mut self, name: &str, value: &str) {
        if self.header(name).is_none() {
            self.set_header(name, value);
        }
    }
}

/// A stage in the request pipeline.
///
/// Both hooks default to doing nothing, so a handler only implements the
/// phase it cares about. Returning an error aborts the request; handlers
/// further out do not see the response.
pub trait Middleware: Send + Sync + fmt::Debug {
    /// Short identifier used by [`MiddlewareStack::names`] and
    /// [`MiddlewareStack::remove`].
    fn name(&self) -> &'static str;

    /// Inspects or rewrites the outbound request.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] to abort the request.
    fn on_request(&self, env: &mut Env) -> Result<(), ConnectionError> {
        let _ = env;
        Ok(())
    }

    /// Inspects or rewrites the response.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] to fail the request.
    fn on_response(&self, env: &Env, response: &mut HttpResponse) -> Result<(), ConnectionError> {
        let _ = (env, response);
        Ok(())
    }
}

/// Ordered list of middleware handlers, outermost first.
///
/// Cloning a stack is cheap and yields an independent list; handlers
/// themselves are shared.
#[derive(Clone, Debug, Default)]
pub struct MiddlewareStack {
    handlers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard stack for a connection.
    #[must_use]
    pub fn standard(settings: &ConnectionSettings) -> Self {
        let mut stack = Self::new();
        stack.push(RemoveRoot);
        if settings.has_credentials() {
            stack.push(BasicAuth::new(
                settings.user.clone().unwrap_or_default(),
                settings.password.clone().unwrap_or_else(|| Password::new("")),
            ));
        }
        stack.push(RaiseError);
        stack.push(FormatCodec::new(Arc::clone(&settings.format)));
        stack.push(Logger);
        stack
    }

    /// Appends a handler as the innermost stage.
    pub fn push(&mut self, handler: impl Middleware + 'static) {
        self.handlers.push(Arc::new(handler));
    }

    /// Inserts a handler at `index`, clamped to the stack length.
    ///
    /// Index 0 makes the handler the outermost stage.
    pub fn insert(&mut self, index: usize, handler: impl Middleware + 'static) {
        let index = index.min(self.handlers.len());
        self.handlers.insert(index, Arc::new(handler));
    }

    /// Removes every handler named `name`, returning whether any was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|handler| handler.name() != name);
        before != self.handlers.len()
    }

    /// Returns handler names, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    /// Returns the number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if the stack has no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs every request hook, outermost first.
    pub(crate) fn run_request(&self, env: &mut Env) -> Result<(), ConnectionError> {
        for handler in &self.handlers {
            handler.on_request(env)?;
        }
        Ok(())
    }

    /// Runs every response hook, innermost first.
    pub(crate) fn run_response(
        &self,
        env: &Env,
        response: &mut HttpResponse,
    ) -> Result<(), ConnectionError> {
        for handler in self.handlers.iter().rev() {
            handler.on_response(env, response)?;
        }
        Ok(())
    }
}

/// Replaces a decoded single-key document with its only value.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoveRoot;

impl Middleware for RemoveRoot {
    fn name(&self) -> &'static str {
        "remove_root"
    }

    fn on_response(&self, _env: &Env, response: &mut HttpResponse) -> Result<(), ConnectionError> {
        if let Body::Data(data) = &mut response.body {
            *data = remove_root(data.take());
        }
        Ok(())
    }
}

/// Adds an HTTP basic `Authorization` header.
#[derive(Clone, Debug)]
pub struct BasicAuth {
    user: String,
    password: Password,
}

impl BasicAuth {
    /// Creates the stage for the given credentials.
    #[must_use]
    pub fn new(user: impl Into<String>, password: Password) -> Self {
        Self {
            user: user.into(),
            password,
        }
    }

    /// Returns the header value, e.g. `Basic ZGF2aWQ6dGVzdDEyMw==`.
    #[must_use]
    pub fn header_value(&self) -> String {
        let credentials = format!("{}:{}", self.user, self.password.as_ref());
        format!("Basic {}", BASE64_STANDARD.encode(credentials))
    }
}

impl Middleware for BasicAuth {
    fn name(&self) -> &'static str {
        "basic_auth"
    }

    fn on_request(&self, env: &mut Env) -> Result<(), ConnectionError> {
        env.set_header("Authorization", self.header_value());
        Ok(())
    }
}

/// Fails the request when the status maps to an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct RaiseError;

impl Middleware for RaiseError {
    fn name(&self) -> &'static str {
        "raise_error"
    }

    fn on_response(&self, _env: &Env, response: &mut HttpResponse) -> Result<(), ConnectionError> {
        match ConnectionError::from_response(response) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Encodes request data and decodes response text with a [`Format`](crate::format::Format).
#[derive(Clone, Debug)]
pub struct FormatCodec {
    format: FormatRef,
}

impl FormatCodec {
    /// Creates the stage for a codec.
    #[must_use]
    pub const fn new(format: FormatRef) -> Self {
        Self { format }
    }
}

impl Middleware for FormatCodec {
    fn name(&self) -> &'static str {
        "format"
    }

    fn on_request(&self, env: &mut Env) -> Result<(), ConnectionError> {
        let mime = self.format.mime_type();
        env.set_header_if_absent("Accept", mime);
        if let Body::Data(data) = &env.body {
            env.body = Body::Text(self.format.encode(data, None)?);
        }
        if !env.body.is_empty() {
            env.set_header_if_absent("Content-Type", mime);
        }
        Ok(())
    }

    fn on_response(&self, env: &Env, response: &mut HttpResponse) -> Result<(), ConnectionError> {
        let Body::Text(text) = &response.body else {
            return Ok(());
        };
        if text.trim().is_empty() {
            return Ok(());
        }
        match self.format.decode(text) {
            Ok(data) => response.body = Body::Data(data),
            Err(error) if response.is_ok() => return Err(error.into()),
            Err(error) => {
                tracing::debug!(
                    "Keeping undecodable {} body from {} {}: {}",
                    response.status,
                    env.method.as_str(),
                    env.url,
                    error
                );
            }
        }
        Ok(())
    }
}

/// Logs each request and response through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Logger;

impl Middleware for Logger {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn on_request(&self, env: &mut Env) -> Result<(), ConnectionError> {
        tracing::info!("{} {}", env.method.as_str(), env.url);
        Ok(())
    }

    fn on_response(&self, env: &Env, response: &mut HttpResponse) -> Result<(), ConnectionError> {
        tracing::info!("{}", Self::response_line(env, response));
        Ok(())
    }
}

impl Logger {
    fn response_line(env: &Env, response: &HttpResponse) -> String {
        format!(
            "--> {} {} {} {} ({:.1}ms)",
            env.method.as_str(),
            env.url,
            response.status,
            response.body.len(),
            env.started_at.elapsed().as_secs_f64() * 1000.0
        )
    }
}

/// Sets a fixed request header.
///
/// Handy for scopes that inject per-call credentials.
#[derive(Clone, Debug)]
pub struct SetHeader {
    name: String,
    value: String,
}

impl SetHeader {
    /// Creates the stage.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Middleware for SetHeader {
    fn name(&self) -> &'static str {
        "set_header"
    }

    fn on_request(&self, env: &mut Env) -> Result<(), ConnectionError> {
        env.set_header(self.name.clone(), self.value.clone());
        Ok(())
    }
}
