//! The transport boundary and the `reqwest` implementation of it.

use super::errors::ConnectionError;
use super::request::{Body, HttpMethod, HttpRequest};
use super::response::HttpResponse;
use crate::config::ConnectionSettings;
use crate::error::ConfigError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error as _;
use std::fmt;

/// Sends one fully built request and returns the raw response.
///
/// The response body is expected to be [`Body::Text`] or [`Body::Empty`];
/// decoding is the pipeline's job.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when no response could be obtained.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ConnectionError>;
}

/// Real HTTP transport backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

// Verify HttpTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpTransport>();
};

impl HttpTransport {
    /// Builds a client honoring the proxy and TLS settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the proxy is unusable, the CA file cannot
    /// be read, or the client cannot be constructed.
    pub fn new(settings: &ConnectionSettings) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder().use_rustls_tls();

        if let Some(proxy_url) = &settings.proxy {
            let mut proxy = reqwest::Proxy::all(proxy_url.to_string()).map_err(|_| {
                ConfigError::InvalidProxyUrl {
                    url: proxy_url.to_string(),
                }
            })?;
            if let Some(user) = proxy_url.user() {
                proxy = proxy.basic_auth(&user, &proxy_url.password().unwrap_or_default());
            }
            builder = builder.proxy(proxy);
        }

        let ssl = &settings.ssl_options;
        if !ssl.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(path) = &ssl.ca_file {
            let invalid = |reason: String| ConfigError::InvalidCertificate {
                path: path.display().to_string(),
                reason,
            };
            let pem = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
            let certificate =
                reqwest::Certificate::from_pem(&pem).map_err(|e| invalid(e.to_string()))?;
            builder = builder.add_root_certificate(certificate);
        }

        let client = builder.build().map_err(|e| ConfigError::HttpClient {
            reason: e.to_string(),
        })?;
        Ok(Self { client })
    }

    /// Wraps an existing `reqwest` client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    fn classify(error: reqwest::Error) -> ConnectionError {
        if error.is_timeout() {
            return ConnectionError::Timeout {
                message: error.to_string(),
            };
        }
        let mut source = error.source();
        while let Some(cause) = source {
            let text = cause.to_string().to_lowercase();
            if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
                return ConnectionError::Ssl {
                    message: cause.to_string(),
                };
            }
            source = cause.source();
        }
        ConnectionError::Network(error)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ConnectionError> {
        let url = request.url.clone();
        let mut req_builder = match request.http_method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
            HttpMethod::Head => self.client.head(url),
        };

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let res = req_builder.send().await.map_err(Self::classify)?;
        let status = res.status().as_u16();
        let headers = Self::parse_response_headers(res.headers());
        let text = res.text().await.map_err(Self::classify)?;
        let body = if text.is_empty() {
            Body::Empty
        } else {
            Body::Text(text)
        };

        Ok(HttpResponse::new(status, headers, body))
    }
}
