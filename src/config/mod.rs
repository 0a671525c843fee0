//! Configuration types for resource types and their connections.
//!
//! # Overview
//!
//! - [`ResourceConfig`]: the settings a single resource type declares itself.
//!   Unset fields are inherited from the parent type when resolved.
//! - [`ConnectionSettings`]: the fully resolved settings a
//!   [`Connection`](crate::connection::Connection) is built from. Comparing a
//!   freshly resolved value against the one a cached connection was built
//!   from is how stale connections are detected.
//! - [`SiteUrl`] and [`Password`]: validated newtypes.
//! - [`AuthType`], [`SslOptions`] and [`Adapter`].
//!
//! # Example
//!
//! ```rust
//! use remote_resource::{ResourceType, SiteUrl};
//!
//! let person = ResourceType::builder("Person")
//!     .site(SiteUrl::new("http://37s.sunrise.i:3000").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(person.collection_name(), "people");
//! ```

mod newtypes;

pub use newtypes::{Password, SiteUrl};

use crate::connection::Stubs;
use crate::format::FormatRef;
use crate::resource::{PrefixTemplate, Schema};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Authentication scheme applied when a user or password is configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthType {
    /// HTTP basic authentication.
    #[default]
    Basic,
}

/// TLS options for the HTTP transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SslOptions {
    /// Whether server certificates are verified.
    pub verify: bool,
    /// Additional PEM encoded CA certificate to trust.
    pub ca_file: Option<PathBuf>,
}

impl Default for SslOptions {
    fn default() -> Self {
        Self {
            verify: true,
            ca_file: None,
        }
    }
}

/// The transport a connection sends requests through.
#[derive(Clone, Debug, Default)]
pub enum Adapter {
    /// Real HTTP via `reqwest`.
    #[default]
    Http,
    /// Canned responses from a [`Stubs`] registry.
    Test(Stubs),
}

impl PartialEq for Adapter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Http, Self::Http) => true,
            (Self::Test(a), Self::Test(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Settings declared directly on one resource type.
///
/// `None` (or an empty header map) means "inherit from the parent type".
/// `element_name`, `collection_name`, `primary_key`, `singleton_name` and
/// `schema` are never inherited.
#[derive(Clone, Debug, Default)]
pub struct ResourceConfig {
    /// Base URI of the remote service.
    pub site: Option<SiteUrl>,
    /// HTTP proxy.
    pub proxy: Option<SiteUrl>,
    /// User for authentication.
    pub user: Option<String>,
    /// Password for authentication.
    pub password: Option<Password>,
    /// Authentication scheme.
    pub auth_type: Option<AuthType>,
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// TLS options.
    pub ssl_options: Option<SslOptions>,
    /// Extra request headers, merged over the parent's.
    pub headers: BTreeMap<String, String>,
    /// Wire format codec.
    pub format: Option<FormatRef>,
    /// Transport selection.
    pub adapter: Option<Adapter>,
    /// Path prefix template.
    pub prefix: Option<PrefixTemplate>,
    /// Singular name used as JSON root and XML element.
    pub element_name: Option<String>,
    /// Plural name used in collection paths.
    pub collection_name: Option<String>,
    /// Attribute holding the identifier.
    pub primary_key: Option<String>,
    /// Path segment used by singleton resources.
    pub singleton_name: Option<String>,
    /// Declared attribute types.
    pub schema: Option<Schema>,
}

/// Fully resolved settings a connection is built from.
#[derive(Clone, Debug)]
pub struct ConnectionSettings {
    /// Name of the resource type the settings were resolved for.
    pub resource: String,
    /// Base URI.
    pub site: SiteUrl,
    /// HTTP proxy.
    pub proxy: Option<SiteUrl>,
    /// User for authentication.
    pub user: Option<String>,
    /// Password for authentication.
    pub password: Option<Password>,
    /// Authentication scheme.
    pub auth_type: AuthType,
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// TLS options.
    pub ssl_options: SslOptions,
    /// Wire format codec.
    pub format: FormatRef,
    /// Transport selection.
    pub adapter: Adapter,
}

impl ConnectionSettings {
    /// Returns `true` if requests should carry credentials.
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        self.user.is_some() || self.password.is_some()
    }
}

impl PartialEq for ConnectionSettings {
    fn eq(&self, other: &Self) -> bool {
        self.site == other.site
            && self.proxy == other.proxy
            && self.user == other.user
            && self.password == other.password
            && self.auth_type == other.auth_type
            && self.timeout == other.timeout
            && self.ssl_options == other.ssl_options
            && self.format.name() == other.format.name()
            && self.adapter == other.adapter
    }
}

// Verify configuration types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceConfig>();
    assert_send_sync::<ConnectionSettings>();
};
