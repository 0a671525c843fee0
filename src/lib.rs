//! # Remote Resource
//!
//! Models REST resources as local objects whose CRUD operations become HTTP
//! requests, with pluggable wire formats, basic authentication, nested
//! `/posts/:post_id/comments` style paths and per-call middleware scopes.
//!
//! ## Overview
//!
//! This crate provides:
//! - Resource types configured via [`ResourceType::builder`], with settings
//!   inherited along a parent chain
//! - Records ([`Resource`]) with dynamic attributes, nested records and a
//!   new/persisted lifecycle
//! - Class-level finders through the [`ResourceQuery`] trait
//! - A middleware request pipeline in [`connection`], with a `reqwest`
//!   transport and a [`Stubs`] transport for tests
//! - JSON and XML codecs in [`format`]
//!
//! ## Quick Start
//!
//! ```rust
//! use remote_resource::{ResourceType, SiteUrl};
//!
//! let person = ResourceType::builder("Person")
//!     .site(SiteUrl::new("http://37s.sunrise.i:3000").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(person.element_name(), "person");
//! assert_eq!(person.collection_name(), "people");
//! ```
//!
//! ## Finding and Saving Records
//!
//! ```rust,ignore
//! use remote_resource::{Params, ResourceQuery};
//! use serde_json::json;
//!
//! let mut matz = person.find(1, &Params::new()).await?;
//! assert_eq!(matz.get("name").and_then(|v| v.as_str()), Some("Matz"));
//!
//! matz.set("name", "Yukihiro");
//! matz.save().await?;
//!
//! let rick = person.create(json!({"name": "Rick"})).await?;
//! assert!(rick.is_persisted());
//! ```
//!
//! ## Nested Resources
//!
//! ```rust,ignore
//! use remote_resource::resource::params;
//!
//! let comment = ResourceType::builder("Comment")
//!     .parent(&person)
//!     .prefix("/posts/:post_id/")
//!     .build()?;
//!
//! // GET /posts/1/comments.json
//! let comments = comment
//!     .find_all(FindOptions::new().param("post_id", 1))
//!     .await?;
//! ```
//!
//! ## Scopes
//!
//! ```rust,ignore
//! use remote_resource::connection::SetHeader;
//!
//! person.define_scope("authed", |stack, args| {
//!     let token = args[0].as_str().unwrap_or_default();
//!     stack.insert(0, SetHeader::new("X-Auth", token));
//! });
//!
//! // Only this request carries the header.
//! let secret = person.scope("authed", &[json!("t0k3n")])?.find(2, &Params::new()).await?;
//! ```
//!
//! ## Design Principles
//!
//! - **Explicit configuration**: settings live on type handles, never in globals
//! - **Fail-fast validation**: newtypes validate on construction
//! - **Thread-safe**: all shared types are `Send + Sync`
//! - **Async-first**: one awaited request per operation on the Tokio runtime

pub mod config;
pub mod connection;
pub mod error;
pub mod format;
pub mod inflector;
pub mod resource;

// Re-export public types at crate root for convenience
pub use config::{
    Adapter, AuthType, ConnectionSettings, Password, ResourceConfig, SiteUrl, SslOptions,
};
pub use error::ConfigError;

// Re-export pipeline types
pub use connection::{
    ClientError, Connection, ConnectionError, HttpMethod, HttpResponse, StubResponse, Stubs,
};
pub use format::{Format, FormatError, FormatRef};

// Re-export resource types
pub use resource::{
    AttributeValue, FindOptions, Params, RequestScope, Resource, ResourceError, ResourceQuery,
    ResourceType, ResourceTypeBuilder, Schema,
};

pub use reqwest::Url;
