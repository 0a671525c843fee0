//! Resource types, records, scopes and queries.
//!
//! This module provides:
//!
//! - [`ResourceType`]: configuration, naming, paths and the connection cache
//! - [`Resource`]: one record with its attributes and lifecycle
//! - [`ResourceQuery`]: `find`, `find_all`, `create` and friends
//! - [`RequestScope`]: a type bound to a connection with extra middleware
//! - [`PrefixTemplate`], [`Params`] and query-string helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use remote_resource::{Params, ResourceQuery, ResourceType, SiteUrl};
//!
//! let person = ResourceType::builder("Person")
//!     .site(SiteUrl::new("http://37s.sunrise.i:3000")?)
//!     .build()?;
//!
//! let mut matz = person.find(1, &Params::new()).await?;
//! matz.set("name", "Yukihiro");
//! matz.save().await?;
//! ```

mod attributes;
mod entity;
mod errors;
mod path;
mod query;
mod resource_type;
mod schema;
mod scope;

pub use attributes::AttributeValue;
pub use entity::{id_from_location, Resource};
pub use errors::{ResourceError, ValidationErrors};
pub use path::{is_blank, param_value, params, query_string, to_query, Params, PrefixTemplate};
pub use query::{FindOptions, ResourceQuery};
pub use resource_type::{NestedFactory, ResourceType, ResourceTypeBuilder, ScopeFn, Validator};
pub use schema::{AttributeType, Schema};
pub use scope::RequestScope;
