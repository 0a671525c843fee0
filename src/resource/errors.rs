//! Resource-level error types.
//!
//! [`ResourceError`] is what every resource type, entity and scope operation
//! returns. Wire failures arrive wrapped as [`ResourceError::Connection`];
//! the helpers below let callers test for the common cases without matching
//! through the nesting.
//!
//! # Example
//!
//! ```rust
//! use remote_resource::{Params, ResourceError, ResourceType, SiteUrl};
//!
//! let comment = ResourceType::builder("Comment")
//!     .site(SiteUrl::new("http://37s.sunrise.i:3000").unwrap())
//!     .prefix("/posts/:post_id/")
//!     .build()
//!     .unwrap();
//!
//! let error = comment.collection_path(&Params::new(), None).unwrap_err();
//! assert!(matches!(error, ResourceError::MissingPrefixParam { ref param } if param == "post_id"));
//! assert_eq!(error.to_string(), "post_id prefix_option is missing");
//! ```

use crate::connection::{ClientError, ConnectionError};
use crate::error::ConfigError;
use crate::format::FormatError;
use std::collections::BTreeMap;
use thiserror::Error;

/// Validation messages keyed by attribute name (`"base"` for the record).
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

/// Errors returned by resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A prefix placeholder had no (or a blank) value.
    #[error("{param} prefix_option is missing")]
    MissingPrefixParam {
        /// The placeholder name.
        param: String,
    },

    /// `load` was given something other than a mapping.
    #[error("expected an attributes mapping for {resource}, got {found}")]
    InvalidAttributes {
        /// The resource type name.
        resource: String,
        /// Description of the value that was given.
        found: String,
    },

    /// An attribute is neither set nor known to the resource type.
    #[error("undefined attribute '{name}' for {resource}")]
    UnknownAttribute {
        /// The resource type name.
        resource: String,
        /// The attribute name.
        name: String,
    },

    /// A scope name was not defined on the resource type.
    #[error("undefined scope '{name}' for {resource}")]
    UnknownScope {
        /// The resource type name.
        resource: String,
        /// The scope name.
        name: String,
    },

    /// An operation that needs an id was called on a record without one.
    #[error("cannot {operation} a {resource} without an id")]
    MissingId {
        /// The resource type name.
        resource: String,
        /// The attempted operation.
        operation: &'static str,
    },

    /// Local validation failed before any request was sent.
    #[error("Validation failed for {resource}: {}", format_messages(.errors))]
    Invalid {
        /// The resource type name.
        resource: String,
        /// Messages per attribute.
        errors: ValidationErrors,
    },

    /// Transport or status error.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Encoding error.
    #[error(transparent)]
    Format(#[from] FormatError),
}

fn format_messages(errors: &ValidationErrors) -> String {
    full_messages(errors).join(", ")
}

fn full_messages(errors: &ValidationErrors) -> Vec<String> {
    errors
        .iter()
        .flat_map(|(field, messages)| {
            messages.iter().map(move |message| {
                if field == "base" {
                    message.clone()
                } else {
                    format!("{field} {message}")
                }
            })
        })
        .collect()
}

impl From<ClientError> for ResourceError {
    fn from(error: ClientError) -> Self {
        Self::Connection(ConnectionError::Client(error))
    }
}

impl ResourceError {
    /// Returns the HTTP status for status-derived errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Connection(error) => error.status(),
            _ => None,
        }
    }

    /// Returns `true` for 404 responses.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Connection(error) if error.is_not_found())
    }

    /// Returns `true` for 410 responses.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(self, Self::Connection(error) if error.is_gone())
    }

    /// Returns `true` for local validation failures and 422 responses.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(
            self,
            Self::Invalid { .. }
                | Self::Connection(ConnectionError::Client(ClientError::ResourceInvalid(_)))
        )
    }

    /// Returns validation messages from a local failure or a 422 body.
    #[must_use]
    pub fn validation_messages(&self) -> Vec<String> {
        match self {
            Self::Invalid { errors, .. } => full_messages(errors),
            Self::Connection(ConnectionError::Client(ClientError::ResourceInvalid(failure))) => {
                failure.validation_errors()
            }
            _ => Vec::new(),
        }
    }
}
