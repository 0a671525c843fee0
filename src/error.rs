//! Configuration error types.
//!
//! Every resource type setter and builder that validates its input returns
//! `Result<T, ConfigError>`, so a bad site URL or an unknown format name is
//! reported when it is configured rather than on the first request.
//!
//! # Example
//!
//! ```rust
//! use remote_resource::{ConfigError, SiteUrl};
//!
//! let result = SiteUrl::new("not a url");
//! assert!(matches!(result, Err(ConfigError::InvalidSiteUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur while configuring a resource type or its connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The site URL could not be parsed or has no host.
    #[error("Invalid site URL '{url}'. Expected an absolute http(s) URL such as 'http://api.example.com'.")]
    InvalidSiteUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// The proxy URL could not be parsed.
    #[error("Invalid proxy URL '{url}'.")]
    InvalidProxyUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// No site is configured on the resource type or any of its parents.
    #[error("No site configured for '{resource}'. Set a site before issuing requests.")]
    MissingSite {
        /// Name of the resource type.
        resource: String,
    },

    /// The format name does not match a known codec.
    #[error("Unknown format '{name}'. Expected 'json' or 'xml'.")]
    UnknownFormat {
        /// The unknown format name.
        name: String,
    },

    /// The TLS certificate file could not be read or parsed.
    #[error("Invalid CA certificate '{path}': {reason}")]
    InvalidCertificate {
        /// Path of the certificate file.
        path: String,
        /// Why the certificate was rejected.
        reason: String,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {reason}")]
    HttpClient {
        /// The reason reported by the HTTP client.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_site_url_error_message() {
        let error = ConfigError::InvalidSiteUrl {
            url: "nope".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("nope"));
        assert!(message.contains("absolute http(s) URL"));
    }

    #[test]
    fn test_missing_site_error_names_resource() {
        let error = ConfigError::MissingSite {
            resource: "Person".to_string(),
        };
        assert!(error.to_string().contains("Person"));
    }

    #[test]
    fn test_unknown_format_error_message() {
        let error = ConfigError::UnknownFormat {
            name: "yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unknown format 'yaml'. Expected 'json' or 'xml'."
        );
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::MissingSite {
            resource: "Person".to_string(),
        };
        let _: &dyn std::error::Error = &error;
    }
}
