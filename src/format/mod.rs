//! Wire formats for resource payloads.
//!
//! A [`Format`] turns attribute data (`serde_json::Value`) into wire text and
//! back. Two codecs ship with the crate:
//!
//! - [`JsonFormat`] (`application/json`, `.json` paths), the default
//! - [`XmlFormat`] (`text/xml`, `.xml` paths), Rails-style typed XML
//!
//! Decoding never strips a root key. Root stripping happens once, centrally,
//! in the connection pipeline via [`remove_root`], so a payload is unwrapped
//! the same way whatever format it arrived in.
//!
//! # Example
//!
//! ```rust
//! use remote_resource::format::{self, remove_root};
//! use serde_json::json;
//!
//! let json = format::lookup("json").unwrap();
//! let body = json.encode(&json!({"name": "Matz"}), Some("person")).unwrap();
//! assert_eq!(body, r#"{"person":{"name":"Matz"}}"#);
//!
//! let decoded = remove_root(json.decode(&body).unwrap());
//! assert_eq!(decoded, json!({"name": "Matz"}));
//! ```

mod json;
mod xml;

pub use json::JsonFormat;
pub use xml::XmlFormat;

use crate::error::ConfigError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Shared handle to a format codec.
pub type FormatRef = Arc<dyn Format>;

/// Errors produced while encoding or decoding a payload.
#[derive(Debug, Error)]
pub enum FormatError {
    /// JSON could not be parsed or produced.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// XML could not be parsed or produced.
    #[error("Invalid XML: {reason}")]
    Xml {
        /// Description of the problem.
        reason: String,
    },
}

impl FormatError {
    pub(crate) fn xml(reason: impl fmt::Display) -> Self {
        Self::Xml {
            reason: reason.to_string(),
        }
    }
}

/// A wire format codec.
///
/// Implementations must be stateless; the same instance is shared by every
/// connection using it.
pub trait Format: Send + Sync + fmt::Debug {
    /// Short name used for lookup, such as `"json"`.
    fn name(&self) -> &'static str;

    /// File extension appended to resource paths.
    fn extension(&self) -> &'static str;

    /// MIME type sent as `Content-Type` and `Accept`.
    fn mime_type(&self) -> &'static str;

    /// Encodes `data`, wrapping it under `root` when given.
    ///
    /// String values are already encoded and pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the value cannot be serialized.
    fn encode(&self, data: &Value, root: Option<&str>) -> Result<String, FormatError>;

    /// Decodes wire text into a value.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the text is not valid for this format.
    fn decode(&self, body: &str) -> Result<Value, FormatError>;
}

/// Returns the shared JSON codec.
#[must_use]
pub fn json() -> FormatRef {
    Arc::new(JsonFormat)
}

/// Returns the shared XML codec.
#[must_use]
pub fn xml() -> FormatRef {
    Arc::new(XmlFormat)
}

/// Looks up a codec by name.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownFormat`] for names other than `json` and `xml`.
pub fn lookup(name: &str) -> Result<FormatRef, ConfigError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(json()),
        "xml" => Ok(xml()),
        _ => Err(ConfigError::UnknownFormat {
            name: name.to_string(),
        }),
    }
}

/// Replaces a mapping that has exactly one key with that key's value.
///
/// Anything else is returned unchanged. Applying it to its own output is a
/// no-op unless the unwrapped value is itself a single-key mapping.
#[must_use]
pub fn remove_root(data: Value) -> Value {
    match data {
        Value::Object(mut map) if map.len() == 1 => {
            let key = map.keys().next().cloned().unwrap_or_default();
            map.remove(&key).unwrap_or(Value::Null)
        }
        other => other,
    }
}
