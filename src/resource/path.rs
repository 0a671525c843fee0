//! Prefix templates and query strings.
//!
//! A prefix such as `/posts/:post_id/` names the options a nested resource
//! needs to build its paths. [`PrefixTemplate`] scans the placeholders once,
//! substitutes escaped values at request time, and splits a combined option
//! map into prefix options and query options.
//!
//! # Example
//!
//! ```rust
//! use remote_resource::resource::{params, to_query, PrefixTemplate};
//! use serde_json::json;
//!
//! let prefix = PrefixTemplate::new("/posts/:post_id/");
//! let options = params(json!({"post_id": 1, "page": 2}));
//!
//! assert_eq!(prefix.render(&options).unwrap(), "/posts/1/");
//!
//! let (prefix_options, query_options) = prefix.split_options(&options);
//! assert_eq!(prefix_options, params(json!({"post_id": 1})));
//! assert_eq!(to_query(&query_options), "page=2");
//! ```

use super::errors::ResourceError;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Option map used for prefix substitution and query strings.
pub type Params = BTreeMap<String, Value>;

/// Builds [`Params`] from a JSON object; any other value yields an empty map.
#[must_use]
pub fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => Params::new(),
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r":([A-Za-z0-9_]+)").expect("placeholder pattern is valid"))
}

/// A compiled path prefix with `:name` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixTemplate {
    source: String,
    parameters: Vec<String>,
}

impl PrefixTemplate {
    /// Compiles a template, caching its placeholder names in order of first
    /// appearance.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut parameters: Vec<String> = Vec::new();
        for captures in placeholder_regex().captures_iter(&source) {
            let name = captures[1].to_string();
            if !parameters.contains(&name) {
                parameters.push(name);
            }
        }
        Self { source, parameters }
    }

    /// Returns the template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the placeholder names.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Returns `true` if `name` is a placeholder.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|parameter| parameter == name)
    }

    /// Verifies every placeholder has a non-blank value.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingPrefixParam`] naming the first
    /// placeholder that is missing or blank.
    pub fn check(&self, options: &Params) -> Result<(), ResourceError> {
        for parameter in &self.parameters {
            if options.get(parameter).map_or(true, is_blank) {
                return Err(ResourceError::MissingPrefixParam {
                    param: parameter.clone(),
                });
            }
        }
        Ok(())
    }

    /// Substitutes every placeholder with its percent-escaped value.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingPrefixParam`] if a placeholder is
    /// missing or blank.
    pub fn render(&self, options: &Params) -> Result<String, ResourceError> {
        self.check(options)?;
        let rendered = placeholder_regex().replace_all(&self.source, |captures: &Captures<'_>| {
            options
                .get(&captures[1])
                .map(|value| urlencoding::encode(&param_value(value)).into_owned())
                .unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }

    /// Splits options into `(prefix options, query options)`.
    ///
    /// Keys that are placeholders go to the first map; everything else to
    /// the second. Empty keys are dropped.
    #[must_use]
    pub fn split_options(&self, options: &Params) -> (Params, Params) {
        let mut prefix_options = Params::new();
        let mut query_options = Params::new();
        for (key, value) in options {
            if key.trim().is_empty() {
                continue;
            }
            if self.has_parameter(key) {
                prefix_options.insert(key.clone(), value.clone());
            } else {
                query_options.insert(key.clone(), value.clone());
            }
        }
        (prefix_options, query_options)
    }
}

/// Returns `true` for values treated as absent: null, `false`, blank strings
/// and empty collections.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Renders a scalar as it appears in a path or query string.
#[must_use]
pub fn param_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    urlencoding::encode(text).replace("%20", "+")
}

fn value_to_query(key: &str, value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let key = format!("{key}[]");
            if items.is_empty() {
                return format!("{}=", escape(&key));
            }
            items
                .iter()
                .map(|item| value_to_query(&key, item))
                .collect::<Vec<_>>()
                .join("&")
        }
        Value::Object(map) => {
            let mut parts: Vec<String> = map
                .iter()
                .map(|(sub, item)| value_to_query(&format!("{key}[{sub}]"), item))
                .filter(|part| !part.is_empty())
                .collect();
            parts.sort();
            parts.join("&")
        }
        Value::Null => format!("{}=", escape(key)),
        other => format!("{}={}", escape(key), escape(&param_value(other))),
    }
}

/// Encodes options as a form-style query: sorted `key=value` pairs, arrays
/// as `key[]=v`, nested maps as `key[sub]=v`, null as `key=`.
#[must_use]
pub fn to_query(options: &Params) -> String {
    let mut parts: Vec<String> = options
        .iter()
        .map(|(key, value)| value_to_query(key, value))
        .filter(|part| !part.is_empty())
        .collect();
    parts.sort();
    parts.join("&")
}

/// Returns `?` plus [`to_query`], or an empty string when there are no
/// options.
#[must_use]
pub fn query_string(options: &Params) -> String {
    let query = to_query(options);
    if query.is_empty() {
        String::new()
    } else {
        format!("?{query}")
    }
}
