//! Declared attribute types.

use serde_json::Value;
use std::collections::BTreeMap;

/// Type of a schema-declared attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttributeType {
    /// Free-form string.
    String,
    /// Long text; same wire shape as `String`.
    Text,
    /// Whole number.
    Integer,
    /// Floating point number.
    Float,
    /// Decimal number, kept as a string to avoid precision loss.
    Decimal,
    /// Boolean.
    Boolean,
    /// Date and time string.
    Datetime,
    /// Date string.
    Date,
}

impl AttributeType {
    /// Parses a type name such as `"integer"` or `"datetime"`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "text" => Some(Self::Text),
            "integer" | "int" => Some(Self::Integer),
            "float" | "double" => Some(Self::Float),
            "decimal" => Some(Self::Decimal),
            "boolean" | "bool" => Some(Self::Boolean),
            "datetime" | "timestamp" => Some(Self::Datetime),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    /// Returns the canonical type name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
            Self::Date => "date",
        }
    }

    /// Coerces a raw value to this type.
    ///
    /// Null stays null. Values that cannot be coerced are returned unchanged.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cast(&self, value: &Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        match self {
            Self::String | Self::Text | Self::Datetime | Self::Date | Self::Decimal => {
                match value {
                    Value::String(_) => value.clone(),
                    Value::Number(n) => Value::String(n.to_string()),
                    Value::Bool(b) => Value::String(b.to_string()),
                    other => other.clone(),
                }
            }
            Self::Integer => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => value.clone(),
                Value::Number(n) => n
                    .as_f64()
                    .map_or_else(|| value.clone(), |f| Value::from(f.trunc() as i64)),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map_or_else(|_| value.clone(), Value::from),
                Value::Bool(b) => Value::from(i64::from(*b)),
                other => other.clone(),
            },
            Self::Float => match value {
                Value::Number(n) => n.as_f64().map_or_else(|| value.clone(), Value::from),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map_or_else(|_| value.clone(), Value::from),
                other => other.clone(),
            },
            Self::Boolean => match value {
                Value::Bool(_) => value.clone(),
                Value::Number(n) => Value::Bool(n.as_f64().is_some_and(|f| f != 0.0)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "t" | "yes" | "y" => Value::Bool(true),
                    "false" | "0" | "f" | "no" | "n" | "" => Value::Bool(false),
                    _ => value.clone(),
                },
                other => other.clone(),
            },
        }
    }
}

/// Attribute name to type mapping declared on a resource type.
///
/// # Example
///
/// ```rust
/// use remote_resource::resource::{AttributeType, Schema};
///
/// let schema = Schema::new().string("name").integer("age");
/// assert_eq!(schema.get("age"), Some(AttributeType::Integer));
/// assert_eq!(schema.names().collect::<Vec<_>>(), vec!["age", "name"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    attributes: BTreeMap<String, AttributeType>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        self.attributes.insert(name.into(), attribute_type);
        self
    }

    /// Declares a string attribute.
    #[must_use]
    pub fn string(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::String)
    }

    /// Declares an integer attribute.
    #[must_use]
    pub fn integer(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::Integer)
    }

    /// Declares a float attribute.
    #[must_use]
    pub fn float(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::Float)
    }

    /// Declares a boolean attribute.
    #[must_use]
    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::Boolean)
    }

    /// Returns the declared type of an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<AttributeType> {
        self.attributes.get(name).copied()
    }

    /// Returns `true` if the attribute is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Iterates declared attribute names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Returns the number of declared attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
