//! Attribute values held by a [`Resource`].

use super::entity::Resource;
use serde_json::Value;

/// One attribute of a resource.
///
/// Nested mappings become child resources and sequences become lists so
/// callers can walk loaded object graphs without re-parsing JSON.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    /// A scalar, or any value that was set directly.
    Value(Value),
    /// A nested resource.
    Resource(Box<Resource>),
    /// A sequence of values or nested resources.
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns the raw value for [`AttributeValue::Value`].
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the string for a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Returns the integer for an integer value.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    /// Returns the number for a numeric value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    /// Returns the boolean for a boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// Returns the nested resource.
    #[must_use]
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Self::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    /// Returns the nested resource for modification.
    pub fn as_resource_mut(&mut self) -> Option<&mut Resource> {
        match self {
            Self::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    /// Returns the list items.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts back to plain JSON, recursing into nested resources.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Resource(resource) => resource.to_value(),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// Only null and `false` are falsy.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Self::Value(Value::Null | Value::Bool(false)))
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<Resource> for AttributeValue {
    fn from(resource: Resource) -> Self {
        Self::Resource(Box::new(resource))
    }
}

impl From<Vec<Self>> for AttributeValue {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        assert_eq!(AttributeValue::from("Matz").as_str(), Some("Matz"));
        assert_eq!(AttributeValue::from(5).as_i64(), Some(5));
        assert_eq!(AttributeValue::from(true).as_bool(), Some(true));
        assert!(AttributeValue::from("Matz").as_resource().is_none());
    }

    #[test]
    fn test_truthiness() {
        assert!(!AttributeValue::from(json!(null)).is_truthy());
        assert!(!AttributeValue::from(false).is_truthy());
        assert!(AttributeValue::from(0).is_truthy());
        assert!(AttributeValue::from("").is_truthy());
        assert!(AttributeValue::List(Vec::new()).is_truthy());
    }

    #[test]
    fn test_list_to_json() {
        let list = AttributeValue::from(vec![AttributeValue::from(1), AttributeValue::from("a")]);
        assert_eq!(list.to_json(), json!([1, "a"]));
        assert_eq!(list.as_list().map(<[AttributeValue]>::len), Some(2));
    }
}
