//! Resource entities: attributes, lifecycle and persistence.
//!
//! A [`Resource`] is one record of a [`ResourceType`]. It starts out new,
//! becomes persisted once it is created remotely or loaded from a response,
//! and sends `POST`, `PUT`, `DELETE`, `HEAD` and `GET` requests for its own
//! lifecycle.
//!
//! # Example
//!
//! ```rust
//! use remote_resource::{Resource, ResourceType, SiteUrl};
//! use serde_json::json;
//!
//! let person = ResourceType::builder("Person")
//!     .site(SiteUrl::new("http://37s.sunrise.i:3000").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let mut matz = Resource::with_attributes(&person, json!({"name": "Matz"}), false).unwrap();
//! assert!(matz.is_new());
//! assert_eq!(matz.get("name").and_then(|v| v.as_str()), Some("Matz"));
//!
//! matz.set("age", 58);
//! assert_eq!(matz.to_value(), json!({"name": "Matz", "age": 58}));
//! ```

use super::attributes::AttributeValue;
use super::errors::{ResourceError, ValidationErrors};
use super::path::{param_value, Params};
use super::resource_type::ResourceType;
use crate::connection::{Body, Connection, HttpResponse};
use crate::format::FormatError;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

fn location_id_regex() -> &'static Regex {
    static LOCATION_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    LOCATION_ID_REGEX
        .get_or_init(|| Regex::new(r"/([^/]*?)(\.\w+)?$").expect("location pattern is valid"))
}

/// Extracts the id from a `Location` header such as `/people/5.json`.
///
/// All-digit ids are returned as integers.
#[must_use]
pub fn id_from_location(location: &str) -> Option<Value> {
    let path = location.split(['?', '#']).next().unwrap_or(location);
    let captures = location_id_regex().captures(path)?;
    let id = captures.get(1)?.as_str();
    if id.is_empty() {
        return None;
    }
    if id.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(number) = id.parse::<i64>() {
            return Some(Value::from(number));
        }
    }
    Some(Value::from(id))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

/// One record of a resource type.
#[derive(Clone, Debug)]
pub struct Resource {
    resource_type: ResourceType,
    attributes: BTreeMap<String, AttributeValue>,
    prefix_options: Params,
    persisted: bool,
    errors: ValidationErrors,
    connection: Option<Arc<Connection>>,
}

impl Resource {
    /// Creates an empty, new record.
    #[must_use]
    pub fn new(resource_type: &ResourceType) -> Self {
        Self {
            resource_type: resource_type.clone(),
            attributes: BTreeMap::new(),
            prefix_options: Params::new(),
            persisted: false,
            errors: ValidationErrors::new(),
            connection: None,
        }
    }

    /// Creates a record and loads `attributes` into it.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidAttributes`] if `attributes` is not a
    /// mapping.
    pub fn with_attributes(
        resource_type: &ResourceType,
        attributes: Value,
        persisted: bool,
    ) -> Result<Self, ResourceError> {
        let mut record = Self::new(resource_type);
        record.persisted = persisted;
        record.load(attributes, false)?;
        Ok(record)
    }

    pub(crate) fn bind_connection(&mut self, connection: Option<Arc<Connection>>) {
        self.connection = connection;
    }

    /// Returns the record's type.
    #[must_use]
    pub const fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    /// Returns every attribute.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    /// Returns the options substituted into the type's prefix.
    #[must_use]
    pub const fn prefix_options(&self) -> &Params {
        &self.prefix_options
    }

    /// Replaces the prefix options.
    pub fn set_prefix_options(&mut self, prefix_options: Params) {
        self.prefix_options = prefix_options;
    }

    /// Returns `true` until the record is saved or loaded from the service.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        !self.persisted
    }

    /// Returns `true` once the record exists remotely.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Returns the errors from the last validation.
    #[must_use]
    pub const fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Merges `attributes` into the record.
    ///
    /// A single top-level key is unwrapped only when it equals the element
    /// name, whatever `remove_root` says; other single keys stay attributes.
    /// Prefix options are then split out and merged into the record's own. Nested
    /// mappings become child records whose type is resolved with
    /// [`ResourceType::nested_type`].
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidAttributes`] if `attributes` (or the
    /// unwrapped root) is not a mapping.
    pub fn load(&mut self, attributes: Value, remove_root: bool) -> Result<&mut Self, ResourceError> {
        let Value::Object(mut map) = attributes else {
            return Err(self.invalid_attributes(&attributes));
        };

        let remove_root = if map.len() == 1 {
            map.contains_key(&self.resource_type.element_name())
        } else {
            remove_root
        };
        if remove_root && map.len() == 1 && map.values().next().is_some_and(Value::is_object) {
            let root = map.values_mut().next().map(Value::take);
            if let Some(Value::Object(inner)) = root {
                map = inner;
            }
        }

        let combined: Params = map.into_iter().collect();
        let (prefix_options, plain) = self.resource_type.split_options(&combined);
        self.prefix_options.extend(prefix_options);

        for (key, value) in plain {
            let attribute = self.materialize(&key, value)?;
            self.attributes.insert(key, attribute);
        }
        Ok(self)
    }

    fn materialize(&self, key: &str, value: Value) -> Result<AttributeValue, ResourceError> {
        match value {
            Value::Object(_) => {
                let nested_type = self.resource_type.nested_type(key, false);
                self.child(&nested_type, value)
            }
            Value::Array(items) => {
                let nested_type = items
                    .iter()
                    .any(Value::is_object)
                    .then(|| self.resource_type.nested_type(key, true));
                let items = items
                    .into_iter()
                    .map(|item| match &nested_type {
                        Some(nested_type) if item.is_object() => self.child(nested_type, item),
                        _ => Ok(AttributeValue::Value(item)),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AttributeValue::List(items))
            }
            scalar => Ok(AttributeValue::Value(scalar)),
        }
    }

    fn child(&self, nested_type: &ResourceType, value: Value) -> Result<AttributeValue, ResourceError> {
        let record = Self::with_attributes(nested_type, value, self.persisted)?;
        Ok(AttributeValue::Resource(Box::new(record)))
    }

    fn invalid_attributes(&self, found: &Value) -> ResourceError {
        ResourceError::InvalidAttributes {
            resource: self.resource_type.name().to_string(),
            found: describe(found).to_string(),
        }
    }

    // Attribute access.

    /// Returns an attribute if it is set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Returns an attribute for modification.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttributeValue> {
        self.attributes.get_mut(name)
    }

    /// Reads an attribute by name.
    ///
    /// Returns `Ok(None)` for known attributes that are not set.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownAttribute`] if the name is neither set
    /// nor known to the type.
    pub fn read(&self, name: &str) -> Result<Option<&AttributeValue>, ResourceError> {
        if let Some(value) = self.attributes.get(name) {
            return Ok(Some(value));
        }
        if self.resource_type.known_attributes().iter().any(|known| known == name) {
            return Ok(None);
        }
        Err(ResourceError::UnknownAttribute {
            resource: self.resource_type.name().to_string(),
            name: name.to_string(),
        })
    }

    /// Returns the truthiness of an attribute; a trailing `?` is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownAttribute`] like [`Resource::read`].
    pub fn query(&self, name: &str) -> Result<bool, ResourceError> {
        let name = name.strip_suffix('?').unwrap_or(name);
        Ok(self.read(name)?.is_some_and(AttributeValue::is_truthy))
    }

    /// Sets an attribute.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> &mut Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Removes an attribute.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    /// Returns `true` if `name` (optionally suffixed with `?` or `=`) can be
    /// read or written.
    #[must_use]
    pub fn respond_to(&self, name: &str) -> bool {
        if let Some(stripped) = name.strip_suffix('=') {
            return !stripped.is_empty();
        }
        let name = name.strip_suffix('?').unwrap_or(name);
        self.attributes.contains_key(name)
            || self.resource_type.known_attributes().iter().any(|known| known == name)
    }

    /// Returns a schema-declared attribute cast to its declared type.
    ///
    /// Returns `None` for attributes the schema does not declare.
    #[must_use]
    pub fn typed(&self, name: &str) -> Option<Value> {
        let attribute_type = self.resource_type.schema()?.get(name)?;
        let value = self
            .attributes
            .get(name)
            .map_or(Value::Null, AttributeValue::to_json);
        Some(attribute_type.cast(&value))
    }

    /// Returns the schema names plus every set attribute name.
    #[must_use]
    pub fn known_attributes(&self) -> Vec<String> {
        let mut known = self.resource_type.known_attributes();
        for name in self.attributes.keys() {
            if !known.contains(name) {
                known.push(name.clone());
            }
        }
        known
    }

    /// Returns the primary key value.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.attributes
            .get(&self.resource_type.primary_key())
            .and_then(AttributeValue::as_value)
            .filter(|id| !id.is_null())
    }

    /// Sets the primary key value.
    pub fn set_id(&mut self, id: impl Into<Value>) -> &mut Self {
        let primary_key = self.resource_type.primary_key();
        self.set(primary_key, AttributeValue::Value(id.into()))
    }

    /// Returns the id as it appears in a path.
    #[must_use]
    pub fn id_param(&self) -> Option<String> {
        self.id().map(param_value)
    }

    /// Converts the attributes back to JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.attributes
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect::<Map<String, Value>>(),
        )
    }

    /// Deserializes the attributes into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Format`] if the attributes do not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ResourceError> {
        Ok(serde_json::from_value(self.to_value()).map_err(FormatError::from)?)
    }

    /// Encodes the record with the type's format, rooted at the element name.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Format`] if encoding fails.
    pub fn encode(&self) -> Result<String, ResourceError> {
        let element_name = self.resource_type.element_name();
        Ok(self
            .resource_type
            .format()
            .encode(&self.to_value(), Some(&element_name))?)
    }

    /// Copies the record as a new one, without the primary key and without
    /// nested records.
    #[must_use]
    pub fn clone_as_new(&self) -> Self {
        let primary_key = self.resource_type.primary_key();
        let mut copy = Self::new(&self.resource_type);
        copy.prefix_options = self.prefix_options.clone();
        copy.connection = self.connection.clone();
        copy.attributes = self
            .attributes
            .iter()
            .filter(|(key, value)| {
                **key != primary_key && !matches!(value, AttributeValue::Resource(_))
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        copy
    }

    // Validation.

    /// Runs the type's validation hook and stores the result.
    pub fn is_valid(&mut self) -> bool {
        self.errors = self.resource_type.validate(self);
        self.errors.is_empty()
    }

    // Persistence.

    fn connection(&self) -> Result<Arc<Connection>, ResourceError> {
        match &self.connection {
            Some(connection) => Ok(Arc::clone(connection)),
            None => self.resource_type.connection(),
        }
    }

    fn require_id(&self, operation: &'static str) -> Result<Value, ResourceError> {
        self.id().cloned().ok_or_else(|| ResourceError::MissingId {
            resource: self.resource_type.name().to_string(),
            operation,
        })
    }

    fn own_path(&self, operation: &'static str) -> Result<String, ResourceError> {
        if self.resource_type.is_singleton() {
            return self.resource_type.singleton_path(&self.prefix_options, None);
        }
        let id = self.require_id(operation)?;
        self.resource_type
            .element_path(id, &self.prefix_options, Some(&Params::new()))
    }

    /// Creates or updates the record remotely.
    ///
    /// Returns `Ok(false)` without sending anything if validation fails.
    ///
    /// # Errors
    ///
    /// Returns the [`ResourceError`] for any failed request.
    pub async fn save(&mut self) -> Result<bool, ResourceError> {
        if !self.is_valid() {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Like [`Resource::save`], but local validation failure is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Invalid`] if validation fails, otherwise the
    /// error of any failed request.
    pub async fn save_strict(&mut self) -> Result<(), ResourceError> {
        if !self.is_valid() {
            return Err(ResourceError::Invalid {
                resource: self.resource_type.name().to_string(),
                errors: self.errors.clone(),
            });
        }
        self.persist().await
    }

    async fn persist(&mut self) -> Result<(), ResourceError> {
        if self.is_new() {
            self.create().await
        } else {
            self.update().await
        }
    }

    async fn create(&mut self) -> Result<(), ResourceError> {
        let path = if self.resource_type.is_singleton() {
            self.resource_type.singleton_path(&self.prefix_options, None)?
        } else {
            self.resource_type
                .collection_path(&self.prefix_options, Some(&Params::new()))?
        };
        let body = Body::Text(self.encode()?);
        let response = self
            .connection()?
            .post(&path, body, &self.resource_type.headers())
            .await?;

        if let Some(id) = response.location().and_then(id_from_location) {
            self.set_id(id);
        }
        self.persisted = true;
        self.load_response(response)
    }

    async fn update(&mut self) -> Result<(), ResourceError> {
        let path = self.own_path("update")?;
        let body = Body::Text(self.encode()?);
        let response = self
            .connection()?
            .put(&path, body, &self.resource_type.headers())
            .await?;
        self.load_response(response)
    }

    fn load_response(&mut self, response: HttpResponse) -> Result<(), ResourceError> {
        if !response.has_loadable_body() {
            return Ok(());
        }
        match response.body {
            Body::Data(data @ Value::Object(_)) => {
                self.load(data, false)?;
            }
            Body::Data(other) => {
                tracing::warn!(
                    "Ignoring {} response body for {}; expected a mapping",
                    describe(&other),
                    self.resource_type.name()
                );
            }
            Body::Text(_) | Body::Empty => {}
        }
        Ok(())
    }

    /// Deletes the record remotely. The record itself is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingId`] for records without an id,
    /// otherwise the error of the failed request.
    pub async fn destroy(&self) -> Result<HttpResponse, ResourceError> {
        let path = self.own_path("destroy")?;
        Ok(self
            .connection()?
            .delete(&path, &self.resource_type.headers())
            .await?)
    }

    /// Returns `true` if the record exists remotely.
    ///
    /// New records return `false` without a request; 404 and 410 responses
    /// also mean `false`.
    ///
    /// # Errors
    ///
    /// Returns any other request failure.
    pub async fn exists(&self) -> Result<bool, ResourceError> {
        if self.is_new() {
            return Ok(false);
        }
        let path = self.own_path("check")?;
        match self
            .connection()?
            .head(&path, &self.resource_type.headers())
            .await
        {
            Ok(response) => Ok(response.status == 200),
            Err(error) if error.is_not_found() || error.is_gone() => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    /// Fetches the record again and merges the result. Prefix options are
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingId`] for records without an id,
    /// otherwise the error of the failed request.
    pub async fn reload(&mut self) -> Result<&mut Self, ResourceError> {
        let path = self.own_path("reload")?;
        let response = self
            .connection()?
            .get(&path, &self.resource_type.headers())
            .await?;
        match response.body {
            Body::Data(data) => {
                self.load(data, false)?;
            }
            Body::Text(_) | Body::Empty => {
                return Err(self.invalid_attributes(&Value::Null));
            }
        }
        self.persisted = true;
        Ok(self)
    }

    /// Sets one attribute and saves.
    ///
    /// # Errors
    ///
    /// See [`Resource::save`].
    pub async fn update_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Result<bool, ResourceError> {
        self.set(name, value);
        self.save().await
    }

    /// Loads `attributes` and saves.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidAttributes`] for non-mappings,
    /// otherwise see [`Resource::save`].
    pub async fn update_attributes(&mut self, attributes: Value) -> Result<bool, ResourceError> {
        self.load(attributes, false)?;
        self.save().await
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.resource_type == other.resource_type
                && self.persisted
                && other.persisted
                && self.id().is_some()
                && self.id() == other.id()
                && self.prefix_options == other.prefix_options)
    }
}
