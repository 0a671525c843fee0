//! Class-level queries shared by resource types and scopes.

use super::entity::Resource;
use super::errors::ResourceError;
use super::path::{params, query_string, Params};
use super::resource_type::ResourceType;
use crate::connection::{Body, Connection, HttpResponse};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Options for collection queries.
///
/// `from` replaces the collection path with a custom one; `params` are
/// split into prefix options and query options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    /// Custom path to fetch instead of the collection path.
    pub from: Option<String>,
    /// Combined prefix and query options.
    pub params: Params,
}

impl FindOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches from a custom path.
    #[must_use]
    pub fn from(mut self, path: impl Into<String>) -> Self {
        self.from = Some(path.into());
        self
    }

    /// Replaces all parameters.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Adds one parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

fn response_data(response: HttpResponse, resource_type: &ResourceType) -> Result<Value, ResourceError> {
    match response.body {
        Body::Data(data) => Ok(data),
        Body::Text(_) | Body::Empty => Err(ResourceError::InvalidAttributes {
            resource: resource_type.name().to_string(),
            found: "an empty or undecodable body".to_string(),
        }),
    }
}

/// Finders and constructors available on a [`ResourceType`] and on a
/// [`RequestScope`](super::RequestScope).
///
/// Every method sends at most one request.
#[allow(async_fn_in_trait)]
pub trait ResourceQuery {
    /// The type being queried.
    fn resource_type(&self) -> &ResourceType;

    /// The connection that overrides the type's own, if any.
    fn scoped_connection(&self) -> Option<Arc<Connection>>;

    /// Returns the connection requests are sent through.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the type's connection cannot be built.
    fn connection(&self) -> Result<Arc<Connection>, ResourceError> {
        match self.scoped_connection() {
            Some(connection) => Ok(connection),
            None => self.resource_type().connection(),
        }
    }

    /// Builds a persisted record from response data.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidAttributes`] for non-mappings.
    fn instantiate(&self, data: Value, prefix_options: &Params) -> Result<Resource, ResourceError> {
        let mut record = Resource::with_attributes(self.resource_type(), data, true)?;
        let mut combined = prefix_options.clone();
        combined.extend(record.prefix_options().clone());
        record.set_prefix_options(combined);
        record.bind_connection(self.scoped_connection());
        Ok(record)
    }

    /// Builds persisted records from a collection response.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidAttributes`] if an item is not a
    /// mapping.
    fn instantiate_collection(
        &self,
        body: Body,
        prefix_options: &Params,
    ) -> Result<Vec<Resource>, ResourceError> {
        match body {
            Body::Data(Value::Array(items)) => items
                .into_iter()
                .map(|item| self.instantiate(item, prefix_options))
                .collect(),
            Body::Data(Value::Null) | Body::Empty => Ok(Vec::new()),
            Body::Data(item) => Ok(vec![self.instantiate(item, prefix_options)?]),
            Body::Text(_) => Err(ResourceError::InvalidAttributes {
                resource: self.resource_type().name().to_string(),
                found: "an undecodable body".to_string(),
            }),
        }
    }

    /// Fetches one record by id.
    ///
    /// # Errors
    ///
    /// Returns a 404 as a `ResourceNotFound` client error, and any other
    /// request failure.
    async fn find(&self, id: impl Into<Value>, params: &Params) -> Result<Resource, ResourceError> {
        let resource_type = self.resource_type();
        let (prefix_options, query_options) = resource_type.split_options(params);
        let path = resource_type.element_path(id, &prefix_options, Some(&query_options))?;
        let response = self
            .connection()?
            .get(&path, &resource_type.headers())
            .await?;
        self.instantiate(response_data(response, resource_type)?, &prefix_options)
    }

    /// Fetches a collection. A 404 yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns any request failure other than 404.
    async fn find_all(&self, options: FindOptions) -> Result<Vec<Resource>, ResourceError> {
        let resource_type = self.resource_type();
        let (prefix_options, query_options) = resource_type.split_options(&options.params);
        let path = match &options.from {
            Some(from) => format!("{from}{}", query_string(&options.params)),
            None => resource_type.collection_path(&prefix_options, Some(&query_options))?,
        };

        match self
            .connection()?
            .get(&path, &resource_type.headers())
            .await
        {
            Ok(response) => self.instantiate_collection(response.body, &prefix_options),
            Err(error) if error.is_not_found() => Ok(Vec::new()),
            Err(error) => Err(error.into()),
        }
    }

    /// Fetches the whole collection.
    ///
    /// # Errors
    ///
    /// See [`ResourceQuery::find_all`].
    async fn all(&self) -> Result<Vec<Resource>, ResourceError> {
        self.find_all(FindOptions::new()).await
    }

    /// Returns the first record of a collection query.
    ///
    /// # Errors
    ///
    /// See [`ResourceQuery::find_all`].
    async fn first(&self, options: FindOptions) -> Result<Option<Resource>, ResourceError> {
        Ok(self.find_all(options).await?.into_iter().next())
    }

    /// Returns the last record of a collection query.
    ///
    /// # Errors
    ///
    /// See [`ResourceQuery::find_all`].
    async fn last(&self, options: FindOptions) -> Result<Option<Resource>, ResourceError> {
        Ok(self.find_all(options).await?.into_iter().last())
    }

    /// Fetches a single record from a custom path. Without `from` nothing is
    /// sent and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns any request failure.
    async fn find_one(&self, options: FindOptions) -> Result<Option<Resource>, ResourceError> {
        let Some(from) = &options.from else {
            return Ok(None);
        };
        let resource_type = self.resource_type();
        let path = format!("{from}{}", query_string(&options.params));
        let response = self
            .connection()?
            .get(&path, &resource_type.headers())
            .await?;
        let record = self.instantiate(response_data(response, resource_type)?, &Params::new())?;
        Ok(Some(record))
    }

    /// Fetches a singleton resource.
    ///
    /// # Errors
    ///
    /// Returns any request failure.
    async fn find_singleton(&self, params: &Params) -> Result<Resource, ResourceError> {
        let resource_type = self.resource_type();
        let (prefix_options, query_options) = resource_type.split_options(params);
        let path = resource_type.singleton_path(&prefix_options, Some(&query_options))?;
        let response = self
            .connection()?
            .get(&path, &resource_type.headers())
            .await?;
        self.instantiate(response_data(response, resource_type)?, &prefix_options)
    }

    /// Creates a record remotely and returns it.
    ///
    /// If local validation fails nothing is sent and the returned record is
    /// still new, with its errors set.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidAttributes`] for non-mappings, and any
    /// request failure.
    async fn create(&self, attributes: Value) -> Result<Resource, ResourceError> {
        let mut record = Resource::with_attributes(self.resource_type(), attributes, false)?;
        record.bind_connection(self.scoped_connection());
        record.save().await?;
        Ok(record)
    }

    /// Fetches the new-record template and merges `attributes` over it.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidAttributes`] for non-mappings, and any
    /// request failure.
    async fn build(&self, attributes: Value) -> Result<Resource, ResourceError> {
        let resource_type = self.resource_type();
        let Value::Object(given) = attributes else {
            return Err(ResourceError::InvalidAttributes {
                resource: resource_type.name().to_string(),
                found: "a non-mapping value".to_string(),
            });
        };
        let (prefix_options, _) = resource_type.split_options(&params(Value::Object(given.clone())));
        let path = resource_type.new_element_path(&prefix_options)?;
        let response = self
            .connection()?
            .get(&path, &resource_type.headers())
            .await?;

        let mut template = match response.body {
            Body::Data(Value::Object(template)) => template,
            _ => Map::new(),
        };
        template.extend(given);
        let mut record = Resource::with_attributes(resource_type, Value::Object(template), false)?;
        record.bind_connection(self.scoped_connection());
        Ok(record)
    }

    /// Deletes a record by id.
    ///
    /// # Errors
    ///
    /// Returns any request failure.
    async fn delete(&self, id: impl Into<Value>, params: &Params) -> Result<HttpResponse, ResourceError> {
        let resource_type = self.resource_type();
        let (prefix_options, query_options) = resource_type.split_options(params);
        let path = resource_type.element_path(id, &prefix_options, Some(&query_options))?;
        Ok(self
            .connection()?
            .delete(&path, &resource_type.headers())
            .await?)
    }

    /// Returns `true` if a `HEAD` on the element path answers 200.
    /// 404 and 410 mean `false`.
    ///
    /// # Errors
    ///
    /// Returns any other request failure.
    async fn exists(&self, id: impl Into<Value>, params: &Params) -> Result<bool, ResourceError> {
        let resource_type = self.resource_type();
        let (prefix_options, query_options) = resource_type.split_options(params);
        let path = resource_type.element_path(id, &prefix_options, Some(&query_options))?;
        match self
            .connection()?
            .head(&path, &resource_type.headers())
            .await
        {
            Ok(response) => Ok(response.status == 200),
            Err(error) if error.is_not_found() || error.is_gone() => Ok(false),
            Err(error) => Err(error.into()),
        }
    }
}

impl ResourceQuery for ResourceType {
    fn resource_type(&self) -> &ResourceType {
        self
    }

    fn scoped_connection(&self) -> Option<Arc<Connection>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Adapter, SiteUrl};
    use crate::connection::{StubResponse, Stubs};
    use serde_json::json;

    fn person(stubs: &Stubs) -> ResourceType {
        ResourceType::builder("Person")
            .site(SiteUrl::new("http://37s.sunrise.i:3000").unwrap())
            .adapter(Adapter::Test(stubs.clone()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_find_options_builder() {
        let options = FindOptions::new().from("/people/managers.json").param("page", 2);
        assert_eq!(options.from.as_deref(), Some("/people/managers.json"));
        assert_eq!(options.params, params(json!({"page": 2})));
    }

    #[tokio::test]
    async fn test_find_all_from_custom_path() {
        let stubs = Stubs::new();
        stubs.get(
            "/companies/1/people.json?active=true",
            StubResponse::ok(r#"[{"id": 1}, {"id": 2}]"#),
        );
        let person = person(&stubs);

        let people = person
            .find_all(
                FindOptions::new()
                    .from("/companies/1/people.json")
                    .param("active", true),
            )
            .await
            .unwrap();
        assert_eq!(people.len(), 2);
        assert!(people.iter().all(Resource::is_persisted));
    }

    #[tokio::test]
    async fn test_find_one_requires_from() {
        let stubs = Stubs::new();
        let person = person(&stubs);
        assert!(person.find_one(FindOptions::new()).await.unwrap().is_none());
        assert!(stubs.requests().is_empty());

        stubs.get(
            "/people/leader.json",
            StubResponse::ok(r#"{"person": {"id": 9}}"#),
        );
        let leader = person
            .find_one(FindOptions::new().from("/people/leader.json"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(leader.id(), Some(&json!(9)));
    }

    #[tokio::test]
    async fn test_first_and_last() {
        let stubs = Stubs::new();
        stubs.get("/people.json", StubResponse::ok(r#"[{"id": 1}, {"id": 2}]"#));
        let person = person(&stubs);
        let first = person.first(FindOptions::new()).await.unwrap().unwrap();
        let last = person.last(FindOptions::new()).await.unwrap().unwrap();
        assert_eq!(first.id(), Some(&json!(1)));
        assert_eq!(last.id(), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_build_merges_template() {
        let stubs = Stubs::new();
        stubs.get(
            "/people/new.json",
            StubResponse::ok(r#"{"person": {"name": "", "age": 0}}"#),
        );
        let person = person(&stubs);
        let record = person.build(json!({"name": "Rick"})).await.unwrap();
        assert!(record.is_new());
        assert_eq!(record.to_value(), json!({"name": "Rick", "age": 0}));
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let stubs = Stubs::new();
        stubs.delete("/people/3.json", StubResponse::new(200));
        let person = person(&stubs);
        let response = person.delete(3, &Params::new()).await.unwrap();
        assert_eq!(response.status, 200);
    }
}
