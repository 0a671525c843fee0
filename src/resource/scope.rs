//! Per-call middleware injection.

use super::errors::ResourceError;
use super::query::ResourceQuery;
use super::resource_type::ResourceType;
use crate::connection::Connection;
use serde_json::Value;
use std::sync::Arc;

/// A resource type bound to a private, modified connection.
///
/// Created by [`ResourceType::scope`]. Query methods from [`ResourceQuery`]
/// send their requests through the scoped connection; records they return
/// keep using it for `save`, `destroy` and `reload`. The type's own
/// connection is never touched.
///
/// # Example
///
/// ```rust
/// use remote_resource::connection::SetHeader;
/// use remote_resource::{Adapter, ResourceType, SiteUrl, Stubs};
/// use serde_json::{json, Value};
///
/// let person = ResourceType::builder("Person")
///     .site(SiteUrl::new("http://37s.sunrise.i:3000").unwrap())
///     .adapter(Adapter::Test(Stubs::new()))
///     .build()
///     .unwrap();
/// person.define_scope("authed", |stack, args| {
///     let token = args.first().and_then(Value::as_str).unwrap_or_default();
///     stack.insert(0, SetHeader::new("X-Auth", token));
/// });
///
/// let scope = person.scope("authed", &[json!("secret")]).unwrap();
/// assert_eq!(scope.connection().stack().names()[0], "set_header");
/// ```
#[derive(Clone, Debug)]
pub struct RequestScope {
    target: ResourceType,
    connection: Arc<Connection>,
}

impl RequestScope {
    pub(crate) fn new(target: ResourceType, connection: Connection) -> Self {
        Self {
            target,
            connection: Arc::new(connection),
        }
    }

    /// Returns the scoped connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Applies another scope to the same connection copy.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownScope`] if the name is not defined on
    /// the target type or its ancestors.
    pub fn scope(mut self, name: &str, args: &[Value]) -> Result<Self, ResourceError> {
        let injector = self.target.scope_injector(name)?;
        injector(Arc::make_mut(&mut self.connection).stack_mut(), args);
        tracing::debug!("Applied scope {} to {}", name, self.target.name());
        Ok(self)
    }
}

impl ResourceQuery for RequestScope {
    fn resource_type(&self) -> &ResourceType {
        &self.target
    }

    fn scoped_connection(&self) -> Option<Arc<Connection>> {
        Some(Arc::clone(&self.connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Adapter, SiteUrl};
    use crate::connection::{SetHeader, Stubs};
    use serde_json::json;

    fn person() -> ResourceType {
        let person = ResourceType::builder("Person")
            .site(SiteUrl::new("http://37s.sunrise.i:3000").unwrap())
            .adapter(Adapter::Test(Stubs::new()))
            .build()
            .unwrap();
        person.define_scope("authed", |stack, args| {
            let token = args.first().and_then(Value::as_str).unwrap_or_default();
            stack.insert(0, SetHeader::new("X-Auth", token));
        });
        person.define_scope("traced", |stack, _| {
            stack.insert(0, SetHeader::new("X-Trace", "on"));
        });
        person
    }

    #[test]
    fn test_scopes_chain_on_one_connection() {
        let person = person();
        let scope = person
            .scope("authed", &[json!("secret")])
            .unwrap()
            .scope("traced", &[])
            .unwrap();
        assert_eq!(
            scope.connection().stack().names()[..2],
            ["set_header", "set_header"]
        );
        assert_eq!(scope.resource_type(), &person);
        assert!(scope.scoped_connection().is_some());
    }

    #[test]
    fn test_chained_unknown_scope_fails() {
        let person = person();
        let result = person.scope("authed", &[]).unwrap().scope("nope", &[]);
        assert!(matches!(result, Err(ResourceError::UnknownScope { .. })));
    }

    #[test]
    fn test_scope_leaves_type_connection_alone() {
        let person = person();
        let before = person.middleware().unwrap().names();
        let _scope = person.scope("authed", &[json!("x")]).unwrap();
        assert_eq!(person.middleware().unwrap().names(), before);
    }
}
