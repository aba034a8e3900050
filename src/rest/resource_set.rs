//! Per-type entry point for searching, fetching and creating records.

use std::sync::Arc;

use serde_json::Value;

use crate::clients::WorkbenchClient;
use crate::rest::resource::fetch_record;
use crate::rest::{
    Collection, Filters, Operator, QueryBuilder, ResourceError, ResourceInstance,
    ResourceOperation, ResourceSchema,
};

/// Handle for one registered resource type.
///
/// Obtained from [`WorkbenchClient::resource`]. Building a query never
/// touches the network; only the async methods and the returned
/// [`Collection`] do.
///
/// # Example
///
/// ```rust,ignore
/// use workbench_api::rest::{contains, Filters};
///
/// let investigations = client.resource("investigations")?;
/// let inv = investigations.get("56f00b9b").await?;
///
/// let mut phish = investigations.search(
///     [contains(["phish"])],
///     Filters::new().with("status", "OPEN"),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct ResourceSet {
    client: WorkbenchClient,
    schema: Arc<ResourceSchema>,
}

impl ResourceSet {
    /// Creates a handle for `schema`.
    #[must_use]
    pub const fn new(client: WorkbenchClient, schema: Arc<ResourceSchema>) -> Self {
        Self { client, schema }
    }

    /// Returns the resource type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    /// Returns the schema of this type.
    #[must_use]
    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Builds a URL under this type.
    #[must_use]
    pub fn make_url(&self, id: Option<&str>, relation: Option<&str>, relationship: bool) -> String {
        self.client
            .make_url(self.type_name(), id, relation, relationship)
    }

    /// Starts a query against this type's collection endpoint.
    #[must_use]
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.schema, self.make_url(None, None, false))
    }

    /// Searches with explicit operators and plain filters.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unknown field names or bad relationship
    /// paths. No request is sent until the collection is iterated.
    pub fn search(
        &self,
        operators: impl IntoIterator<Item = Operator>,
        filters: Filters,
    ) -> Result<Collection, ResourceError> {
        let query = self.query().operators(operators).filters(filters).build()?;
        tracing::debug!(type_name = self.type_name(), query = %query, "Built query");
        Ok(Collection::new(self.client.clone(), self.type_name(), query))
    }

    /// Searches with plain filters only.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceSet::search`].
    pub fn filter_by(&self, filters: Filters) -> Result<Collection, ResourceError> {
        self.search([], filters)
    }

    /// Lists every record in the default order.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceSet::search`].
    pub fn all(&self) -> Result<Collection, ResourceError> {
        self.search([], Filters::new())
    }

    /// Fetches one record by id.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] on a 404 and any other transport
    /// error unchanged.
    pub async fn get(&self, id: &str) -> Result<ResourceInstance, ResourceError> {
        tracing::debug!(
            type_name = self.type_name(),
            id,
            operation = %ResourceOperation::Find,
            "Fetching record"
        );
        fetch_record(&self.client, self.type_name(), id).await
    }

    /// Returns the number of records matching `filters`.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::count`], plus validation errors.
    pub async fn count(&self, filters: Filters) -> Result<u64, ResourceError> {
        self.filter_by(filters)?.count().await
    }

    /// Returns the first match, or `None`.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::next`], plus validation errors.
    pub async fn one_or_none(
        &self,
        operators: impl IntoIterator<Item = Operator>,
        filters: Filters,
    ) -> Result<Option<ResourceInstance>, ResourceError> {
        self.search(operators, filters)?.one_or_none().await
    }

    /// Returns an empty, unsaved record bound to this client.
    #[must_use]
    pub fn new_record(&self) -> ResourceInstance {
        ResourceInstance::new(Arc::clone(&self.schema), Some(self.client.clone()))
    }

    /// Returns an unsaved record with `attributes` set.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotAnAttribute`] for any name that is not a
    /// declared attribute.
    pub fn build<I, K, V>(&self, attributes: I) -> Result<ResourceInstance, ResourceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = self.new_record();
        for (name, value) in attributes {
            record.set(name.as_ref(), value)?;
        }
        Ok(record)
    }

    /// Creates a record on the server and returns it.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceSet::build`] and [`ResourceInstance::save`].
    pub async fn create<I, K, V>(&self, attributes: I) -> Result<ResourceInstance, ResourceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = self.build(attributes)?;
        record.save().await
    }
}
