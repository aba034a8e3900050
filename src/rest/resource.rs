//! A single resource record with dirty tracking and a save/delete lifecycle.
//!
//! [`ResourceInstance`] is the dynamic counterpart of a JSON:API entry. Field
//! names are classified through the record's [`ResourceSchema`]: attributes are
//! read and written directly, relationships are resolved lazily over the wire
//! and mutated through their own setters so that the two dirty channels of
//! [`DirtyTracker`] stay apart.
//!
//! # Lifecycle
//!
//! ```text
//! New ──save──> Persisted(clean) ──set──> Persisted(dirty) ──save──> Persisted(clean)
//!                      │                          │
//!                      └──────────delete──────────┴──> Deleted
//! ```
//!
//! Every mutating call on a [`ResourceState::Deleted`] instance fails with
//! [`ResourceError::Deleted`]. Reads keep working.
//!
//! # Example
//!
//! ```rust,ignore
//! let investigations = client.resource("investigations")?;
//! let mut inv = investigations.get("56f00b9b").await?;
//! inv.set("status", "CLOSED")?;
//! let saved = inv.save().await?;
//!
//! // Or let the scope save on success:
//! inv.scoped(|inv| Box::pin(async move {
//!     inv.set("priority", 3)?;
//!     Ok(())
//! })).await?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::clients::{DataType, HttpRequest, WorkbenchClient};
use crate::rest::{
    is_plural, DirtyTracker, Document, FieldKind, PrimaryData, RelationshipData, RelationshipRef,
    ResourceEntry, ResourceError, ResourceOperation, ResourceSchema,
};

/// Where an instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Built locally, never saved.
    New,
    /// Known to the server.
    Persisted,
    /// Deleted on the server. Terminal.
    Deleted,
}

/// The records a relationship resolved to.
#[derive(Debug, Clone)]
pub enum Related {
    /// The relationship is empty.
    None,
    /// A to-one relationship.
    One(Box<ResourceInstance>),
    /// A to-many relationship.
    Many(Vec<ResourceInstance>),
}

impl Related {
    /// Returns `true` if nothing is related.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the single related record, if this is a to-one relationship.
    #[must_use]
    pub fn as_one(&self) -> Option<&ResourceInstance> {
        match self {
            Self::One(instance) => Some(instance),
            _ => None,
        }
    }

    /// Returns the related records as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[ResourceInstance] {
        match self {
            Self::None => &[],
            Self::One(instance) => std::slice::from_ref(instance),
            Self::Many(instances) => instances,
        }
    }
}

/// The value behind a field name.
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    /// A declared attribute; `None` if the server did not send it.
    Attribute(Option<&'a Value>),
    /// A declared relationship, resolved.
    Related(&'a Related),
}

/// Local state of one relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Linkage {
    data: Option<RelationshipData>,
    related_link: Option<String>,
    cleared: bool,
}

/// One record of a registered resource type.
#[derive(Debug, Clone)]
pub struct ResourceInstance {
    schema: Arc<ResourceSchema>,
    id: Option<String>,
    attributes: Map<String, Value>,
    relationships: BTreeMap<String, Linkage>,
    tracker: DirtyTracker,
    materialized: HashMap<String, Related>,
    state: ResourceState,
    client: Option<WorkbenchClient>,
}

// Verify ResourceInstance is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceInstance>();
};

impl ResourceInstance {
    /// Creates an unsaved instance.
    ///
    /// Without a client the instance can be filled in but not saved.
    #[must_use]
    pub fn new(schema: Arc<ResourceSchema>, client: Option<WorkbenchClient>) -> Self {
        Self {
            schema,
            id: None,
            attributes: Map::new(),
            relationships: BTreeMap::new(),
            tracker: DirtyTracker::default(),
            materialized: HashMap::new(),
            state: ResourceState::New,
            client,
        }
    }

    /// Creates a clean, persisted instance from a wire entry.
    #[must_use]
    pub fn from_entry(
        entry: ResourceEntry,
        schema: Arc<ResourceSchema>,
        client: Option<WorkbenchClient>,
    ) -> Self {
        let relationships = entry
            .relationships
            .into_iter()
            .map(|(name, relationship)| {
                let linkage = Linkage {
                    data: relationship.data,
                    related_link: relationship.links.and_then(|links| links.related),
                    cleared: false,
                };
                (name, linkage)
            })
            .collect();

        Self {
            schema,
            id: entry.id,
            attributes: entry.attributes,
            relationships,
            tracker: DirtyTracker::default(),
            materialized: HashMap::new(),
            state: ResourceState::Persisted,
            client,
        }
    }

    /// Binds the instance to a client.
    pub fn attach(&mut self, client: WorkbenchClient) {
        self.client = Some(client);
    }

    /// Returns the resource type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    /// Returns the schema of this record's type.
    #[must_use]
    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Returns the server-assigned id, `None` until first saved.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ResourceState {
        self.state
    }

    /// Returns `true` if the instance has never been saved.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.state == ResourceState::New
    }

    /// Returns `true` once the record has been deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.state == ResourceState::Deleted
    }

    /// Returns `true` if a save would send anything.
    ///
    /// An unsaved record is always dirty.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state == ResourceState::New || self.tracker.is_dirty()
    }

    /// Returns the dirty tracker.
    #[must_use]
    pub const fn tracker(&self) -> &DirtyTracker {
        &self.tracker
    }

    /// Returns every attribute value held locally.
    #[must_use]
    pub const fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns the linkage of a relationship, if known.
    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&RelationshipData> {
        self.relationships.get(name).and_then(|l| l.data.as_ref())
    }

    /// Returns a linkage pointing at this record.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotPersisted`] if the record has no id.
    pub fn to_relationship_ref(&self) -> Result<RelationshipRef, ResourceError> {
        let id = self.persisted_id("link")?;
        Ok(RelationshipRef::new(self.type_name(), id))
    }

    /// Reads an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownField`] if `name` is not a declared
    /// attribute.
    pub fn attribute(&self, name: &str) -> Result<Option<&Value>, ResourceError> {
        match self.schema.classify(name) {
            FieldKind::Attribute => Ok(self.attributes.get(name)),
            FieldKind::Relationship | FieldKind::Unknown => Err(self.unknown_field(name)),
        }
    }

    /// Reads an attribute and deserializes it.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownField`] for undeclared names and
    /// [`ResourceError::MalformedResponse`] if the value has another shape.
    pub fn attribute_as<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, ResourceError> {
        match self.attribute(name)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(T::deserialize(value)?)),
        }
    }

    /// Reads any declared field.
    ///
    /// Attributes are returned as stored. Relationships are fetched on first
    /// access and cached until the relationship is changed locally.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownField`] for undeclared names, and any
    /// error raised while resolving a relationship.
    pub async fn get(&mut self, name: &str) -> Result<Field<'_>, ResourceError> {
        match self.schema.classify(name) {
            FieldKind::Attribute => Ok(Field::Attribute(self.attributes.get(name))),
            FieldKind::Relationship => Ok(Field::Related(self.related(name).await?)),
            FieldKind::Unknown => Err(self.unknown_field(name)),
        }
    }

    /// Resolves a relationship.
    ///
    /// A persisted record follows the relationship's `related` link, or the
    /// conventional `/<type>/<id>/<name>` URL when the server sent none. An
    /// unsaved record fetches each linked id individually.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotARelationship`] for names that are not
    /// relationships, [`ResourceError::MissingRelationship`] if there is
    /// nothing to resolve, and any transport error.
    pub async fn related(&mut self, name: &str) -> Result<&Related, ResourceError> {
        if !self.schema.has_relationship(name) {
            return Err(ResourceError::NotARelationship {
                type_name: self.type_name().to_string(),
                name: name.to_string(),
            });
        }

        if !self.materialized.contains_key(name) {
            let related = self.fetch_related(name).await?;
            self.materialized.insert(name.to_string(), related);
        }

        self.materialized
            .get(name)
            .ok_or_else(|| ResourceError::MissingRelationship {
                type_name: self.schema.type_name().to_string(),
                name: name.to_string(),
            })
    }

    /// Writes an attribute and marks it dirty.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotAnAttribute`] for relationships and unknown
    /// names, and [`ResourceError::Deleted`] on a deleted record.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ResourceError> {
        self.ensure_mutable()?;
        if self.schema.classify(name) != FieldKind::Attribute {
            return Err(ResourceError::NotAnAttribute {
                type_name: self.type_name().to_string(),
                name: name.to_string(),
            });
        }
        self.attributes.insert(name.to_string(), value.into());
        self.tracker.mark_attribute(name);
        Ok(())
    }

    /// Replaces a relationship's linkage.
    ///
    /// A single reference on a plural relationship name is stored as a
    /// one-element list.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotARelationship`] for undeclared names and
    /// [`ResourceError::Deleted`] on a deleted record.
    pub fn set_relationship(
        &mut self,
        name: &str,
        data: RelationshipData,
    ) -> Result<(), ResourceError> {
        self.ensure_relationship(name)?;
        let data = match data {
            RelationshipData::One(r) if is_plural(name) => RelationshipData::Many(vec![r]),
            other => other,
        };
        let linkage = self.relationships.entry(name.to_string()).or_default();
        linkage.data = Some(data);
        linkage.cleared = false;
        self.relationship_changed(name);
        Ok(())
    }

    /// Appends a reference to a relationship.
    ///
    /// On a singular name this replaces the current reference.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceInstance::set_relationship`].
    pub fn add_relationship(
        &mut self,
        name: &str,
        reference: RelationshipRef,
    ) -> Result<(), ResourceError> {
        self.ensure_relationship(name)?;
        let linkage = self.relationships.entry(name.to_string()).or_default();
        linkage.data = match linkage.data.take() {
            Some(RelationshipData::Many(mut refs)) => {
                refs.push(reference);
                Some(RelationshipData::Many(refs))
            }
            Some(RelationshipData::One(existing)) if is_plural(name) => {
                Some(RelationshipData::Many(vec![existing, reference]))
            }
            _ if is_plural(name) => Some(RelationshipData::Many(vec![reference])),
            _ => Some(RelationshipData::One(reference)),
        };
        linkage.cleared = false;
        self.relationship_changed(name);
        Ok(())
    }

    /// Empties a relationship. It is sent as `null` on the next save.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceInstance::set_relationship`].
    pub fn clear_relationship(&mut self, name: &str) -> Result<(), ResourceError> {
        self.ensure_relationship(name)?;
        let linkage = self.relationships.entry(name.to_string()).or_default();
        linkage.data = None;
        linkage.cleared = true;
        self.relationship_changed(name);
        Ok(())
    }

    /// Persists local changes.
    ///
    /// A new record is created with every attribute. A persisted record sends
    /// only dirty attributes, and nothing at all when clean. The response
    /// replaces the local state, and a copy of the result is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Deleted`] on a deleted record,
    /// [`ResourceError::Detached`] without a client, and any transport error.
    pub async fn save(&mut self) -> Result<Self, ResourceError> {
        self.ensure_mutable()?;

        let (operation, url, body) = match self.state {
            ResourceState::New => {
                let client = self.client()?;
                let url = client.make_url(self.type_name(), None, None, false);
                (ResourceOperation::Create, url, self.create_payload())
            }
            _ if !self.tracker.is_dirty() => {
                tracing::debug!(
                    type_name = self.type_name(),
                    id = self.id.as_deref(),
                    "Nothing to save"
                );
                return Ok(self.clone());
            }
            _ => {
                let id = self.persisted_id("update")?;
                let client = self.client()?;
                let url = client.make_url(self.type_name(), Some(id), None, false);
                (ResourceOperation::Update, url, self.update_payload(id))
            }
        };

        let client = self.client()?.clone();
        tracing::debug!(
            type_name = self.type_name(),
            id = self.id.as_deref(),
            operation = %operation,
            "Saving resource"
        );

        let request = HttpRequest::builder(operation.http_method(), url)
            .body(body)
            .body_type(DataType::JsonApi)
            .build()?;
        let response = client.send(request).await?;
        self.adopt(response.json(), client)?;
        Ok(self.clone())
    }

    /// Deletes the record on the server.
    ///
    /// With `confirm` set, and confirmation enabled on the client, the user is
    /// asked first.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotPersisted`] for an unsaved record,
    /// [`ResourceError::Deleted`] if already deleted,
    /// [`ResourceError::Confirmation`] if the user did not agree, and any
    /// transport error. The instance stays usable after a failure.
    pub async fn delete(&mut self, confirm: bool) -> Result<(), ResourceError> {
        self.ensure_mutable()?;
        let id = self.persisted_id("delete")?.to_string();
        let client = self.client()?.clone();

        if confirm && client.prompts_on_delete() {
            client
                .gate()
                .confirm(&format!("delete {} {id}", self.type_name()))?;
        }

        let url = client.make_url(self.type_name(), Some(&id), None, false);
        let body = json!({
            "data": {
                "type": self.type_name(),
                "id": id,
                "attributes": Value::Object(self.attributes.clone()),
            },
            "id": id,
        });
        let request = HttpRequest::builder(ResourceOperation::Delete.http_method(), url)
            .body(body)
            .body_type(DataType::JsonApi)
            .build()?;
        client.send(request).await?;

        tracing::debug!(type_name = self.type_name(), id = %id, "Deleted resource");
        self.state = ResourceState::Deleted;
        self.materialized.clear();
        Ok(())
    }

    /// Runs `body` against this record and saves on success.
    ///
    /// After `body` returns `Ok`, the record is saved if it is not deleted and
    /// is new or has dirty attributes or relationships. After an `Err`, nothing is
    /// saved and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error of `body`, or of the closing save.
    pub async fn scoped<T, F>(&mut self, body: F) -> Result<T, ResourceError>
    where
        F: for<'r> FnOnce(
            &'r mut Self,
        ) -> Pin<Box<dyn Future<Output = Result<T, ResourceError>> + Send + 'r>>,
    {
        let value = body(&mut *self).await?;
        if !self.is_deleted() && self.is_dirty() {
            self.save().await?;
        }
        Ok(value)
    }

    pub(crate) fn client(&self) -> Result<&WorkbenchClient, ResourceError> {
        self.client.as_ref().ok_or_else(|| ResourceError::Detached {
            type_name: self.type_name().to_string(),
        })
    }

    fn persisted_id(&self, operation: &'static str) -> Result<&str, ResourceError> {
        match (&self.state, self.id.as_deref()) {
            (ResourceState::New, _) | (_, None) => Err(ResourceError::NotPersisted {
                type_name: self.type_name().to_string(),
                operation,
            }),
            (_, Some(id)) => Ok(id),
        }
    }

    fn ensure_mutable(&self) -> Result<(), ResourceError> {
        if self.is_deleted() {
            return Err(ResourceError::Deleted {
                type_name: self.type_name().to_string(),
                id: self.id.clone().unwrap_or_default(),
            });
        }
        Ok(())
    }

    fn ensure_relationship(&self, name: &str) -> Result<(), ResourceError> {
        self.ensure_mutable()?;
        if !self.schema.has_relationship(name) {
            return Err(ResourceError::NotARelationship {
                type_name: self.type_name().to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn relationship_changed(&mut self, name: &str) {
        self.tracker.mark_relationships();
        self.materialized.remove(name);
    }

    fn unknown_field(&self, name: &str) -> ResourceError {
        ResourceError::UnknownField {
            type_name: self.type_name().to_string(),
            name: name.to_string(),
        }
    }

    fn create_payload(&self) -> Value {
        json!({
            "data": {
                "type": self.type_name(),
                "attributes": Value::Object(self.attributes.clone()),
                "relationships": self.relationship_block(),
            }
        })
    }

    fn update_payload(&self, id: &str) -> Value {
        json!({
            "data": {
                "type": self.type_name(),
                "id": id,
                "attributes": Value::Object(self.tracker.changed_attributes(&self.attributes)),
                "relationships": self.relationship_block(),
            },
            "id": id,
        })
    }

    /// Renders every known linkage; plural names always render a list.
    fn relationship_block(&self) -> Value {
        let block: Map<String, Value> = self
            .relationships
            .iter()
            .filter_map(|(name, linkage)| {
                let data = match &linkage.data {
                    Some(RelationshipData::One(r)) if is_plural(name) => json!([r]),
                    Some(data) => json!(data),
                    None if linkage.cleared => Value::Null,
                    None => return None,
                };
                Some((name.clone(), json!({ "data": data })))
            })
            .collect();
        Value::Object(block)
    }

    /// Replaces local state with the server's view after a save.
    fn adopt(&mut self, body: &Value, client: WorkbenchClient) -> Result<(), ResourceError> {
        let (primary, _) = Document::from_value(body)?.into_entries();
        let Some(entry) = primary.into_iter().next() else {
            self.state = ResourceState::Persisted;
            self.tracker.mark_clean();
            return Ok(());
        };

        let schema = match entry.type_name.as_deref() {
            Some(type_name) if type_name != self.type_name() => {
                client.registry().resolve(type_name)?
            }
            _ => Arc::clone(&self.schema),
        };
        let mut fresh = Self::from_entry(entry, schema, Some(client));

        match (&self.id, &fresh.id) {
            (Some(own), Some(theirs)) if own != theirs => {
                tracing::warn!(
                    type_name = self.type_name(),
                    id = %own,
                    returned = %theirs,
                    "Server returned a different id, keeping the local one"
                );
                fresh.id = Some(own.clone());
            }
            (Some(own), None) => fresh.id = Some(own.clone()),
            _ => {}
        }

        *self = fresh;
        Ok(())
    }

    async fn fetch_related(&self, name: &str) -> Result<Related, ResourceError> {
        let client = self.client()?;
        let target = client
            .registry()
            .resolve_relationship_type(self.type_name(), name)?;
        let linkage = self.relationships.get(name);

        let url = match (linkage.and_then(|l| l.related_link.clone()), self.id()) {
            (Some(link), _) => Some(link),
            (None, Some(id)) if !self.is_new() => {
                Some(client.make_url(self.type_name(), Some(id), Some(name), false))
            }
            _ => None,
        };

        if let Some(url) = url {
            tracing::debug!(
                type_name = self.type_name(),
                relationship = name,
                url = %url,
                "Resolving relationship"
            );
            let request = HttpRequest::builder(ResourceOperation::Find.http_method(), url).build()?;
            let response = client.send(request).await?;
            let document = Document::from_value(response.json())?;
            return Ok(match document.data {
                None => Related::None,
                Some(PrimaryData::One(entry)) => {
                    Related::One(Box::new(decode_entry(*entry, &target, client)?))
                }
                Some(PrimaryData::Many(entries)) => Related::Many(
                    entries
                        .into_iter()
                        .map(|entry| decode_entry(entry, &target, client))
                        .collect::<Result<_, _>>()?,
                ),
            });
        }

        match linkage.and_then(|l| l.data.as_ref()) {
            Some(RelationshipData::One(r)) => Ok(Related::One(Box::new(
                fetch_record(client, &r.type_name, &r.id).await?,
            ))),
            Some(RelationshipData::Many(refs)) => {
                let mut records = Vec::with_capacity(refs.len());
                for r in refs {
                    records.push(fetch_record(client, &r.type_name, &r.id).await?);
                }
                Ok(Related::Many(records))
            }
            None if linkage.is_some_and(|l| l.cleared) => Ok(Related::None),
            None => Err(ResourceError::MissingRelationship {
                type_name: self.type_name().to_string(),
                name: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(id={}) {}",
            self.type_name(),
            self.id.as_deref().unwrap_or("<new>"),
            Value::Object(self.attributes.clone())
        )
    }
}

/// Decodes a wire entry through the client's registry.
///
/// The entry's own `type` wins over `fallback_type`.
pub(crate) fn decode_entry(
    entry: ResourceEntry,
    fallback_type: &str,
    client: &WorkbenchClient,
) -> Result<ResourceInstance, ResourceError> {
    let type_name = entry
        .type_name
        .clone()
        .unwrap_or_else(|| fallback_type.to_string());
    let schema = client.registry().resolve(&type_name)?;
    Ok(ResourceInstance::from_entry(entry, schema, Some(client.clone())))
}

/// Fetches one record by type and id.
pub(crate) async fn fetch_record(
    client: &WorkbenchClient,
    type_name: &str,
    id: &str,
) -> Result<ResourceInstance, ResourceError> {
    let url = client.make_url(type_name, Some(id), None, false);
    let request = HttpRequest::builder(ResourceOperation::Find.http_method(), url).build()?;
    let response = match client.send(request).await {
        Ok(response) => response,
        Err(ResourceError::Http(error)) => {
            return Err(ResourceError::from_http_error(error, type_name, id))
        }
        Err(other) => return Err(other),
    };

    let (primary, _) = Document::from_value(response.json())?.into_entries();
    let entry = primary
        .into_iter()
        .next()
        .ok_or_else(|| ResourceError::NotFound {
            type_name: type_name.to_string(),
            id: id.to_string(),
        })?;
    decode_entry(entry, type_name, client)
}
