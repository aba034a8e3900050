//! Resource type schemas and the registry that holds them.
//!
//! A [`ResourceSchema`] lists the attribute and relationship names of one
//! JSON:API type. A [`TypeRegistry`] is built once at startup and shared
//! read-only (behind an `Arc`) by the query builder, resource instances and
//! collections.
//!
//! # Example
//!
//! ```rust
//! use workbench_api::rest::{ResourceSchema, TypeRegistry, FieldKind};
//!
//! let registry = TypeRegistry::builder()
//!     .register(
//!         ResourceSchema::new("investigations")
//!             .attributes(["title", "close_comment", "created_at"])
//!             .relationships(["organization", "comments"]),
//!     )
//!     .register(ResourceSchema::new("organizations").attributes(["name"]))
//!     .build()
//!     .unwrap();
//!
//! let schema = registry.resolve("investigations").unwrap();
//! assert_eq!(schema.classify("title"), FieldKind::Attribute);
//! assert_eq!(
//!     registry.resolve_relationship_type("investigations", "organization").unwrap(),
//!     "organizations"
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rest::errors::ResourceError;

/// How a name relates to a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A declared attribute.
    Attribute,
    /// A declared relationship.
    Relationship,
    /// Neither.
    Unknown,
}

/// The static schema of one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSchema {
    type_name: String,
    #[serde(default)]
    attributes: BTreeSet<String>,
    #[serde(default)]
    relationships: BTreeSet<String>,
    /// Relationship name to target type, for names that do not pluralize
    /// to their target (e.g. `created_by` to `actors`).
    #[serde(default)]
    relationship_types: BTreeMap<String, String>,
}

impl ResourceSchema {
    /// Creates an empty schema for `type_name`.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: BTreeSet::new(),
            relationships: BTreeSet::new(),
            relationship_types: BTreeMap::new(),
        }
    }

    /// Adds attribute names.
    #[must_use]
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds relationship names whose target type is derived from the name.
    #[must_use]
    pub fn relationships<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationships
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds one relationship with an explicit target type.
    #[must_use]
    pub fn relationship_to(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        let name = name.into();
        self.relationships.insert(name.clone());
        self.relationship_types.insert(name, target.into());
        self
    }

    /// Returns the JSON:API type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the declared attribute names, sorted.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    /// Returns the declared relationship names, sorted.
    pub fn relationship_names(&self) -> impl Iterator<Item = &str> {
        self.relationships.iter().map(String::as_str)
    }

    /// Returns `true` if `name` is a declared attribute.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Returns `true` if `name` is a declared relationship.
    #[must_use]
    pub fn has_relationship(&self, name: &str) -> bool {
        self.relationships.contains(name)
    }

    /// Returns `true` if the schema declares any relationship.
    #[must_use]
    pub fn has_relationships(&self) -> bool {
        !self.relationships.is_empty()
    }

    /// Classifies `name` against this schema.
    #[must_use]
    pub fn classify(&self, name: &str) -> FieldKind {
        if self.has_attribute(name) {
            FieldKind::Attribute
        } else if self.has_relationship(name) {
            FieldKind::Relationship
        } else {
            FieldKind::Unknown
        }
    }

    fn explicit_target(&self, relationship: &str) -> Option<&str> {
        self.relationship_types.get(relationship).map(String::as_str)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let overlap: Vec<String> = self
            .attributes
            .intersection(&self.relationships)
            .cloned()
            .collect();
        if overlap.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::OverlappingFields {
                type_name: self.type_name.clone(),
                fields: overlap,
            })
        }
    }
}

/// Returns `true` if a relationship name is plural and carries a list.
#[must_use]
pub fn is_plural(name: &str) -> bool {
    name.ends_with('s')
}

/// English pluralization good enough for resource type names.
#[must_use]
pub fn pluralize(name: &str) -> String {
    if is_plural(name) {
        return name.to_string();
    }
    if let Some(stem) = name.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    format!("{name}s")
}

/// Immutable mapping from type name to schema.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    schemas: HashMap<String, Arc<ResourceSchema>>,
}

// Verify TypeRegistry is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TypeRegistry>();
};

impl TypeRegistry {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Loads a registry from a JSON array of schemas.
    ///
    /// ```rust
    /// use workbench_api::rest::TypeRegistry;
    ///
    /// let registry = TypeRegistry::from_json_str(r#"[
    ///     {"type_name": "comments", "attributes": ["comment"], "relationships": ["investigation"]},
    ///     {"type_name": "investigations", "attributes": ["title"]}
    /// ]"#).unwrap();
    /// assert!(registry.contains("comments"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRegistry`] for malformed JSON, and the
    /// same errors as [`TypeRegistryBuilder::build`] otherwise.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let schemas: Vec<ResourceSchema> =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidRegistry {
                reason: e.to_string(),
            })?;
        schemas
            .into_iter()
            .fold(Self::builder(), TypeRegistryBuilder::register)
            .build()
    }

    /// Returns `true` if `type_name` is registered.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if no type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Looks up the schema for `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownType`] if the type is not registered.
    pub fn resolve(&self, type_name: &str) -> Result<Arc<ResourceSchema>, ResourceError> {
        self.schemas
            .get(type_name)
            .cloned()
            .ok_or_else(|| ResourceError::UnknownType {
                type_name: type_name.to_string(),
            })
    }

    /// Returns the type name a relationship points at.
    ///
    /// An explicit mapping on the owning schema wins. Otherwise the
    /// pluralized relationship name is used if registered, then the name
    /// itself, and finally the name with a trailing `s` enforced.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownType`] if `owning_type` is not
    /// registered, or [`ResourceError::NotARelationship`] if it does not
    /// declare `relationship`.
    pub fn resolve_relationship_type(
        &self,
        owning_type: &str,
        relationship: &str,
    ) -> Result<String, ResourceError> {
        let schema = self.resolve(owning_type)?;
        if !schema.has_relationship(relationship) {
            return Err(ResourceError::NotARelationship {
                type_name: owning_type.to_string(),
                name: relationship.to_string(),
            });
        }

        if let Some(target) = schema.explicit_target(relationship) {
            return Ok(target.to_string());
        }

        let plural = pluralize(relationship);
        if self.contains(&plural) {
            return Ok(plural);
        }
        if self.contains(relationship) {
            return Ok(relationship.to_string());
        }

        Ok(if relationship.ends_with('s') {
            relationship.to_string()
        } else {
            format!("{relationship}s")
        })
    }
}

/// Builder for [`TypeRegistry`].
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    schemas: Vec<ResourceSchema>,
}

impl TypeRegistryBuilder {
    /// Adds a schema.
    #[must_use]
    pub fn register(mut self, schema: ResourceSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Validates and freezes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OverlappingFields`] if a schema declares a
    /// name as both attribute and relationship, or
    /// [`ConfigError::DuplicateType`] if a type is registered twice.
    pub fn build(self) -> Result<TypeRegistry, ConfigError> {
        let mut schemas = HashMap::with_capacity(self.schemas.len());
        for schema in self.schemas {
            schema.validate()?;
            let type_name = schema.type_name.clone();
            if schemas.insert(type_name.clone(), Arc::new(schema)).is_some() {
                return Err(ConfigError::DuplicateType { type_name });
            }
        }
        Ok(TypeRegistry { schemas })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::errors::ErrorKind;

    fn registry() -> TypeRegistry {
        TypeRegistry::builder()
            .register(
                ResourceSchema::new("investigative_actions")
                    .attributes(["action_type", "created_at"])
                    .relationships(["investigation", "files"])
                    .relationship_to("created_by", "actors"),
            )
            .register(ResourceSchema::new("investigations").attributes(["title"]))
            .register(ResourceSchema::new("files").attributes(["filename"]))
            .register(ResourceSchema::new("actors").attributes(["display_name"]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_classify_fields() {
        let schema = registry().resolve("investigative_actions").unwrap();
        assert_eq!(schema.classify("action_type"), FieldKind::Attribute);
        assert_eq!(schema.classify("investigation"), FieldKind::Relationship);
        assert_eq!(schema.classify("created_by"), FieldKind::Relationship);
        assert_eq!(schema.classify("bogus"), FieldKind::Unknown);
    }

    #[test]
    fn test_resolve_unknown_type_is_lookup_error() {
        let error = registry().resolve("widgets").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Lookup);
        assert!(error.to_string().contains("widgets"));
    }

    #[test]
    fn test_relationship_type_resolution_order() {
        let registry = registry();
        assert_eq!(
            registry
                .resolve_relationship_type("investigative_actions", "created_by")
                .unwrap(),
            "actors"
        );
        assert_eq!(
            registry
                .resolve_relationship_type("investigative_actions", "investigation")
                .unwrap(),
            "investigations"
        );
        assert_eq!(
            registry
                .resolve_relationship_type("investigative_actions", "files")
                .unwrap(),
            "files"
        );
    }

    #[test]
    fn test_relationship_type_falls_back_to_trailing_s() {
        let registry = TypeRegistry::builder()
            .register(ResourceSchema::new("comments").relationships(["vendor_alert"]))
            .build()
            .unwrap();
        assert_eq!(
            registry
                .resolve_relationship_type("comments", "vendor_alert")
                .unwrap(),
            "vendor_alerts"
        );
    }

    #[test]
    fn test_relationship_type_rejects_undeclared_relationship() {
        let error = registry()
            .resolve_relationship_type("investigations", "organization")
            .unwrap_err();
        assert!(matches!(error, ResourceError::NotARelationship { .. }));
    }

    #[test]
    fn test_overlapping_names_are_rejected() {
        let result = TypeRegistry::builder()
            .register(
                ResourceSchema::new("investigations")
                    .attributes(["organization"])
                    .relationships(["organization"]),
            )
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::OverlappingFields { fields, .. }) if fields == vec!["organization".to_string()]
        ));
    }

    #[test]
    fn test_duplicate_types_are_rejected() {
        let result = TypeRegistry::builder()
            .register(ResourceSchema::new("investigations"))
            .register(ResourceSchema::new("investigations"))
            .build();
        assert!(matches!(result, Err(ConfigError::DuplicateType { .. })));
    }

    #[test]
    fn test_from_json_str() {
        let registry = TypeRegistry::from_json_str(
            r#"[{"type_name": "comments", "attributes": ["comment"],
                 "relationships": ["investigation", "created_by"],
                 "relationship_types": {"created_by": "actors"}}]"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry
                .resolve_relationship_type("comments", "created_by")
                .unwrap(),
            "actors"
        );

        let result = TypeRegistry::from_json_str("{not json");
        assert!(matches!(result, Err(ConfigError::InvalidRegistry { .. })));
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("investigation"), "investigations");
        assert_eq!(pluralize("activity"), "activities");
        assert_eq!(pluralize("assembly"), "assemblies");
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize("files"), "files");
        assert!(is_plural("comments"));
        assert!(!is_plural("organization"));
    }
}
