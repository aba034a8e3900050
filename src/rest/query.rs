//! Query composition.
//!
//! [`QueryBuilder`] turns caller operators and plain field filters into a
//! canonical [`Query`]: explicit operators first in caller order, then plain
//! filters in lexicographic field order, then the default sort
//! `sort=+created_at&sort=+id` unless the caller sorted explicitly.
//!
//! # Example
//!
//! ```rust
//! use workbench_api::rest::{gt, Filters, QueryBuilder, ResourceSchema};
//!
//! let schema = ResourceSchema::new("investigations").attributes(["status", "created_at"]);
//! let query = QueryBuilder::new(&schema, "/api/v2/investigations")
//!     .filters(Filters::new().with("status", "OPEN").with("created_at", gt("2020-01-01")))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     query.to_string(),
//!     "/api/v2/investigations?filter[created_at]=>2020-01-01&filter[status]=OPEN&sort=+created_at&sort=+id"
//! );
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::rest::errors::ResourceError;
use crate::rest::operators::{relationship, Operator};
use crate::rest::registry::{FieldKind, ResourceSchema};

/// Sort pairs appended when the caller gives none.
pub const DEFAULT_SORT: [&str; 2] = ["+created_at", "+id"];

/// Separator for `relationship__attribute` plain filter names.
const RELATIONSHIP_SEPARATOR: &str = "__";

/// Plain field filters, kept in lexicographic field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    entries: BTreeMap<String, Operator>,
}

impl Filters {
    /// Creates an empty set of filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter; a later filter on the same field replaces the earlier one.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Operator>) -> Self {
        self.insert(field, value);
        self
    }

    /// Adds a filter in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Operator>) {
        self.entries.insert(field.into(), value.into());
    }

    /// Returns `true` if there are no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates filters in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operator)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Filters
where
    K: Into<String>,
    V: Into<Operator>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut filters = Self::new();
        for (k, v) in iter {
            filters.insert(k, v);
        }
        filters
    }
}

/// A rendered listing query: base path plus ordered pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    path: String,
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Creates a query with no parameters.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            pairs: Vec::new(),
        }
    }

    /// Returns the base path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query pairs in wire order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Returns a copy with `page[limit]` set to `n`, replacing any existing limit.
    #[must_use]
    pub fn with_limit(&self, n: u32) -> Self {
        let mut query = self.clone();
        query.pairs.retain(|(key, _)| key != "page[limit]");
        query.pairs.insert(0, ("page[limit]".to_string(), n.to_string()));
        query
    }

    /// Returns the percent-encoded URL sent on the wire.
    #[must_use]
    pub fn to_url(&self) -> String {
        if self.pairs.is_empty() {
            return self.path.clone();
        }
        let query = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.path)
    }
}

/// Unencoded form, for logs and assertions.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// Builds a [`Query`] for one resource type.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    schema: &'a ResourceSchema,
    path: String,
    operators: Vec<Operator>,
    filters: Filters,
}

impl<'a> QueryBuilder<'a> {
    /// Starts a query against `path` for the type described by `schema`.
    #[must_use]
    pub fn new(schema: &'a ResourceSchema, path: impl Into<String>) -> Self {
        Self {
            schema,
            path: path.into(),
            operators: Vec::new(),
            filters: Filters::new(),
        }
    }

    /// Appends one explicit operator.
    #[must_use]
    pub fn operator(mut self, operator: Operator) -> Self {
        self.operators.push(operator);
        self
    }

    /// Appends explicit operators, keeping their order.
    #[must_use]
    pub fn operators(mut self, operators: impl IntoIterator<Item = Operator>) -> Self {
        self.operators.extend(operators);
        self
    }

    /// Merges plain field filters.
    #[must_use]
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters.entries.extend(filters.entries);
        self
    }

    /// Validates field names and renders the query.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownFields`] listing every plain filter
    /// name the schema does not know, [`ResourceError::RelationshipDepth`]
    /// for `a__b__c` names, and any error raised by an operator's render.
    pub fn build(self) -> Result<Query, ResourceError> {
        let plain = self.resolve_filters()?;

        let mut pairs = Vec::new();
        for operator in &self.operators {
            pairs.extend(operator.render(None, self.schema)?);
        }
        for (field, operator) in &plain {
            pairs.extend(operator.render(field.as_deref(), self.schema)?);
        }

        let sorted = self.operators.iter().any(Operator::is_sort)
            || plain.iter().any(|(_, op)| op.is_sort());
        if !sorted {
            pairs.extend(
                DEFAULT_SORT
                    .iter()
                    .map(|s| ("sort".to_string(), (*s).to_string())),
            );
        }

        Ok(Query {
            path: self.path,
            pairs,
        })
    }

    /// Maps each plain filter to a field name plus operator, or to a
    /// relationship filter for `rel__attr` and `rel_id` names.
    fn resolve_filters(&self) -> Result<Vec<(Option<String>, Operator)>, ResourceError> {
        let mut resolved = Vec::new();
        let mut unknown = Vec::new();

        for (name, operator) in self.filters.iter() {
            if name == "id" || self.schema.classify(name) != FieldKind::Unknown {
                resolved.push((Some(name.to_string()), operator.clone()));
                continue;
            }

            if let Some((rel, rest)) = name.split_once(RELATIONSHIP_SEPARATOR) {
                if rest.contains(RELATIONSHIP_SEPARATOR) {
                    return Err(ResourceError::RelationshipDepth {
                        path: name.to_string(),
                    });
                }
                if self.schema.has_relationship(rel) && !rest.is_empty() {
                    let path = format!("{rel}.{rest}");
                    resolved.push((None, relationship(&path, operator.clone())?));
                    continue;
                }
            } else if let Some(rel) = name.strip_suffix("_id") {
                if self.schema.has_relationship(rel) {
                    resolved.push((None, relationship(name, operator.clone())?));
                    continue;
                }
            }

            unknown.push(name.to_string());
        }

        if unknown.is_empty() {
            Ok(resolved)
        } else {
            Err(ResourceError::UnknownFields {
                type_name: self.schema.type_name().to_string(),
                fields: unknown,
            })
        }
    }
}
