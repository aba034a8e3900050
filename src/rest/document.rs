//! JSON:API wire documents.
//!
//! Read side: `{data, included, links.next, meta.page.total}` with entries
//! of `{id, type, attributes, relationships}`. The write side is rendered by
//! the resource instance; only the relationship linkage types are shared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One `{id, type}` linkage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipRef {
    /// The related record id.
    pub id: String,
    /// The related record type.
    #[serde(rename = "type")]
    pub type_name: String,
}

impl RelationshipRef {
    /// Creates a linkage.
    #[must_use]
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
        }
    }
}

/// Relationship linkage data: one reference or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    /// A to-many linkage.
    Many(Vec<RelationshipRef>),
    /// A to-one linkage.
    One(RelationshipRef),
}

impl RelationshipData {
    /// Returns the linked references in order.
    #[must_use]
    pub fn refs(&self) -> Vec<&RelationshipRef> {
        match self {
            Self::Many(refs) => refs.iter().collect(),
            Self::One(r) => vec![r],
        }
    }
}

/// `links` of a relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelationshipLinks {
    /// URL of the related records.
    #[serde(default)]
    pub related: Option<String>,
}

/// A relationship as it appears in an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelationshipEntry {
    /// Linkage, `None` when absent or null.
    #[serde(default)]
    pub data: Option<RelationshipData>,
    /// Links to the related records.
    #[serde(default)]
    pub links: Option<RelationshipLinks>,
}

/// One resource object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResourceEntry {
    /// Server-assigned id.
    #[serde(default)]
    pub id: Option<String>,
    /// Wire type name; some endpoints omit it.
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    /// Attribute values.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Relationships by name.
    #[serde(default)]
    pub relationships: BTreeMap<String, RelationshipEntry>,
}

/// Primary data: one entry or a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// A list of entries.
    Many(Vec<ResourceEntry>),
    /// A single entry.
    One(Box<ResourceEntry>),
}

/// Top-level `links`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentLinks {
    /// URL of the next page.
    #[serde(default)]
    pub next: Option<String>,
}

/// `meta.page`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    /// Total matching records.
    #[serde(default)]
    pub total: Option<u64>,
}

/// Top-level `meta`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentMeta {
    /// Page metadata.
    #[serde(default)]
    pub page: Option<PageMeta>,
}

/// A JSON:API response document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Document {
    /// Primary data, `None` when absent or null.
    #[serde(default)]
    pub data: Option<PrimaryData>,
    /// Side-loaded entries.
    #[serde(default)]
    pub included: Vec<ResourceEntry>,
    /// Pagination links.
    #[serde(default)]
    pub links: Option<DocumentLinks>,
    /// Metadata.
    #[serde(default)]
    pub meta: Option<DocumentMeta>,
}

impl Document {
    /// Decodes a response body.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the body is not a JSON:API document.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Splits the document into its primary entries (a single object becomes
    /// a one-element list) and its included entries.
    #[must_use]
    pub fn into_entries(self) -> (Vec<ResourceEntry>, Vec<ResourceEntry>) {
        let primary = match self.data {
            Some(PrimaryData::Many(entries)) => entries,
            Some(PrimaryData::One(entry)) => vec![*entry],
            None => Vec::new(),
        };
        (primary, self.included)
    }

    /// Returns the next page link, if any.
    #[must_use]
    pub fn next_link(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|links| links.next.as_deref())
            .filter(|next| !next.is_empty())
    }

    /// Returns `meta.page.total`, if present.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.page.as_ref())
            .and_then(|page| page.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_object_data_becomes_one_element_list() {
        let doc = Document::from_value(&json!({
            "data": {"id": "1", "type": "investigations", "attributes": {"title": "x"}}
        }))
        .unwrap();
        let (primary, included) = doc.into_entries();
        assert_eq!(primary.len(), 1);
        assert_eq!(primary[0].id.as_deref(), Some("1"));
        assert!(included.is_empty());
    }

    #[test]
    fn test_list_data_with_included_links_and_meta() {
        let doc = Document::from_value(&json!({
            "data": [{"id": "1", "type": "investigations"}, {"id": "2", "type": "investigations"}],
            "included": [{"id": "9", "type": "organizations"}],
            "links": {"next": "https://workbench.example.com/api/v2/investigations?page[after]=2"},
            "meta": {"page": {"total": 57}}
        }))
        .unwrap();
        assert_eq!(
            doc.next_link(),
            Some("https://workbench.example.com/api/v2/investigations?page[after]=2")
        );
        assert_eq!(doc.total(), Some(57));
        let (primary, included) = doc.into_entries();
        assert_eq!(primary.len(), 2);
        assert_eq!(included[0].type_name.as_deref(), Some("organizations"));
    }

    #[test]
    fn test_null_and_missing_data() {
        let doc = Document::from_value(&json!({"data": null})).unwrap();
        assert!(doc.into_entries().0.is_empty());
        let doc = Document::from_value(&json!({})).unwrap();
        assert!(doc.next_link().is_none());
        assert!(doc.total().is_none());
    }

    #[test]
    fn test_relationship_entries() {
        let entry: ResourceEntry = serde_json::from_value(json!({
            "id": "1",
            "type": "investigations",
            "relationships": {
                "organization": {
                    "data": {"id": "o1", "type": "organizations"},
                    "links": {"related": "/api/v2/investigations/1/organization"}
                },
                "comments": {"data": [{"id": "c1", "type": "comments"}, {"id": "c2", "type": "comments"}]},
                "lead_alert": {"data": null},
                "assigned_to_actor": {"links": {"related": "/api/v2/investigations/1/assigned_to_actor"}}
            }
        }))
        .unwrap();

        assert_eq!(
            entry.relationships["organization"].data,
            Some(RelationshipData::One(RelationshipRef::new("organizations", "o1")))
        );
        assert_eq!(
            entry.relationships["comments"].data.as_ref().unwrap().refs().len(),
            2
        );
        assert!(entry.relationships["lead_alert"].data.is_none());
        assert_eq!(
            entry.relationships["assigned_to_actor"]
                .links
                .as_ref()
                .and_then(|l| l.related.as_deref()),
            Some("/api/v2/investigations/1/assigned_to_actor")
        );
    }

    #[test]
    fn test_relationship_data_serializes_as_object_or_list() {
        let one = RelationshipData::One(RelationshipRef::new("organizations", "o1"));
        assert_eq!(
            serde_json::to_value(&one).unwrap(),
            json!({"id": "o1", "type": "organizations"})
        );
        let many = RelationshipData::Many(vec![RelationshipRef::new("comments", "c1")]);
        assert_eq!(
            serde_json::to_value(&many).unwrap(),
            json!([{"id": "c1", "type": "comments"}])
        );
    }

    #[test]
    fn test_non_document_is_an_error() {
        assert!(Document::from_value(&json!({"data": 5})).is_err());
    }
}
