//! Dirty tracking for partial updates.
//!
//! [`DirtyTracker`] keeps two channels: the set of attribute names written
//! since the last sync, and a single flag for the relationship block. Only
//! dirty attributes go into a PATCH; the relationship block is sent whole.
//!
//! # Example
//!
//! ```rust
//! use workbench_api::rest::DirtyTracker;
//! use serde_json::{json, Map};
//!
//! let mut tracker = DirtyTracker::default();
//! assert!(!tracker.is_dirty());
//!
//! tracker.mark_attribute("title");
//! tracker.mark_attribute("title");
//! assert_eq!(tracker.dirty_attributes().count(), 1);
//!
//! let mut attributes = Map::new();
//! attributes.insert("title".into(), json!("New"));
//! attributes.insert("status".into(), json!("OPEN"));
//! let changes = tracker.changed_attributes(&attributes);
//! assert!(changes.get("title").is_some());
//! assert!(changes.get("status").is_none());
//!
//! tracker.mark_clean();
//! assert!(!tracker.is_dirty());
//! ```

use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Records which attributes and whether the relationship block changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyTracker {
    dirty_attributes: BTreeSet<String>,
    relationships_dirty: bool,
}

impl DirtyTracker {
    /// Marks one attribute as changed.
    pub fn mark_attribute(&mut self, name: impl Into<String>) {
        self.dirty_attributes.insert(name.into());
    }

    /// Marks the relationship block as changed.
    pub fn mark_relationships(&mut self) {
        self.relationships_dirty = true;
    }

    /// Returns `true` if anything changed since the last sync.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty_attributes.is_empty() || self.relationships_dirty
    }

    /// Returns `true` if `name` changed since the last sync.
    #[must_use]
    pub fn is_attribute_dirty(&self, name: &str) -> bool {
        self.dirty_attributes.contains(name)
    }

    /// Returns `true` if the relationship block changed.
    #[must_use]
    pub const fn relationships_dirty(&self) -> bool {
        self.relationships_dirty
    }

    /// Iterates the changed attribute names in sorted order.
    pub fn dirty_attributes(&self) -> impl Iterator<Item = &str> {
        self.dirty_attributes.iter().map(String::as_str)
    }

    /// Returns the subset of `attributes` that changed.
    ///
    /// A dirty name missing from `attributes` is sent as `null`.
    #[must_use]
    pub fn changed_attributes(&self, attributes: &Map<String, Value>) -> Map<String, Value> {
        self.dirty_attributes
            .iter()
            .map(|name| {
                (
                    name.clone(),
                    attributes.get(name).cloned().unwrap_or(Value::Null),
                )
            })
            .collect()
    }

    /// Forgets all changes. Call after a successful save.
    pub fn mark_clean(&mut self) {
        self.dirty_attributes.clear();
        self.relationships_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_tracker_is_clean() {
        let tracker = DirtyTracker::default();
        assert!(!tracker.is_dirty());
        assert!(!tracker.relationships_dirty());
        assert_eq!(tracker.dirty_attributes().count(), 0);
    }

    #[test]
    fn test_attribute_marked_twice_is_one_entry() {
        let mut tracker = DirtyTracker::default();
        tracker.mark_attribute("title");
        tracker.mark_attribute("title");
        assert!(tracker.is_attribute_dirty("title"));
        assert_eq!(tracker.dirty_attributes().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn test_relationship_channel_is_separate() {
        let mut tracker = DirtyTracker::default();
        tracker.mark_relationships();
        assert!(tracker.is_dirty());
        assert!(tracker.relationships_dirty());
        assert_eq!(tracker.dirty_attributes().count(), 0);
    }

    #[test]
    fn test_changed_attributes_is_the_dirty_subset() {
        let mut tracker = DirtyTracker::default();
        tracker.mark_attribute("title");
        tracker.mark_attribute("removed");

        let mut attributes = Map::new();
        attributes.insert("title".to_string(), json!("New"));
        attributes.insert("status".to_string(), json!("OPEN"));

        let changes = tracker.changed_attributes(&attributes);
        assert_eq!(Value::Object(changes), json!({"title": "New", "removed": null}));
    }

    #[test]
    fn test_mark_clean_resets_both_channels() {
        let mut tracker = DirtyTracker::default();
        tracker.mark_attribute("title");
        tracker.mark_relationships();
        tracker.mark_clean();
        assert!(!tracker.is_dirty());
    }
}
