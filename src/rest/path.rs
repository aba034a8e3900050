//! URL construction for resource endpoints.
//!
//! Every resource type lives under `<prefix>/<type>`; records, their related
//! collections and their relationship linkage hang off that root:
//!
//! | Call | Path |
//! |---|---|
//! | `make_url(p, "investigations", None, None, false)` | `/api/v2/investigations` |
//! | `make_url(p, "investigations", Some(id), None, false)` | `/api/v2/investigations/{id}` |
//! | `make_url(p, "investigations", Some(id), Some("comments"), false)` | `/api/v2/investigations/{id}/comments` |
//! | `make_url(p, "investigations", Some(id), Some("comments"), true)` | `/api/v2/investigations/{id}/relationships/comments` |
//!
//! # Example
//!
//! ```rust
//! use workbench_api::rest::make_url;
//!
//! let url = make_url("/api/v2", "investigations", Some("abc"), Some("investigative_actions"), true);
//! assert_eq!(url, "/api/v2/investigations/abc/relationships/investigative_actions");
//! ```

use std::fmt;

use crate::clients::HttpMethod;

/// Operations issued against a resource endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceOperation {
    /// Fetch one record (GET /type/{id}).
    Find,
    /// List records (GET /type).
    All,
    /// Create a record (POST /type).
    Create,
    /// Update a record (PATCH /type/{id}).
    Update,
    /// Delete a record (DELETE /type/{id}).
    Delete,
    /// Fetch a record's binary content (GET /type/{id}/download).
    Download,
    /// Send binary content (POST /files/{id}/upload).
    Upload,
}

impl ResourceOperation {
    /// Returns the HTTP method for this operation.
    #[must_use]
    pub const fn http_method(&self) -> HttpMethod {
        match self {
            Self::Find | Self::All | Self::Download => HttpMethod::Get,
            Self::Create | Self::Upload => HttpMethod::Post,
            Self::Update => HttpMethod::Patch,
            Self::Delete => HttpMethod::Delete,
        }
    }

    /// Returns the operation name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::All => "all",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Download => "download",
            Self::Upload => "upload",
        }
    }
}

impl fmt::Display for ResourceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a resource URL path.
///
/// `id` is percent-encoded; `prefix`, `type_name` and `relation` are
/// trusted names from the registry.
#[must_use]
pub fn make_url(
    prefix: &str,
    type_name: &str,
    id: Option<&str>,
    relation: Option<&str>,
    relationship: bool,
) -> String {
    let mut url = format!("{}/{type_name}", prefix.trim_end_matches('/'));
    if let Some(id) = id {
        url.push('/');
        url.push_str(&urlencoding::encode(id));
        if let Some(relation) = relation {
            if relationship {
                url.push_str("/relationships");
            }
            url.push('/');
            url.push_str(relation);
        }
    }
    url
}

/// Builds the path of a record-scoped action such as `download`.
#[must_use]
pub fn action_url(prefix: &str, type_name: &str, id: &str, action: ResourceOperation) -> String {
    format!("{}/{action}", make_url(prefix, type_name, Some(id), None, false))
}
