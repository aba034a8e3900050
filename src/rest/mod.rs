//! The resource layer: operators, queries, records and collections.
//!
//! This module turns a [`TypeRegistry`] and a [`WorkbenchClient`](crate::WorkbenchClient)
//! into a dynamic JSON:API object model:
//!
//! - **[`Operator`]s** render one field's filter as `filter[...]`, `flag[...]`,
//!   `page[limit]`, `include` and `sort` pairs
//! - **[`QueryBuilder`]** validates plain filter names against a schema and
//!   renders operators in a deterministic order
//! - **[`ResourceInstance`]** holds one record, tracks which attributes and
//!   relationships changed, and saves or deletes itself
//! - **[`Collection`]** pages through query results lazily
//! - **[`ResourceSet`]** is the per-type entry point tying these together
//! - **[`Downloadable`] / [`Uploadable`]** add binary transfer to
//!   [`File`] and [`InvestigativeAction`] records
//!
//! # Example
//!
//! ```rust,ignore
//! use workbench_api::rest::{contains, relationship, sort, Filters};
//!
//! let investigations = client.resource("investigations")?;
//! let mut open = investigations.search(
//!     [
//!         relationship("organization.name", contains(["acme"]))?,
//!         sort("created_at", "desc")?,
//!     ],
//!     Filters::new().with("status", "OPEN"),
//! )?;
//!
//! while let Some(mut inv) = open.next().await? {
//!     inv.set("status", "CLOSED")?;
//!     inv.save().await?;
//! }
//! ```

mod collection;
mod document;
mod errors;
pub mod operators;
mod path;
mod query;
mod registry;
mod resource;
mod resource_set;
mod tracking;
mod transfer;

pub use collection::Collection;
pub use document::{
    Document, DocumentLinks, DocumentMeta, PageMeta, PrimaryData, RelationshipData,
    RelationshipEntry, RelationshipLinks, RelationshipRef, ResourceEntry,
};
pub use errors::{ConfirmationError, ErrorKind, ResourceError};
pub use operators::{
    contains, flag, gt, include, is_null, limit, lt, neq, not_null, relationship, sort, sort_by,
    starts_with, window, window_from, window_until, FilterValue, Operator, RelationshipFilter,
    SortDirection, NULL_SENTINEL,
};
pub use path::{action_url, make_url, ResourceOperation};
pub use query::{Filters, Query, QueryBuilder, DEFAULT_SORT};
pub use registry::{
    is_plural, pluralize, FieldKind, ResourceSchema, TypeRegistry, TypeRegistryBuilder,
};
pub use resource::{Field, Related, ResourceInstance, ResourceState};
pub use resource_set::ResourceSet;
pub use tracking::DirtyTracker;
pub use transfer::{
    Downloadable, File, FileUpload, InvestigativeAction, Uploadable, DEFAULT_DOWNLOAD_FORMAT,
    FILES_TYPE, INVESTIGATIVE_ACTIONS_TYPE,
};
