//! Lazy, paginated iteration over query results.
//!
//! A [`Collection`] fetches one page at a time. Each page yields its primary
//! entries, then its side-loaded `included` entries, before the `links.next`
//! page is requested. Iteration ends on the first page without a next link
//! and cannot be restarted; build the query again to start over.
//!
//! # Example
//!
//! ```rust,ignore
//! use workbench_api::rest::{gt, Filters};
//!
//! let mut recent = client
//!     .resource("investigations")?
//!     .filter_by(Filters::new().with("created_at", gt("2024-01-01")))?;
//!
//! println!("{} matches", recent.count().await?);
//! while let Some(inv) = recent.next().await? {
//!     println!("{inv}");
//! }
//! ```

use std::collections::VecDeque;

use crate::clients::{HttpRequest, WorkbenchClient};
use crate::rest::resource::decode_entry;
use crate::rest::{
    Document, Query, ResourceEntry, ResourceError, ResourceInstance, ResourceOperation,
};

/// A not-restartable sequence of resource instances.
#[derive(Debug)]
pub struct Collection {
    client: WorkbenchClient,
    type_name: String,
    query: Option<Query>,
    next_url: Option<String>,
    buffer: VecDeque<ResourceEntry>,
    total: Option<u64>,
    pages: u32,
}

impl Collection {
    /// Creates a collection over `query`. Nothing is fetched yet.
    #[must_use]
    pub fn new(client: WorkbenchClient, type_name: impl Into<String>, query: Query) -> Self {
        Self {
            client,
            type_name: type_name.into(),
            next_url: Some(query.to_url()),
            query: Some(query),
            buffer: VecDeque::new(),
            total: None,
            pages: 0,
        }
    }

    /// Creates a collection seeded with an already fetched page.
    ///
    /// Its `links.next` is followed as usual. [`Collection::count`] relies
    /// on the page metadata, since there is no query to probe.
    #[must_use]
    pub fn from_document(
        client: WorkbenchClient,
        type_name: impl Into<String>,
        document: Document,
    ) -> Self {
        let mut collection = Self {
            client,
            type_name: type_name.into(),
            query: None,
            next_url: None,
            buffer: VecDeque::new(),
            total: None,
            pages: 0,
        };
        collection.absorb(document);
        collection
    }

    /// Returns the type name used for entries without a `type`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the query this collection was built from.
    #[must_use]
    pub const fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    /// Returns the number of pages fetched so far.
    #[must_use]
    pub const fn pages_fetched(&self) -> u32 {
        self.pages
    }

    /// Returns the next record, fetching the next page when needed.
    ///
    /// # Errors
    ///
    /// Returns a transport error if a page fetch fails, or
    /// [`ResourceError::UnknownType`] if an entry's type is not registered.
    pub async fn next(&mut self) -> Result<Option<ResourceInstance>, ResourceError> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return decode_entry(entry, &self.type_name, &self.client).map(Some);
            }
            let Some(url) = self.next_url.take() else {
                return Ok(None);
            };
            self.fetch_page(url).await?;
        }
    }

    /// Returns the first record, or `None` if there are no matches.
    ///
    /// Consumes at most one record of the sequence.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::next`].
    pub async fn one_or_none(&mut self) -> Result<Option<ResourceInstance>, ResourceError> {
        self.next().await
    }

    /// Drains the remaining records into a vector.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::next`].
    pub async fn try_collect(mut self) -> Result<Vec<ResourceInstance>, ResourceError> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Returns the total number of matches reported by the server.
    ///
    /// Uses the metadata of a page already fetched, or issues a `page[limit]=0`
    /// probe. Iteration state is not affected.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MalformedResponse`] if the server reports no
    /// total, and any transport error.
    pub async fn count(&mut self) -> Result<u64, ResourceError> {
        if let Some(total) = self.total {
            return Ok(total);
        }

        let probe = self
            .query
            .as_ref()
            .map(|query| query.with_limit(0).to_url())
            .ok_or_else(|| missing_total(&self.type_name))?;

        tracing::debug!(type_name = %self.type_name, url = %probe, "Counting matches");
        let request = HttpRequest::builder(ResourceOperation::All.http_method(), probe).build()?;
        let response = self.client.send(request).await?;
        let total = Document::from_value(response.json())?
            .total()
            .ok_or_else(|| missing_total(&self.type_name))?;
        self.total = Some(total);
        Ok(total)
    }

    async fn fetch_page(&mut self, url: String) -> Result<(), ResourceError> {
        tracing::debug!(
            type_name = %self.type_name,
            url = %url,
            page = self.pages + 1,
            "Fetching page"
        );
        let request = HttpRequest::builder(ResourceOperation::All.http_method(), url).build()?;
        let response = self.client.send(request).await?;
        let document = Document::from_value(response.json())?;
        self.absorb(document);
        Ok(())
    }

    fn absorb(&mut self, document: Document) {
        self.pages += 1;
        if let Some(total) = document.total() {
            self.total = Some(total);
        }
        self.next_url = document.next_link().map(ToString::to_string);
        let (primary, included) = document.into_entries();
        self.buffer.extend(primary);
        self.buffer.extend(included);
    }
}

fn missing_total(type_name: &str) -> ResourceError {
    ResourceError::MalformedResponse {
        reason: format!("no meta.page.total in {type_name} response"),
    }
}
