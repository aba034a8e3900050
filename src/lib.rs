//! # Workbench API Rust Client
//!
//! A Rust client for JSON:API style security workbench services, providing
//! type-safe configuration, an async HTTP transport with retry logic, and a
//! dynamic resource layer with filtering, pagination and dirty tracking.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`WorkbenchConfig`] and [`WorkbenchConfigBuilder`]
//! - Validated newtypes for the service URL and API token
//! - An explicit, immutable [`TypeRegistry`](rest::TypeRegistry) describing
//!   each resource type's attributes and relationships
//! - Filter operators and a deterministic query builder
//! - Resource instances that save only what changed
//! - Lazy paginated collections
//! - Interactive confirmation before deletes
//! - Binary upload and download for files and investigative actions
//!
//! ## Quick Start
//!
//! ```rust
//! use workbench_api::{WorkbenchConfig, ApiToken, BaseUrl};
//! use workbench_api::rest::{ResourceSchema, TypeRegistry};
//!
//! let config = WorkbenchConfig::builder()
//!     .base_url(BaseUrl::new("https://workbench.example.com").unwrap())
//!     .api_token(ApiToken::new("my-token").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let registry = TypeRegistry::builder()
//!     .register(
//!         ResourceSchema::new("investigations")
//!             .attributes(["title", "status", "created_at"])
//!             .relationships(["organization", "comments"]),
//!     )
//!     .register(ResourceSchema::new("organizations").attributes(["name"]))
//!     .register(ResourceSchema::new("comments").attributes(["comment"]))
//!     .build()
//!     .unwrap();
//! assert_eq!(registry.len(), 3);
//! ```
//!
//! ## Working With Records
//!
//! ```rust,ignore
//! use workbench_api::WorkbenchClient;
//! use workbench_api::rest::{gt, Filters};
//!
//! let client = WorkbenchClient::new(&config, registry)?;
//! let investigations = client.resource("investigations")?;
//!
//! let mut recent = investigations.filter_by(
//!     Filters::new()
//!         .with("status", "OPEN")
//!         .with("created_at", gt("2024-01-01")),
//! )?;
//! while let Some(mut inv) = recent.next().await? {
//!     inv.set("status", "CLOSED")?;
//!     inv.save().await?;
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration and the type registry are passed explicitly
//! - **Fail-fast validation**: Field names are checked before any request is sent
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime

pub mod clients;
pub mod config;
pub mod confirm;
pub mod error;
pub mod rest;

// Re-export public types at crate root for convenience
pub use config::{ApiToken, BaseUrl, WorkbenchConfig, WorkbenchConfigBuilder};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    DataType, HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError, Transport,
    WorkbenchClient,
};

// Re-export the resource layer entry points
pub use rest::{
    Collection, ErrorKind, Filters, Operator, ResourceError, ResourceInstance, ResourceSet,
    TypeRegistry,
};
