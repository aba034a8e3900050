//! HTTP transport and the Workbench client.
//!
//! # Overview
//!
//! - [`Transport`]: the capability the resource layer sends requests through
//! - [`HttpClient`]: the reqwest-backed [`Transport`] with retry logic
//! - [`HttpRequest`] / [`HttpResponse`]: transport-level request and response
//! - [`HttpMethod`] and [`DataType`]: methods and body content types
//! - [`WorkbenchClient`]: transport, type registry and confirmation gate,
//!   the entry point for [`crate::rest`]
//!
//! # Retry Behavior
//!
//! [`HttpClient`] retries transient failures up to the configured `tries`:
//!
//! - **429 (Rate Limited)**: waits for the `Retry-After` header value, or 1 second if not present
//! - **500/502/503/504**: waits a fixed 1 second
//! - **Other 4xx**: returned immediately
//!
//! A connection that fails to open is rebuilt once and the call retried once.

mod errors;
mod http_client;
mod http_request;
mod http_response;
mod transport;
mod workbench;

pub use errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
pub use http_client::{HttpClient, RETRY_WAIT_TIME, SDK_VERSION};
pub use http_request::{DataType, HttpMethod, HttpRequest, HttpRequestBuilder, RequestBody};
pub use http_response::HttpResponse;
pub use transport::Transport;
pub use workbench::WorkbenchClient;
