//! The transport seam between the resource layer and the network.

use async_trait::async_trait;

use crate::clients::errors::HttpError;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;

/// Sends a prepared request and returns the parsed response.
///
/// [`HttpClient`](crate::clients::HttpClient) is the production
/// implementation. Resource handles hold a transport as
/// `Arc<dyn Transport>`, so tests can substitute an in-memory one.
///
/// Implementations raise [`HttpError`] for non-2xx responses unless the
/// request sets `raise_for_status` to `false`.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Sends `request`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] on validation, network or status failures.
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}
