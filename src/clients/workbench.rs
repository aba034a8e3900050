//! The Workbench client: transport, type registry and confirmation gate.

use std::sync::Arc;

use crate::clients::errors::HttpError;
use crate::clients::http_client::HttpClient;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;
use crate::clients::transport::Transport;
use crate::config::{WorkbenchConfig, DEFAULT_API_PREFIX};
use crate::confirm::{ConfirmationGate, Prompt};
use crate::rest::{make_url, ResourceError, ResourceSet, TypeRegistry};

/// Entry point for the resource layer.
///
/// Cheap to clone; every resource instance and collection holds a clone so
/// it can issue its own requests.
///
/// # Example
///
/// ```rust,ignore
/// use workbench_api::{WorkbenchClient, WorkbenchConfig, BaseUrl, ApiToken};
/// use workbench_api::rest::{Filters, TypeRegistry};
///
/// let config = WorkbenchConfig::builder()
///     .base_url(BaseUrl::new("https://workbench.example.com")?)
///     .api_token(ApiToken::new(token)?)
///     .build()?;
/// let registry = TypeRegistry::from_json_str(&std::fs::read_to_string("types.json")?)?;
/// let client = WorkbenchClient::new(&config, registry)?;
///
/// let mut open = client
///     .resource("investigations")?
///     .filter_by(Filters::new().with("status", "OPEN"))?;
/// while let Some(inv) = open.next().await? {
///     println!("{inv}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct WorkbenchClient {
    transport: Arc<dyn Transport>,
    registry: Arc<TypeRegistry>,
    gate: ConfirmationGate,
    api_prefix: String,
    prompt_on_delete: bool,
}

// Verify WorkbenchClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WorkbenchClient>();
};

impl WorkbenchClient {
    /// Creates a client backed by [`HttpClient`].
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the HTTP client cannot be created.
    pub fn new(config: &WorkbenchConfig, registry: TypeRegistry) -> Result<Self, HttpError> {
        let transport = HttpClient::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), Arc::new(registry))
            .api_prefix(config.api_prefix())
            .prompt_on_delete(config.prompt_on_delete()))
    }

    /// Creates a client over any transport, with default settings.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, registry: Arc<TypeRegistry>) -> Self {
        Self {
            transport,
            registry,
            gate: ConfirmationGate::default(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            prompt_on_delete: true,
        }
    }

    /// Overrides the path prefix of resource URLs.
    #[must_use]
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.api_prefix = format!("/{}", prefix.trim_matches('/'));
        self
    }

    /// Enables or disables delete confirmation for every call.
    #[must_use]
    pub const fn prompt_on_delete(mut self, prompt: bool) -> Self {
        self.prompt_on_delete = prompt;
        self
    }

    /// Replaces the line reader used for delete confirmation.
    #[must_use]
    pub fn prompt(mut self, prompt: Arc<dyn Prompt>) -> Self {
        self.gate = ConfirmationGate::new(prompt);
        self
    }

    /// Returns the type registry.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Returns the path prefix of resource URLs.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Returns `true` if deletes ask for confirmation.
    #[must_use]
    pub const fn prompts_on_delete(&self) -> bool {
        self.prompt_on_delete
    }

    /// Returns the confirmation gate.
    #[must_use]
    pub const fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    /// Returns a handle for one resource type.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownType`] if the type is not registered.
    pub fn resource(&self, type_name: &str) -> Result<ResourceSet, ResourceError> {
        let schema = self.registry.resolve(type_name)?;
        Ok(ResourceSet::new(self.clone(), schema))
    }

    /// Builds a resource URL under this client's prefix.
    #[must_use]
    pub fn make_url(
        &self,
        type_name: &str,
        id: Option<&str>,
        relation: Option<&str>,
        relationship: bool,
    ) -> String {
        make_url(&self.api_prefix, type_name, id, relation, relationship)
    }

    /// Sends a request through the transport.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] for any transport failure.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ResourceError> {
        Ok(self.transport.request(request).await?)
    }
}
