//! Configuration types for the Workbench client.
//!
//! This module provides the configuration used to initialize the transport
//! and the resource layer.
//!
//! # Overview
//!
//! - [`WorkbenchConfig`]: The main configuration struct holding all client settings
//! - [`WorkbenchConfigBuilder`]: A builder for constructing [`WorkbenchConfig`] instances
//! - [`ApiToken`]: A validated API token with masked debug output
//! - [`BaseUrl`]: A validated service base URL
//!
//! # Example
//!
//! ```rust
//! use workbench_api::{WorkbenchConfig, ApiToken, BaseUrl};
//!
//! let config = WorkbenchConfig::builder()
//!     .base_url(BaseUrl::new("https://workbench.example.com").unwrap())
//!     .api_token(ApiToken::new("my-token").unwrap())
//!     .build()
//!     .unwrap();
//! assert!(config.prompt_on_delete());
//! ```

mod newtypes;

use std::time::Duration;

pub use newtypes::{ApiToken, BaseUrl};

use crate::error::ConfigError;

/// Default path prefix for every resource URL.
pub const DEFAULT_API_PREFIX: &str = "/api/v2";

/// Default request timeout, passed through to the HTTP layer unchanged.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of attempts for rate-limited or failing requests.
pub const DEFAULT_TRIES: u32 = 3;

/// Configuration for the Workbench client.
///
/// # Thread Safety
///
/// `WorkbenchConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug)]
pub struct WorkbenchConfig {
    base_url: BaseUrl,
    api_token: Option<ApiToken>,
    api_prefix: String,
    prompt_on_delete: bool,
    timeout: Duration,
    tries: u32,
    user_agent_prefix: Option<String>,
}

impl WorkbenchConfig {
    /// Creates a new builder for constructing a `WorkbenchConfig`.
    #[must_use]
    pub fn builder() -> WorkbenchConfigBuilder {
        WorkbenchConfigBuilder::new()
    }

    /// Returns the service base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the API token, if configured.
    #[must_use]
    pub const fn api_token(&self) -> Option<&ApiToken> {
        self.api_token.as_ref()
    }

    /// Returns the path prefix prepended to resource URLs (e.g. `/api/v2`).
    #[must_use]
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Returns whether destructive calls require interactive confirmation.
    #[must_use]
    pub const fn prompt_on_delete(&self) -> bool {
        self.prompt_on_delete
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the number of attempts for retryable status codes.
    #[must_use]
    pub const fn tries(&self) -> u32 {
        self.tries
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

// Verify WorkbenchConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WorkbenchConfig>();
};

/// Builder for constructing [`WorkbenchConfig`] instances.
///
/// `base_url` is required. All other fields have defaults.
///
/// # Defaults
///
/// - `api_prefix`: `/api/v2`
/// - `prompt_on_delete`: `true`
/// - `timeout`: 30 seconds
/// - `tries`: 3
/// - `api_token`: `None`
/// - `user_agent_prefix`: `None`
#[derive(Debug, Default)]
pub struct WorkbenchConfigBuilder {
    base_url: Option<BaseUrl>,
    api_token: Option<ApiToken>,
    api_prefix: Option<String>,
    prompt_on_delete: Option<bool>,
    timeout: Option<Duration>,
    tries: Option<u32>,
    user_agent_prefix: Option<String>,
}

impl WorkbenchConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service base URL (required).
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API token sent as a bearer credential.
    #[must_use]
    pub fn api_token(mut self, token: ApiToken) -> Self {
        self.api_token = Some(token);
        self
    }

    /// Overrides the resource path prefix.
    #[must_use]
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.api_prefix = Some(format!("/{}", prefix.trim_matches('/')));
        self
    }

    /// Enables or disables the delete confirmation gate.
    #[must_use]
    pub const fn prompt_on_delete(mut self, prompt: bool) -> Self {
        self.prompt_on_delete = Some(prompt);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the number of attempts for 429 and 5xx responses.
    ///
    /// Values below 1 are treated as 1.
    #[must_use]
    pub const fn tries(mut self, tries: u32) -> Self {
        self.tries = Some(tries);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`WorkbenchConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `base_url` is not set.
    pub fn build(self) -> Result<WorkbenchConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or(ConfigError::MissingRequiredField { field: "base_url" })?;

        Ok(WorkbenchConfig {
            base_url,
            api_token: self.api_token,
            api_prefix: self
                .api_prefix
                .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string()),
            prompt_on_delete: self.prompt_on_delete.unwrap_or(true),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            tries: self.tries.unwrap_or(DEFAULT_TRIES).max(1),
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}
