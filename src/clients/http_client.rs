//! HTTP client for Workbench API communication.
//!
//! This module provides the [`HttpClient`] type, the reqwest-backed
//! [`Transport`] used in production.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::clients::errors::{HttpError, HttpResponseError, MaxHttpRetriesExceededError};
use crate::clients::http_request::{HttpMethod, HttpRequest, RequestBody};
use crate::clients::http_response::HttpResponse;
use crate::clients::transport::Transport;
use crate::config::{BaseUrl, WorkbenchConfig};

/// Fixed retry wait time in seconds when the server gives no `Retry-After`.
pub const RETRY_WAIT_TIME: u64 = 1;

/// Library version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Status codes that are retried up to the configured number of tries.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// HTTP client for making requests to the Workbench API.
///
/// The client handles:
/// - URL construction from the configured base URL (absolute URLs such as
///   `links.next` are used as-is)
/// - Default headers including User-Agent and the bearer token
/// - Automatic retry logic for 429 and 5xx gateway responses
/// - A single reconnect-and-retry when the connection itself fails
/// - Withholding the bearer token from absolute URLs on other hosts
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use workbench_api::{WorkbenchConfig, BaseUrl, ApiToken};
/// use workbench_api::clients::{HttpClient, HttpRequest, HttpMethod, Transport};
///
/// let config = WorkbenchConfig::builder()
///     .base_url(BaseUrl::new("https://workbench.example.com")?)
///     .api_token(ApiToken::new("token")?)
///     .build()?;
///
/// let client = HttpClient::new(&config)?;
/// let request = HttpRequest::builder(HttpMethod::Get, "/api/v2/investigations").build()?;
/// let response = client.request(request).await?;
/// ```
#[derive(Debug)]
pub struct HttpClient {
    /// The internal reqwest HTTP client, replaced after a connection failure.
    client: RwLock<reqwest::Client>,
    /// Base URL of the service.
    base_url: BaseUrl,
    /// Default headers to include in all requests.
    default_headers: HashMap<String, String>,
    /// Request timeout.
    timeout: Duration,
    /// Attempts for retryable statuses.
    tries: u32,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the underlying reqwest client
    /// cannot be created (e.g. TLS initialization failure).
    pub fn new(config: &WorkbenchConfig) -> Result<Self, HttpError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}Workbench API Library v{SDK_VERSION} | Rust {rust_version}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert(
            "Accept".to_string(),
            "application/vnd.api+json, application/json".to_string(),
        );

        if let Some(token) = config.api_token() {
            default_headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", token.as_ref()),
            );
        }

        let client = Self::build_client(config.timeout())?;

        Ok(Self {
            client: RwLock::new(client),
            base_url: config.base_url().clone(),
            default_headers,
            timeout: config.timeout(),
            tries: config.tries(),
        })
    }

    fn build_client(timeout: Duration) -> Result<reqwest::Client, HttpError> {
        Ok(reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()?)
    }

    /// Returns the base URL for this client.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the number of attempts made for retryable statuses.
    #[must_use]
    pub const fn tries(&self) -> u32 {
        self.tries
    }

    fn current_client(&self) -> reqwest::Client {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reconnect(&self) -> Result<(), HttpError> {
        let fresh = Self::build_client(self.timeout)?;
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        Ok(())
    }

    fn build_request(
        client: &reqwest::Client,
        url: &str,
        headers: &HashMap<String, String>,
        request: &HttpRequest,
    ) -> reqwest::RequestBuilder {
        let mut req_builder = match request.http_method {
            HttpMethod::Get => client.get(url),
            HttpMethod::Post => client.post(url),
            HttpMethod::Patch => client.patch(url),
            HttpMethod::Delete => client.delete(url),
        };

        for (key, value) in headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(query) = &request.query {
            req_builder = req_builder.query(query);
        }

        // Content-Type is already in `headers`, so json() keeps it
        match &request.body {
            Some(RequestBody::Json(value)) => req_builder.json(value),
            Some(RequestBody::Bytes(bytes)) => req_builder.body(bytes.clone()),
            None => req_builder,
        }
    }

    /// Sends one attempt, rebuilding the connection once if it fails.
    ///
    /// A refused connect and a connection dropped before the response both
    /// count as connection failures. Timeouts do not.
    async fn send_once(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        request: &HttpRequest,
    ) -> Result<reqwest::Response, HttpError> {
        let client = self.current_client();
        match Self::build_request(&client, url, headers, request).send().await {
            Ok(response) => Ok(response),
            Err(e) if is_connection_failure(&e) => {
                tracing::warn!(url = %url, error = %e, "Connection failed, reconnecting once");
                self.reconnect()?;
                let client = self.current_client();
                Ok(Self::build_request(&client, url, headers, request)
                    .send()
                    .await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Calculates the retry delay based on response and status code.
    fn calculate_retry_delay(response: &HttpResponse, status: u16) -> Duration {
        // Only 429 honours Retry-After
        if status == 429 {
            if let Some(retry_after) = response.retry_request_after {
                if retry_after.is_finite() && retry_after >= 0.0 {
                    return Duration::from_secs_f64(retry_after);
                }
            }
        }
        Duration::from_secs(RETRY_WAIT_TIME)
    }
}

fn is_connection_failure(error: &reqwest::Error) -> bool {
    error.is_connect() || (error.is_request() && !error.is_timeout())
}

#[async_trait]
impl Transport for HttpClient {
    /// Sends an HTTP request to the Workbench API.
    ///
    /// This method handles:
    /// - Request validation
    /// - URL construction
    /// - Header merging
    /// - Response parsing
    /// - Retry logic for 429 and 5xx gateway responses
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let url = self.base_url.join(&request.path);

        let mut headers = self.default_headers.clone();
        if let Some(body_type) = &request.body_type {
            headers.insert(
                "Content-Type".to_string(),
                body_type.as_content_type().to_string(),
            );
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }
        // The token only goes to the configured host
        if !self.base_url.is_same_origin(&request.path) {
            tracing::warn!(url = %url, "Dropping credentials for request to another host");
            headers.retain(|key, _| !key.eq_ignore_ascii_case("authorization"));
        }

        let mut tries: u32 = 0;
        loop {
            tries += 1;
            tracing::debug!(
                method = %request.http_method,
                url = %url,
                attempt = tries,
                "Sending request"
            );

            let res = self.send_once(&url, &headers, &request).await?;

            let code = res.status().as_u16();
            let res_headers = Self::parse_response_headers(res.headers());
            let raw_body = res.bytes().await.map(|b| b.to_vec()).unwrap_or_default();

            let response = HttpResponse::from_bytes(code, res_headers, raw_body);

            if response.is_ok() || !request.raise_for_status {
                return Ok(response);
            }

            let error_message = response.error_message();
            let error_reference = response.request_id().map(String::from);

            if !RETRYABLE_STATUSES.contains(&code) {
                return Err(HttpError::Response(HttpResponseError {
                    code,
                    message: error_message,
                    error_reference,
                }));
            }

            if tries >= self.tries {
                if self.tries == 1 {
                    return Err(HttpError::Response(HttpResponseError {
                        code,
                        message: error_message,
                        error_reference,
                    }));
                }
                return Err(HttpError::MaxRetries(MaxHttpRetriesExceededError {
                    code,
                    tries: self.tries,
                    message: error_message,
                    error_reference,
                }));
            }

            let delay = Self::calculate_retry_delay(&response, code);
            tracing::warn!(
                status = code,
                attempt = tries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retryable response from {url}"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiToken;

    fn config(token: Option<&str>) -> WorkbenchConfig {
        let mut builder = WorkbenchConfig::builder()
            .base_url(BaseUrl::new("https://workbench.example.com").unwrap());
        if let Some(token) = token {
            builder = builder.api_token(ApiToken::new(token).unwrap());
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_client_construction_with_config() {
        let client = HttpClient::new(&config(Some("token"))).unwrap();
        assert_eq!(client.base_url().as_ref(), "https://workbench.example.com");
        assert_eq!(client.tries(), 3);
    }

    #[test]
    fn test_user_agent_header_format() {
        let client = HttpClient::new(&config(None)).unwrap();
        let user_agent = client.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.contains("Workbench API Library v"));
        assert!(user_agent.contains("Rust"));
    }

    #[test]
    fn test_bearer_token_header_injection() {
        let client = HttpClient::new(&config(Some("secret"))).unwrap();
        assert_eq!(
            client.default_headers().get("Authorization"),
            Some(&"Bearer secret".to_string())
        );
    }

    #[test]
    fn test_no_authorization_header_without_token() {
        let client = HttpClient::new(&config(None)).unwrap();
        assert!(client.default_headers().get("Authorization").is_none());
    }

    #[test]
    fn test_user_agent_with_prefix() {
        let config = WorkbenchConfig::builder()
            .base_url(BaseUrl::new("https://workbench.example.com").unwrap())
            .user_agent_prefix("Poller/1.0")
            .build()
            .unwrap();
        let client = HttpClient::new(&config).unwrap();

        let user_agent = client.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.starts_with("Poller/1.0 | "));
    }

    #[test]
    fn test_retry_delay_honours_retry_after_for_429_only() {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), vec!["0.5".to_string()]);
        let response = HttpResponse::new(429, headers.clone(), serde_json::json!({}));
        assert_eq!(
            HttpClient::calculate_retry_delay(&response, 429),
            Duration::from_millis(500)
        );

        let response = HttpResponse::new(503, headers, serde_json::json!({}));
        assert_eq!(
            HttpClient::calculate_retry_delay(&response, 503),
            Duration::from_secs(RETRY_WAIT_TIME)
        );
    }
}
