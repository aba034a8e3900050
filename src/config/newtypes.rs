//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated Workbench API token.
///
/// This newtype ensures the token is non-empty and masks its value
/// in debug output to prevent accidental exposure in logs.
///
/// # Example
///
/// ```rust
/// use workbench_api::ApiToken;
///
/// let token = ApiToken::new("my-token").unwrap();
/// assert_eq!(token.as_ref(), "my-token");
/// assert_eq!(format!("{:?}", token), "ApiToken(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Creates a new validated API token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiToken`] if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::EmptyApiToken);
        }
        Ok(Self(token))
    }
}

impl AsRef<str> for ApiToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(*****)")
    }
}

/// A validated base URL for the Workbench service.
///
/// The URL must carry a scheme and a host. A trailing slash is stripped so
/// that paths can be appended directly.
///
/// # Example
///
/// ```rust
/// use workbench_api::BaseUrl;
///
/// let url = BaseUrl::new("https://workbench.example.com/").unwrap();
/// assert_eq!(url.as_ref(), "https://workbench.example.com");
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.host_name(), "workbench.example.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseUrl {
    url: String,
    scheme_end: usize,
    host_start: usize,
    host_end: usize,
}

impl BaseUrl {
    /// Creates a new validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL is invalid.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/').to_string();

        let scheme_end = url
            .find("://")
            .ok_or_else(|| ConfigError::InvalidBaseUrl { url: url.clone() })?;

        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidBaseUrl { url: url.clone() });
        }

        let host_start = scheme_end + 3;
        if host_start >= url.len() {
            return Err(ConfigError::InvalidBaseUrl { url: url.clone() });
        }

        // Host ends at port, path, query, or end of string
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_end == host_start {
            return Err(ConfigError::InvalidBaseUrl { url: url.clone() });
        }

        Ok(Self {
            url,
            scheme_end,
            host_start,
            host_end,
        })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }

    /// Returns `true` if `url` is relative, or absolute on this scheme, host
    /// and port.
    ///
    /// ```rust
    /// use workbench_api::BaseUrl;
    ///
    /// let base = BaseUrl::new("https://workbench.example.com").unwrap();
    /// assert!(base.is_same_origin("/api/v2/investigations"));
    /// assert!(base.is_same_origin("https://workbench.example.com/api/v2/files"));
    /// assert!(!base.is_same_origin("https://cdn.example.net/api/v2/files"));
    /// ```
    #[must_use]
    pub fn is_same_origin(&self, url: &str) -> bool {
        if !is_absolute(url) {
            return true;
        }
        Self::new(url).is_ok_and(|other| {
            other.scheme().eq_ignore_ascii_case(self.scheme())
                && other.authority().eq_ignore_ascii_case(self.authority())
        })
    }

    /// Host and port, as written.
    fn authority(&self) -> &str {
        let rest = &self.url[self.host_start..];
        let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        &rest[..end]
    }

    /// Joins a path or absolute URL onto this base.
    ///
    /// Absolute URLs (as found in `links.next`) are returned unchanged.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        if is_absolute(path) {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.url)
        } else {
            format!("{}/{path}", self.url)
        }
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.url)
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_token_rejects_empty_string() {
        assert!(matches!(ApiToken::new(""), Err(ConfigError::EmptyApiToken)));
        assert!(matches!(ApiToken::new("   "), Err(ConfigError::EmptyApiToken)));
    }

    #[test]
    fn test_api_token_masks_value_in_debug() {
        let token = ApiToken::new("super-secret-token").unwrap();
        let debug_output = format!("{:?}", token);
        assert_eq!(debug_output, "ApiToken(*****)");
        assert!(!debug_output.contains("super-secret-token"));
    }

    #[test]
    fn test_base_url_validates_format() {
        let url = BaseUrl::new("https://workbench.example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_name(), "workbench.example.com");

        let url = BaseUrl::new("http://localhost:3000").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_name(), "localhost");
    }

    #[test]
    fn test_base_url_rejects_invalid() {
        assert!(BaseUrl::new("workbench.example.com").is_err());
        assert!(BaseUrl::new("https://").is_err());
        assert!(BaseUrl::new("://example.com").is_err());
    }

    #[test]
    fn test_base_url_join_handles_relative_and_absolute() {
        let url = BaseUrl::new("https://workbench.example.com/").unwrap();
        assert_eq!(
            url.join("/api/v2/investigations"),
            "https://workbench.example.com/api/v2/investigations"
        );
        assert_eq!(
            url.join("api/v2/investigations"),
            "https://workbench.example.com/api/v2/investigations"
        );
        assert_eq!(
            url.join("https://other.example.com/api/v2/investigations?page[after]=x"),
            "https://other.example.com/api/v2/investigations?page[after]=x"
        );
    }

    #[test]
    fn test_same_origin_compares_scheme_host_and_port() {
        let url = BaseUrl::new("http://localhost:3000").unwrap();
        assert!(url.is_same_origin("/api/v2/investigations"));
        assert!(url.is_same_origin("http://LOCALHOST:3000/api/v2/investigations?page[after]=x"));
        assert!(!url.is_same_origin("http://localhost:4000/api/v2/investigations"));
        assert!(!url.is_same_origin("https://localhost:3000/api/v2/investigations"));
        assert!(!url.is_same_origin("http://evil.example.com/api/v2/investigations"));
    }

    #[test]
    fn test_base_url_round_trips_through_serde() {
        let url = BaseUrl::new("https://workbench.example.com").unwrap();
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, r#""https://workbench.example.com""#);
        let restored: BaseUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, url);
    }
}
