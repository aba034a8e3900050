//! HTTP response types for the Workbench client.
//!
//! This module provides the [`HttpResponse`] type returned by every
//! [`Transport`](crate::clients::Transport).

use std::collections::HashMap;

/// An HTTP response from the Workbench service.
///
/// The body is kept twice: parsed as JSON (empty object when the payload is
/// not JSON) and as the raw bytes for binary downloads.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, lowercased (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body.
    pub body: serde_json::Value,
    /// The raw response body.
    pub raw_body: Vec<u8>,
    /// Seconds to wait before retrying (from `Retry-After` header).
    pub retry_request_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse` from an already parsed JSON body.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let raw_body = serde_json::to_vec(&body).unwrap_or_default();
        Self::with_raw_body(code, headers, body, raw_body)
    }

    /// Creates a new `HttpResponse` from raw bytes, parsing JSON when possible.
    #[must_use]
    pub fn from_bytes(code: u16, headers: HashMap<String, Vec<String>>, raw_body: Vec<u8>) -> Self {
        let body = if raw_body.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_slice(&raw_body).unwrap_or_else(|_| {
                // Keep non-JSON server errors visible to message extraction
                if code >= 500 {
                    serde_json::json!({ "raw_body": String::from_utf8_lossy(&raw_body) })
                } else {
                    serde_json::json!({})
                }
            })
        };
        Self::with_raw_body(code, headers, body, raw_body)
    }

    fn with_raw_body(
        code: u16,
        headers: HashMap<String, Vec<String>>,
        body: serde_json::Value,
        raw_body: Vec<u8>,
    ) -> Self {
        let retry_request_after = headers
            .get("retry-after")
            .and_then(|values| values.first())
            .and_then(|value| value.parse::<f64>().ok());

        Self {
            code,
            headers,
            body,
            raw_body,
            retry_request_after,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the parsed JSON body.
    #[must_use]
    pub const fn json(&self) -> &serde_json::Value {
        &self.body
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.raw_body
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get("x-request-id")
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Extracts a human readable error message from the body.
    ///
    /// Priority: JSON:API `errors[].detail`, then `errors[].status`, then
    /// `errors[].title`; then `message` (joined with any `validation`
    /// details); then OAuth-style `error_description` and `error`. Falls
    /// back to a generic message carrying the status code.
    #[must_use]
    pub fn error_message(&self) -> String {
        let body = &self.body;

        if let Some(errors) = body.get("errors").and_then(serde_json::Value::as_array) {
            let messages: Vec<String> = errors
                .iter()
                .filter_map(|error| {
                    ["detail", "status", "title"]
                        .iter()
                        .find_map(|key| error.get(*key).and_then(value_text))
                })
                .collect();
            if !messages.is_empty() {
                return messages.join("; ");
            }
        }

        if let Some(message) = body.get("message").and_then(value_text) {
            return match body.get("validation") {
                Some(validation) if !validation.is_null() => {
                    format!("{message}: {validation}")
                }
                _ => message,
            };
        }

        for key in ["error_description", "error", "raw_body"] {
            if let Some(message) = body.get(key).and_then(value_text) {
                return message;
            }
        }

        format!("Request failed with status {}", self.code)
    }
}

fn value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
