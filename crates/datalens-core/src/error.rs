// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the DataLens client.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// The primary error type used across all DataLens crates.
#[derive(Debug, Error)]
pub enum DatalensError {
    /// Configuration errors (invalid TOML, bad base URL, missing required values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable client storage errors (file I/O, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend answered with a non-2xx status that has no more specific variant.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<Value>,
    },

    /// Missing, expired, or rejected credentials (HTTP 401/403).
    #[error("authentication error: {message}")]
    Authentication {
        status: Option<u16>,
        message: String,
    },

    /// Rejected input (HTTP 400/422, or client-side checks before a request is sent).
    #[error("validation error: {message}")]
    Validation {
        status: Option<u16>,
        message: String,
        details: Option<Value>,
    },

    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("network error: {message}")]
    Network {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// A bearer token could not be decoded into claims.
    #[error("token decode error: {0}")]
    TokenDecode(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Structured error body returned by the backend.
///
/// The backend reports failures as `{"detail": ...}` where `detail` is either
/// a string or a list of field errors; some endpoints add `message`/`code`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorPayload {
    /// Human-readable summary of the payload, if it carries one.
    pub fn summary(&self) -> Option<String> {
        if let Some(message) = &self.message {
            return Some(message.clone());
        }
        match self.detail.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| {
                        let msg = item.get("msg").and_then(Value::as_str)?;
                        let field = item
                            .get("loc")
                            .and_then(Value::as_array)
                            .and_then(|loc| loc.last())
                            .map(|v| match v {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            });
                        Some(match field {
                            Some(field) => format!("{field}: {msg}"),
                            None => msg.to_string(),
                        })
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl DatalensError {
    /// Classify a non-2xx HTTP response into the error taxonomy.
    pub fn from_status(status: u16, payload: Option<ErrorPayload>) -> Self {
        let payload = payload.unwrap_or_default();
        let message = payload
            .summary()
            .unwrap_or_else(|| format!("request failed with status {status}"));

        match status {
            401 | 403 => DatalensError::Authentication {
                status: Some(status),
                message,
            },
            400 | 422 => DatalensError::Validation {
                status: Some(status),
                message,
                details: payload.detail,
            },
            _ => DatalensError::Api {
                status,
                code: payload.code,
                message,
                details: payload.detail,
            },
        }
    }

    /// Shorthand for an authentication error raised on the client side.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        DatalensError::Authentication {
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for a client-side validation failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        DatalensError::Validation {
            status: None,
            message: message.into(),
            details: None,
        }
    }

    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            DatalensError::Api { status, .. } => Some(*status),
            DatalensError::Authentication { status, .. }
            | DatalensError::Validation { status, .. } => *status,
            _ => None,
        }
    }

    /// The message without its category prefix, for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            DatalensError::Api { message, .. }
            | DatalensError::Authentication { message, .. }
            | DatalensError::Validation { message, .. }
            | DatalensError::Network { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, DatalensError::Authentication { .. })
    }

    /// Returns true for failures worth retrying: no response, a timeout,
    /// or a 5xx/429 from the backend.
    pub fn is_transient(&self) -> bool {
        match self {
            DatalensError::Network { .. } | DatalensError::Timeout { .. } => true,
            DatalensError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
