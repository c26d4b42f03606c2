// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response bodies, shaped by `Content-Type`.

use bytes::Bytes;
use datalens_core::{DatalensError, ErrorPayload};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Longest error body kept verbatim when it is not structured JSON.
const MAX_ERROR_TEXT: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// `204 No Content` or a zero-length body.
    Empty,
    Json(Value),
    Text(String),
    /// Passed through untouched (downloads, exports, images).
    Binary { content_type: String, bytes: Bytes },
}

/// Media types returned as raw bytes.
fn is_binary(mime: &str) -> bool {
    matches!(
        mime,
        "application/octet-stream"
            | "application/zip"
            | "application/x-zip-compressed"
            | "application/pdf"
            | "application/vnd.apache.parquet"
    ) || mime.starts_with("application/vnd.")
        || mime.starts_with("image/")
}

fn is_json(mime: &str) -> bool {
    mime == "application/json" || mime.ends_with("+json")
}

impl ApiResponse {
    /// Classify a successful response body.
    pub fn from_parts(
        status: u16,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<Self, DatalensError> {
        if status == 204 || bytes.is_empty() {
            return Ok(ApiResponse::Empty);
        }

        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if is_binary(&mime) {
            return Ok(ApiResponse::Binary {
                content_type: mime,
                bytes,
            });
        }
        if is_json(&mime) {
            return serde_json::from_slice(&bytes)
                .map(ApiResponse::Json)
                .map_err(|e| DatalensError::Internal(format!("response is not valid JSON: {e}")));
        }
        Ok(ApiResponse::Text(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Deserialize the body. An empty body deserializes from `null`, and text
    /// bodies are parsed as JSON for backends that mislabel them.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, DatalensError> {
        let decode_err = |e: serde_json::Error| {
            DatalensError::Internal(format!("unexpected response shape: {e}"))
        };
        match self {
            ApiResponse::Json(value) => serde_json::from_value(value).map_err(decode_err),
            ApiResponse::Empty => serde_json::from_value(Value::Null).map_err(decode_err),
            ApiResponse::Text(text) => serde_json::from_str(&text).map_err(decode_err),
            ApiResponse::Binary { content_type, .. } => Err(DatalensError::Internal(format!(
                "expected JSON, got `{content_type}`"
            ))),
        }
    }

    /// Raw bytes of a binary or text body.
    pub fn into_bytes(self) -> Result<Bytes, DatalensError> {
        match self {
            ApiResponse::Binary { bytes, .. } => Ok(bytes),
            ApiResponse::Text(text) => Ok(Bytes::from(text)),
            ApiResponse::Empty => Ok(Bytes::new()),
            ApiResponse::Json(value) => Ok(Bytes::from(value.to_string())),
        }
    }
}

/// Turn a non-2xx response into an error, keeping any structured payload.
pub fn error_from_response(status: u16, body: &[u8]) -> DatalensError {
    let payload = serde_json::from_slice::<ErrorPayload>(body).ok().or_else(|| {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        (!text.is_empty()).then(|| ErrorPayload {
            detail: Some(Value::String(text.chars().take(MAX_ERROR_TEXT).collect())),
            ..Default::default()
        })
    });
    DatalensError::from_status(status, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_type_decides_shape() {
        let json = ApiResponse::from_parts(
            200,
            Some("application/json; charset=utf-8"),
            Bytes::from_static(br#"{"ok":true}"#),
        )
        .unwrap();
        assert_eq!(json, ApiResponse::Json(json!({"ok": true})));

        let problem = ApiResponse::from_parts(
            200,
            Some("application/problem+json"),
            Bytes::from_static(b"[]"),
        )
        .unwrap();
        assert_eq!(problem, ApiResponse::Json(json!([])));

        let text = ApiResponse::from_parts(200, Some("text/csv"), Bytes::from_static(b"a,b\n1,2"))
            .unwrap();
        assert_eq!(text, ApiResponse::Text("a,b\n1,2".into()));

        let xlsx = ApiResponse::from_parts(
            200,
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            Bytes::from_static(b"PK\x03\x04"),
        )
        .unwrap();
        assert!(matches!(xlsx, ApiResponse::Binary { .. }));
    }

    #[test]
    fn no_content_is_empty() {
        assert_eq!(
            ApiResponse::from_parts(204, Some("application/json"), Bytes::from_static(b"{}"))
                .unwrap(),
            ApiResponse::Empty
        );
        assert_eq!(
            ApiResponse::from_parts(200, Some("application/json"), Bytes::new()).unwrap(),
            ApiResponse::Empty
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err =
            ApiResponse::from_parts(200, Some("application/json"), Bytes::from_static(b"{oops"))
                .unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn empty_body_into_unit_or_option() {
        let unit: () = ApiResponse::Empty.into_json().unwrap();
        assert_eq!(unit, ());
        let none: Option<u32> = ApiResponse::Empty.into_json().unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn plain_text_error_body_becomes_message() {
        let err = error_from_response(502, b"Bad Gateway\n");
        assert_eq!(err.to_string(), "API error (502): Bad Gateway");
    }

    #[test]
    fn structured_error_body_is_kept() {
        let err = error_from_response(404, br#"{"detail":"Dataset not found","code":"not_found"}"#);
        match err {
            DatalensError::Api { status, code, message, .. } => {
                assert_eq!(status, 404);
                assert_eq!(code.as_deref(), Some("not_found"));
                assert_eq!(message, "Dataset not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
