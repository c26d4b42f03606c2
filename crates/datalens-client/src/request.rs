// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request description handed to the transport.

use datalens_core::DatalensError;
use reqwest::multipart::Form;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// Endpoints called without an `Authorization` header.
pub const EXEMPT_ENDPOINTS: &[&str] = &["/users/token", "/users/token/refresh", "/users/register"];

/// Whether `endpoint` is one of the credential-issuing endpoints.
pub fn is_exempt(endpoint: &str) -> bool {
    let path = endpoint.split('?').next().unwrap_or(endpoint);
    let path = path.trim_end_matches('/');
    EXEMPT_ENDPOINTS.contains(&path)
}

/// A query parameter value. `Many` repeats the key once per item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::One(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::One(value)
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        QueryValue::One(value.clone())
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::Many(values)
    }
}

impl From<&[String]> for QueryValue {
    fn from(values: &[String]) -> Self {
        QueryValue::Many(values.to_vec())
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        QueryValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

macro_rules! query_value_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    QueryValue::One(value.to_string())
                }
            }
        )*
    };
}

query_value_from_display!(bool, i32, i64, u32, u64, usize, f64);

pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    /// Sent without an explicit `Content-Type` so the boundary is filled in.
    Multipart(Form),
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => write!(f, "Empty"),
            RequestBody::Json(_) => write!(f, "Json(..)"),
            RequestBody::Form(fields) => write!(f, "Form({} fields)", fields.len()),
            RequestBody::Multipart(_) => write!(f, "Multipart(..)"),
        }
    }
}

/// One outbound call: endpoint, method, query, body, and extra headers.
#[derive(Debug)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) endpoint: String,
    pub(crate) query: Vec<(String, QueryValue)>,
    pub(crate) body: RequestBody,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) skip_auth: bool,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: Vec::new(),
            skip_auth: false,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_opt<V: Into<QueryValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Add every field of `params` as a query parameter.
    ///
    /// `params` must serialize to a JSON object. Null fields are skipped and
    /// arrays become repeated keys.
    pub fn query_from<T: Serialize>(mut self, params: &T) -> Result<Self, DatalensError> {
        let value = serde_json::to_value(params)
            .map_err(|e| DatalensError::Internal(format!("failed to encode query: {e}")))?;
        let Value::Object(fields) = value else {
            return Err(DatalensError::Internal(
                "query parameters must serialize to an object".into(),
            ));
        };
        for (key, value) in fields {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    let items = items
                        .into_iter()
                        .filter(|v| !v.is_null())
                        .map(scalar_to_string)
                        .collect();
                    self.query.push((key, QueryValue::Many(items)));
                }
                other => self.query.push((key, QueryValue::One(scalar_to_string(other)))),
            }
        }
        Ok(self)
    }

    /// JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, DatalensError> {
        let value = serde_json::to_value(body)
            .map_err(|e| DatalensError::Internal(format!("failed to encode request body: {e}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send without an `Authorization` header.
    pub fn without_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    pub fn requires_auth(&self) -> bool {
        !self.skip_auth && !is_exempt(&self.endpoint)
    }

    /// Query pairs in insertion order with `Many` values expanded.
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.query
            .iter()
            .flat_map(|(key, value)| match value {
                QueryValue::One(v) => vec![(key.as_str(), v.as_str())],
                QueryValue::Many(vs) => vs.iter().map(|v| (key.as_str(), v.as_str())).collect(),
            })
            .collect()
    }
}

fn scalar_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalens_core::dataset::{DatasetListQuery, SortOrder};

    #[test]
    fn exempt_endpoints() {
        assert!(is_exempt("/users/token"));
        assert!(is_exempt("/users/token/refresh?refresh_token=abc"));
        assert!(is_exempt("/users/register/"));
        assert!(!is_exempt("/users/me"));
        assert!(!is_exempt("/datasets"));
    }

    #[test]
    fn many_expands_to_repeated_keys() {
        let req = ApiRequest::get("/datasets")
            .query("tags", vec!["a", "b"])
            .query("limit", 10u64);
        assert_eq!(
            req.query_pairs(),
            vec![("tags", "a"), ("tags", "b"), ("limit", "10")]
        );
    }

    #[test]
    fn query_from_struct_skips_unset_fields() {
        let query = DatasetListQuery {
            limit: Some(20),
            sort_order: Some(SortOrder::Asc),
            tags: vec!["sales".into(), "2024".into()],
            ..Default::default()
        };
        let req = ApiRequest::get("/datasets").query_from(&query).unwrap();
        let mut pairs = req.query_pairs();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("limit", "20"),
                ("sort_order", "asc"),
                ("tags", "2024"),
                ("tags", "sales")
            ]
        );
    }

    #[test]
    fn query_from_rejects_non_objects() {
        assert!(ApiRequest::get("/x").query_from(&vec![1, 2]).is_err());
    }

    #[test]
    fn auth_requirement() {
        assert!(ApiRequest::get("/users/me").requires_auth());
        assert!(!ApiRequest::post("/users/token").requires_auth());
        assert!(!ApiRequest::get("/health").without_auth().requires_auth());
    }

    #[test]
    fn query_opt_skips_none() {
        let req = ApiRequest::get("/datasets/search/suggest")
            .query("q", "sal")
            .query_opt::<u64>("limit", None);
        assert_eq!(req.query_pairs(), vec![("q", "sal")]);
    }
}
