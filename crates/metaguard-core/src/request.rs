//! Request contexts
//!
//! [`RequestParts`] holds already-extracted values and suits tests and custom
//! transports. [`HttpRequestContext`] adapts an `http::Request` plus the path
//! parameters matched by whatever router dispatched it.

use crate::source::RequestContext;
use bytes::Bytes;
use http::request::Parts;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// In-memory request context
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    path: HashMap<String, Value>,
    query: HashMap<String, Value>,
    headers: HashMap<String, Value>,
    cookies: HashMap<String, Value>,
    body: Map<String, Value>,
}

impl RequestParts {
    /// Create a builder
    pub fn builder() -> RequestPartsBuilder {
        RequestPartsBuilder::default()
    }
}

impl RequestContext for RequestParts {
    fn path_param(&self, name: &str) -> Option<Value> {
        self.path.get(name).cloned()
    }

    fn query_param(&self, name: &str) -> Option<Value> {
        self.query.get(name).cloned()
    }

    fn header(&self, name: &str) -> Option<Value> {
        self.headers.get(name).cloned()
    }

    fn cookie(&self, name: &str) -> Option<Value> {
        self.cookies.get(name).cloned()
    }

    fn body_field(&self, name: &str) -> Option<Value> {
        self.body.get(name).cloned()
    }
}

/// Builder for [`RequestParts`]
#[derive(Debug, Default)]
pub struct RequestPartsBuilder {
    parts: RequestParts,
}

impl RequestPartsBuilder {
    pub fn path(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parts.path.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parts.query.insert(name.into(), value.into());
        self
    }

    /// Header names are stored exactly as given
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parts.headers.insert(name.into(), value.into());
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parts.cookies.insert(name.into(), value.into());
        self
    }

    /// Set a single body field
    pub fn body(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parts.body.insert(name.into(), value.into());
        self
    }

    /// Replace the body with a parsed JSON document. Non-object documents have no fields.
    pub fn body_json(mut self, body: Value) -> Self {
        self.parts.body = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    pub fn build(self) -> RequestParts {
        self.parts
    }
}

/// Request context over an `http::Request` with a buffered body.
///
/// Query parameters keep their first occurrence. Header lookups go through
/// `http::HeaderMap`, so they follow its case-insensitive matching.
#[derive(Debug)]
pub struct HttpRequestContext {
    parts: Parts,
    path_params: HashMap<String, String>,
    query: HashMap<String, String>,
    body: Map<String, Value>,
}

impl HttpRequestContext {
    /// Build a context from a request whose body is already collected.
    ///
    /// Fails if the body is non-empty and not valid JSON.
    pub fn from_request(
        request: http::Request<Bytes>,
        path_params: HashMap<String, String>,
    ) -> Result<Self, serde_json::Error> {
        let (parts, body) = request.into_parts();

        let body = if body.is_empty() {
            Map::new()
        } else {
            match serde_json::from_slice::<Value>(&body)? {
                Value::Object(map) => map,
                _ => Map::new(),
            }
        };

        let mut query = HashMap::new();
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(
            parts.uri.query().unwrap_or(""),
        )
        .unwrap_or_default();
        for (name, value) in pairs {
            query.entry(name).or_insert(value);
        }

        Ok(Self {
            parts,
            path_params,
            query,
            body,
        })
    }

    /// The underlying request head
    pub fn parts(&self) -> &Parts {
        &self.parts
    }
}

impl RequestContext for HttpRequestContext {
    fn path_param(&self, name: &str) -> Option<Value> {
        self.path_params.get(name).cloned().map(Value::String)
    }

    fn query_param(&self, name: &str) -> Option<Value> {
        self.query.get(name).cloned().map(Value::String)
    }

    fn header(&self, name: &str) -> Option<Value> {
        self.parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| Value::String(value.to_string()))
    }

    #[cfg(feature = "cookies")]
    fn cookie(&self, name: &str) -> Option<Value> {
        self.parts
            .headers
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .flat_map(cookie::Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|c| c.name() == name)
            .map(|c| Value::String(c.value().to_string()))
    }

    fn body_field(&self, name: &str) -> Option<Value> {
        self.body.get(name).cloned()
    }
}
