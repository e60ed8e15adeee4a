//! Parameter sources and the request-context capability
//!
//! The guard never touches a concrete transport type. It asks a
//! [`RequestContext`] for a named value from one of five locations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Where a declared field is read from.
///
/// Unrecognized tags deserialize into [`ParamSource::Unknown`] instead of
/// failing, and always resolve to "not provided".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamSource {
    Path,
    Query,
    Header,
    Cookie,
    Body,
    Unknown(String),
}

impl ParamSource {
    /// The wire tag (`path`, `query`, ...)
    pub fn as_str(&self) -> &str {
        match self {
            ParamSource::Path => "path",
            ParamSource::Query => "query",
            ParamSource::Header => "header",
            ParamSource::Cookie => "cookie",
            ParamSource::Body => "body",
            ParamSource::Unknown(tag) => tag,
        }
    }

    /// True for `body`-sourced fields
    pub fn is_body(&self) -> bool {
        matches!(self, ParamSource::Body)
    }
}

impl From<&str> for ParamSource {
    fn from(tag: &str) -> Self {
        match tag {
            "path" => ParamSource::Path,
            "query" => ParamSource::Query,
            "header" => ParamSource::Header,
            "cookie" => ParamSource::Cookie,
            "body" => ParamSource::Body,
            other => ParamSource::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ParamSource {
    fn from(tag: String) -> Self {
        ParamSource::from(tag.as_str())
    }
}

impl From<ParamSource> for String {
    fn from(source: ParamSource) -> Self {
        match source {
            ParamSource::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access to the named values of one incoming request.
///
/// Implemented by transport adapters. Every lookup defaults to "absent", so an
/// adapter only overrides the sources its transport has. Header lookups use
/// whatever normalization the transport already applied.
pub trait RequestContext: Send + Sync {
    /// Value of a matched path parameter
    fn path_param(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Value of a query-string parameter
    fn query_param(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Value of a request header
    fn header(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Value of a request cookie
    fn cookie(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Value of a top-level field of the parsed body
    fn body_field(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }
}

/// Look up `field` in the location named by `source`.
///
/// Unknown sources and JSON `null` values both resolve to `None`.
pub fn resolve(ctx: &dyn RequestContext, field: &str, source: &ParamSource) -> Option<Value> {
    let value = match source {
        ParamSource::Path => ctx.path_param(field),
        ParamSource::Query => ctx.query_param(field),
        ParamSource::Header => ctx.header(field),
        ParamSource::Cookie => ctx.cookie(field),
        ParamSource::Body => ctx.body_field(field),
        ParamSource::Unknown(_) => {
            crate::trace_debug!(field, %source, "ignoring param with unknown source");
            None
        }
    };

    value.filter(|v| !v.is_null())
}
