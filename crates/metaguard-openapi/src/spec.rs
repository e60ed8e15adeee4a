//! OpenAPI specification types

use crate::config::{License, OpenApiConfig, Server, Tag};
use crate::generator;
use metaguard_core::{ExternalDocs, Guard, GuardConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// OpenAPI version emitted by [`OpenApiSpec`]
pub const OPENAPI_VERSION: &str = "3.0.2";

/// API information for OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// Reusable components of the document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Value>,
}

/// OpenAPI document assembled from guard metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiSpec {
    pub openapi: String,
    pub info: ApiInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
}

/// Path item in OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
}

impl PathItem {
    /// Slot for an HTTP method, matched case-insensitively
    pub fn operation_mut(&mut self, method: &str) -> Option<&mut Option<Operation>> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(&mut self.get),
            "POST" => Some(&mut self.post),
            "PUT" => Some(&mut self.put),
            "PATCH" => Some(&mut self.patch),
            "DELETE" => Some(&mut self.delete),
            "HEAD" => Some(&mut self.head),
            "OPTIONS" => Some(&mut self.options),
            _ => None,
        }
    }
}

/// Operation (endpoint) in OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

impl Operation {
    /// An operation with only the default `200` response
    pub fn new() -> Self {
        Self {
            tags: None,
            summary: None,
            description: None,
            external_docs: None,
            operation_id: None,
            parameters: None,
            request_body: None,
            responses: BTreeMap::from([("200".to_string(), Response::success(None))]),
            deprecated: None,
        }
    }
}

impl Default for Operation {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-body parameter in OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Value,
}

/// Request body: generated from body parameters, or copied from the guard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    Json {
        content: BTreeMap<String, MediaType>,
    },
    Verbatim(Value),
}

/// Media type in OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: SchemaRef,
}

/// Response entry of an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Spec(ResponseSpec),
    Verbatim(Value),
}

impl Response {
    /// A "Success" response, optionally with a JSON body schema
    pub fn success(schema: Option<SchemaRef>) -> Self {
        Response::Spec(ResponseSpec {
            description: "Success".to_string(),
            content: schema.map(|schema| {
                BTreeMap::from([(generator::JSON.to_string(), MediaType { schema })])
            }),
        })
    }
}

/// Response specification
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResponseSpec {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// Schema reference or inline schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(Value),
}

impl OpenApiSpec {
    /// Create a new OpenAPI specification
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self::from_config(OpenApiConfig::new(title, version))
    }

    /// Create a specification carrying the document-level fields of `config`
    pub fn from_config(config: OpenApiConfig) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info: ApiInfo {
                title: config.title,
                version: config.version,
                description: config.description,
                license: config.license,
            },
            external_docs: config.external_docs,
            servers: config.servers,
            tags: config.tags,
            paths: BTreeMap::new(),
            components: Components::default(),
        }
    }

    /// Set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.info.description = Some(desc.into());
        self
    }

    /// Add a path operation. Unknown methods are ignored.
    pub fn path(mut self, path: &str, method: &str, operation: Operation) -> Self {
        self.insert_operation(path, method, operation);
        self
    }

    /// Document a guarded route.
    ///
    /// The guard's `path` overrides `path` when set. A hidden guard still
    /// yields an operation, carrying only the default response.
    pub fn document(mut self, path: &str, method: &str, guard: &Guard) -> Self {
        self.document_metadata(path, method, guard.metadata());
        self
    }

    /// Document every `(path, method, guard)` route
    pub fn document_routes<'a, I>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a Guard)>,
    {
        for (path, method, guard) in routes {
            self.document_metadata(path, method, guard.metadata());
        }
        self
    }

    /// Document a route from raw metadata; `None` is an undocumented route
    pub fn document_metadata(&mut self, path: &str, method: &str, metadata: Option<&GuardConfig>) {
        let path = metadata
            .and_then(|m| m.path.as_deref())
            .unwrap_or(path);
        let operation = match metadata {
            Some(metadata) => generator::operation(metadata),
            None => Operation::new(),
        };
        self.insert_operation(path, method, operation);
    }

    fn insert_operation(&mut self, path: &str, method: &str, operation: Operation) {
        let item = self.paths.entry(path.to_string()).or_default();
        if let Some(slot) = item.operation_mut(method) {
            *slot = Some(operation);
        }
    }

    /// Add a schema definition
    pub fn schema(mut self, name: &str, schema: Value) -> Self {
        self.components.schemas.insert(name.to_string(), schema);
        self
    }

    /// Add a reusable response definition
    pub fn response(mut self, name: &str, response: Value) -> Self {
        self.components.responses.insert(name.to_string(), response);
        self
    }

    /// Register a type that implements Schema (utoipa::ToSchema)
    pub fn register<T: for<'a> utoipa::ToSchema<'a>>(mut self) -> Self {
        let (name, schema) = T::schema();
        if let Ok(json_schema) = serde_json::to_value(schema) {
            self.components.schemas.insert(name.to_string(), json_schema);
        }
        self
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Render as indented JSON text
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
