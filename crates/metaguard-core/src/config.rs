//! Guard configuration

use crate::error::ConfigError;
use crate::param::{ParameterSpec, Parameters};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Link to external documentation for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A declared response: either a schema reference shorthand or a full response object.
///
/// A reference ending in `[]` documents an array of the referenced schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseEntry {
    Ref(String),
    Object(Value),
}

impl From<&str> for ResponseEntry {
    fn from(reference: &str) -> Self {
        ResponseEntry::Ref(reference.to_string())
    }
}

impl From<String> for ResponseEntry {
    fn from(reference: String) -> Self {
        ResponseEntry::Ref(reference)
    }
}

impl From<Value> for ResponseEntry {
    fn from(object: Value) -> Self {
        match object {
            Value::String(reference) => ResponseEntry::Ref(reference),
            other => ResponseEntry::Object(other),
        }
    }
}

/// Declarative configuration of one guard.
///
/// Everything besides `parameters`, `hidden` and `annotate_locals` is
/// documentation metadata and has no effect on validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardConfig {
    /// Suppress metadata export
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    /// Locals slot that receives the validated inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotate_locals: Option<String>,
    #[serde(default)]
    pub parameters: Parameters,

    /// Documentation path, when it differs from the route path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Request body object, used when no body parameters are declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<BTreeMap<String, ResponseEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

impl GuardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON text.
    ///
    /// Formatters and validators cannot be expressed in JSON; attach them
    /// afterwards with [`GuardConfig::formatter_for`] or [`GuardConfig::validator_for`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Declare a parameter. Declaration order is validation order.
    pub fn param(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.parameters.insert(name, spec);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Publish validated inputs under `slot`
    pub fn annotate_locals(mut self, slot: impl Into<String>) -> Self {
        self.annotate_locals = Some(slot.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn external_docs(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.external_docs = Some(ExternalDocs {
            url: url.into(),
            description,
        });
        self
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    pub fn request_body(mut self, body: Value) -> Self {
        self.request_body = Some(body);
        self
    }

    /// Declare a response for a status code
    pub fn response(mut self, code: impl Into<String>, entry: impl Into<ResponseEntry>) -> Self {
        self.responses
            .get_or_insert_with(BTreeMap::new)
            .insert(code.into(), entry.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = Some(true);
        self
    }

    /// Attach a formatter to an already declared parameter. Unknown names are ignored.
    pub fn formatter_for(mut self, name: &str, formatter: crate::Formatter) -> Self {
        for (param, spec) in self.parameters.iter_mut() {
            if param == name {
                spec.formatter = Some(formatter.clone());
            }
        }
        self
    }

    /// Attach a validator to an already declared parameter. Unknown names are ignored.
    pub fn validator_for(
        mut self,
        name: &str,
        validator: impl crate::ParamValidator + 'static,
    ) -> Self {
        let validator: std::sync::Arc<dyn crate::ParamValidator> = std::sync::Arc::new(validator);
        for (param, spec) in self.parameters.iter_mut() {
            if param == name {
                spec.validator = Some(validator.clone());
            }
        }
        self
    }
}
