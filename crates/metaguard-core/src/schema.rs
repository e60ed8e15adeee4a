//! Parameter schemas
//!
//! A [`ParameterSchema`] is both the coercion/constraint descriptor used by the
//! guard and the OpenAPI schema object exported as metadata, so its serialized
//! form uses OpenAPI field names.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Declared type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SchemaType {
    Integer,
    Number,
    String,
    Boolean,
    /// Any other declared type. Values pass through without coercion.
    Other(String),
}

impl SchemaType {
    /// The OpenAPI type name
    pub fn as_str(&self) -> &str {
        match self {
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::String => "string",
            SchemaType::Boolean => "boolean",
            SchemaType::Other(name) => name,
        }
    }
}

impl From<&str> for SchemaType {
    fn from(name: &str) -> Self {
        match name {
            "integer" => SchemaType::Integer,
            "number" => SchemaType::Number,
            "string" => SchemaType::String,
            "boolean" => SchemaType::Boolean,
            other => SchemaType::Other(other.to_string()),
        }
    }
}

impl From<String> for SchemaType {
    fn from(name: String) -> Self {
        SchemaType::from(name.as_str())
    }
}

impl From<SchemaType> for String {
    fn from(ty: SchemaType) -> Self {
        match ty {
            SchemaType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape, constraints and default of a single parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSchema {
    /// Target type; `None` disables coercion
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Regular expression string values must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Allowed literal values, in declared order
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    /// Fallback when the field is not supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl ParameterSchema {
    /// Schema with no type and no constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema of the given type
    pub fn of(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    pub fn integer() -> Self {
        Self::of(SchemaType::Integer)
    }

    pub fn number() -> Self {
        Self::of(SchemaType::Number)
    }

    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaType::Boolean)
    }

    /// Inclusive lower bound
    pub fn minimum(mut self, bound: impl Into<Number>) -> Self {
        self.minimum = Some(bound.into());
        self
    }

    /// Inclusive upper bound
    pub fn maximum(mut self, bound: impl Into<Number>) -> Self {
        self.maximum = Some(bound.into());
        self
    }

    /// Exclusive lower bound
    pub fn exclusive_minimum(mut self, bound: impl Into<Number>) -> Self {
        self.exclusive_minimum = Some(bound.into());
        self
    }

    /// Exclusive upper bound
    pub fn exclusive_maximum(mut self, bound: impl Into<Number>) -> Self {
        self.exclusive_maximum = Some(bound.into());
        self
    }

    pub fn min_length(mut self, len: u64) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: u64) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Restrict values to the given literals
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// The default to apply to an absent field. A declared `null` counts as no default.
    pub fn default_for_absent(&self) -> Option<&Value> {
        self.default.as_ref().filter(|v| !v.is_null())
    }
}

/// Render a value the way a loosely-typed string conversion would.
///
/// Integral floats drop their fractional part, arrays are comma-joined and
/// objects render as JSON text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => display_number(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn display_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        // integral floats print without exponent or fraction below 1e21
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

/// Literal equality with numbers compared by value (`5 == 5.0`).
pub fn literal_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}
