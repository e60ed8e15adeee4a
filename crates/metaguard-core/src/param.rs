//! Declared parameters

use crate::pipeline::{formatter, Formatter, IntoVerdict, ParamValidator, SyncValidator};
use crate::schema::ParameterSchema;
use crate::source::{ParamSource, RequestContext};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// One declared field of a guard.
///
/// Formatters and validators are code and never appear in serialized metadata.
#[derive(Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "in")]
    pub source: ParamSource,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ParameterSchema>,
    #[serde(skip)]
    pub formatter: Option<Formatter>,
    #[serde(skip)]
    pub validator: Option<Arc<dyn ParamValidator>>,
}

impl ParameterSpec {
    /// An optional, untyped field read from `source`
    pub fn new(source: impl Into<ParamSource>) -> Self {
        Self {
            source: source.into(),
            required: false,
            schema: None,
            formatter: None,
            validator: None,
        }
    }

    pub fn path() -> Self {
        Self::new(ParamSource::Path)
    }

    pub fn query() -> Self {
        Self::new(ParamSource::Query)
    }

    pub fn header() -> Self {
        Self::new(ParamSource::Header)
    }

    pub fn cookie() -> Self {
        Self::new(ParamSource::Cookie)
    }

    pub fn body() -> Self {
        Self::new(ParamSource::Body)
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn schema(mut self, schema: ParameterSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Transform the raw value before coercion
    pub fn format_with<F>(mut self, f: F) -> Self
    where
        F: Fn(Value, &dyn RequestContext) -> Value + Send + Sync + 'static,
    {
        self.formatter = Some(formatter(f));
        self
    }

    /// Use a prepared [`Formatter`], e.g. one built with [`crate::try_formatter`]
    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Attach any [`ParamValidator`]
    pub fn validator(mut self, validator: impl ParamValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Attach a synchronous validator closure
    pub fn validate_with<F, R>(self, f: F) -> Self
    where
        F: Fn(&Value, &dyn RequestContext) -> R + Send + Sync + 'static,
        R: IntoVerdict + 'static,
    {
        self.validator(SyncValidator(f))
    }

    /// Attach an asynchronous validator closure
    pub fn validate_async<F, Fut, R>(self, f: F) -> Self
    where
        F: Fn(&Value, &dyn RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoVerdict + Send + 'static,
    {
        self.validator(f)
    }
}

impl fmt::Debug for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSpec")
            .field("source", &self.source)
            .field("required", &self.required)
            .field("schema", &self.schema)
            .field("has_formatter", &self.formatter.is_some())
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Declared parameters in declaration order.
///
/// Serializes as a map; deserializing keeps the order of the source document.
/// Re-declaring a name replaces the earlier spec in place.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    entries: Vec<(String, ParameterSpec)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a parameter
    pub fn insert(&mut self, name: impl Into<String>, spec: ParameterSpec) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = spec,
            None => self.entries.push((name, spec)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, spec)| spec)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterSpec)> {
        self.entries.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ParameterSpec)> {
        self.entries.iter_mut().map(|(name, spec)| (name.as_str(), spec))
    }
}

impl<N: Into<String>> FromIterator<(N, ParameterSpec)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (N, ParameterSpec)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (name, spec) in iter {
            params.insert(name, spec);
        }
        params
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, spec) in &self.entries {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParametersVisitor;

        impl<'de> Visitor<'de> for ParametersVisitor {
            type Value = Parameters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter name to parameter spec")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Parameters, A::Error> {
                let mut params = Parameters::new();
                while let Some((name, spec)) = access.next_entry::<String, ParameterSpec>()? {
                    params.insert(name, spec);
                }
                Ok(params)
            }
        }

        deserializer.deserialize_map(ParametersVisitor)
    }
}
