//! Guard orchestration
//!
//! A [`Guard`] walks its declared parameters in order. Each present value is
//! formatted, coerced and constrained, then handed to the custom validator.
//! Absent values fall back to the schema default or fail when required. The
//! first failure ends the walk and nothing is published.

use crate::coerce;
use crate::config::GuardConfig;
use crate::error::{ConfigError, GuardError, InvalidParameter};
use crate::param::ParameterSpec;
use crate::pipeline;
use crate::schema::ParameterSchema;
use crate::source::{self, RequestContext};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// A compiled, immutable guard.
///
/// Cloning is cheap; clones share the configuration.
#[derive(Debug, Clone)]
pub struct Guard {
    inner: Arc<GuardInner>,
}

#[derive(Debug)]
struct GuardInner {
    config: GuardConfig,
    // one slot per declared parameter, in declaration order
    patterns: Vec<Option<Regex>>,
}

impl Guard {
    /// Compile a guard. Fails if a declared `pattern` is not a valid regex.
    pub fn new(config: GuardConfig) -> Result<Self, ConfigError> {
        let patterns = config
            .parameters
            .iter()
            .map(|(name, spec)| compile_pattern(name, spec))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            inner: Arc::new(GuardInner { config, patterns }),
        })
    }

    /// Parse a JSON configuration and compile it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::new(GuardConfig::from_json_str(json)?)
    }

    /// The configuration exposed to documentation tooling, `None` when hidden
    pub fn metadata(&self) -> Option<&GuardConfig> {
        if self.inner.config.hidden {
            None
        } else {
            Some(&self.inner.config)
        }
    }

    /// The full configuration, regardless of `hidden`
    pub fn config(&self) -> &GuardConfig {
        &self.inner.config
    }

    /// Validate one request.
    ///
    /// Returns `Ok(None)` when the guard declares no parameters.
    pub async fn validate(&self, ctx: &dyn RequestContext) -> Result<Option<Inputs>, GuardError> {
        let params = &self.inner.config.parameters;
        if params.is_empty() {
            return Ok(None);
        }

        let mut inputs = Inputs::with_capacity(params.len());
        for ((name, spec), pattern) in params.iter().zip(&self.inner.patterns) {
            match resolve_field(name, spec, pattern.as_ref(), ctx).await {
                Ok(value) => {
                    crate::trace_trace!(field = name, present = value.is_some(), "param accepted");
                    inputs.push(name, value);
                }
                Err(err) => {
                    crate::trace_debug!(field = name, source = %spec.source, error = %err, "guard rejected request");
                    return Err(err);
                }
            }
        }

        Ok(Some(inputs))
    }

    /// Validate and publish the inputs to the configured locals slot.
    pub async fn handle(
        &self,
        ctx: &dyn RequestContext,
        locals: &mut Locals,
    ) -> Result<(), GuardError> {
        let Some(inputs) = self.validate(ctx).await? else {
            return Ok(());
        };

        if let Some(slot) = &self.inner.config.annotate_locals {
            locals.insert(slot.clone(), inputs);
        }
        Ok(())
    }

    /// Run the guard, then resume `next` with its outcome.
    ///
    /// `next` receives `None` on success or the terminal error. Whatever it
    /// returns is handed back unchanged, and a panic inside it is not caught.
    pub async fn call<F, T>(&self, ctx: &dyn RequestContext, locals: &mut Locals, next: F) -> T
    where
        F: FnOnce(Option<GuardError>, &mut Locals) -> T,
    {
        let outcome = self.handle(ctx, locals).await.err();
        next(outcome, locals)
    }

    /// Like [`Guard::call`] for continuations that are themselves async.
    pub async fn call_async<F, Fut, T>(
        &self,
        ctx: &dyn RequestContext,
        locals: &mut Locals,
        next: F,
    ) -> T
    where
        F: FnOnce(Option<GuardError>, &mut Locals) -> Fut,
        Fut: Future<Output = T>,
    {
        let outcome = self.handle(ctx, locals).await.err();
        next(outcome, locals).await
    }
}

fn compile_pattern(name: &str, spec: &ParameterSpec) -> Result<Option<Regex>, ConfigError> {
    let Some(pattern) = spec.schema.as_ref().and_then(|s| s.pattern.as_deref()) else {
        return Ok(None);
    };

    Regex::new(pattern)
        .map(Some)
        .map_err(|source| ConfigError::Pattern {
            field: name.to_string(),
            source,
        })
}

async fn resolve_field(
    name: &str,
    spec: &ParameterSpec,
    pattern: Option<&Regex>,
    ctx: &dyn RequestContext,
) -> Result<Option<Value>, GuardError> {
    let Some(raw) = source::resolve(ctx, name, &spec.source) else {
        return match spec.schema.as_ref().and_then(ParameterSchema::default_for_absent) {
            Some(default) => Ok(Some(default.clone())),
            None if spec.required => Err(InvalidParameter::missing(name, spec.source.clone()).into()),
            None => Ok(None),
        };
    };

    let value = pipeline::format(spec.formatter.as_ref(), raw, ctx)?;
    let value = match &spec.schema {
        Some(schema) => coerce::apply(name, &spec.source, value, schema, pattern)?,
        None => value,
    };
    pipeline::check(spec.validator.as_ref(), name, &spec.source, &value, ctx).await?;

    Ok(Some(value))
}

/// Validated inputs of one request, in declaration order.
///
/// Every declared field has an entry; optional fields that were not supplied
/// hold `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    entries: Vec<(String, Option<Value>)>,
}

impl Inputs {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, name: &str, value: Option<Value>) {
        self.entries.push((name.to_string(), value));
    }

    /// The value of a field, `None` if absent or undeclared
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, value)| value.as_ref())
    }

    /// True if the field has a value
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True if the field was declared, even when it holds no value
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// JSON object of the present fields
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .filter_map(|(name, value)| value.clone().map(|v| (name.clone(), v)))
            .collect();
        Value::Object(map)
    }

    /// Deserialize the present fields into a typed struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

/// Request-scoped output slots written by [`Guard::handle`].
#[derive(Debug, Clone, Default)]
pub struct Locals {
    slots: HashMap<String, Inputs>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: &str) -> Option<&Inputs> {
        self.slots.get(slot)
    }

    pub fn insert(&mut self, slot: impl Into<String>, inputs: Inputs) -> Option<Inputs> {
        self.slots.insert(slot.into(), inputs)
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }

    pub fn remove(&mut self, slot: &str) -> Option<Inputs> {
        self.slots.remove(slot)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
