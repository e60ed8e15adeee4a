//! Guard metadata to OpenAPI operation translation

use crate::spec::{MediaType, Operation, Parameter, RequestBody, Response, SchemaRef};
use metaguard_core::{GuardConfig, ParameterSchema, ResponseEntry};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Media type of generated request and response bodies
pub const JSON: &str = "application/json";

/// Build the operation documenting one guard
pub fn operation(metadata: &GuardConfig) -> Operation {
    let mut operation = Operation {
        tags: metadata.tags.clone().filter(|tags| !tags.is_empty()),
        summary: non_empty(&metadata.summary),
        description: non_empty(&metadata.description),
        external_docs: metadata.external_docs.clone(),
        operation_id: non_empty(&metadata.operation_id),
        deprecated: metadata.deprecated.filter(|deprecated| *deprecated),
        ..Operation::new()
    };

    let mut parameters = Vec::new();
    let mut body = None::<(Map<String, Value>, Vec<Value>)>;

    for (name, spec) in metadata.parameters.iter() {
        if spec.source.is_body() {
            let (properties, required) = body.get_or_insert_with(Default::default);
            properties.insert(name.to_string(), schema_json(spec.schema.as_ref(), json!({})));
            if spec.required {
                required.push(Value::String(name.to_string()));
            }
        } else {
            parameters.push(Parameter {
                name: name.to_string(),
                location: spec.source.as_str().to_string(),
                required: spec.required,
                schema: schema_json(spec.schema.as_ref(), json!({"type": "string"})),
            });
        }
    }

    if !parameters.is_empty() {
        operation.parameters = Some(parameters);
    }

    operation.request_body = match body {
        Some((properties, required)) => Some(RequestBody::Json {
            content: BTreeMap::from([(
                JSON.to_string(),
                MediaType {
                    schema: SchemaRef::Inline(json!({
                        "type": "object",
                        "properties": properties,
                        "required": required,
                    })),
                },
            )]),
        }),
        None => metadata.request_body.clone().map(RequestBody::Verbatim),
    };

    if let Some(responses) = metadata.responses.as_ref().filter(|r| !r.is_empty()) {
        operation.responses = responses
            .iter()
            .map(|(code, entry)| (code.clone(), response(entry)))
            .collect();
    }

    operation
}

/// Expand a declared response. `"#/components/schemas/Book[]"` documents an array of books.
pub fn response(entry: &ResponseEntry) -> Response {
    match entry {
        ResponseEntry::Ref(reference) => Response::success(Some(schema_ref(reference))),
        ResponseEntry::Object(object) => Response::Verbatim(object.clone()),
    }
}

fn schema_ref(reference: &str) -> SchemaRef {
    if reference.contains("[]") {
        SchemaRef::Inline(json!({
            "type": "array",
            "items": {"$ref": reference.replacen("[]", "", 1)},
        }))
    } else {
        SchemaRef::Ref {
            reference: reference.to_string(),
        }
    }
}

fn schema_json(schema: Option<&ParameterSchema>, fallback: Value) -> Value {
    schema
        .and_then(|schema| serde_json::to_value(schema).ok())
        .unwrap_or(fallback)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|s| !s.is_empty())
}
