//! Error schemas for OpenAPI documentation
//!
//! These schemas match the body produced by `InvalidParameter::to_body`.

use crate::spec::OpenApiSpec;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Name of the reusable response registered by [`OpenApiSpec::with_error_responses`]
pub const ILLEGAL_INPUT: &str = "IllegalInput";

/// Rejection body returned when a guard refuses a request (406)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvalidParameterSchema {
    /// The error details
    pub error: InvalidParameterBodySchema,
}

/// Rejection details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvalidParameterBodySchema {
    /// Always "invalid_parameter"
    #[serde(rename = "type")]
    pub error_type: String,
    /// The guard's diagnostic, e.g. "Missing required param 'id' in path"
    pub message: String,
    /// The rejected field
    pub fields: Vec<ParameterErrorSchema>,
}

/// The field that failed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParameterErrorSchema {
    /// Declared parameter name
    pub field: String,
    /// Parameter source ("path", "query", "header", "cookie" or "body")
    #[serde(rename = "in")]
    pub location: String,
    /// Failure code (e.g. "required", "type", "minimum", "enum", "validator")
    pub code: String,
}

impl OpenApiSpec {
    /// Register the guard rejection schemas and an `IllegalInput` response
    pub fn with_error_responses(self) -> Self {
        let reference = format!("#/components/schemas/{}", InvalidParameterSchema::schema().0);
        self.register::<InvalidParameterSchema>()
            .register::<InvalidParameterBodySchema>()
            .register::<ParameterErrorSchema>()
            .response(
                ILLEGAL_INPUT,
                json!({
                    "description": "Illegal input",
                    "content": {"application/json": {"schema": {"$ref": reference}}}
                }),
            )
    }
}
