//! Error types for MetaGuard
//!
//! Every rejection produced by the guard's own pipeline is an [`InvalidParameter`].
//! Errors raised by user code (formatters, validators) travel as
//! [`GuardError::Unexpected`] and are never rewrapped into a parameter error.

use crate::source::ParamSource;
use http::StatusCode;
use serde::Serialize;
use std::fmt;

/// Boxed error raised by user-supplied formatters and validators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for guard operations
pub type Result<T, E = GuardError> = std::result::Result<T, E>;

/// Why a parameter was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidReason {
    /// Required field was not supplied and has no default
    Missing,
    /// The raw value could not be coerced to the declared type
    TypeMismatch(&'static str),
    /// `minimum` violated
    Minimum(serde_json::Number),
    /// `maximum` violated
    Maximum(serde_json::Number),
    /// `exclusiveMinimum` violated
    ExclusiveMinimum(serde_json::Number),
    /// `exclusiveMaximum` violated
    ExclusiveMaximum(serde_json::Number),
    /// `minLength` violated
    MinLength(u64),
    /// `maxLength` violated
    MaxLength(u64),
    /// `pattern` violated
    Pattern(String),
    /// Value is not one of the declared `enum` members (already rendered, in order)
    NotInEnum(Vec<String>),
    /// A custom validator returned `false`
    Rejected,
    /// A custom validator returned its own message
    Custom(String),
}

impl InvalidReason {
    /// Stable machine-readable code for this reason.
    pub fn code(&self) -> &'static str {
        match self {
            InvalidReason::Missing => "required",
            InvalidReason::TypeMismatch(_) => "type",
            InvalidReason::Minimum(_) => "minimum",
            InvalidReason::Maximum(_) => "maximum",
            InvalidReason::ExclusiveMinimum(_) => "exclusive_minimum",
            InvalidReason::ExclusiveMaximum(_) => "exclusive_maximum",
            InvalidReason::MinLength(_) => "min_length",
            InvalidReason::MaxLength(_) => "max_length",
            InvalidReason::Pattern(_) => "pattern",
            InvalidReason::NotInEnum(_) => "enum",
            InvalidReason::Rejected | InvalidReason::Custom(_) => "validator",
        }
    }
}

/// A parameter failed extraction, coercion, constraints or custom validation.
///
/// Displays as the exact diagnostic delivered to callers, e.g.
/// `Invalid param 'page' in query: must be >= 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidParameter {
    /// Field name as declared in the guard configuration
    pub field: String,
    /// Where the field was read from
    pub source: ParamSource,
    /// Why it was rejected
    pub reason: InvalidReason,
}

impl InvalidParameter {
    /// Create a new parameter error
    pub fn new(field: impl Into<String>, source: ParamSource, reason: InvalidReason) -> Self {
        Self {
            field: field.into(),
            source,
            reason,
        }
    }

    /// Create a "missing required param" error
    pub fn missing(field: impl Into<String>, source: ParamSource) -> Self {
        Self::new(field, source, InvalidReason::Missing)
    }

    /// HTTP status for every invalid-parameter rejection (406 Not Acceptable)
    pub fn status(&self) -> StatusCode {
        StatusCode::NOT_ACCEPTABLE
    }

    /// The rendered diagnostic message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// JSON error body in the `{"error": {"type", "message", "fields"}}` shape.
    pub fn to_body(&self) -> serde_json::Value {
        let response = ErrorResponse {
            error: ErrorBody {
                error_type: "invalid_parameter",
                message: self.message(),
                fields: vec![FieldError {
                    field: self.field.clone(),
                    location: self.source.as_str().to_string(),
                    code: self.reason.code(),
                }],
            },
        };
        serde_json::to_value(response).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for InvalidParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (field, source) = (&self.field, &self.source);
        match &self.reason {
            InvalidReason::Missing => write!(f, "Missing required param '{field}' in {source}"),
            InvalidReason::Custom(message) => f.write_str(message),
            InvalidReason::Rejected => write!(f, "Invalid param '{field}' in {source}"),
            reason => {
                write!(f, "Invalid param '{field}' in {source}: ")?;
                match reason {
                    InvalidReason::TypeMismatch(ty) => write!(f, "{ty} required"),
                    InvalidReason::Minimum(n) => write!(f, "must be >= {n}"),
                    InvalidReason::Maximum(n) => write!(f, "must be <= {n}"),
                    InvalidReason::ExclusiveMinimum(n) => write!(f, "must be > {n}"),
                    InvalidReason::ExclusiveMaximum(n) => write!(f, "must be < {n}"),
                    InvalidReason::MinLength(n) => write!(f, "length must be >= {n}"),
                    InvalidReason::MaxLength(n) => write!(f, "length must be <= {n}"),
                    InvalidReason::Pattern(p) => write!(f, "must match pattern \"{p}\""),
                    InvalidReason::NotInEnum(values) => {
                        write!(f, "must be one of \"{}\"", values.join(", "))
                    }
                    InvalidReason::Missing
                    | InvalidReason::Custom(_)
                    | InvalidReason::Rejected => Ok(()),
                }
            }
        }
    }
}

impl std::error::Error for InvalidParameter {}

/// Terminal error delivered by a guard.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The request's input failed the guard
    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameter),

    /// A formatter or validator failed; the original error is passed through untouched
    #[error(transparent)]
    Unexpected(BoxError),
}

impl GuardError {
    /// Wrap an arbitrary error raised by user code
    pub fn unexpected(err: impl Into<BoxError>) -> Self {
        GuardError::Unexpected(err.into())
    }

    /// The parameter error, if this is a validation rejection
    pub fn as_invalid_parameter(&self) -> Option<&InvalidParameter> {
        match self {
            GuardError::InvalidParameter(err) => Some(err),
            GuardError::Unexpected(_) => None,
        }
    }

    /// Status classification: 406 for parameter errors, 500 otherwise
    pub fn status(&self) -> StatusCode {
        match self {
            GuardError::InvalidParameter(err) => err.status(),
            GuardError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors detected while building a guard from its configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration text could not be parsed
    #[error("invalid guard configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A declared `pattern` is not a valid regular expression
    #[error("invalid pattern for param '{field}': {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: &'static str,
    message: String,
    fields: Vec<FieldError>,
}

#[derive(Serialize)]
struct FieldError {
    field: String,
    #[serde(rename = "in")]
    location: String,
    code: &'static str,
}
