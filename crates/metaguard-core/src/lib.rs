//! # MetaGuard Core
//!
//! Declarative request-input guards. A [`Guard`] is built once from a
//! [`GuardConfig`] and then checks every request against it: each declared
//! parameter is read from its source, formatted, coerced to its schema type,
//! checked against its constraints and handed to an optional custom validator.
//! The same configuration is exported as metadata for documentation tooling.
//!
//! This crate is not meant to be used directly. Use `metaguard` instead.
//!
//! ```rust,ignore
//! use metaguard_core::{Guard, GuardConfig, ParameterSchema, ParameterSpec, RequestParts};
//!
//! let guard = Guard::new(
//!     GuardConfig::new().param(
//!         "page",
//!         ParameterSpec::query().schema(ParameterSchema::integer().minimum(1)),
//!     ),
//! )?;
//!
//! let ctx = RequestParts::builder().query("page", "0").build();
//! let err = guard.validate(&ctx).await.unwrap_err();
//! assert_eq!(err.to_string(), "Invalid param 'page' in query: must be >= 1");
//! ```

mod coerce;
mod config;
mod error;
mod guard;
mod param;
mod pipeline;
mod request;
mod schema;
mod source;
mod tracing_macros;

// Public API
pub use coerce::{apply as apply_schema, coerce};
pub use config::{ExternalDocs, GuardConfig, ResponseEntry};
pub use error::{BoxError, ConfigError, GuardError, InvalidParameter, InvalidReason, Result};
pub use guard::{Guard, Inputs, Locals};
pub use param::{ParameterSpec, Parameters};
pub use pipeline::{formatter, try_formatter, Formatter, IntoVerdict, ParamValidator, SyncValidator, Verdict};
pub use request::{HttpRequestContext, RequestParts, RequestPartsBuilder};
pub use schema::{display_value, literal_eq, ParameterSchema, SchemaType};
pub use source::{resolve, ParamSource, RequestContext};

// Re-exported for validator implementations
pub use async_trait::async_trait;
