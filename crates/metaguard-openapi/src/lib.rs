//! OpenAPI documentation for MetaGuard
//!
//! Walks guard metadata and assembles an OpenAPI 3.0 document. Every
//! non-hidden guard contributes its tags, summary, description and operation
//! id, its parameters (body parameters merged into one JSON request body) and
//! its responses. Component schemas can be registered from `utoipa` types.
//!
//! # Usage
//!
//! ```rust,ignore
//! use metaguard_openapi::{OpenApiConfig, OpenApiSpec};
//!
//! let spec = OpenApiSpec::from_config(OpenApiConfig::new("Book Store", "1.0.2"))
//!     .register::<Book>()
//!     .document("/books", "get", &list_books)
//!     .document("/books", "post", &create_book);
//!
//! std::fs::write("openapi.json", spec.to_json_pretty()?)?;
//! ```

mod config;
mod generator;
mod schemas;
mod spec;

pub use config::{License, OpenApiConfig, Server, Tag};
pub use generator::{operation, response, JSON};
pub use schemas::{InvalidParameterBodySchema, InvalidParameterSchema, ParameterErrorSchema, ILLEGAL_INPUT};
pub use spec::{
    ApiInfo, Components, MediaType, OpenApiSpec, Operation, Parameter, PathItem, RequestBody,
    Response, ResponseSpec, SchemaRef, OPENAPI_VERSION,
};

// Re-export utoipa's ToSchema derive macro as Schema
pub use utoipa::ToSchema as Schema;
