//! # MetaGuard
//!
//! Declarative request-input guards that double as API documentation.
//!
//! A guard is configured once per route with the fields it expects: where each
//! one comes from (`path`, `query`, `header`, `cookie` or `body`), its type and
//! constraints, and optional formatter and validator hooks. Every request is
//! checked against it in declaration order and the first problem is reported
//! with a stable message. The configuration is also exported as metadata, and
//! the `openapi` feature turns that metadata into an OpenAPI document.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use metaguard::prelude::*;
//!
//! let guard = Guard::new(
//!     GuardConfig::new()
//!         .tag("Books")
//!         .param("page", ParameterSpec::query().schema(ParameterSchema::integer().minimum(1)))
//!         .annotate_locals("parameters"),
//! )?;
//!
//! let ctx = RequestParts::builder().query("page", "2").build();
//! let mut locals = Locals::new();
//! guard.handle(&ctx, &mut locals).await?;
//! assert_eq!(locals.get("parameters").unwrap().get("page"), Some(&json!(2)));
//! ```
//!
//! ## Optional Features
//!
//! - `openapi` - OpenAPI document generation from guard metadata (default)
//! - `tracing` - debug events for guard decisions (default)
//! - `cookies` - cookie lookups for `HttpRequestContext` (default)

// Re-export core functionality
pub use metaguard_core::*;

// Re-export the documentation generator (feature-gated)
#[cfg(feature = "openapi")]
pub use metaguard_openapi as openapi;
#[cfg(feature = "openapi")]
pub use metaguard_openapi::{OpenApiConfig, OpenApiSpec, Schema};

/// Prelude module - import everything you need with `use metaguard::prelude::*`
pub mod prelude {
    pub use metaguard_core::{
        // Hooks
        async_trait,
        formatter,
        try_formatter,
        // Errors
        ConfigError,
        Formatter,
        // Guards
        Guard,
        GuardConfig,
        GuardError,
        // Request context
        HttpRequestContext,
        Inputs,
        InvalidParameter,
        IntoVerdict,
        Locals,
        ParamSource,
        ParamValidator,
        // Configuration
        ParameterSchema,
        ParameterSpec,
        RequestContext,
        RequestParts,
        ResponseEntry,
        SchemaType,
        SyncValidator,
        Verdict,
    };

    // OpenAPI generation (feature-gated)
    #[cfg(feature = "openapi")]
    pub use metaguard_openapi::{OpenApiConfig, OpenApiSpec, Schema};

    // Re-export commonly used external types
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{json, Value};
    pub use tracing::{debug, error, info, trace, warn};
}
