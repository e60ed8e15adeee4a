//! Feature-gated logging
//!
//! Guards sit on the hot path of every request. With the `tracing` feature
//! disabled these macros expand to nothing and their arguments are not evaluated.

/// Debug-level event for per-field guard activity
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! trace_debug {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "metaguard", $($arg)*)
    };
}

/// Debug-level event, no-op when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Trace-level event for values flowing through the pipeline
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! trace_trace {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "metaguard", $($arg)*)
    };
}

/// Trace-level event, no-op when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace_trace {
    ($($arg:tt)*) => {};
}
