//! # calltrail-core - Explicit Call-Stack Traces
//!
//! A [`StackTrace`] is a value passed down a call chain by hand. Each call
//! site derives a copy with its own frame in front, so when an error is
//! raised the trace already describes how execution got there, without any
//! platform unwinding.
//!
//! ## Public API
//!
//! ### Traces (`stack_trace`)
//! - [`StackTrace`] - Newest-first frames with an optional lock against growth
//! - [`stack_trace!`] / [`stacking!`] - Root and derived traces at the call site
//!
//! ### Frames (`frame`)
//! - [`StackItem`] - File, function, line, and thread snapshot of one call site
//! - [`function_name!`] / [`here!`] - Call-site capture helpers
//!
//! ### Thread Snapshots (`thread_details`)
//! - [`ThreadDetails`] - Best-effort identity of the thread that recorded a frame
//! - [`QualityOfService`] - Scheduling class of that thread
//! - [`ThreadIntrospection`] - Source of raw thread facts ([`HostThread`] for the real one)
//!
//! ### Error Reporting (`traced`)
//! - [`Traced`] - Application error carrying the trace it was raised with
//! - [`TraceResultExt`] - `.traced(trace)` on any `Result`
//!
//! ### Infrastructure
//! - [`Error`] / [`Result`] - Errors from the logging layer
//! - [`logging::init()`] - File logging controlled by `CALLTRAIL_LOG`

pub mod error;
pub mod frame;
pub mod logging;
pub mod prelude;
pub mod stack_trace;
pub mod thread_details;
pub mod traced;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result};
pub use frame::StackItem;
pub use stack_trace::StackTrace;
pub use thread_details::{
    parse_description_fields, parse_object_id, HostThread, QualityOfService, ThreadDetails,
    ThreadIntrospection, FALLBACK_QUALITY_OF_SERVICE,
};
pub use traced::{TraceResultExt, Traced};
