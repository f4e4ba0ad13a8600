//! calltrail Library
//!
//! Call-stack traces threaded explicitly through function calls, for
//! reporting where an error came from without platform unwinding.
//!
//! All functionality lives in [`calltrail_core`]; this crate re-exports it.

pub use calltrail_core::*;
