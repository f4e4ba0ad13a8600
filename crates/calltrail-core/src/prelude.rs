//! Prelude for common imports used throughout calltrail crates

pub use crate::error::{Error, Result};
pub use crate::frame::StackItem;
pub use crate::stack_trace::StackTrace;
pub use crate::thread_details::{QualityOfService, ThreadDetails};
pub use crate::traced::{TraceResultExt, Traced};
pub use crate::{function_name, here, stack_trace, stacking};
pub use tracing::{debug, error, info, instrument, trace, warn};
