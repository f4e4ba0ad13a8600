//! Carrying a trace alongside an application error

use std::error::Error as StdError;
use std::fmt;

use crate::stack_trace::StackTrace;

/// An application error paired with the trace of where it was raised.
///
/// Displays as the inner error; [`report`](Traced::report) adds the frames.
#[derive(Debug, Clone)]
pub struct Traced<E> {
    error: E,
    trace: StackTrace,
}

impl<E> Traced<E> {
    pub fn new(error: E, trace: StackTrace) -> Self {
        Self { error, trace }
    }

    pub fn error(&self) -> &E {
        &self.error
    }

    pub fn trace(&self) -> &StackTrace {
        &self.trace
    }

    pub fn into_parts(self) -> (E, StackTrace) {
        (self.error, self.trace)
    }

    pub fn map_err<F, E2>(self, f: F) -> Traced<E2>
    where
        F: FnOnce(E) -> E2,
    {
        Traced {
            error: f(self.error),
            trace: self.trace,
        }
    }
}

impl<E: fmt::Display> Traced<E> {
    /// Error message followed by one frame per line, innermost first.
    pub fn report(&self) -> String {
        format!("{}\n{}", self.error, self.trace.report())
    }
}

impl<E: fmt::Display> fmt::Display for Traced<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<E: StdError + 'static> StdError for Traced<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}

/// Extension trait for attaching a trace to a failing `Result`
pub trait TraceResultExt<T, E> {
    /// Attach `trace` to the error, if any
    fn traced(self, trace: StackTrace) -> Result<T, Traced<E>>;

    /// Attach a lazily built trace, only paid for on the error path
    fn with_trace<F>(self, f: F) -> Result<T, Traced<E>>
    where
        F: FnOnce() -> StackTrace;
}

impl<T, E: fmt::Display> TraceResultExt<T, E> for Result<T, E> {
    fn traced(self, trace: StackTrace) -> Result<T, Traced<E>> {
        self.with_trace(|| trace)
    }

    fn with_trace<F>(self, f: F) -> Result<T, Traced<E>>
    where
        F: FnOnce() -> StackTrace,
    {
        self.map_err(|error| {
            let traced = Traced::new(error, f());
            tracing::debug!(
                "{} (raised at {})",
                traced.error,
                traced
                    .trace
                    .first()
                    .map(|frame| frame.description())
                    .unwrap_or_default()
            );
            traced
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::StackItem;
    use crate::thread_details::ThreadDetails;

    fn trace() -> StackTrace {
        StackTrace::with_root(
            StackItem::new("/app/main.ext", "main()", 3, ThreadDetails::unavailable()),
            false,
        )
        .derive_with_frame(
            StackItem::new("/app/io.ext", "load(path:)", 17, ThreadDetails::unavailable()),
            None,
        )
    }

    #[test]
    fn test_display_is_inner_error() {
        let err = Traced::new("disk full", trace());
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_report_lists_frames_after_message() {
        let err = Traced::new("disk full", trace());
        assert_eq!(
            err.report(),
            "disk full\n/app/io.ext:17 - load(path:)\n/app/main.ext:3 - main()"
        );
    }

    #[test]
    fn test_source_is_inner_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Traced::new(io, trace());
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "missing");
    }

    #[test]
    fn test_traced_result_ext() {
        let ok: Result<u8, &str> = Ok(1);
        assert_eq!(ok.traced(trace()).unwrap(), 1);

        let failed: Result<u8, &str> = Err("boom");
        let err = failed.traced(trace()).unwrap_err();
        assert_eq!(*err.error(), "boom");
        assert_eq!(err.trace().len(), 2);
    }

    #[test]
    fn test_with_trace_is_lazy_on_success() {
        let ok: Result<u8, &str> = Ok(1);
        let value = ok
            .with_trace(|| panic!("trace built on success path"))
            .unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn test_map_err_keeps_trace() {
        let err = Traced::new(7, trace()).map_err(|code| format!("code {code}"));
        let (error, trace) = err.into_parts();
        assert_eq!(error, "code 7");
        assert_eq!(trace.len(), 2);
    }
}
