//! A single recorded call site

use std::fmt;
use std::panic::Location;

use serde::{Deserialize, Serialize};

use crate::thread_details::ThreadDetails;

/// One call site: where it is and which thread was running it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackItem {
    file_path: String,
    /// Raw function text, possibly with a parameter list
    function: String,
    line: u32,
    thread_details: ThreadDetails,
}

impl StackItem {
    pub fn new(
        file_path: impl Into<String>,
        function: impl Into<String>,
        line: u32,
        thread_details: ThreadDetails,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            function: function.into(),
            line,
            thread_details,
        }
    }

    /// Frame for an explicit location, capturing the current thread.
    pub fn at(file_path: impl Into<String>, function: impl Into<String>, line: u32) -> Self {
        Self::new(file_path, function, line, ThreadDetails::capture())
    }

    /// Frame for the caller's file and line, capturing the current thread.
    #[track_caller]
    pub fn here(function: impl Into<String>) -> Self {
        let location = Location::caller();
        Self::at(location.file(), function, location.line())
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn thread_details(&self) -> &ThreadDetails {
        &self.thread_details
    }

    /// `function` cut at the first `(`, dropping any parameter list.
    pub fn function_name(&self) -> &str {
        match self.function.find('(') {
            Some(idx) => &self.function[..idx],
            None => &self.function,
        }
    }

    /// `<file_path>:<line> - <function>`
    pub fn description(&self) -> String {
        format!("{}:{} - {}", self.file_path, self.line, self.function)
    }
}

impl fmt::Display for StackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} - {}", self.file_path, self.line, self.function)
    }
}

/// Turn `type_name` output for a probe fn nested in the caller into the
/// caller's path. Used by [`function_name!`](crate::function_name).
#[doc(hidden)]
pub fn trim_probe_path(raw: &'static str) -> &'static str {
    let mut path = raw.strip_suffix("::__probe").unwrap_or(raw);
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    path
}

/// Path of the enclosing function, e.g. `my_crate::io::load`.
///
/// Closure and async-block segments are stripped so the name points at the
/// function that contains them.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __probe() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::frame::trim_probe_path(__type_name_of(__probe))
    }};
}

/// [`StackItem`] for the current file, line, and enclosing function.
#[macro_export]
macro_rules! here {
    () => {
        $crate::frame::StackItem::at(::std::file!(), $crate::function_name!(), ::std::line!())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(function: &str) -> StackItem {
        StackItem::new("/a/b.ext", function, 42, ThreadDetails::unavailable())
    }

    #[test]
    fn test_function_name_strips_parameters() {
        assert_eq!(frame("foo(bar: Int)").function_name(), "foo");
        assert_eq!(frame("foo(_:)").function_name(), "foo");
    }

    #[test]
    fn test_function_name_without_parens_is_unchanged() {
        assert_eq!(frame("foo").function_name(), "foo");
        assert_eq!(frame("").function_name(), "");
    }

    #[test]
    fn test_description_format() {
        assert_eq!(frame("foo()").description(), "/a/b.ext:42 - foo()");
    }

    #[test]
    fn test_display_matches_description() {
        let item = frame("foo(x:)");
        assert_eq!(item.to_string(), item.description());
    }

    #[test]
    fn test_here_uses_caller_location() {
        let expected_line = line!() + 1;
        let item = StackItem::here("caller");
        assert_eq!(item.file_path(), file!());
        assert_eq!(item.line(), expected_line);
        assert_eq!(item.function(), "caller");
    }

    #[test]
    fn test_function_name_macro_names_enclosing_fn() {
        let name = crate::function_name!();
        assert!(
            name.ends_with("tests::test_function_name_macro_names_enclosing_fn"),
            "got {name}"
        );
    }

    #[test]
    fn test_function_name_macro_strips_closures() {
        let name = (|| crate::function_name!())();
        assert!(
            name.ends_with("tests::test_function_name_macro_strips_closures"),
            "got {name}"
        );
    }

    #[test]
    fn test_here_macro() {
        let item = crate::here!();
        assert_eq!(item.file_path(), file!());
        assert!(item.function().ends_with("test_here_macro"));
    }

    #[test]
    fn test_trim_probe_path() {
        assert_eq!(trim_probe_path("a::b::__probe"), "a::b");
        assert_eq!(trim_probe_path("a::b::{{closure}}::{{closure}}::__probe"), "a::b");
        assert_eq!(trim_probe_path("plain"), "plain");
    }

    #[test]
    fn test_serializes_camel_case_fields() {
        let json = serde_json::to_value(frame("foo()")).unwrap();
        assert_eq!(json["filePath"], "/a/b.ext");
        assert_eq!(json["line"], 42);
        assert_eq!(json["threadDetails"]["qualityOfService"], "default");
    }
}
