//! Explicitly threaded call-stack traces.
//!
//! A [`StackTrace`] is plain data: the top of a call chain creates one, and
//! each call site records itself with `trace.stacking(..)`, a copy with one
//! more frame in front. The frame names the function making the call, which
//! is what `stacking!` captures. Nothing is global, so concurrent call chains
//! never share state.
//!
//! ```
//! use calltrail_core::StackTrace;
//!
//! fn outer() -> StackTrace {
//!     let trace = StackTrace::new("outer()");
//!     inner(trace)
//! }
//!
//! fn inner(trace: StackTrace) -> StackTrace {
//!     trace.stacking("inner()")
//! }
//!
//! let trace = outer();
//! assert_eq!(trace.len(), 2);
//! assert_eq!(trace[0].function_name(), "inner");
//! ```

use std::collections::vec_deque;
use std::collections::VecDeque;
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::frame::StackItem;

/// Ordered frames, newest first (index 0 is the innermost call site).
///
/// A locked trace silently ignores appends, so anything derived from it keeps
/// the frames it had when it was locked. Every trace holds at least its root
/// frame; deserializing one without frames fails with [`Error::EmptyTrace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SerializedStackTrace")]
pub struct StackTrace {
    frames: VecDeque<StackItem>,
    mutable: bool,
}

/// Wire shape of [`StackTrace`], checked before it becomes one
#[derive(Deserialize)]
struct SerializedStackTrace {
    frames: VecDeque<StackItem>,
    mutable: bool,
}

impl TryFrom<SerializedStackTrace> for StackTrace {
    type Error = Error;

    fn try_from(raw: SerializedStackTrace) -> Result<Self, Error> {
        if raw.frames.is_empty() {
            return Err(Error::EmptyTrace);
        }
        Ok(Self {
            frames: raw.frames,
            mutable: raw.mutable,
        })
    }
}

impl StackTrace {
    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    /// Root trace holding exactly `root`.
    pub fn with_root(root: StackItem, locked: bool) -> Self {
        let mut frames = VecDeque::with_capacity(8);
        frames.push_back(root);
        Self {
            frames,
            mutable: !locked,
        }
    }

    /// Root trace for the caller's location.
    #[track_caller]
    pub fn new(function: impl Into<String>) -> Self {
        Self::with_root(StackItem::here(function), false)
    }

    /// Root trace for the caller's location that never grows.
    #[track_caller]
    pub fn new_locked(function: impl Into<String>) -> Self {
        Self::with_root(StackItem::here(function), true)
    }

    /// Duplicate `from`. `locked` overrides its mutability when given.
    pub fn copy_of(from: &StackTrace, locked: Option<bool>) -> Self {
        Self {
            frames: from.frames.clone(),
            mutable: locked.map_or(from.mutable, |locked| !locked),
        }
    }

    pub fn is_locked(&self) -> bool {
        !self.mutable
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Append / derive
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert `frame` at the front. Does nothing on a locked trace.
    pub fn append(&mut self, frame: StackItem) {
        if !self.mutable {
            tracing::trace!(frame = %frame, "trace is locked, frame dropped");
            return;
        }
        self.frames.push_front(frame);
    }

    /// In-place append of the caller's location.
    #[track_caller]
    pub fn stack(&mut self, function: impl Into<String>) {
        if self.mutable {
            self.append(StackItem::here(function));
        }
    }

    /// Copy with `frame` prepended. The receiver is left untouched.
    ///
    /// `locked = Some(true)` freezes the copy before the append, so it keeps
    /// exactly the receiver's frames and never grows again.
    pub fn derive_with_frame(&self, frame: StackItem, locked: Option<bool>) -> Self {
        let mut derived = Self::copy_of(self, locked);
        derived.append(frame);
        derived
    }

    /// Copy with the caller's location prepended.
    #[track_caller]
    pub fn stacking(&self, function: impl Into<String>) -> Self {
        let mut derived = self.clone();
        derived.stack(function);
        derived
    }

    /// Like [`stacking`](Self::stacking) but with an explicit lock override.
    #[track_caller]
    pub fn stacking_locked(&self, function: impl Into<String>, locked: bool) -> Self {
        let mut derived = Self::copy_of(self, Some(locked));
        derived.stack(function);
        derived
    }

    /// Copy with an explicitly located frame prepended.
    ///
    /// The thread snapshot is only taken when the copy can actually grow.
    pub fn stacking_at(
        &self,
        file_path: impl Into<String>,
        function: impl Into<String>,
        line: u32,
        locked: Option<bool>,
    ) -> Self {
        let mut derived = Self::copy_of(self, locked);
        if derived.mutable {
            derived.append(StackItem::at(file_path, function, line));
        }
        derived
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sequence access
    // ─────────────────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&StackItem> {
        self.frames.get(position)
    }

    /// Innermost frame
    pub fn first(&self) -> Option<&StackItem> {
        self.frames.front()
    }

    /// Outermost frame (the root)
    pub fn last(&self) -> Option<&StackItem> {
        self.frames.back()
    }

    /// Frames innermost to outermost; `.rev()` walks from the root.
    pub fn iter(&self) -> vec_deque::Iter<'_, StackItem> {
        self.frames.iter()
    }

    /// Next valid position after `position`.
    pub fn index_after(&self, position: usize) -> Option<usize> {
        let next = position.checked_add(1)?;
        (next < self.len()).then_some(next)
    }

    /// Previous valid position. Stepping back from `len()` lands on the last frame.
    pub fn index_before(&self, position: usize) -> Option<usize> {
        if position > self.len() {
            return None;
        }
        position.checked_sub(1)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    /// Frame descriptions joined by newlines, innermost first.
    pub fn report(&self) -> String {
        self.iter()
            .map(StackItem::description)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Index<usize> for StackTrace {
    type Output = StackItem;

    fn index(&self, position: usize) -> &StackItem {
        &self.frames[position]
    }
}

impl<'a> IntoIterator for &'a StackTrace {
    type Item = &'a StackItem;
    type IntoIter = vec_deque::Iter<'a, StackItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", frame)?;
        }
        Ok(())
    }
}

/// Root [`StackTrace`] at the current file, line, and enclosing function.
///
/// `stack_trace!(locked = true)` builds one that never grows.
#[macro_export]
macro_rules! stack_trace {
    () => {
        $crate::stack_trace::StackTrace::with_root($crate::here!(), false)
    };
    (locked = $locked:expr) => {
        $crate::stack_trace::StackTrace::with_root($crate::here!(), $locked)
    };
}

/// Derive from `trace` with the current call site prepended.
///
/// `stacking!(trace, locked = true)` freezes the derived copy instead.
#[macro_export]
macro_rules! stacking {
    ($trace:expr) => {
        ($trace).stacking_at(
            ::std::file!(),
            $crate::function_name!(),
            ::std::line!(),
            ::std::option::Option::None,
        )
    };
    ($trace:expr, locked = $locked:expr) => {
        ($trace).stacking_at(
            ::std::file!(),
            $crate::function_name!(),
            ::std::line!(),
            ::std::option::Option::Some($locked),
        )
    };
}
