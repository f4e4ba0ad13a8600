//! Thread identity snapshots
//!
//! A [`ThreadDetails`] records who was running when a frame was captured. The
//! host only offers loosely structured text about a thread, so capture is a
//! best-effort scrape: every step that fails leaves its field unset.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// `Debug` rendering of `std::thread::Thread`. The name is a `Debug`-escaped
/// string, so `"` only appears escaped inside it.
static HOST_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^Thread \{ id: ThreadId\((\d+)\), name: (?:None|Some\("((?:[^"\\]|\\.)*)"\))"#)
        .expect("Invalid host description regex")
});

/// Brace-delimited `key = value` (or `key: value`) metadata in a description.
static METADATA_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("Invalid metadata block regex"));

/// Object identity in `<Kind: ID ...>` form.
static OBJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^:>]*:([^>]*)>").expect("Invalid object id regex"));

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Invalid digits regex"));

/// Values the host prints for "no value"
const NULL_PLACEHOLDERS: [&str; 5] = ["null", "nil", "(null)", "(nil)", "None"];

/// Keys that may carry the numeric thread id, in lookup order
const NUMBER_KEYS: [&str; 2] = ["number", "id"];

const NAME_KEY: &str = "name";
const MAIN_THREAD_NAME: &str = "main";

/// Used when the platform cannot report a scheduling class
pub const FALLBACK_QUALITY_OF_SERVICE: QualityOfService = QualityOfService::Default;

// ─────────────────────────────────────────────────────────────────────────────
// QualityOfService
// ─────────────────────────────────────────────────────────────────────────────

/// Scheduling class of a thread, lowest to highest urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QualityOfService {
    Background,
    Utility,
    #[default]
    Default,
    UserInitiated,
    UserInteractive,
}

impl QualityOfService {
    /// Map a Unix nice value onto a scheduling class.
    ///
    /// Negative nice values mean "more urgent", so they land on the user-facing
    /// classes; positive values fall toward background work.
    pub fn from_nice(nice: i32) -> Self {
        match nice {
            n if n <= -10 => Self::UserInteractive,
            n if n < 0 => Self::UserInitiated,
            0 => Self::Default,
            n if n < 10 => Self::Utility,
            _ => Self::Background,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Utility => "utility",
            Self::Default => "default",
            Self::UserInitiated => "userInitiated",
            Self::UserInteractive => "userInteractive",
        }
    }
}

impl fmt::Display for QualityOfService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Introspection seam
// ─────────────────────────────────────────────────────────────────────────────

/// Raw facts about a thread as the host reports them.
///
/// Every method is allowed to come back empty; [`ThreadDetails`] fills the gaps.
#[cfg_attr(test, mockall::automock)]
pub trait ThreadIntrospection {
    /// Human-readable description text
    fn description(&self) -> String;

    /// Explicitly assigned thread name
    fn name(&self) -> Option<String>;

    /// `None` when the platform cannot tell
    fn is_main_thread(&self) -> Option<bool>;

    /// Decimal text of the low-level thread handle
    fn raw_handle(&self) -> Option<String>;

    fn quality_of_service(&self) -> Option<QualityOfService>;
}

/// The calling thread, as seen through `std` and the OS.
///
/// Platform queries (main-thread flag, handle, priority) always answer for the
/// OS thread that calls them, so a `HostThread` is only handed out for the
/// current thread.
#[derive(Debug, Clone)]
pub struct HostThread {
    thread: std::thread::Thread,
}

impl HostThread {
    pub fn current() -> Self {
        Self {
            thread: std::thread::current(),
        }
    }
}

impl ThreadIntrospection for HostThread {
    /// `Thread { id: ThreadId(N), name: Some("x"), .. }`
    fn description(&self) -> String {
        format!("{:?}", self.thread)
    }

    fn name(&self) -> Option<String> {
        self.thread.name().map(str::to_owned)
    }

    fn is_main_thread(&self) -> Option<bool> {
        platform::is_main_thread()
    }

    fn raw_handle(&self) -> Option<String> {
        platform::raw_handle()
    }

    fn quality_of_service(&self) -> Option<QualityOfService> {
        platform::quality_of_service()
    }
}

mod platform {
    use super::QualityOfService;

    #[cfg(target_os = "linux")]
    fn current_tid() -> libc::pid_t {
        // SAFETY: gettid has no preconditions and cannot fail.
        unsafe { libc::syscall(libc::SYS_gettid) as libc::pid_t }
    }

    #[cfg(target_os = "linux")]
    pub fn is_main_thread() -> Option<bool> {
        // The main thread's tid equals the process id.
        // SAFETY: getpid has no preconditions and cannot fail.
        Some(current_tid() == unsafe { libc::getpid() })
    }

    #[cfg(target_os = "macos")]
    pub fn is_main_thread() -> Option<bool> {
        // SAFETY: pthread_main_np only inspects the calling thread.
        Some(unsafe { libc::pthread_main_np() } != 0)
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    pub fn is_main_thread() -> Option<bool> {
        None
    }

    #[cfg(unix)]
    pub fn raw_handle() -> Option<String> {
        // SAFETY: pthread_self has no preconditions and cannot fail.
        let handle = unsafe { libc::pthread_self() } as usize;
        Some(handle.to_string())
    }

    #[cfg(not(unix))]
    pub fn raw_handle() -> Option<String> {
        None
    }

    #[cfg(target_os = "linux")]
    pub fn quality_of_service() -> Option<QualityOfService> {
        // -1 is a valid nice value, so errno has to be cleared to tell it apart
        // from a failure.
        // SAFETY: __errno_location returns the calling thread's errno slot.
        unsafe { *libc::__errno_location() = 0 };
        // SAFETY: getpriority only reads scheduler state for the given tid.
        let nice = unsafe { libc::getpriority(libc::PRIO_PROCESS, current_tid() as libc::id_t) };
        if nice == -1 && std::io::Error::last_os_error().raw_os_error().unwrap_or(0) != 0 {
            return None;
        }
        Some(QualityOfService::from_nice(nice))
    }

    #[cfg(not(target_os = "linux"))]
    pub fn quality_of_service() -> Option<QualityOfService> {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ThreadDetails
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of the executing thread, taken when a frame is recorded.
///
/// Immutable once built. No field is guaranteed to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDetails {
    thread_object_id: Option<String>,
    thread_number: Option<u64>,
    description_name: Option<String>,
    set_name: Option<String>,
    quality_of_service: QualityOfService,
    is_main_thread: bool,
}

impl ThreadDetails {
    /// Capture the current thread.
    pub fn capture() -> Self {
        Self::from_introspection(&HostThread::current())
    }

    /// Build a snapshot from whatever the introspection source reports.
    pub fn from_introspection(thread: &impl ThreadIntrospection) -> Self {
        let description = thread.description();
        let mut fields = parse_description_fields(&description);

        let is_main_thread = thread.is_main_thread().unwrap_or(false);
        if is_main_thread && !fields.contains_key(NAME_KEY) {
            fields.insert(NAME_KEY.to_string(), MAIN_THREAD_NAME.to_string());
        }

        let thread_number = match NUMBER_KEYS.iter().find_map(|key| fields.get(*key)) {
            Some(text) => parse_number(text),
            None => {
                let handle = thread.raw_handle();
                tracing::debug!(?handle, "no thread number in description, using handle");
                handle.and_then(|h| h.trim().parse::<u64>().ok())
            }
        };

        Self {
            thread_object_id: parse_object_id(&description),
            thread_number,
            description_name: fields.remove(NAME_KEY),
            set_name: thread.name(),
            quality_of_service: thread
                .quality_of_service()
                .unwrap_or(FALLBACK_QUALITY_OF_SERVICE),
            is_main_thread,
        }
    }

    /// Snapshot with every optional field unset
    pub fn unavailable() -> Self {
        Self {
            thread_object_id: None,
            thread_number: None,
            description_name: None,
            set_name: None,
            quality_of_service: FALLBACK_QUALITY_OF_SERVICE,
            is_main_thread: false,
        }
    }

    pub fn thread_object_id(&self) -> Option<&str> {
        self.thread_object_id.as_deref()
    }

    pub fn thread_number(&self) -> Option<u64> {
        self.thread_number
    }

    pub fn description_name(&self) -> Option<&str> {
        self.description_name.as_deref()
    }

    pub fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }

    /// Assigned name if there is one, otherwise the name from the description
    pub fn name(&self) -> Option<&str> {
        self.set_name().or_else(|| self.description_name())
    }

    pub fn quality_of_service(&self) -> QualityOfService {
        self.quality_of_service
    }

    pub fn is_main_thread(&self) -> bool {
        self.is_main_thread
    }
}

impl Default for ThreadDetails {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl fmt::Display for ThreadDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name().unwrap_or("<unnamed>"))?;
        if let Some(number) = self.thread_number {
            write!(f, " #{}", number)?;
        }
        write!(f, " [{}]", self.quality_of_service)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Description parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a thread description into key/value pairs.
///
/// The host's own `Debug` form (`Thread { id: ThreadId(N), name: Some("x"), .. }`)
/// is matched directly, honoring quotes and escapes, and yields `id` and
/// `name`. Other text is read from its first `{...}` block: entries are comma
/// separated and split at their first `=` or `:`. Entries with no separator,
/// empty values, or null placeholders are dropped. Quoted text in any other
/// form is not split at all, so nothing is read from it.
pub fn parse_description_fields(description: &str) -> HashMap<String, String> {
    if let Some(caps) = HOST_DESCRIPTION.captures(description) {
        return host_fields(&caps);
    }
    if description.contains('"') {
        tracing::debug!(description, "quoted thread description in unknown form");
        return HashMap::new();
    }

    let Some(block) = METADATA_BLOCK
        .captures(description)
        .and_then(|caps| caps.get(1))
    else {
        tracing::debug!(description, "thread description has no metadata block");
        return HashMap::new();
    };

    block
        .as_str()
        .split(',')
        .filter_map(|entry| {
            let split_at = entry.find(|c: char| c == '=' || c == ':')?;
            let key = entry[..split_at].trim();
            let value = clean_value(&entry[split_at + 1..]);
            if key.is_empty() || value.is_empty() || NULL_PLACEHOLDERS.contains(&value) {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Extract `ID` from `<Kind: ID ...>`: the text between the first `:` and the
/// next `>`. Only text before the first quote is searched, so a quoted name
/// cannot pose as an object id.
pub fn parse_object_id(description: &str) -> Option<String> {
    let unquoted = description.split('"').next().unwrap_or(description);
    let id = OBJECT_ID.captures(unquoted)?.get(1)?.as_str().trim();
    (!id.is_empty()).then(|| id.to_string())
}

fn host_fields(caps: &Captures<'_>) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), caps[1].to_string());
    match caps.get(2).map(|m| unescape_debug_str(m.as_str())) {
        Some(Some(name)) if !name.is_empty() => {
            fields.insert(NAME_KEY.to_string(), name);
        }
        Some(None) => tracing::debug!("thread name has an unknown escape"),
        _ => {}
    }
    fields
}

/// Undo `str`'s `Debug` escaping. `None` on an escape it never produces.
fn unescape_debug_str(escaped: &str) -> Option<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '0' => out.push('\0'),
            c @ ('\\' | '"' | '\'') => out.push(c),
            'u' => {
                let body = chars.as_str().strip_prefix('{')?;
                let end = body.find('}')?;
                let code = u32::from_str_radix(&body[..end], 16).ok()?;
                out.push(char::from_u32(code)?);
                chars = body[end + 1..].chars();
            }
            _ => return None,
        }
    }
    Some(out)
}

/// Strip surrounding whitespace and a `Some(...)` wrapper.
fn clean_value(raw: &str) -> &str {
    let value = raw.trim();
    value
        .strip_prefix("Some(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map_or(value, str::trim)
}

/// First run of digits, so `1` and `ThreadId(1)` both read as 1.
fn parse_number(text: &str) -> Option<u64> {
    DIGITS.find(text)?.as_str().parse().ok()
}
