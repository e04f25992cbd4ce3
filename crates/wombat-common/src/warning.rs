//! Engine warnings with coloured terminal output.
//!
//! Deduplicates so a stylesheet that repeats an unsupported construct on
//! every rule only reports it once. Every warning is also forwarded to the
//! `log` facade so embedders with a logger installed see it there.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use owo_colors::OwoColorize;

/// Global set of warnings we've already printed.
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about an unsupported feature (prints once per unique message).
///
/// # Example
/// ```ignore
/// warn_once("CSS", "unsupported pseudo-class ':host-context'");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let should_print = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_print {
        log::warn!(target: "wombat", "[{component}] {message}");
        eprintln!("{}", format!("[Wombat {component}] ⚠ {message}").yellow());
    }
}

/// Returns true if `message` has already been reported for `component`.
#[must_use]
pub fn was_warned(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .is_some_and(|set| set.contains(&key))
}

/// Clear all recorded warnings (call when a document is torn down).
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
