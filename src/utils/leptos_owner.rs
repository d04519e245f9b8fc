//! Guards for async work that finishes after its component is gone.
//!
//! A request started by a page can resolve after the user navigated away.
//! Writing into the page's signals at that point would touch a disposed
//! owner, so every late update goes through these helpers instead.
use leptos::logging::log;
use leptos::{Owner, SignalSet};

/// Runs `f` under `owner`. If there is no owner, or it was disposed,
/// logs and returns None.
pub fn with_owner_safe<F, R>(owner: Option<Owner>, log_context: &str, f: F) -> Option<R>
where
    F: FnOnce() -> R,
{
    let Some(owner) = owner else {
        log!("[OWNER] No Leptos owner in context: {}", log_context);
        return None;
    };
    match leptos::try_with_owner(owner, f) {
        Ok(value) => Some(value),
        Err(_) => {
            log!("[OWNER] Owner disposed, skipping: {}", log_context);
            None
        }
    }
}

/// Sets `signal` unless it was disposed. Returns whether the value landed.
pub fn set_if_alive<S, T>(signal: S, value: T, log_context: &str) -> bool
where
    S: SignalSet<Value = T>,
{
    match signal.try_set(value) {
        None => true,
        Some(_) => {
            log!("[OWNER] Dropped stale update: {}", log_context);
            false
        }
    }
}
