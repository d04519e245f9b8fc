use std::panic;

use leptos::logging::log;

/// Panic hook that adds context to Leptos owner-disposal panics.
///
/// These come from a response or timer that touched a page after it was
/// unmounted, which is easy to misread from the bare message.
pub fn set_custom_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        // Call the original hook first
        original_hook(panic_info);

        let message = if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else {
            "Unknown panic".to_string()
        };

        if is_owner_disposal(&message) {
            log!("[PANIC] Leptos owner disposal detected. This usually happens when:");
            log!("[PANIC] 1. A request resolved after its page was unmounted");
            log!("[PANIC] 2. An alert timer fired after the banner was removed");
            log!("[PANIC] Route late updates through utils::leptos_owner::set_if_alive");
        }
        if let Some(location) = panic_info.location() {
            log!("[PANIC] at {}:{}", location.file(), location.line());
        }
    }));
}

fn is_owner_disposal(message: &str) -> bool {
    message.contains("OwnerDisposed") || message.contains("disposed")
}

/// Call once from the browser entry point.
pub fn init() {
    console_error_panic_hook::set_once();
    log!("[PANIC_HOOK] Setting up custom panic hook");
    set_custom_panic_hook();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_disposal_messages() {
        assert!(is_owner_disposal("called `Result::unwrap()` on an `Err` value: OwnerDisposed"));
        assert!(is_owner_disposal("tried to access a signal that was disposed"));
        assert!(!is_owner_disposal("index out of bounds"));
    }
}
