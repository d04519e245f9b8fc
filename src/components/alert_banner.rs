//! Success and error banner shared by the pages, plus the delete prompt.
use gloo_timers::callback::Timeout;
use leptos::logging::error;
use leptos::*;

use crate::error::ClientError;

/// How long a banner stays up, in milliseconds.
pub const DISMISS_AFTER_MS: u32 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            message: message.into(),
        }
    }

    pub fn class(&self) -> &'static str {
        match self.kind {
            AlertKind::Success => "alert alert-success",
            AlertKind::Error => "alert alert-danger",
        }
    }
}

impl From<&ClientError> for Alert {
    fn from(err: &ClientError) -> Self {
        Alert::error(err.to_string())
    }
}

/// Shows the current alert and clears it after [`DISMISS_AFTER_MS`].
#[component]
pub fn AlertBanner(alert: RwSignal<Option<Alert>>) -> impl IntoView {
    create_effect(move |_| {
        let Some(shown) = alert.get() else {
            return;
        };
        // Only clear the alert this timer was started for.
        Timeout::new(DISMISS_AFTER_MS, move || {
            let still_shown = alert
                .try_with_untracked(|current| current.as_ref() == Some(&shown))
                .unwrap_or(false);
            if still_shown {
                let _ = alert.try_set(None);
            }
        })
        .forget();
    });

    move || {
        alert.get().map(|current| {
            view! {
                <div class=current.class() role="alert">
                    <span>{current.message.clone()}</span>
                    <button class="close" on:click=move |_| alert.set(None)>"×"</button>
                </div>
            }
        })
    }
}

/// Browser confirmation prompt. A blocked or failed prompt counts as "no".
pub fn confirm(message: &str) -> bool {
    gloo_utils::window()
        .confirm_with_message(message)
        .unwrap_or_else(|_| {
            error!("[PAGE] Confirmation prompt unavailable");
            false
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_become_error_alerts() {
        let err = ClientError::Http {
            status: 422,
            message: "Name is required".into(),
        };
        let alert = Alert::from(&err);
        assert_eq!(alert.kind, AlertKind::Error);
        assert_eq!(alert.message, "Name is required");
        assert_eq!(alert.class(), "alert alert-danger");
    }
}
