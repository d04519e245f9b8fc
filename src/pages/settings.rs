use leptos::logging::{error, log, warn};
use leptos::*;
use wasm_bindgen_futures::spawn_local;

use crate::client::ApiClient;
use crate::components::alert_banner::{Alert, AlertBanner};
use crate::components::form_fields::TextField;
use crate::components::status_badge::ActiveBadge;
use crate::error::ClientError;
use crate::models::user::{PasswordChange, User};
use crate::models::check;
use crate::session::SessionHandle;
use crate::utils::leptos_owner::set_if_alive;

/// Builds the password change body; the two new entries must agree.
pub fn password_change(
    current: &str,
    new_password: &str,
    confirmation: &str,
) -> Result<PasswordChange, ClientError> {
    let change = PasswordChange {
        current_password: current.to_string(),
        new_password: new_password.to_string(),
    };
    let mut problems = check(&change).err().unwrap_or_default();
    if new_password != confirmation {
        problems.push("Passwords do not match".to_string());
    }
    if problems.is_empty() {
        Ok(change)
    } else {
        Err(ClientError::Validation(problems))
    }
}

#[component]
pub fn SettingsPage(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let alert = create_rw_signal(None::<Alert>);
    let saving = create_rw_signal(false);
    let current = create_rw_signal(String::new());
    let new_password = create_rw_signal(String::new());
    let confirmation = create_rw_signal(String::new());
    let client = store_value(client);

    // Refresh the stored profile from the server once.
    create_effect(move |_| {
        let client = client.get_value();
        spawn_local(async move {
            match client.get::<User>("auth/me").await {
                Ok(user) => {
                    if let Err(err) = session.update_user(user) {
                        warn!("[SETTINGS] Profile refresh rejected: {}", err);
                    }
                }
                Err(err) if err.is_unauthorized() => session.logout(),
                Err(err) => warn!("[SETTINGS] Profile refresh failed: {}", err),
            }
        });
    });

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let change = match password_change(
            &current.get_untracked(),
            &new_password.get_untracked(),
            &confirmation.get_untracked(),
        ) {
            Ok(change) => change,
            Err(err) => {
                alert.set(Some(Alert::from(&err)));
                return;
            }
        };
        let client = client.get_value();
        saving.set(true);
        spawn_local(async move {
            let result = client
                .put::<PasswordChange, serde_json::Value>("auth/password", &change)
                .await;
            set_if_alive(saving, false, "settings");
            match result {
                Ok(_) => {
                    log!("[SETTINGS] Password changed");
                    for field in [current, new_password, confirmation] {
                        set_if_alive(field, String::new(), "settings");
                    }
                    set_if_alive(alert, Some(Alert::success("Password changed")), "settings");
                }
                Err(err) => {
                    error!("[SETTINGS] Password change failed: {}", err);
                    set_if_alive(alert, Some(Alert::from(&err)), "settings");
                }
            }
        });
    };

    let profile = move || {
        session.user().map(|user| {
            view! {
                <dl class="profile">
                    <dt>"Name"</dt>
                    <dd>{user.name.clone()}</dd>
                    <dt>"Email"</dt>
                    <dd>{user.email.clone()}</dd>
                    <dt>"Role"</dt>
                    <dd>{user.role.as_str()}</dd>
                    <dt>"Status"</dt>
                    <dd><ActiveBadge active=user.active /></dd>
                    <dt>"Member since"</dt>
                    <dd>{user.created_at.format("%Y-%m-%d").to_string()}</dd>
                </dl>
            }
        })
    };

    view! {
        <section class="page">
            <header class="page-header">
                <h2>"Settings"</h2>
            </header>
            <AlertBanner alert=alert />
            <div class="panel">
                <h3>"Profile"</h3>
                {profile}
            </div>
            <form class="panel" on:submit=submit>
                <h3>"Change password"</h3>
                <TextField label="Current password" value=current kind="password" required=true />
                <TextField label="New password" value=new_password kind="password" required=true />
                <TextField label="Confirm new password" value=confirmation kind="password" required=true />
                <button type="submit" class="btn btn-primary" disabled=move || saving.get()>
                    {move || if saving.get() { "Saving..." } else { "Change password" }}
                </button>
            </form>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_confirmation_is_reported() {
        let err = password_change("old-secret", "new-secret-1", "new-secret-2").unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn matching_passwords_build_the_body() {
        let change = password_change("old-secret", "new-secret-1", "new-secret-1").unwrap();
        assert_eq!(change.new_password, "new-secret-1");
        assert!(password_change("", "short", "short").is_err());
    }
}
