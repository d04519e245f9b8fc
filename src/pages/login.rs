use leptos::logging::{error, log};
use leptos::*;
use leptos_router::use_navigate;
use wasm_bindgen_futures::spawn_local;

use crate::client::ApiClient;
use crate::components::alert_banner::{Alert, AlertBanner};
use crate::components::form_fields::TextField;
use crate::error::ClientError;
use crate::models::user::{LoginRequest, LoginResponse};
use crate::session::{SessionHandle, HOME_PATH};
use crate::utils::leptos_owner::{set_if_alive, with_owner_safe};

pub fn login_request(email: &str, password: &str) -> Result<LoginRequest, ClientError> {
    let request = LoginRequest {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ClientError::Validation(vec![
            "Email and password are required".into(),
        ]));
    }
    Ok(request)
}

#[component]
pub fn LoginPage(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let email = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let busy = create_rw_signal(false);
    let alert = create_rw_signal(None::<Alert>);
    let navigate = store_value(use_navigate());
    let client = store_value(client);

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let request = match login_request(&email.get_untracked(), &password.get_untracked()) {
            Ok(request) => request,
            Err(err) => {
                alert.set(Some(Alert::from(&err)));
                return;
            }
        };
        let client = client.get_value();
        let owner = Owner::current();
        busy.set(true);
        spawn_local(async move {
            let result = match client
                .post::<LoginRequest, LoginResponse>("auth/login", &request)
                .await
            {
                // Non-admin accounts are turned away by the session.
                Ok(response) => session.login(response.user, response.token),
                Err(err) => Err(err),
            };
            set_if_alive(busy, false, "login");
            match result {
                Ok(()) => {
                    log!("[LOGIN] Signed in as {}", request.email);
                    with_owner_safe(owner, "login redirect", || {
                        navigate.with_value(|navigate| navigate(HOME_PATH, Default::default()))
                    });
                }
                Err(err) => {
                    error!("[LOGIN] Sign-in failed: {}", err);
                    set_if_alive(password, String::new(), "login");
                    set_if_alive(alert, Some(Alert::from(&err)), "login");
                }
            }
        });
    };

    view! {
        <div class="login-page">
            <form class="login-card" on:submit=submit>
                <h1>"StoreDesk"</h1>
                <p class="muted">"Sign in with an administrator account"</p>
                <AlertBanner alert=alert />
                <TextField label="Email" value=email kind="email" required=true />
                <TextField label="Password" value=password kind="password" required=true />
                <button type="submit" class="btn btn-primary" disabled=move || busy.get()>
                    {move || if busy.get() { "Signing in..." } else { "Sign in" }}
                </button>
            </form>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_rejected_before_sending() {
        assert!(login_request("  ", "secret").is_err());
        assert!(login_request("admin@shop.test", "").is_err());
        let request = login_request(" admin@shop.test ", "secret").unwrap();
        assert_eq!(request.email, "admin@shop.test");
    }
}
