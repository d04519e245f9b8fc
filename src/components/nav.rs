use leptos::logging::warn;
use leptos::*;
use leptos_router::{use_navigate, NavigateOptions, A};
use wasm_bindgen_futures::spawn_local;

use crate::client::ApiClient;
use crate::session::{SessionHandle, LOGIN_PATH};

/// Sidebar entries as `(path, label)`.
pub const LINKS: [(&str, &str); 9] = [
    ("/", "Dashboard"),
    ("/orders", "Orders"),
    ("/products", "Products"),
    ("/categories", "Categories"),
    ("/gift-boxes", "Gift boxes"),
    ("/reviews", "Reviews"),
    ("/users", "Users"),
    ("/saved", "Saved"),
    ("/settings", "Settings"),
];

#[component]
pub fn Nav(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let navigate = use_navigate();
    let logout = move |_| {
        let client = client.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            // Revoking the token is best effort; the local session goes regardless.
            if let Err(err) = client
                .post::<_, serde_json::Value>("auth/logout", &serde_json::Value::Null)
                .await
            {
                warn!("[AUTH] Server logout failed: {}", err);
            }
            session.logout();
            navigate(LOGIN_PATH, NavigateOptions::default());
        });
    };

    view! {
        <nav class="sidebar">
            <div class="brand">"StoreDesk"</div>
            <ul>
                {LINKS
                    .iter()
                    .map(|(path, label)| view! { <li><A href=*path exact=true>{*label}</A></li> })
                    .collect_view()}
            </ul>
            <div class="account">
                <span>{move || session.user().map(|u| u.name).unwrap_or_default()}</span>
                <button class="btn btn-link" on:click=logout>"Log out"</button>
            </div>
        </nav>
    }
}
