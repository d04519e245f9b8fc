use std::rc::Rc;

use leptos::*;

use super::{form_title, Editing, PageState};
use crate::client::ApiClient;
use crate::components::alert_banner::AlertBanner;
use crate::components::data_table::{Column, DataTable, RowActions};
use crate::components::form_fields::{CheckField, SelectField, TextField};
use crate::components::modal::Modal;
use crate::components::status_badge::ActiveBadge;
use crate::error::ClientError;
use crate::models::user::{Role, User, UserInput};
use crate::models::Resource;
use crate::session::SessionHandle;

fn role_options() -> Vec<(String, String)> {
    [Role::Admin, Role::Customer]
        .into_iter()
        .map(|role| (role.as_str().to_string(), super::capitalize(role.as_str())))
        .collect()
}

/// New users need a password; on edit a blank password keeps the old one.
pub fn password_for(editing: &Editing, typed: &str) -> Result<Option<String>, ClientError> {
    match (editing, typed.is_empty()) {
        (Editing::Existing(_), true) => Ok(None),
        (_, true) => Err(ClientError::Validation(vec!["Password is required".into()])),
        (_, false) => Ok(Some(typed.to_string())),
    }
}

#[component]
pub fn UsersPage(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let page = PageState::<User>::new(session);
    page.load_on_mount(client.clone());
    let client = store_value(client);
    let page_size = client.with_value(|c| c.config().page_size);

    let name = create_rw_signal(String::new());
    let email = create_rw_signal(String::new());
    let role = create_rw_signal(Role::Customer.as_str().to_string());
    let active = create_rw_signal(true);
    let password = create_rw_signal(String::new());

    let open_form = move |user: Option<User>| {
        let input = user.as_ref().map(Resource::to_input).unwrap_or_default();
        name.set(input.name);
        email.set(input.email);
        role.set(input.role.as_str().to_string());
        active.set(input.active);
        password.set(String::new());
        match user {
            Some(user) => page.open_existing(&user.id),
            None => page.open_new(),
        }
    };

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let password = password_for(&page.editing.get_untracked(), &password.get_untracked());
        let draft = UserInput {
            name: name.get_untracked(),
            email: email.get_untracked().trim().to_string(),
            role: Role::parse(&role.get_untracked()).unwrap_or_default(),
            active: active.get_untracked(),
            password: None,
        };
        page.save(client.get_value(), async move {
            Ok(UserInput {
                password: password?,
                ..draft
            })
        });
    };

    let columns = vec![
        Column::new("name", "Name"),
        Column::new("email", "Email"),
        Column::new("role", "Role"),
        Column::new("active", "Status")
            .render(|u: &User| view! { <ActiveBadge active=u.active /> }.into_view()),
        Column::new("created_at", "Joined")
            .render(|u: &User| u.created_at.format("%Y-%m-%d").to_string().into_view()),
    ];
    let actions: RowActions<User> = Rc::new(move |user: &User| {
        let editing = user.clone();
        let id = user.id.clone();
        view! {
            <button class="btn btn-sm" on:click=move |_| open_form(Some(editing.clone()))>"Edit"</button>
            <button class="btn btn-sm btn-danger" on:click=move |_| page.delete(client.get_value(), id.clone())>
                "Delete"
            </button>
        }
        .into_view()
    });

    view! {
        <section class="page">
            <header class="page-header">
                <h2>"Users"</h2>
                <button class="btn btn-primary" on:click=move |_| open_form(None)>"Add user"</button>
            </header>
            <AlertBanner alert=page.alert />
            <DataTable rows=page.rows columns=columns actions=actions loading=page.loading page_size=page_size />
            <Show when=move || page.editing.with(Editing::is_open)>
                <Modal
                    title=page.editing.with_untracked(form_title::<User>)
                    on_close=move |_| page.close()
                >
                    <form on:submit=submit>
                        <TextField label="Name" value=name required=true />
                        <TextField label="Email" value=email kind="email" required=true />
                        <SelectField label="Role" value=role options=Signal::derive(role_options) />
                        <TextField
                            label="Password"
                            value=password
                            kind="password"
                            placeholder="Leave blank to keep the current password"
                        />
                        <CheckField label="Active" value=active />
                        <button type="submit" class="btn btn-primary" disabled=move || page.saving.get()>
                            {move || if page.saving.get() { "Saving..." } else { "Save" }}
                        </button>
                    </form>
                </Modal>
            </Show>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_password_only_allowed_when_editing() {
        assert_eq!(
            password_for(&Editing::Existing("u1".into()), ""),
            Ok(None)
        );
        assert!(password_for(&Editing::New, "").is_err());
        assert_eq!(
            password_for(&Editing::New, "s3cretpass"),
            Ok(Some("s3cretpass".to_string()))
        );
    }

    #[test]
    fn role_options_cover_both_roles() {
        let options = role_options();
        assert_eq!(options[0], ("admin".to_string(), "Admin".to_string()));
        assert_eq!(options.len(), 2);
    }
}
