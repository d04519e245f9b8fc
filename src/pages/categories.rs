use std::rc::Rc;

use leptos::*;

use super::{form_title, thumbnail, Editing, PageState};
use crate::client::ApiClient;
use crate::components::alert_banner::AlertBanner;
use crate::components::data_table::{Column, DataTable, RowActions};
use crate::components::form_fields::{CheckField, TextField};
use crate::components::image_picker::ImagePicker;
use crate::components::modal::Modal;
use crate::components::status_badge::ActiveBadge;
use crate::models::category::{Category, CategoryInput};
use crate::models::Resource;
use crate::session::SessionHandle;
use crate::upload::{stored, upload_for_draft, ImageRef};

#[component]
pub fn CategoriesPage(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let page = PageState::<Category>::new(session);
    page.load_on_mount(client.clone());
    let client = store_value(client);
    let page_size = client.with_value(|c| c.config().page_size);

    let name = create_rw_signal(String::new());
    let active = create_rw_signal(true);
    let image = create_rw_signal(Vec::<ImageRef>::new());

    let open_form = move |category: Option<Category>| {
        let input = category.as_ref().map(Resource::to_input).unwrap_or_default();
        name.set(input.name);
        active.set(input.active);
        image.set(stored(input.image.as_slice()));
        match category {
            Some(category) => page.open_existing(&category.id),
            None => page.open_new(),
        }
    };

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let client = client.get_value();
        let images = image.get_untracked();
        let draft = CategoryInput {
            name: name.get_untracked(),
            image: None,
            active: active.get_untracked(),
        };
        page.save(client.clone(), async move {
            // A category keeps a single image.
            let image = upload_for_draft(&client, &draft, &images)
                .await?
                .into_iter()
                .next();
            Ok(CategoryInput { image, ..draft })
        });
    };

    let columns = vec![
        Column::new("image", "Image").render(|c: &Category| thumbnail(c.image.as_deref())),
        Column::new("name", "Name"),
        Column::new("product_count", "Products"),
        Column::new("active", "Status")
            .render(|c: &Category| view! { <ActiveBadge active=c.active /> }.into_view()),
    ];
    let actions: RowActions<Category> = Rc::new(move |category: &Category| {
        let editing = category.clone();
        let id = category.id.clone();
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
                <h2>"Categories"</h2>
                <button class="btn btn-primary" on:click=move |_| open_form(None)>"Add category"</button>
            </header>
            <AlertBanner alert=page.alert />
            <DataTable rows=page.rows columns=columns actions=actions loading=page.loading page_size=page_size />
            <Show when=move || page.editing.with(Editing::is_open)>
                <Modal
                    title=page.editing.with_untracked(form_title::<Category>)
                    on_close=move |_| page.close()
                >
                    <form on:submit=submit>
                        <TextField label="Name" value=name required=true />
                        <ImagePicker images=image multiple=false />
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
