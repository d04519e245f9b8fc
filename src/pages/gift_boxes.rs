use std::rc::Rc;

use leptos::logging::warn;
use leptos::*;
use wasm_bindgen_futures::spawn_local;

use super::{form_title, money, thumbnail, Editing, FieldErrors, PageState};
use crate::client::ApiClient;
use crate::components::alert_banner::AlertBanner;
use crate::components::data_table::{Column, DataTable, RowActions};
use crate::components::form_fields::{CheckField, TextArea, TextField};
use crate::components::image_picker::ImagePicker;
use crate::components::modal::Modal;
use crate::components::status_badge::ActiveBadge;
use crate::models::gift_box::{GiftBox, GiftBoxInput, GiftBoxItem};
use crate::models::product::Product;
use crate::models::{parse_amount, parse_count, Resource};
use crate::session::SessionHandle;
use crate::upload::{stored, upload_for_draft, ImageRef};
use crate::utils::leptos_owner::set_if_alive;

/// Raw text of one line of the contents editor.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRow {
    pub product_id: String,
    pub quantity: String,
}

impl Default for ContentRow {
    fn default() -> Self {
        Self {
            product_id: String::new(),
            quantity: "1".to_string(),
        }
    }
}

/// Lines without a product are skipped.
pub fn parse_contents(rows: &[ContentRow], errors: &mut FieldErrors) -> Vec<GiftBoxItem> {
    rows.iter()
        .filter(|row| !row.product_id.is_empty())
        .map(|row| GiftBoxItem {
            product_id: row.product_id.clone(),
            quantity: errors.take(parse_count("Quantity", &row.quantity)),
            product_name: None,
        })
        .collect()
}

/// "2 x Saffron, 1 x Cardamom" for the table.
pub fn contents_summary(contents: &[GiftBoxItem]) -> String {
    if contents.is_empty() {
        return "-".to_string();
    }
    contents
        .iter()
        .map(|item| {
            let name = item.product_name.as_deref().unwrap_or(&item.product_id);
            format!("{} x {}", item.quantity, name)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[component]
pub fn GiftBoxesPage(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let page = PageState::<GiftBox>::new(session);
    page.load_on_mount(client.clone());
    let client = store_value(client);
    let page_size = client.with_value(|c| c.config().page_size);

    let products = create_rw_signal(Vec::<(String, String)>::new());
    create_effect(move |_| {
        let client = client.get_value();
        spawn_local(async move {
            match client.list::<Product>().await {
                Ok(list) => {
                    let options = list.into_iter().map(|p| (p.id, p.name)).collect();
                    set_if_alive(products, options, "gift box products");
                }
                Err(err) => warn!("[PAGE] Products unavailable: {}", err),
            }
        });
    });

    let name = create_rw_signal(String::new());
    let description = create_rw_signal(String::new());
    let price = create_rw_signal(String::new());
    let stock = create_rw_signal(String::new());
    let active = create_rw_signal(true);
    let contents = create_rw_signal(Vec::<ContentRow>::new());
    let images = create_rw_signal(Vec::<ImageRef>::new());

    let open_form = move |gift_box: Option<GiftBox>| {
        let input = gift_box.as_ref().map(Resource::to_input).unwrap_or_default();
        let existing = gift_box.is_some();
        name.set(input.name);
        description.set(input.description);
        price.set(if existing { input.price.to_string() } else { String::new() });
        stock.set(if existing { input.stock.to_string() } else { String::new() });
        active.set(input.active);
        contents.set(
            input
                .contents
                .into_iter()
                .map(|item| ContentRow {
                    product_id: item.product_id,
                    quantity: item.quantity.to_string(),
                })
                .collect(),
        );
        images.set(stored(&input.images));
        match gift_box {
            Some(gift_box) => page.open_existing(&gift_box.id),
            None => page.open_new(),
        }
    };

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let client = client.get_value();
        let chosen = images.get_untracked();
        let mut errors = FieldErrors::default();
        let draft = GiftBoxInput {
            name: name.get_untracked(),
            description: description.get_untracked(),
            price: errors.take(parse_amount("Price", &price.get_untracked())),
            stock: errors.take(parse_count("Stock", &stock.get_untracked())),
            images: Vec::new(),
            contents: parse_contents(&contents.get_untracked(), &mut errors),
            active: active.get_untracked(),
        };
        page.save(client.clone(), async move {
            errors.finish()?;
            let images = upload_for_draft(&client, &draft, &chosen).await?;
            Ok(GiftBoxInput { images, ..draft })
        });
    };

    let contents_editor = move || {
        contents
            .get()
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                let chosen = row.product_id.clone();
                let none_chosen = chosen.is_empty();
                view! {
                    <div class="content-row">
                        <select on:change=move |ev| {
                            let value = event_target_value(&ev);
                            contents.update(|rows| {
                                if let Some(row) = rows.get_mut(index) {
                                    row.product_id = value;
                                }
                            });
                        }>
                            <option value="" selected=none_chosen>"Choose a product"</option>
                            {move || {
                                products
                                    .get()
                                    .into_iter()
                                    .map(|(id, label)| {
                                        let selected = id == chosen;
                                        view! { <option value=id selected=selected>{label}</option> }
                                    })
                                    .collect_view()
                            }}
                        </select>
                        <input
                            class="qty"
                            inputmode="numeric"
                            prop:value=row.quantity
                            on:input=move |ev| {
                                let value = event_target_value(&ev);
                                contents.update(|rows| {
                                    if let Some(row) = rows.get_mut(index) {
                                        row.quantity = value;
                                    }
                                });
                            }
                        />
                        <button
                            type="button"
                            class="btn btn-sm"
                            on:click=move |_| contents.update(|rows| {
                                if index < rows.len() {
                                    rows.remove(index);
                                }
                            })
                        >
                            "Remove"
                        </button>
                    </div>
                }
            })
            .collect_view()
    };

    let columns = vec![
        Column::new("images", "Image")
            .render(|g: &GiftBox| thumbnail(g.images.first().map(String::as_str))),
        Column::new("name", "Name"),
        Column::new("contents", "Contents")
            .render(|g: &GiftBox| contents_summary(&g.contents).into_view()),
        Column::new("price", "Price").render(|g: &GiftBox| money(g.price).into_view()),
        Column::new("stock", "Stock"),
        Column::new("active", "Status")
            .render(|g: &GiftBox| view! { <ActiveBadge active=g.active /> }.into_view()),
    ];
    let actions: RowActions<GiftBox> = Rc::new(move |gift_box: &GiftBox| {
        let editing = gift_box.clone();
        let id = gift_box.id.clone();
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
                <h2>"Gift boxes"</h2>
                <button class="btn btn-primary" on:click=move |_| open_form(None)>"Add gift box"</button>
            </header>
            <AlertBanner alert=page.alert />
            <DataTable rows=page.rows columns=columns actions=actions loading=page.loading page_size=page_size />
            <Show when=move || page.editing.with(Editing::is_open)>
                <Modal
                    title=page.editing.with_untracked(form_title::<GiftBox>)
                    on_close=move |_| page.close()
                >
                    <form on:submit=submit>
                        <TextField label="Name" value=name required=true />
                        <TextArea label="Description" value=description />
                        <TextField label="Price" value=price required=true />
                        <TextField label="Stock" value=stock required=true />
                        <fieldset class="contents">
                            <legend>"Contents"</legend>
                            {contents_editor}
                            <button
                                type="button"
                                class="btn btn-sm"
                                on:click=move |_| contents.update(|rows| rows.push(ContentRow::default()))
                            >
                                "Add product"
                            </button>
                        </fieldset>
                        <ImagePicker images=images />
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
    fn rows_without_a_product_are_skipped() {
        let rows = vec![
            ContentRow {
                product_id: "p1".into(),
                quantity: "2".into(),
            },
            ContentRow::default(),
        ];
        let mut errors = FieldErrors::default();
        let items = parse_contents(&rows, &mut errors);
        assert!(errors.finish().is_ok());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[test]
    fn summary_prefers_product_names() {
        let contents = vec![
            GiftBoxItem {
                product_id: "p1".into(),
                quantity: 2,
                product_name: Some("Saffron".into()),
            },
            GiftBoxItem {
                product_id: "p9".into(),
                quantity: 1,
                product_name: None,
            },
        ];
        assert_eq!(contents_summary(&contents), "2 x Saffron, 1 x p9");
        assert_eq!(contents_summary(&[]), "-");
    }
}
