use std::rc::Rc;

use leptos::logging::warn;
use leptos::*;
use wasm_bindgen_futures::spawn_local;

use super::{form_title, money, thumbnail, Editing, FieldErrors, PageState};
use crate::client::ApiClient;
use crate::components::alert_banner::AlertBanner;
use crate::components::data_table::{Column, DataTable, RowActions};
use crate::components::form_fields::{CheckField, SelectField, TextArea, TextField};
use crate::components::image_picker::ImagePicker;
use crate::components::modal::Modal;
use crate::components::status_badge::ActiveBadge;
use crate::models::category::Category;
use crate::models::product::{Product, ProductInput, Variant};
use crate::models::{parse_amount, parse_count, Resource};
use crate::session::SessionHandle;
use crate::upload::{stored, upload_for_draft, ImageRef};
use crate::utils::leptos_owner::set_if_alive;

/// Raw text of one row of the variants editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantRow {
    pub name: String,
    pub price: String,
    pub stock: String,
}

impl From<&Variant> for VariantRow {
    fn from(variant: &Variant) -> Self {
        Self {
            name: variant.name.clone(),
            price: variant.price.to_string(),
            stock: variant.stock.to_string(),
        }
    }
}

/// Parses the editor rows; blank rows are skipped.
pub fn parse_variants(rows: &[VariantRow], errors: &mut FieldErrors) -> Vec<Variant> {
    rows.iter()
        .filter(|row| !(row.name.trim().is_empty() && row.price.trim().is_empty()))
        .filter_map(|row| {
            let variant = Variant::from_form(&row.name, &row.price, &row.stock);
            match variant {
                Ok(variant) => Some(variant),
                Err(problem) => {
                    errors.take::<()>(Err(problem));
                    None
                }
            }
        })
        .collect()
}

#[component]
pub fn ProductsPage(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let page = PageState::<Product>::new(session);
    page.load_on_mount(client.clone());
    let client = store_value(client);
    let page_size = client.with_value(|c| c.config().page_size);

    // Category choices for the select
    let categories = create_rw_signal(Vec::<(String, String)>::new());
    create_effect(move |_| {
        let client = client.get_value();
        spawn_local(async move {
            match client.list::<Category>().await {
                Ok(list) => {
                    let options = list.into_iter().map(|c| (c.id, c.name)).collect();
                    set_if_alive(categories, options, "product categories");
                }
                Err(err) => warn!("[PAGE] Categories unavailable: {}", err),
            }
        });
    });

    let name = create_rw_signal(String::new());
    let description = create_rw_signal(String::new());
    let price = create_rw_signal(String::new());
    let stock = create_rw_signal(String::new());
    let category_id = create_rw_signal(String::new());
    let active = create_rw_signal(true);
    let variants = create_rw_signal(Vec::<VariantRow>::new());
    let images = create_rw_signal(Vec::<ImageRef>::new());

    let open_form = move |product: Option<Product>| {
        let input = product.as_ref().map(Resource::to_input).unwrap_or_default();
        name.set(input.name);
        description.set(input.description);
        price.set(if product.is_some() { input.price.to_string() } else { String::new() });
        stock.set(if product.is_some() { input.stock.to_string() } else { String::new() });
        category_id.set(input.category_id.unwrap_or_default());
        active.set(input.active);
        variants.set(input.variants.iter().map(VariantRow::from).collect());
        images.set(stored(&input.images));
        match product {
            Some(product) => page.open_existing(&product.id),
            None => page.open_new(),
        }
    };

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let client = client.get_value();
        let chosen = images.get_untracked();
        let mut errors = FieldErrors::default();
        let draft = ProductInput {
            name: name.get_untracked(),
            description: description.get_untracked(),
            price: errors.take(parse_amount("Price", &price.get_untracked())),
            stock: errors.take(parse_count("Stock", &stock.get_untracked())),
            variants: parse_variants(&variants.get_untracked(), &mut errors),
            images: Vec::new(),
            category_id: Some(category_id.get_untracked()).filter(|id| !id.is_empty()),
            active: active.get_untracked(),
        };
        page.save(client.clone(), async move {
            errors.finish()?;
            let images = upload_for_draft(&client, &draft, &chosen).await?;
            Ok(ProductInput { images, ..draft })
        });
    };

    let edit_variant = move |index: usize, apply: fn(&mut VariantRow, String), value: String| {
        variants.update(|rows| {
            if let Some(row) = rows.get_mut(index) {
                apply(row, value);
            }
        });
    };

    let variant_editor = move || {
        variants
            .get()
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                view! {
                    <div class="variant-row">
                        <input
                            placeholder="Name"
                            prop:value=row.name
                            on:input=move |ev| edit_variant(index, |r, v| r.name = v, event_target_value(&ev))
                        />
                        <input
                            placeholder="Price"
                            inputmode="decimal"
                            prop:value=row.price
                            on:input=move |ev| edit_variant(index, |r, v| r.price = v, event_target_value(&ev))
                        />
                        <input
                            placeholder="Stock"
                            inputmode="numeric"
                            prop:value=row.stock
                            on:input=move |ev| edit_variant(index, |r, v| r.stock = v, event_target_value(&ev))
                        />
                        <button
                            type="button"
                            class="btn btn-sm"
                            on:click=move |_| variants.update(|rows| {
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
            .render(|p: &Product| thumbnail(p.images.first().map(String::as_str))),
        Column::new("name", "Name"),
        Column::new("category", "Category").render(|p: &Product| {
            p.category
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "-".to_string())
                .into_view()
        }),
        Column::new("price", "Price").render(|p: &Product| money(p.price).into_view()),
        Column::new("stock", "Stock"),
        Column::new("variants", "Variants").render(|p: &Product| p.variants.len().into_view()),
        Column::new("active", "Status")
            .render(|p: &Product| view! { <ActiveBadge active=p.active /> }.into_view()),
    ];
    let actions: RowActions<Product> = Rc::new(move |product: &Product| {
        let editing = product.clone();
        let id = product.id.clone();
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
                <h2>"Products"</h2>
                <button class="btn btn-primary" on:click=move |_| open_form(None)>"Add product"</button>
            </header>
            <AlertBanner alert=page.alert />
            <DataTable rows=page.rows columns=columns actions=actions loading=page.loading page_size=page_size />
            <Show when=move || page.editing.with(Editing::is_open)>
                <Modal
                    title=page.editing.with_untracked(form_title::<Product>)
                    on_close=move |_| page.close()
                >
                    <form on:submit=submit>
                        <TextField label="Name" value=name required=true />
                        <TextArea label="Description" value=description />
                        <TextField label="Price" value=price required=true />
                        <TextField label="Stock" value=stock required=true />
                        <SelectField
                            label="Category"
                            value=category_id
                            options=categories
                            empty="No category"
                        />
                        <fieldset class="variants">
                            <legend>"Variants"</legend>
                            {variant_editor}
                            <button
                                type="button"
                                class="btn btn-sm"
                                on:click=move |_| variants.update(|rows| rows.push(VariantRow::default()))
                            >
                                "Add variant"
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

    fn row(name: &str, price: &str, stock: &str) -> VariantRow {
        VariantRow {
            name: name.into(),
            price: price.into(),
            stock: stock.into(),
        }
    }

    #[test]
    fn variant_prices_are_parsed_as_floats() {
        let mut errors = FieldErrors::default();
        let variants = parse_variants(&[row("250g", "4,75", "3"), row("", "", "")], &mut errors);
        assert!(errors.finish().is_ok());
        assert_eq!(
            variants,
            vec![Variant {
                name: "250g".into(),
                price: 4.75,
                stock: 3
            }]
        );
    }

    #[test]
    fn bad_variant_text_is_reported() {
        let mut errors = FieldErrors::default();
        let variants = parse_variants(&[row("1kg", "cheap", "")], &mut errors);
        assert!(variants.is_empty());
        assert_eq!(
            errors.finish().unwrap_err().to_string(),
            "Variant price must be a number"
        );
    }
}
