use std::rc::Rc;

use leptos::logging::warn;
use leptos::*;
use wasm_bindgen_futures::spawn_local;

use super::{form_title, Editing, PageState};
use crate::client::ApiClient;
use crate::components::alert_banner::AlertBanner;
use crate::components::data_table::{Column, DataTable, RowActions};
use crate::components::form_fields::{SelectField, TextArea, TextField};
use crate::components::modal::Modal;
use crate::models::product::Product;
use crate::models::review::{Review, ReviewInput, MAX_RATING, MIN_RATING};
use crate::models::Resource;
use crate::session::SessionHandle;
use crate::utils::leptos_owner::set_if_alive;

/// Query string for the product filter; None lists every review.
pub fn product_query(product_id: &str) -> Option<String> {
    if product_id.is_empty() {
        None
    } else {
        Some(format!("product_id={}", urlencoding::encode(product_id)))
    }
}

/// New query for the list, when the filter moved away from `previous`.
/// The first run has no previous value and leaves the mount fetch alone.
pub fn filter_change(previous: Option<&str>, selected: &str) -> Option<Option<String>> {
    match previous {
        Some(previous) if previous != selected => Some(product_query(selected)),
        _ => None,
    }
}

fn rating_options() -> Vec<(String, String)> {
    (MIN_RATING..=MAX_RATING)
        .rev()
        .map(|rating| (rating.to_string(), format!("{rating} / {MAX_RATING}")))
        .collect()
}

#[component]
pub fn ReviewsPage(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let page = PageState::<Review>::new(session);
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
                    set_if_alive(products, options, "review products");
                }
                Err(err) => warn!("[PAGE] Products unavailable: {}", err),
            }
        });
    });

    // Changing the filter re-runs the page's load effect.
    let filter = create_rw_signal(String::new());
    create_effect(move |previous: Option<String>| {
        let selected = filter.get();
        if let Some(query) = filter_change(previous.as_deref(), &selected) {
            page.query.set(query);
        }
        selected
    });

    let product_id = create_rw_signal(String::new());
    let author_name = create_rw_signal(String::new());
    let rating = create_rw_signal(MAX_RATING.to_string());
    let comment = create_rw_signal(String::new());

    let open_form = move |review: Option<Review>| {
        let mut input = review.as_ref().map(Resource::to_input).unwrap_or_default();
        if review.is_none() {
            // New reviews default to the filtered product.
            input.product_id = filter.get_untracked();
        }
        product_id.set(input.product_id);
        author_name.set(input.author_name);
        rating.set(input.rating.to_string());
        comment.set(input.comment);
        match review {
            Some(review) => page.open_existing(&review.id),
            None => page.open_new(),
        }
    };

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let input = ReviewInput {
            product_id: product_id.get_untracked(),
            author_name: author_name.get_untracked(),
            rating: rating.get_untracked().parse().unwrap_or(0),
            comment: comment.get_untracked(),
        };
        page.save(client.get_value(), async move { Ok(input) });
    };

    let columns = vec![
        Column::new("product", "Product").render(|r: &Review| {
            r.product
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| r.product_id.clone())
                .into_view()
        }),
        Column::new("author_name", "Author"),
        Column::new("rating", "Rating")
            .render(|r: &Review| view! { <span class="stars">{r.stars()}</span> }.into_view()),
        Column::new("comment", "Comment"),
        Column::new("created_at", "Date")
            .render(|r: &Review| r.created_at.format("%Y-%m-%d").to_string().into_view()),
    ];
    let actions: RowActions<Review> = Rc::new(move |review: &Review| {
        let editing = review.clone();
        let id = review.id.clone();
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
                <h2>"Reviews"</h2>
                <button class="btn btn-primary" on:click=move |_| open_form(None)>"Add review"</button>
            </header>
            <div class="filters">
                <SelectField label="Product" value=filter options=products empty="All products" />
            </div>
            <AlertBanner alert=page.alert />
            <DataTable rows=page.rows columns=columns actions=actions loading=page.loading page_size=page_size />
            <Show when=move || page.editing.with(Editing::is_open)>
                <Modal
                    title=page.editing.with_untracked(form_title::<Review>)
                    on_close=move |_| page.close()
                >
                    <form on:submit=submit>
                        <SelectField
                            label="Product"
                            value=product_id
                            options=products
                            empty="Choose a product"
                        />
                        <TextField label="Author" value=author_name required=true />
                        <SelectField label="Rating" value=rating options=Signal::derive(rating_options) />
                        <TextArea label="Comment" value=comment />
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
    fn empty_filter_lists_everything() {
        assert_eq!(product_query(""), None);
        assert_eq!(product_query("p1"), Some("product_id=p1".to_string()));
        assert_eq!(
            product_query("a b&c"),
            Some("product_id=a%20b%26c".to_string())
        );
    }

    #[test]
    fn only_a_changed_filter_requests_a_new_list() {
        assert_eq!(filter_change(None, ""), None);
        assert_eq!(filter_change(Some(""), ""), None);
        assert_eq!(
            filter_change(Some(""), "p2"),
            Some(Some("product_id=p2".to_string()))
        );
        assert_eq!(filter_change(Some("p2"), ""), Some(None));
    }

    #[test]
    fn ratings_are_listed_best_first() {
        let options = rating_options();
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].0, "5");
        assert_eq!(options[4].1, "1 / 5");
    }
}
