#![cfg(target_arch = "wasm32")]

use gloo_timers::future::TimeoutFuture;
use leptos::*;
use serde::Serialize;
use storedesk::components::data_table::{Column, DataTable};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[derive(Serialize, Clone)]
struct Customer {
    name: String,
    city: String,
}

fn customers(count: usize) -> Vec<Customer> {
    (1..=count)
        .map(|i| Customer {
            name: format!("Customer {i}"),
            city: if i % 2 == 0 { "Nairobi" } else { "Mombasa" }.to_string(),
        })
        .collect()
}

fn mount_table(rows: RwSignal<Vec<Customer>>) -> web_sys::HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let container = document
        .create_element("div")
        .unwrap()
        .unchecked_into::<web_sys::HtmlElement>();
    document.body().unwrap().append_child(&container).unwrap();

    mount_to(container.clone(), move || {
        let columns = vec![Column::new("name", "Name"), Column::new("city", "City")];
        view! { <DataTable rows=rows columns=columns page_size=5 /> }
    });
    container
}

fn body_rows(container: &web_sys::HtmlElement) -> u32 {
    container.query_selector_all("tbody tr").unwrap().length()
}

#[wasm_bindgen_test]
async fn shows_one_page_of_rows() {
    let rows = create_rw_signal(customers(12));
    let container = mount_table(rows);
    TimeoutFuture::new(0).await;

    assert_eq!(body_rows(&container), 5);
    let footer = container.query_selector(".pagination").unwrap().unwrap();
    assert!(footer.text_content().unwrap().contains("1-5 of 12"));
}

#[wasm_bindgen_test]
async fn follows_the_rows_signal() {
    let rows = create_rw_signal(customers(3));
    let container = mount_table(rows);
    TimeoutFuture::new(0).await;
    assert_eq!(body_rows(&container), 3);

    rows.set(Vec::new());
    TimeoutFuture::new(0).await;
    let body = container.query_selector("tbody").unwrap().unwrap();
    assert!(body.text_content().unwrap().contains("No records found"));
}
