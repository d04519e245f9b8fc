use std::rc::Rc;

use leptos::logging::log;
use leptos::*;
use wasm_bindgen_futures::spawn_local;

use super::{money, Editing, PageState};
use crate::client::{item_endpoint, ApiClient};
use crate::components::alert_banner::AlertBanner;
use crate::components::data_table::{Column, DataTable, RowActions};
use crate::components::form_fields::{SelectField, TextArea};
use crate::components::modal::Modal;
use crate::components::status_badge::StatusBadge;
use crate::error::ClientError;
use crate::models::order::{Order, OrderStatus, StatusUpdate};
use crate::session::SessionHandle;
use crate::utils::leptos_owner::set_if_alive;

/// `orders/{id}/status`
pub fn status_endpoint(id: &str) -> String {
    format!("{}/status", item_endpoint::<Order>(id))
}

fn status_options() -> Vec<(String, String)> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| (status.label().to_string(), status.label().to_string()))
        .collect()
}

/// Reads the status select back. Any status may follow any other.
pub fn status_update(status: &str, note: &str) -> Result<StatusUpdate, String> {
    Ok(StatusUpdate {
        status: status.parse()?,
        note: Some(note.to_string()),
    })
}

fn customer_name(order: &Order) -> String {
    match &order.customer {
        Some(customer) => customer.name.clone(),
        None => order.shipping_address.full_name.clone(),
    }
}

#[component]
fn OrderDetail(order: Order) -> impl IntoView {
    let items = order
        .items
        .iter()
        .map(|item| {
            view! {
                <tr>
                    <td>{item.name.clone()}</td>
                    <td>{item.quantity}</td>
                    <td>{money(item.unit_price)}</td>
                    <td>{money(item.line_total())}</td>
                </tr>
            }
        })
        .collect_view();
    let email = order.customer.as_ref().map(|c| c.email.clone());

    view! {
        <div class="order-detail">
            <p>
                <strong>{customer_name(&order)}</strong>
                {email.map(|email| view! { <span class="muted">" "{email}</span> })}
            </p>
            <p>{order.shipping_address.one_line()}</p>
            <p class="muted">{order.shipping_address.phone.clone()}</p>
            <table class="table">
                <thead>
                    <tr><th>"Item"</th><th>"Qty"</th><th>"Unit"</th><th>"Total"</th></tr>
                </thead>
                <tbody>{items}</tbody>
            </table>
            <p>"Subtotal: " {money(order.subtotal)}</p>
            <p>"Shipping: " {money(order.shipping_fee)}</p>
            <p><strong>"Total: " {money(order.total)}</strong></p>
            {order.status_note.clone().map(|note| view! { <p class="muted">"Note: " {note}</p> })}
        </div>
    }
}

#[component]
pub fn OrdersPage(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let page = PageState::<Order>::new(session);
    page.load_on_mount(client.clone());
    let client = store_value(client);
    let page_size = client.with_value(|c| c.config().page_size);

    let status = create_rw_signal(String::new());
    let note = create_rw_signal(String::new());

    let open_detail = move |order: &Order| {
        status.set(order.status.label().to_string());
        note.set(order.status_note.clone().unwrap_or_default());
        page.open_existing(&order.id);
    };

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let Some(id) = page.editing.with_untracked(Editing::id) else {
            return;
        };
        let update = match status_update(&status.get_untracked(), &note.get_untracked()) {
            Ok(update) => update,
            Err(problem) => {
                page.fail(ClientError::Validation(vec![problem]));
                return;
            }
        };
        let client = client.get_value();
        page.saving.set(true);
        spawn_local(async move {
            let result = client
                .put::<StatusUpdate, Order>(&status_endpoint(&id), &update)
                .await;
            set_if_alive(page.saving, false, "order status");
            match result {
                Ok(order) => {
                    log!("[PAGE] Order {} is now {}", order.id, order.status);
                    set_if_alive(page.editing, Editing::Closed, "order status");
                    page.notify(format!("Order marked {}", order.status));
                    page.reload(client);
                }
                Err(err) => page.fail(err),
            }
        });
    };

    let columns = vec![
        Column::new("id", "Order").render(|o: &Order| {
            let short: String = o.id.chars().take(8).collect();
            short.into_view()
        }),
        Column::new("customer", "Customer").render(|o: &Order| customer_name(o).into_view()),
        Column::new("items", "Items").render(|o: &Order| o.items.len().into_view()),
        Column::new("total", "Total").render(|o: &Order| money(o.total).into_view()),
        Column::new("status", "Status")
            .render(|o: &Order| view! { <StatusBadge status=o.status /> }.into_view()),
        Column::new("created_at", "Placed")
            .render(|o: &Order| o.created_at.format("%Y-%m-%d %H:%M").to_string().into_view()),
    ];
    let actions: RowActions<Order> = Rc::new(move |order: &Order| {
        let viewing = order.clone();
        let id = order.id.clone();
        view! {
            <button class="btn btn-sm" on:click=move |_| open_detail(&viewing)>"View"</button>
            <button class="btn btn-sm btn-danger" on:click=move |_| page.delete(client.get_value(), id.clone())>
                "Delete"
            </button>
        }
        .into_view()
    });

    view! {
        <section class="page">
            <header class="page-header">
                <h2>"Orders"</h2>
            </header>
            <AlertBanner alert=page.alert />
            <DataTable rows=page.rows columns=columns actions=actions loading=page.loading page_size=page_size />
            <Show when=move || page.editing.with(Editing::is_open)>
                <Modal title="Order details" on_close=move |_| page.close()>
                    {move || page.current().map(|order| view! { <OrderDetail order=order /> })}
                    <form on:submit=submit>
                        <SelectField label="Status" value=status options=Signal::derive(status_options) />
                        <TextArea label="Note" value=note />
                        <button type="submit" class="btn btn-primary" disabled=move || page.saving.get()>
                            {move || if page.saving.get() { "Updating..." } else { "Update status" }}
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
    fn status_endpoint_is_below_the_order() {
        assert_eq!(status_endpoint("o1"), "orders/o1/status");
    }

    #[test]
    fn delivered_order_can_go_back_to_confirmed() {
        let update = status_update("Confirmed", "customer asked to reship").unwrap();
        assert_eq!(update.status, OrderStatus::Confirmed);
        assert!(status_update("Lost", "").is_err());
    }

    #[test]
    fn every_status_is_offered() {
        assert_eq!(status_options().len(), OrderStatus::ALL.len());
    }
}
