use leptos::logging::{error, log};
use leptos::*;
use leptos_router::A;
use wasm_bindgen_futures::spawn_local;

use super::money;
use crate::client::ApiClient;
use crate::components::alert_banner::{Alert, AlertBanner};
use crate::components::status_badge::StatusBadge;
use crate::models::stats::DashboardStats;
use crate::session::SessionHandle;
use crate::utils::leptos_owner::set_if_alive;

/// Count cards in display order: label, link target, value.
pub fn count_cards(stats: &DashboardStats) -> Vec<(&'static str, &'static str, i64)> {
    vec![
        ("Orders", "/orders", stats.orders),
        ("Products", "/products", stats.products),
        ("Out of stock", "/products", stats.out_of_stock),
        ("Categories", "/categories", stats.categories),
        ("Gift boxes", "/gift-boxes", stats.gift_boxes),
        ("Reviews", "/reviews", stats.reviews),
        ("Users", "/users", stats.users),
    ]
}

#[component]
pub fn DashboardPage(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let stats = create_rw_signal(None::<DashboardStats>);
    let alert = create_rw_signal(None::<Alert>);

    create_effect(move |_| {
        let client = client.clone();
        spawn_local(async move {
            match client.get::<DashboardStats>("stats").await {
                Ok(loaded) => {
                    log!("[PAGE] Dashboard stats loaded: {} orders", loaded.orders);
                    set_if_alive(stats, Some(loaded), "dashboard");
                }
                Err(err) => {
                    error!("[PAGE] Dashboard stats failed: {}", err);
                    if err.is_unauthorized() {
                        session.logout();
                    }
                    set_if_alive(alert, Some(Alert::from(&err)), "dashboard");
                }
            }
        });
    });

    let greeting = move || {
        session
            .user()
            .map(|user| format!("Welcome back, {}", user.name))
            .unwrap_or_else(|| "Welcome".to_string())
    };

    let body = move || {
        let Some(stats) = stats.get() else {
            return view! { <p class="muted">"Loading..."</p> }.into_view();
        };
        let cards = count_cards(&stats)
            .into_iter()
            .map(|(label, href, value)| {
                view! {
                    <A href=href class="card">
                        <span class="card-label">{label}</span>
                        <strong>{value}</strong>
                    </A>
                }
            })
            .collect_view();
        let statuses = stats
            .orders_by_status
            .iter()
            .map(|entry| {
                view! {
                    <li>
                        <StatusBadge status=entry.status />
                        <span class="count">{entry.count}</span>
                    </li>
                }
            })
            .collect_view();
        view! {
            <div class="summary-cards">
                <div class="card card-highlight">
                    <span class="card-label">"Revenue"</span>
                    <strong>{money(stats.revenue)}</strong>
                </div>
                {cards}
            </div>
            <h3>"Orders by status"</h3>
            <ul class="status-list">{statuses}</ul>
        }
        .into_view()
    };

    view! {
        <section class="page">
            <header class="page-header">
                <h2>{greeting}</h2>
            </header>
            <AlertBanner alert=alert />
            {body}
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cards_link_to_their_pages() {
        let stats = DashboardStats {
            orders: 4,
            users: 2,
            ..Default::default()
        };
        let cards = count_cards(&stats);
        assert_eq!(cards[0], ("Orders", "/orders", 4));
        assert!(cards.contains(&("Users", "/users", 2)));
    }
}
