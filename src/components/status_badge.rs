use leptos::*;

use crate::models::order::OrderStatus;

#[component]
pub fn StatusBadge(status: OrderStatus) -> impl IntoView {
    view! { <span class=status.badge_class()>{status.label()}</span> }
}

#[component]
pub fn ActiveBadge(active: bool) -> impl IntoView {
    let (class, label) = if active {
        ("badge badge-success", "Active")
    } else {
        ("badge badge-secondary", "Inactive")
    };
    view! { <span class=class>{label}</span> }
}
