use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{not_blank, Resource, Validate};

/// Fulfilment label of an order.
///
/// Any label may replace any other; there is no transition graph, so an
/// order can go from `Delivered` back to `Confirmed`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// CSS class of the badge shown in the orders table.
    pub fn badge_class(self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "badge badge-info",
            OrderStatus::Processing => "badge badge-warning",
            OrderStatus::Shipped => "badge badge-primary",
            OrderStatus::Delivered => "badge badge-success",
            OrderStatus::Cancelled => "badge badge-danger",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown order status: {s}"))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, Validate)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    #[validate(range(min = 1, message = "Item quantity must be at least 1"))]
    pub quantity: i64,
    #[validate(range(min = 0.0, message = "Item price must not be negative"))]
    pub unit_price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, Validate)]
pub struct ShippingAddress {
    #[validate(custom(function = "not_blank", message = "Recipient name is required"))]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[validate(custom(function = "not_blank", message = "Address is required"))]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[validate(custom(function = "not_blank", message = "City is required"))]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[validate(custom(function = "not_blank", message = "Country is required"))]
    pub country: String,
}

impl ShippingAddress {
    /// Single-line form used in the orders table.
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2);
        }
        parts.push(self.city.as_str());
        if !self.postal_code.is_empty() {
            parts.push(self.postal_code.as_str());
        }
        parts.push(self.country.as_str());
        parts.join(", ")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub shipping_fee: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub status_note: Option<String>,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /orders`. Totals are never taken from the client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, Validate)]
pub struct OrderInput {
    #[validate(custom(function = "not_blank", message = "Customer is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "An order needs at least one item"))]
    #[validate(nested)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Shipping fee must not be negative"))]
    pub shipping_fee: f64,
    #[validate(nested)]
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// Body of `PUT /orders/{id}/status`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
}

impl StatusUpdate {
    /// Blank notes are dropped rather than stored as empty strings.
    pub fn normalized_note(&self) -> Option<String> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

/// Returns `(subtotal, total)` for a set of order lines.
pub fn order_totals(items: &[OrderItem], shipping_fee: f64) -> (f64, f64) {
    let subtotal: f64 = items.iter().map(OrderItem::line_total).sum();
    (subtotal, subtotal + shipping_fee)
}

impl Resource for Order {
    const ENDPOINT: &'static str = "orders";
    const LABEL: &'static str = "order";
    type Input = OrderInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_input(&self) -> OrderInput {
        OrderInput {
            user_id: self.user_id.clone(),
            items: self.items.clone(),
            shipping_fee: self.shipping_fee,
            shipping_address: self.shipping_address.clone(),
            status: Some(self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::check;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Lina Haddad".into(),
            line1: "12 Spice Market".into(),
            city: "Marseille".into(),
            country: "France".into(),
            ..Default::default()
        }
    }

    #[test]
    fn order_needs_items_with_positive_quantity() {
        let mut input = OrderInput {
            user_id: "u1".into(),
            shipping_address: address(),
            ..Default::default()
        };
        assert_eq!(
            check(&input),
            Err(vec!["An order needs at least one item".to_string()])
        );

        input.items.push(OrderItem {
            product_id: "p1".into(),
            name: "Cumin".into(),
            quantity: 0,
            unit_price: 2.0,
        });
        input.shipping_address.city = " ".into();
        assert_eq!(
            check(&input),
            Err(vec![
                "City is required".to_string(),
                "Item quantity must be at least 1".to_string()
            ])
        );

        input.items[0].quantity = 3;
        input.shipping_address.city = "Marseille".into();
        assert_eq!(check(&input), Ok(()));
    }

    #[test]
    fn status_labels_round_trip_through_from_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.label().parse::<OrderStatus>(), Ok(status));
        }
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert!("Returned".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_plain_label() {
        let json = serde_json::to_string(&OrderStatus::Delivered).unwrap();
        assert_eq!(json, "\"Delivered\"");
    }

    #[test]
    fn totals_include_shipping() {
        let items = vec![
            OrderItem {
                product_id: "p1".into(),
                name: "Cardamom".into(),
                quantity: 2,
                unit_price: 4.5,
            },
            OrderItem {
                product_id: "p2".into(),
                name: "Cloves".into(),
                quantity: 1,
                unit_price: 3.0,
            },
        ];
        assert_eq!(order_totals(&items, 5.0), (12.0, 17.0));
    }

    #[test]
    fn blank_note_is_dropped() {
        let update = StatusUpdate {
            status: OrderStatus::Shipped,
            note: Some("   ".into()),
        };
        assert_eq!(update.normalized_note(), None);
    }
}
