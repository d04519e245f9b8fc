use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{not_blank, Resource, Validate};

/// One product line inside a gift box.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, Validate)]
pub struct GiftBoxItem {
    #[validate(custom(function = "not_blank", message = "Every gift box item needs a product"))]
    pub product_id: String,
    #[validate(range(min = 1, message = "Gift box item quantity must be at least 1"))]
    pub quantity: i64,
    /// Filled in by the backend from the products table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GiftBox {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub contents: Vec<GiftBoxItem>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct GiftBoxInput {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub contents: Vec<GiftBoxItem>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Default for GiftBoxInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: 0.0,
            stock: 0,
            images: Vec::new(),
            contents: Vec::new(),
            active: true,
        }
    }
}

impl Resource for GiftBox {
    const ENDPOINT: &'static str = "gift-boxes";
    const LABEL: &'static str = "gift box";
    type Input = GiftBoxInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_input(&self) -> GiftBoxInput {
        GiftBoxInput {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            stock: self.stock,
            images: self.images.clone(),
            contents: self
                .contents
                .iter()
                .map(|item| GiftBoxItem {
                    product_name: None,
                    ..item.clone()
                })
                .collect(),
            active: self.active,
        }
    }
}
