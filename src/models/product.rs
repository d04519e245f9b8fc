use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{not_blank, parse_amount, parse_count, EntityRef, Resource, Validate};

/// A purchasable variation of a product, e.g. a size or a pack.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, Validate)]
pub struct Variant {
    #[validate(custom(function = "not_blank", message = "Variant name is required"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "Variant price must not be negative"))]
    pub price: f64,
    #[serde(default)]
    #[validate(range(min = 0, message = "Variant stock must not be negative"))]
    pub stock: i64,
}

impl Variant {
    /// Builds a variant from the raw text of the variant editor row.
    pub fn from_form(name: &str, price: &str, stock: &str) -> Result<Self, String> {
        let variant = Variant {
            name: name.trim().to_string(),
            price: parse_amount("Variant price", price)?,
            stock: if stock.trim().is_empty() {
                0
            } else {
                parse_count("Variant stock", stock)?
            },
        };
        if variant.name.is_empty() {
            return Err("Variant name is required".to_string());
        }
        Ok(variant)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category: Option<EntityRef>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct ProductInput {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: i64,
    #[serde(default)]
    #[validate(nested)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Default for ProductInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: 0.0,
            stock: 0,
            variants: Vec::new(),
            images: Vec::new(),
            category_id: None,
            active: true,
        }
    }
}

impl Resource for Product {
    const ENDPOINT: &'static str = "products";
    const LABEL: &'static str = "product";
    type Input = ProductInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_input(&self) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            stock: self.stock,
            variants: self.variants.clone(),
            images: self.images.clone(),
            category_id: self.category_id.clone(),
            active: self.active,
        }
    }
}
