use serde::{Deserialize, Serialize};

use super::{not_blank, Resource, Validate};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub active: bool,
    /// Number of products currently filed under this category.
    #[serde(default)]
    pub product_count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct CategoryInput {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Default for CategoryInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            image: None,
            active: true,
        }
    }
}

impl Resource for Category {
    const ENDPOINT: &'static str = "categories";
    const LABEL: &'static str = "category";
    type Input = CategoryInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_input(&self) -> CategoryInput {
        CategoryInput {
            name: self.name.clone(),
            image: self.image.clone(),
            active: self.active,
        }
    }
}
