use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{not_blank, EntityRef, Resource, Validate};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    #[serde(default)]
    pub product: Option<EntityRef>,
    pub author_name: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Star string shown in the reviews table, e.g. `★★★☆☆`.
    pub fn stars(&self) -> String {
        let filled = self.rating.clamp(0, MAX_RATING) as usize;
        let mut stars = "★".repeat(filled);
        stars.push_str(&"☆".repeat(MAX_RATING as usize - filled));
        stars
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct ReviewInput {
    #[validate(custom(function = "not_blank", message = "Product is required"))]
    pub product_id: String,
    #[validate(custom(function = "not_blank", message = "Author name is required"))]
    pub author_name: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

impl Default for ReviewInput {
    fn default() -> Self {
        Self {
            product_id: String::new(),
            author_name: String::new(),
            rating: MAX_RATING,
            comment: String::new(),
        }
    }
}

impl Resource for Review {
    const ENDPOINT: &'static str = "reviews";
    const LABEL: &'static str = "review";
    type Input = ReviewInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_input(&self) -> ReviewInput {
        ReviewInput {
            product_id: self.product_id.clone(),
            author_name: self.author_name.clone(),
            rating: self.rating,
            comment: self.comment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_outside_one_to_five_is_rejected() {
        let mut input = ReviewInput {
            product_id: "p1".into(),
            author_name: "Sam".into(),
            ..Default::default()
        };
        for rating in 1..=5 {
            input.rating = rating;
            assert!(input.validate().is_ok(), "rating {rating}");
        }
        input.rating = 0;
        assert!(input.validate().is_err());
        input.rating = 6;
        assert!(input.validate().is_err());
    }
}
