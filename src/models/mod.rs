//! Records exchanged between the dashboard and the REST backend.
//!
//! Every type here is plain data. The server stores and validates them, the
//! browser renders and edits them, and both sides agree on the JSON shape
//! through serde.
pub mod category;
pub mod envelope;
pub mod gift_box;
pub mod order;
pub mod product;
pub mod review;
pub mod stats;
pub mod transaction;
pub mod user;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
pub use validator::Validate;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// A record the REST API exposes as a collection under `/api/{ENDPOINT}`.
pub trait Resource: Serialize + DeserializeOwned + Clone + 'static {
    /// Path segment below the API base, e.g. `gift-boxes`.
    const ENDPOINT: &'static str;
    /// Singular name used in logs, prompts and modal titles.
    const LABEL: &'static str;
    /// Body accepted by create and update.
    type Input: Serialize + DeserializeOwned + Clone + Default + Validate + 'static;

    fn id(&self) -> &str;

    /// Prefill for the edit form.
    fn to_input(&self) -> Self::Input;
}

/// Foreign record embedded by the backend, e.g. a product's category.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

/// Custom rule for required text: whitespace alone does not count.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Runs the derived validators and flattens any failures into the
/// messages carried by the `errors` array of a 422 response.
pub fn check<T: Validate>(value: &T) -> Result<(), Vec<String>> {
    value.validate().map_err(|errors| messages(&errors))
}

/// Messages of every failed rule, nested records included. Sorted so the
/// same record always reports the same list.
pub fn messages(errors: &ValidationErrors) -> Vec<String> {
    let mut out = Vec::new();
    collect_messages(errors, &mut out);
    out.sort();
    out.dedup();
    out
}

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|error| describe(field, error)))
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, out),
            ValidationErrorsKind::List(rows) => {
                for inner in rows.values() {
                    collect_messages(inner, out);
                }
            }
        }
    }
}

fn describe(field: &str, error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("{field} is invalid"),
    }
}

/// Parses a decimal typed into a form field. Accepts a comma as decimal separator.
pub fn parse_amount(field: &str, text: &str) -> Result<f64, String> {
    let normalized = text.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("{field} must be a number")),
    }
}

/// Parses a whole number typed into a form field.
pub fn parse_count(field: &str, text: &str) -> Result<i64, String> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| format!("{field} must be a whole number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Draft {
        #[validate(custom(function = "not_blank", message = "Name is required"))]
        name: String,
        #[validate(range(min = 0.0, message = "Price must not be negative"))]
        price: f64,
    }

    #[test]
    fn whitespace_name_counts_as_missing() {
        let draft = Draft {
            name: "   ".into(),
            price: -2.0,
        };
        assert_eq!(
            check(&draft),
            Err(vec![
                "Name is required".to_string(),
                "Price must not be negative".to_string()
            ])
        );
        let draft = Draft {
            name: "Saffron".into(),
            price: 0.0,
        };
        assert_eq!(check(&draft), Ok(()));
    }

    #[test]
    fn parse_amount_accepts_comma_separator() {
        assert_eq!(parse_amount("Price", " 12,50 "), Ok(12.5));
        assert_eq!(parse_amount("Price", "3"), Ok(3.0));
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert_eq!(
            parse_amount("Price", "abc"),
            Err("Price must be a number".to_string())
        );
        assert!(parse_amount("Price", "NaN").is_err());
    }

    #[test]
    fn parse_count_rejects_fractions() {
        assert_eq!(parse_count("Stock", "4"), Ok(4));
        assert!(parse_count("Stock", "4.5").is_err());
    }
}
