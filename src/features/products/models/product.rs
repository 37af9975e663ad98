use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for product
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub tax_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated, normalized values for a row about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub tax_rate: f64,
}

/// Validated, normalized partial update.
///
/// `None` leaves a field untouched. For the nullable columns the inner
/// `Option` is the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub image_url: Option<Option<String>>,
    pub is_available: Option<bool>,
    pub tax_rate: Option<f64>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Aggregate row behind the stats overview
#[derive(Debug, Clone, FromRow)]
pub struct ProductTotals {
    pub total_products: i64,
    pub available_products: i64,
    pub total_value: f64,
    pub average_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_changes_are_empty() {
        assert!(ProductChanges::default().is_empty());
    }

    #[test]
    fn test_any_provided_field_is_a_change() {
        let price_only = ProductChanges {
            price: Some(12.5),
            ..Default::default()
        };
        assert!(!price_only.is_empty());

        let clear_description = ProductChanges {
            description: Some(None),
            ..Default::default()
        };
        assert!(!clear_description.is_empty());
    }
}
