//! Normalization rules shared by create and update payloads.
//!
//! Length and range limits are declared on the DTOs with `validator`; the
//! checks here cover what a derive cannot express (blank strings, strictly
//! positive prices) and produce the stored form of each value.

use crate::core::error::{AppError, Result};
use crate::shared::constants::PRODUCT_IMAGE_URL_MAX_LEN;
use crate::shared::types::round2;

/// Trim a required text field, rejecting empty or whitespace-only input
pub fn required_text(label: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", label)));
    }
    Ok(trimmed.to_string())
}

pub fn name(value: &str) -> Result<String> {
    required_text("Product name", value)
}

pub fn category(value: &str) -> Result<String> {
    required_text("Product category", value)
}

pub fn image_url(value: String) -> Result<String> {
    if value.chars().count() > PRODUCT_IMAGE_URL_MAX_LEN {
        return Err(AppError::Validation(format!(
            "Image URL must be at most {} characters",
            PRODUCT_IMAGE_URL_MAX_LEN
        )));
    }
    Ok(value)
}

/// Price must be strictly positive, also after rounding to two decimals
pub fn price(value: f64) -> Result<f64> {
    let rounded = round2(value);
    if !rounded.is_finite() || rounded <= 0.0 {
        return Err(AppError::Validation(
            "Product price must be greater than 0".to_string(),
        ));
    }
    Ok(rounded)
}

/// Tax rate is a percentage in [0, 100]; stored with two decimals
pub fn tax_rate(value: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&value) {
        return Err(AppError::Validation(
            "Tax rate must be between 0 and 100".to_string(),
        ));
    }
    Ok(round2(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trimmed() {
        assert_eq!(name("  Widget \n").unwrap(), "Widget");
    }

    #[test]
    fn test_blank_name_rejected() {
        for input in ["", "   ", "\t\n"] {
            match name(input) {
                Err(AppError::Validation(msg)) => assert_eq!(msg, "Product name cannot be empty"),
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_blank_category_rejected() {
        assert!(matches!(category("  "), Err(AppError::Validation(_))));
        assert_eq!(category(" Phones ").unwrap(), "Phones");
    }

    #[test]
    fn test_image_url_length() {
        assert!(image_url("a".repeat(500)).is_ok());
        assert!(matches!(
            image_url("a".repeat(501)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_price_rules() {
        assert_eq!(price(19.999).unwrap(), 20.0);
        assert_eq!(price(0.014).unwrap(), 0.01);
        assert!(matches!(price(0.0), Err(AppError::Validation(_))));
        assert!(matches!(price(-5.0), Err(AppError::Validation(_))));
        assert!(matches!(price(0.004), Err(AppError::Validation(_))));
        assert!(matches!(price(f64::NAN), Err(AppError::Validation(_))));
        assert!(matches!(price(f64::INFINITY), Err(AppError::Validation(_))));
        // finite input whose cents overflow
        assert!(matches!(price(1e307), Err(AppError::Validation(_))));
        assert!(price(1e300).is_ok());
    }

    #[test]
    fn test_tax_rate_rules() {
        assert_eq!(tax_rate(0.0).unwrap(), 0.0);
        assert_eq!(tax_rate(100.0).unwrap(), 100.0);
        assert_eq!(tax_rate(18.456).unwrap(), 18.46);
        assert!(matches!(tax_rate(-0.01), Err(AppError::Validation(_))));
        assert!(matches!(tax_rate(100.5), Err(AppError::Validation(_))));
    }
}
