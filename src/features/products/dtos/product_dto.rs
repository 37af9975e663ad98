use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::products::models::{NewProduct, Product, ProductChanges, ProductTotals};
use crate::features::products::validation;
use crate::shared::constants::{DEFAULT_PAGE_LIMIT, DEFAULT_TAX_RATE};
use crate::shared::types::{double_option, flexible_bool, page_number, round2, total_pages};

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_tax_rate() -> f64 {
    DEFAULT_TAX_RATE
}

// Query params for listing products
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    /// Number of products to skip
    #[serde(default)]
    #[validate(range(min = 0, message = "skip must be greater than or equal to 0"))]
    #[param(minimum = 0)]
    pub skip: i64,

    /// Number of products to return
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    #[param(minimum = 1, maximum = 1000)]
    pub limit: i64,

    /// Filter by exact category
    pub category: Option<String>,

    /// Case-insensitive search in name and description
    pub search: Option<String>,

    /// Show only available products (default: true)
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub available_only: bool,
}

impl Default for ListProductsQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
            category: None,
            search: None,
            available_only: true,
        }
    }
}

impl ListProductsQuery {
    /// Category filter, ignoring an empty value
    pub fn category_filter(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    /// Search term, ignoring an empty value
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    /// New availability status
    #[serde(deserialize_with = "flexible_bool")]
    pub is_available: bool,
}

// Create request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductDto {
    #[validate(length(min = 1, max = 255, message = "Product name must be 1-255 characters"))]
    pub name: String,

    pub description: Option<String>,

    /// Price, must be greater than 0
    pub price: f64,

    #[validate(length(min = 1, max = 100, message = "Product category must be 1-100 characters"))]
    pub category: String,

    #[serde(alias = "image_url")]
    pub image_url: Option<String>,

    #[serde(default = "default_true", alias = "is_available")]
    pub is_available: bool,

    /// Tax rate as a percentage in [0, 100]
    #[serde(default = "default_tax_rate", alias = "tax_rate")]
    pub tax_rate: f64,
}

impl TryFrom<CreateProductDto> for NewProduct {
    type Error = AppError;

    fn try_from(dto: CreateProductDto) -> Result<Self> {
        Ok(Self {
            name: validation::name(&dto.name)?,
            description: dto.description,
            price: validation::price(dto.price)?,
            category: validation::category(&dto.category)?,
            image_url: dto.image_url.map(validation::image_url).transpose()?,
            is_available: dto.is_available,
            tax_rate: validation::tax_rate(dto.tax_rate)?,
        })
    }
}

// Update request. Omitted fields stay unchanged; `description` and
// `imageUrl` accept an explicit null.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductDto {
    #[validate(length(min = 1, max = 255, message = "Product name must be 1-255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    pub price: Option<f64>,

    #[validate(length(min = 1, max = 100, message = "Product category must be 1-100 characters"))]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "double_option", alias = "image_url")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,

    #[serde(alias = "is_available")]
    pub is_available: Option<bool>,

    #[serde(alias = "tax_rate")]
    pub tax_rate: Option<f64>,
}

impl TryFrom<UpdateProductDto> for ProductChanges {
    type Error = AppError;

    fn try_from(dto: UpdateProductDto) -> Result<Self> {
        Ok(Self {
            name: dto.name.as_deref().map(validation::name).transpose()?,
            description: dto.description,
            price: dto.price.map(validation::price).transpose()?,
            category: dto.category.as_deref().map(validation::category).transpose()?,
            image_url: dto
                .image_url
                .map(|url| url.map(validation::image_url).transpose())
                .transpose()?,
            is_available: dto.is_available,
            tax_rate: dto.tax_rate.map(validation::tax_rate).transpose()?,
        })
    }
}

// Response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponseDto {
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

impl From<Product> for ProductResponseDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            category: p.category,
            image_url: p.image_url,
            is_available: p.is_available,
            tax_rate: p.tax_rate,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// One page of products plus pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductListResponseDto {
    pub products: Vec<ProductResponseDto>,
    /// Matching products, ignoring pagination
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub pages: i64,
}

impl ProductListResponseDto {
    pub fn new(products: Vec<Product>, total: i64, skip: i64, limit: i64) -> Self {
        Self {
            products: products.into_iter().map(ProductResponseDto::from).collect(),
            total,
            page: page_number(skip, limit),
            size: limit,
            pages: total_pages(total, limit),
        }
    }
}

/// Catalog-wide statistics, computed over all products regardless of availability
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductStatsDto {
    pub total_products: i64,
    pub available_products: i64,
    pub unavailable_products: i64,
    pub categories: Vec<String>,
    pub average_price: f64,
    pub total_value: f64,
}

impl ProductStatsDto {
    pub fn new(totals: ProductTotals, categories: Vec<String>) -> Self {
        let (average_price, total_value) = if totals.total_products == 0 {
            (0.0, 0.0)
        } else {
            (round2(totals.average_price), round2(totals.total_value))
        };

        Self {
            total_products: totals.total_products,
            available_products: totals.available_products,
            unavailable_products: totals.total_products - totals.available_products,
            categories,
            average_price,
            total_value,
        }
    }
}
