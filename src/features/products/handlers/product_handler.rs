use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::products::dtos::{
    AvailabilityQuery, CreateProductDto, ListProductsQuery, ProductListResponseDto,
    ProductResponseDto, ProductStatsDto, UpdateProductDto,
};
use crate::features::products::models::{NewProduct, ProductChanges};
use crate::features::products::services::ProductService;

/// List products with optional filtering and pagination
#[utoipa::path(
    get,
    path = "/products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Page of products", body = ProductListResponseDto),
        (status = 400, description = "Invalid pagination or filter parameters")
    ),
    tag = "products"
)]
pub async fn list_products(
    State(service): State<Arc<ProductService>>,
    AppQuery(query): AppQuery<ListProductsQuery>,
) -> Result<Json<ProductListResponseDto>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let page = service.list(&query).await?;
    Ok(Json(page))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponseDto),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn get_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponseDto>> {
    let product = service.get_by_id(id).await?;
    Ok(Json(product.into()))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductDto,
    responses(
        (status = 201, description = "Product created", body = ProductResponseDto),
        (status = 400, description = "Validation error or name already taken")
    ),
    tag = "products"
)]
pub async fn create_product(
    State(service): State<Arc<ProductService>>,
    AppJson(dto): AppJson<CreateProductDto>,
) -> Result<(StatusCode, Json<ProductResponseDto>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let product = service.create(NewProduct::try_from(dto)?).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Update an existing product (only provided fields change)
#[utoipa::path(
    put,
    path = "/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = UpdateProductDto,
    responses(
        (status = 200, description = "Product updated", body = ProductResponseDto),
        (status = 400, description = "Validation error or name already taken"),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn update_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateProductDto>,
) -> Result<Json<ProductResponseDto>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let product = service.update(id, ProductChanges::try_from(dto)?).await?;
    Ok(Json(product.into()))
}

/// Delete a product permanently
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List all distinct product categories
#[utoipa::path(
    get,
    path = "/products/categories/list",
    responses(
        (status = 200, description = "Distinct categories", body = Vec<String>)
    ),
    tag = "products"
)]
pub async fn list_categories(
    State(service): State<Arc<ProductService>>,
) -> Result<Json<Vec<String>>> {
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

/// Catalog statistics overview
#[utoipa::path(
    get,
    path = "/products/stats/overview",
    responses(
        (status = 200, description = "Aggregate statistics over all products", body = ProductStatsDto)
    ),
    tag = "products"
)]
pub async fn get_stats(
    State(service): State<Arc<ProductService>>,
) -> Result<Json<ProductStatsDto>> {
    let stats = service.stats().await?;
    Ok(Json(stats))
}

/// Set product availability to the given value
#[utoipa::path(
    patch,
    path = "/products/{id}/availability",
    params(
        ("id" = i64, Path, description = "Product ID"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Availability updated", body = ProductResponseDto),
        (status = 400, description = "Missing or invalid is_available parameter"),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn set_availability(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i64>,
    AppQuery(query): AppQuery<AvailabilityQuery>,
) -> Result<Json<ProductResponseDto>> {
    let product = service.set_availability(id, query.is_available).await?;
    Ok(Json(product.into()))
}
