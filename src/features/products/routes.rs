use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::features::products::handlers;
use crate::features::products::services::ProductService;

/// Create routes for the products feature
pub fn routes(service: Arc<ProductService>) -> Router {
    Router::new()
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/products/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/products/categories/list", get(handlers::list_categories))
        .route("/products/stats/overview", get(handlers::get_stats))
        .route(
            "/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(
            "/products/{id}/availability",
            patch(handlers::set_availability),
        )
        .with_state(service)
}
