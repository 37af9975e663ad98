use utoipa::{Modify, OpenApi};

use crate::features::products::{dtos as products_dtos, handlers as products_handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        products_handlers::list_products,
        products_handlers::get_product,
        products_handlers::create_product,
        products_handlers::update_product,
        products_handlers::delete_product,
        products_handlers::list_categories,
        products_handlers::get_stats,
        products_handlers::set_availability,
    ),
    components(
        schemas(
            products_dtos::CreateProductDto,
            products_dtos::UpdateProductDto,
            products_dtos::ProductResponseDto,
            products_dtos::ProductListResponseDto,
            products_dtos::ProductStatsDto,
        )
    ),
    tags(
        (name = "products", description = "Product catalog management"),
    ),
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Product catalog management API",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
