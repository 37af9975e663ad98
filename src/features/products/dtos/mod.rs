pub mod product_dto;

pub use product_dto::{
    AvailabilityQuery, CreateProductDto, ListProductsQuery, ProductListResponseDto,
    ProductResponseDto, ProductStatsDto, UpdateProductDto,
};
