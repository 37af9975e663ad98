/// Default number of products returned by the list endpoint
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Tax rate (percent) applied when a product is created without one
pub const DEFAULT_TAX_RATE: f64 = 18.0;

// =============================================================================
// FIELD LIMITS
// =============================================================================

pub const PRODUCT_IMAGE_URL_MAX_LEN: usize = 500;
