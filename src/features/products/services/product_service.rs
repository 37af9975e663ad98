use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::error::{AppError, Result};
use crate::features::products::dtos::{ListProductsQuery, ProductListResponseDto, ProductStatsDto};
use crate::features::products::models::{NewProduct, Product, ProductChanges, ProductTotals};

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, image_url, \
                               is_available, tax_rate, created_at, updated_at";

const DUPLICATE_NAME: &str = "Product with this name already exists";

/// Convert database error to more specific AppError with user-friendly messages
fn handle_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        // Unique constraint violation: a concurrent insert won the name
        if db_err.code().as_deref() == Some("23505") {
            return AppError::Conflict(DUPLICATE_NAME.to_string());
        }

        // Check constraint violation (price / tax rate bounds)
        if db_err.code().as_deref() == Some("23514") {
            return AppError::Validation(format!(
                "Value rejected by constraint {}",
                db_err.constraint().unwrap_or("unknown")
            ));
        }
    }

    tracing::error!("Product query failed: {:?}", e);
    AppError::Database(e)
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Product with id {} not found", id))
}

/// Escape LIKE wildcards so the search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Append the WHERE clause shared by the list and count queries
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ListProductsQuery) {
    qb.push(" WHERE TRUE");

    if query.available_only {
        qb.push(" AND is_available = TRUE");
    }

    if let Some(category) = query.category_filter() {
        qb.push(" AND category = ").push_bind(category.to_string());
    }

    if let Some(search) = query.search_term() {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR description ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// UPDATE touching only the columns present in `changes`
fn build_update(id: i64, changes: ProductChanges) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET ");
    let mut set = qb.separated(", ");
    set.push("updated_at = NOW()");

    if let Some(name) = changes.name {
        set.push("name = ").push_bind_unseparated(name);
    }
    if let Some(description) = changes.description {
        set.push("description = ").push_bind_unseparated(description);
    }
    if let Some(price) = changes.price {
        set.push("price = ").push_bind_unseparated(price);
    }
    if let Some(category) = changes.category {
        set.push("category = ").push_bind_unseparated(category);
    }
    if let Some(image_url) = changes.image_url {
        set.push("image_url = ").push_bind_unseparated(image_url);
    }
    if let Some(is_available) = changes.is_available {
        set.push("is_available = ").push_bind_unseparated(is_available);
    }
    if let Some(tax_rate) = changes.tax_rate {
        set.push("tax_rate = ").push_bind_unseparated(tax_rate);
    }

    qb.push(" WHERE id = ")
        .push_bind(id)
        .push(format!(" RETURNING {}", PRODUCT_COLUMNS));
    qb
}

/// Service for product catalog operations
pub struct ProductService {
    pool: PgPool,
}

impl ProductService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List products matching the filters, one page at a time
    pub async fn list(&self, query: &ListProductsQuery) -> Result<ProductListResponseDto> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)?;

        let mut page_qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM products",
            PRODUCT_COLUMNS
        ));
        push_filters(&mut page_qb, query);
        page_qb
            .push(" ORDER BY id LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.skip);

        let products: Vec<Product> = page_qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(handle_db_error)?;

        Ok(ProductListResponseDto::new(
            products,
            total,
            query.skip,
            query.limit,
        ))
    }

    async fn find(&self, id: i64) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(handle_db_error)
    }

    /// Get product by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Product> {
        self.find(id).await?.ok_or_else(|| not_found(id))
    }

    /// Whether `name` is held by a product other than `except_id`
    async fn name_taken(&self, name: &str, except_id: Option<i64>) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await
        .map_err(handle_db_error)
    }

    /// Create a new product; names are unique
    pub async fn create(&self, new_product: NewProduct) -> Result<Product> {
        if self.name_taken(&new_product.name, None).await? {
            return Err(AppError::Conflict(DUPLICATE_NAME.to_string()));
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, description, price, category, image_url, is_available, tax_rate)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&new_product.name)
        .bind(&new_product.description)
        .bind(new_product.price)
        .bind(&new_product.category)
        .bind(&new_product.image_url)
        .bind(new_product.is_available)
        .bind(new_product.tax_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(handle_db_error)?;

        tracing::info!(product_id = product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Apply a partial update. Renaming onto another product's name is a conflict.
    pub async fn update(&self, id: i64, changes: ProductChanges) -> Result<Product> {
        let current = self.get_by_id(id).await?;

        if changes.is_empty() {
            return Ok(current);
        }

        if let Some(ref name) = changes.name {
            if *name != current.name && self.name_taken(name, Some(id)).await? {
                return Err(AppError::Conflict(DUPLICATE_NAME.to_string()));
            }
        }

        let mut qb = build_update(id, changes);
        let updated = qb
            .build_query_as::<Product>()
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(product_id = id, "Product updated");
        Ok(updated)
    }

    /// Permanently delete a product
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(handle_db_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        tracing::info!(product_id = id, "Product deleted");
        Ok(())
    }

    /// Distinct non-empty categories across all products
    pub async fn list_categories(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM products WHERE category <> '' ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(handle_db_error)
    }

    /// Counts and price aggregates over the whole catalog
    pub async fn stats(&self) -> Result<ProductStatsDto> {
        let totals = sqlx::query_as::<_, ProductTotals>(
            r#"
            SELECT COUNT(*) AS total_products,
                   COUNT(*) FILTER (WHERE is_available) AS available_products,
                   COALESCE(SUM(price), 0)::DOUBLE PRECISION AS total_value,
                   COALESCE(AVG(price), 0)::DOUBLE PRECISION AS average_price
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(handle_db_error)?;

        let categories = self.list_categories().await?;

        Ok(ProductStatsDto::new(totals, categories))
    }

    /// Set availability to exactly `is_available`
    pub async fn set_availability(&self, id: i64, is_available: bool) -> Result<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET is_available = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(is_available)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(handle_db_error)?
        .ok_or_else(|| not_found(id))?;

        tracing::info!(product_id = id, is_available, "Product availability set");
        Ok(product)
    }
}


/// Tests against a real database; run with `DATABASE_URL` set and `--ignored`
#[cfg(test)]
mod db_tests {
    use super::*;

    fn new_product(name: &str, category: &str, price: f64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            price,
            category: category.to_string(),
            image_url: None,
            is_available: true,
            tax_rate: 18.0,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_create_assigns_id_and_timestamps(pool: PgPool) {
        let service = ProductService::new(pool);

        let product = service
            .create(new_product("Widget", "Tools", 10.5))
            .await
            .unwrap();

        assert!(product.id > 0);
        assert_eq!(product.name, "Widget");
        assert!(product.is_available);
        assert_eq!(product.tax_rate, 18.0);
        assert!(product.created_at <= product.updated_at);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_create_duplicate_name_conflicts(pool: PgPool) {
        let service = ProductService::new(pool);

        service
            .create(new_product("Widget", "Tools", 10.0))
            .await
            .unwrap();
        let second = service.create(new_product("Widget", "Other", 3.0)).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_update_rename_rules(pool: PgPool) {
        let service = ProductService::new(pool);
        let widget = service
            .create(new_product("Widget", "Tools", 10.0))
            .await
            .unwrap();
        let gadget = service
            .create(new_product("Gadget", "Tools", 20.0))
            .await
            .unwrap();

        let taken = service
            .update(
                gadget.id,
                ProductChanges {
                    name: Some("Widget".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(taken, Err(AppError::Conflict(_))));

        let same = service
            .update(
                widget.id,
                ProductChanges {
                    name: Some("Widget".to_string()),
                    price: Some(11.0),
                    description: Some(Some("Updated".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.name, "Widget");
        assert_eq!(same.price, 11.0);
        assert_eq!(same.description.as_deref(), Some("Updated"));
        assert_eq!(same.category, "Tools");
        assert!(same.updated_at >= widget.updated_at);
        assert_eq!(same.created_at, widget.created_at);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_price_update_keeps_newer_availability(pool: PgPool) {
        let service = ProductService::new(pool);
        let mut original = new_product("Widget", "Tools", 10.0);
        original.description = Some("Sturdy".to_string());
        let product = service.create(original).await.unwrap();

        service.set_availability(product.id, false).await.unwrap();

        let updated = service
            .update(
                product.id,
                ProductChanges {
                    price: Some(5.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 5.0);
        assert!(!updated.is_available);
        assert_eq!(updated.description.as_deref(), Some("Sturdy"));

        let stored = service.get_by_id(product.id).await.unwrap();
        assert!(!stored.is_available);
        assert_eq!(stored.price, 5.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_unknown_id_not_found(pool: PgPool) {
        let service = ProductService::new(pool);

        assert!(matches!(
            service.get_by_id(999).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.update(999, ProductChanges::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(999).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.set_availability(999, true).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_delete_is_permanent(pool: PgPool) {
        let service = ProductService::new(pool);
        let product = service
            .create(new_product("Widget", "Tools", 10.0))
            .await
            .unwrap();

        service.delete(product.id).await.unwrap();

        assert!(matches!(
            service.get_by_id(product.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(product.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_list_paginates_in_insertion_order(pool: PgPool) {
        let service = ProductService::new(pool);
        let mut ids = Vec::new();
        for i in 1..=25 {
            let product = service
                .create(new_product(&format!("Product {:02}", i), "General", i as f64))
                .await
                .unwrap();
            ids.push(product.id);
        }

        let query = ListProductsQuery {
            limit: 10,
            ..Default::default()
        };
        let page = service.list(&query).await.unwrap();

        let page_ids: Vec<i64> = page.products.iter().map(|p| p.id).collect();
        assert_eq!(page_ids, ids[..10].to_vec());
        assert_eq!(page.total, 25);
        assert_eq!(page.page, 1);
        assert_eq!(page.size, 10);
        assert_eq!(page.pages, 3);

        let query = ListProductsQuery {
            skip: 20,
            limit: 10,
            ..Default::default()
        };
        let last = service.list(&query).await.unwrap();
        assert_eq!(last.products.len(), 5);
        assert_eq!(last.page, 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_list_filters(pool: PgPool) {
        let service = ProductService::new(pool);
        let mut phone = new_product("Handset X", "Electronics", 300.0);
        phone.description = Some("Smart Phone with 5G".to_string());
        service.create(phone).await.unwrap();
        service
            .create(new_product("Kettle", "Kitchen", 25.0))
            .await
            .unwrap();
        let hidden = service
            .create(new_product("Old Phone", "Electronics", 50.0))
            .await
            .unwrap();
        service.set_availability(hidden.id, false).await.unwrap();

        let search = ListProductsQuery {
            search: Some("phone".to_string()),
            ..Default::default()
        };
        let found = service.list(&search).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.products[0].name, "Handset X");

        let everything = ListProductsQuery {
            search: Some("phone".to_string()),
            available_only: false,
            ..Default::default()
        };
        assert_eq!(service.list(&everything).await.unwrap().total, 2);

        let kitchen = ListProductsQuery {
            category: Some("Kitchen".to_string()),
            ..Default::default()
        };
        let found = service.list(&kitchen).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.products[0].name, "Kettle");

        let wildcard = ListProductsQuery {
            search: Some("%".to_string()),
            available_only: false,
            ..Default::default()
        };
        assert_eq!(service.list(&wildcard).await.unwrap().total, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_set_availability_is_not_a_toggle(pool: PgPool) {
        let service = ProductService::new(pool);
        let product = service
            .create(new_product("Widget", "Tools", 10.0))
            .await
            .unwrap();

        let still_available = service.set_availability(product.id, true).await.unwrap();
        assert!(still_available.is_available);

        let unavailable = service.set_availability(product.id, false).await.unwrap();
        assert!(!unavailable.is_available);
        assert!(unavailable.updated_at >= product.updated_at);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_stats_empty_catalog(pool: PgPool) {
        let service = ProductService::new(pool);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_products, 0);
        assert_eq!(stats.available_products, 0);
        assert_eq!(stats.unavailable_products, 0);
        assert!(stats.categories.is_empty());
        assert_eq!(stats.average_price, 0.0);
        assert_eq!(stats.total_value, 0.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_stats_and_categories_cover_all_products(pool: PgPool) {
        let service = ProductService::new(pool);
        service
            .create(new_product("A", "Tools", 10.0))
            .await
            .unwrap();
        service
            .create(new_product("B", "Tools", 20.0))
            .await
            .unwrap();
        let c = service
            .create(new_product("C", "Garden", 5.01))
            .await
            .unwrap();
        service.set_availability(c.id, false).await.unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.available_products, 2);
        assert_eq!(stats.unavailable_products, 1);
        assert_eq!(stats.total_value, 35.01);
        assert_eq!(stats.average_price, 11.67);
        assert_eq!(stats.categories, vec!["Garden", "Tools"]);

        let categories = service.list_categories().await.unwrap();
        assert_eq!(categories, vec!["Garden", "Tools"]);
    }
}
