//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductPage, UpdateProduct};
use crate::query::{translate_with, PaginationPolicy, QueryParams};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// The service layer handles validation, turns listing parameters into a
/// query descriptor, and orchestrates repository operations.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    pagination: PaginationPolicy,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the default pagination policy
    pub fn new(repository: R) -> Self {
        Self::with_pagination(repository, PaginationPolicy::default())
    }

    pub fn with_pagination(repository: R, pagination: PaginationPolicy) -> Self {
        Self {
            repository: Arc::new(repository),
            pagination,
        }
    }

    pub fn pagination(&self) -> PaginationPolicy {
        self.pagination
    }

    /// Create a new product owned by `owner`
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create_product(&self, input: CreateProduct, owner: Uuid) -> ProductResult<Product> {
        input.validate()?;

        self.repository.create(input, owner).await
    }

    /// One page of products matching the query parameters, with the total
    /// number of matches
    #[instrument(skip(self, params))]
    pub async fn list_products(&self, params: &QueryParams) -> ProductResult<ProductPage> {
        let query = translate_with(params, &self.pagination);

        let products = self.repository.find(&query).await?;
        let total = self.repository.count(query.predicates()).await?;

        tracing::debug!(
            returned = products.len(),
            total,
            page = query.page().number(),
            "Listed products"
        );

        Ok(ProductPage {
            products,
            total,
            page_size: query.page().size(),
        })
    }

    /// Every product, unfiltered and unpaginated
    #[instrument(skip(self))]
    pub async fn list_all_products(&self) -> ProductResult<Vec<Product>> {
        self.repository.list_all().await
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Update a product. A missing product is reported before the input is
    /// validated.
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        if self.repository.get_by_id(id).await?.is_none() {
            return Err(ProductError::UpdateTargetMissing(id));
        }

        input.validate()?;

        self.repository
            .update(id, input)
            .await?
            .ok_or(ProductError::UpdateTargetMissing(id))
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<()> {
        let product = self.get_product(id).await?;

        // Image files stay in the media store; only the record is removed.
        if !product.images.is_empty() {
            tracing::debug!(
                product_id = %id,
                images = product.images.len(),
                "Deleting product with images"
            );
        }

        if !self.repository.delete(id).await? {
            return Err(ProductError::NotFound(id));
        }
        Ok(())
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProductRepository;
    use mockall::predicate::eq;

    fn sample_input() -> CreateProduct {
        CreateProduct {
            name: "Camera".to_string(),
            description: "Mirrorless".to_string(),
            price: 650.0,
            rating: 0.0,
            images: vec![],
            category: "Cameras".to_string(),
            stock: 2,
        }
    }

    fn sample_product() -> Product {
        Product::new(sample_input(), Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_create_product_rejects_invalid_input() {
        let mut repo = MockProductRepository::new();
        repo.expect_create().never();

        let service = ProductService::new(repo);
        let input = CreateProduct {
            price: -1.0,
            ..sample_input()
        };

        let result = service.create_product(input, Uuid::new_v4()).await;
        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_product_passes_owner() {
        let owner = Uuid::new_v4();
        let mut repo = MockProductRepository::new();
        repo.expect_create()
            .withf(move |_, o| *o == owner)
            .times(1)
            .returning(|input, owner| Ok(Product::new(input, owner)));

        let service = ProductService::new(repo);
        let product = service.create_product(sample_input(), owner).await.unwrap();

        assert_eq!(product.user, owner);
    }

    #[tokio::test]
    async fn test_list_products_uses_policy_and_counts_matches() {
        let mut repo = MockProductRepository::new();
        repo.expect_find()
            .withf(|query| query.page().skip() == 10 && query.page().limit() == 10)
            .times(1)
            .returning(|_| Ok(vec![sample_product()]));
        repo.expect_count()
            .withf(|predicates| predicates.len() == 1 && predicates[0].field() == "category")
            .times(1)
            .returning(|_| Ok(11));

        let service = ProductService::with_pagination(repo, PaginationPolicy::new(10, 50));
        let params = QueryParams::from_pairs([("category", "Cameras"), ("page", "2")]);

        let page = service.list_products(&params).await.unwrap();
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.total, 11);
        assert_eq!(page.page_size, 10);
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));

        let service = ProductService::new(repo);
        let result = service.get_product(Uuid::new_v4()).await;

        assert!(matches!(result, Err(ProductError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_missing_product_reports_update_target_missing() {
        let id = Uuid::new_v4();
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id()
            .with(eq(id))
            .returning(|_| Ok(None));
        repo.expect_update().never();

        let service = ProductService::new(repo);
        let result = service.update_product(id, UpdateProduct::default()).await;

        assert!(matches!(result, Err(ProductError::UpdateTargetMissing(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_update_validates_after_existence_check() {
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id()
            .returning(|_| Ok(Some(sample_product())));
        repo.expect_update().never();

        let service = ProductService::new(repo);
        let input = UpdateProduct {
            stock: Some(crate::models::MAX_STOCK + 1),
            ..Default::default()
        };

        let result = service.update_product(Uuid::new_v4(), input).await;
        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_product_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));
        repo.expect_delete().never();

        let service = ProductService::new(repo);
        let result = service.delete_product(Uuid::new_v4()).await;

        assert!(matches!(result, Err(ProductError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_existing_product() {
        let product = sample_product();
        let id = product.id;
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(product.clone())));
        repo.expect_delete().with(eq(id)).times(1).returning(|_| Ok(true));

        let service = ProductService::new(repo);
        assert!(service.delete_product(id).await.is_ok());
    }
}
