use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{CreateProduct, Product, UpdateProduct};
use crate::query::{Predicate, QueryDescriptor};

/// Repository trait for Product persistence
///
/// Listing goes through a [`QueryDescriptor`], so implementations only need
/// to know how to evaluate [`Predicate`]s against their storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persist a new product owned by `owner`
    async fn create(&self, input: CreateProduct, owner: Uuid) -> ProductResult<Product>;

    /// Get a product by ID
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Products matching the descriptor's predicates within its page window,
    /// oldest first
    async fn find(&self, query: &QueryDescriptor) -> ProductResult<Vec<Product>>;

    /// Count products matching all predicates, ignoring pagination
    async fn count(&self, predicates: &[Predicate]) -> ProductResult<u64>;

    /// Every product, oldest first
    async fn list_all(&self) -> ProductResult<Vec<Product>>;

    /// Update an existing product. `None` when no product has this ID.
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Option<Product>>;

    /// Delete a product by ID. `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> ProductResult<bool>;
}
