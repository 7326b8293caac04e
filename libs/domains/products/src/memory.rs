//! In-memory implementation of ProductRepository
//!
//! Evaluates predicates with the same rules as the MongoDB adapter: numeric
//! fields compare as numbers, every other field as a string, a missing field
//! never matches. Used by tests and local tooling.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{is_numeric_field, numeric_value, CreateProduct, Product, UpdateProduct};
use crate::query::{ComparisonOp, Predicate, QueryDescriptor};
use crate::repository::ProductRepository;

/// Products held in insertion (oldest first) order
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository seeded with existing products
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }

    async fn matching(&self, predicates: &[Predicate]) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut matched = Vec::new();
        for product in products.iter() {
            if matches_all(product, predicates)? {
                matched.push(product.clone());
            }
        }
        Ok(matched)
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, input: CreateProduct, owner: Uuid) -> ProductResult<Product> {
        let product = Product::new(input, owner);
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn find(&self, query: &QueryDescriptor) -> ProductResult<Vec<Product>> {
        let page = query.page();
        let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);

        Ok(self
            .matching(query.predicates())
            .await?
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn count(&self, predicates: &[Predicate]) -> ProductResult<u64> {
        Ok(self.matching(predicates).await?.len() as u64)
    }

    async fn list_all(&self) -> ProductResult<Vec<Product>> {
        Ok(self.products.read().await.clone())
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Option<Product>> {
        let mut products = self.products.write().await;
        Ok(products.iter_mut().find(|p| p.id == id).map(|product| {
            product.apply_update(input);
            product.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }
}

fn matches_all(product: &Product, predicates: &[Predicate]) -> ProductResult<bool> {
    if predicates.is_empty() {
        return Ok(true);
    }

    let document = match serde_json::to_value(product) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(ProductError::Internal("product is not a document".to_string())),
        Err(e) => return Err(ProductError::Internal(e.to_string())),
    };

    Ok(predicates.iter().all(|predicate| matches(&document, predicate)))
}

fn matches(document: &Map<String, Value>, predicate: &Predicate) -> bool {
    let Some(actual) = document.get(predicate.field()) else {
        return false;
    };

    match predicate {
        Predicate::Eq { field, value } => compare(field, actual, value) == Some(Ordering::Equal),
        Predicate::In { field, values } => values
            .iter()
            .any(|value| compare(field, actual, value) == Some(Ordering::Equal)),
        Predicate::Range { field, bounds } => bounds.iter().all(|bound| {
            compare(field, actual, &bound.value).is_some_and(|ordering| satisfies(bound.op, ordering))
        }),
        Predicate::Text { needle, .. } => actual
            .as_str()
            .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
    }
}

/// Ordering of the stored value relative to the raw filter value
fn compare(field: &str, actual: &Value, raw: &str) -> Option<Ordering> {
    if is_numeric_field(field) {
        let expected = numeric_value(field, raw)?;
        actual.as_f64()?.partial_cmp(&expected)
    } else {
        Some(actual.as_str()?.cmp(raw))
    }
}

fn satisfies(op: ComparisonOp, ordering: Ordering) -> bool {
    match op {
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::Gte => ordering != Ordering::Less,
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::Lte => ordering != Ordering::Greater,
    }
}
