//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::{FindOptions, IndexOptions},
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{numeric_value, CreateProduct, Product, UpdateProduct};
use crate::query::{Page, Predicate, QueryDescriptor};
use crate::repository::ProductRepository;

pub const COLLECTION_NAME: &str = "products";

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COLLECTION_NAME)
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Initialize indexes for the listing filters and sort order
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(IndexOptions::builder().name("idx_name".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "category": 1, "_id": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_category_id".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "price": 1 })
                .options(IndexOptions::builder().name("idx_price".to_string()).build())
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// Overwrite a stored product. `false` when no document has its id.
    async fn replace(&self, product: &Product) -> ProductResult<bool> {
        let result = self
            .collection
            .replace_one(id_filter(product.id), product)
            .await?;
        Ok(result.matched_count > 0)
    }
}

fn id_filter(id: Uuid) -> Document {
    doc! { "_id": id.to_string() }
}

/// Ids are UUIDv7 strings, so their order is creation order
fn oldest_first() -> Document {
    doc! { "_id": 1 }
}

/// Skip and limit are sent as i64 on the wire
fn page_options(page: Page) -> FindOptions {
    FindOptions::builder()
        .skip(page.skip().min(i64::MAX as u64))
        .limit(i64::try_from(page.limit()).unwrap_or(i64::MAX))
        .sort(oldest_first())
        .build()
}

/// Build a MongoDB filter document from predicates.
///
/// Values on numeric fields are sent as numbers when they parse, every
/// other value as a string. Text needles are regex-escaped.
pub fn to_mongo_filter(predicates: &[Predicate]) -> Document {
    let clauses: Vec<(String, Bson)> = predicates.iter().map(clause).collect();

    let mut filter = Document::new();
    let mut collided = false;
    for (field, condition) in &clauses {
        if filter.contains_key(field) {
            collided = true;
            break;
        }
        filter.insert(field.clone(), condition.clone());
    }

    if !collided {
        return filter;
    }

    // Two predicates on one field: keep both through an explicit $and
    let all: Vec<Document> = clauses
        .into_iter()
        .map(|(field, condition)| {
            let mut single = Document::new();
            single.insert(field, condition);
            single
        })
        .collect();
    doc! { "$and": all }
}

fn clause(predicate: &Predicate) -> (String, Bson) {
    let condition = match predicate {
        Predicate::Eq { field, value } => coerce(field, value),
        Predicate::In { field, values } => {
            let values: Vec<Bson> = values.iter().map(|value| coerce(field, value)).collect();
            Bson::Document(doc! { "$in": values })
        }
        Predicate::Range { field, bounds } => {
            let mut range = Document::new();
            for bound in bounds {
                range.insert(format!("${}", bound.op.as_key()), coerce(field, &bound.value));
            }
            Bson::Document(range)
        }
        Predicate::Text { needle, .. } => Bson::Document(doc! {
            "$regex": regex::escape(needle),
            "$options": "i",
        }),
    };

    (predicate.field().to_string(), condition)
}

fn coerce(field: &str, raw: &str) -> Bson {
    match numeric_value(field, raw) {
        Some(number) => Bson::Double(number),
        None => Bson::String(raw.to_string()),
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    async fn create(&self, input: CreateProduct, owner: Uuid) -> ProductResult<Product> {
        let product = Product::new(input, owner);

        self.collection.insert_one(&product).await?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let product = self.collection.find_one(id_filter(id)).await?;
        Ok(product)
    }

    #[instrument(skip(self, query), fields(page = query.page().number(), size = query.page().size()))]
    async fn find(&self, query: &QueryDescriptor) -> ProductResult<Vec<Product>> {
        let filter = to_mongo_filter(query.predicates());
        let options = page_options(query.page());

        let cursor = self.collection.find(filter).with_options(options).await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self, predicates))]
    async fn count(&self, predicates: &[Predicate]) -> ProductResult<u64> {
        let count = self
            .collection
            .count_documents(to_mongo_filter(predicates))
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> ProductResult<Vec<Product>> {
        let options = FindOptions::builder().sort(oldest_first()).build();

        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Option<Product>> {
        let Some(mut product) = self.collection.find_one(id_filter(id)).await? else {
            return Ok(None);
        };

        product.apply_update(input);
        if !self.replace(&product).await? {
            // deleted after it was read
            return Ok(None);
        }

        tracing::info!(product_id = %id, "Product updated successfully");
        Ok(Some(product))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let result = self.collection.delete_one(id_filter(id)).await?;

        if result.deleted_count == 0 {
            return Ok(false);
        }

        tracing::info!(product_id = %id, "Product deleted successfully");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProduct;
    use crate::query::{Bound, ComparisonOp};
    use test_utils::{TestDataBuilder, TestMongo};
    use uuid::{NoContext, Timestamp};

    #[test]
    fn test_to_mongo_filter_empty() {
        assert!(to_mongo_filter(&[]).is_empty());
    }

    #[test]
    fn test_to_mongo_filter_equality_on_text_field() {
        let filter = to_mongo_filter(&[Predicate::Eq {
            field: "category".to_string(),
            value: "Laptop".to_string(),
        }]);

        assert_eq!(filter, doc! { "category": "Laptop" });
    }

    #[test]
    fn test_to_mongo_filter_coerces_numeric_fields() {
        let filter = to_mongo_filter(&[Predicate::Range {
            field: "price".to_string(),
            bounds: vec![
                Bound {
                    op: ComparisonOp::Gte,
                    value: "100".to_string(),
                },
                Bound {
                    op: ComparisonOp::Lt,
                    value: "499.5".to_string(),
                },
            ],
        }]);

        assert_eq!(filter, doc! { "price": { "$gte": 100.0, "$lt": 499.5 } });
    }

    #[test]
    fn test_to_mongo_filter_keeps_unparseable_number_as_string() {
        let filter = to_mongo_filter(&[Predicate::Eq {
            field: "stock".to_string(),
            value: "plenty".to_string(),
        }]);

        assert_eq!(filter, doc! { "stock": "plenty" });
    }

    #[test]
    fn test_to_mongo_filter_any_of() {
        let filter = to_mongo_filter(&[Predicate::In {
            field: "category".to_string(),
            values: vec!["Laptop".to_string(), "Camera".to_string()],
        }]);

        assert_eq!(filter, doc! { "category": { "$in": ["Laptop", "Camera"] } });
    }

    #[test]
    fn test_to_mongo_filter_escapes_search_needle() {
        let filter = to_mongo_filter(&[Predicate::Text {
            field: "name".to_string(),
            needle: "a.b*".to_string(),
        }]);

        assert_eq!(
            filter,
            doc! { "name": { "$regex": "a\\.b\\*", "$options": "i" } }
        );
    }

    #[test]
    fn test_to_mongo_filter_same_field_uses_and() {
        let filter = to_mongo_filter(&[
            Predicate::Text {
                field: "name".to_string(),
                needle: "phone".to_string(),
            },
            Predicate::Eq {
                field: "name".to_string(),
                value: "Phone X".to_string(),
            },
        ]);

        assert_eq!(
            filter,
            doc! { "$and": [
                { "name": { "$regex": "phone", "$options": "i" } },
                { "name": "Phone X" },
            ] }
        );
    }

    #[test]
    fn test_id_filter_uses_string_form() {
        let id = Uuid::now_v7();
        assert_eq!(id_filter(id), doc! { "_id": id.to_string() });
    }

    #[test]
    fn test_page_options_skip_and_limit() {
        let options = page_options(Page::new(3, 5));

        assert_eq!(options.skip, Some(10));
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.sort, Some(doc! { "_id": 1 }));
    }

    #[test]
    fn test_page_options_huge_page_still_serializes() {
        let options = page_options(Page::new(u64::MAX, 5));

        assert_eq!(options.skip, Some(i64::MAX as u64));
        let serialized = mongodb::bson::to_document(&options).unwrap();
        assert_eq!(serialized.get_i64("skip").unwrap(), i64::MAX);
    }

    #[test]
    fn test_id_string_order_follows_creation_time() {
        let earlier = Uuid::new_v7(Timestamp::from_unix(NoContext, 1_700_000_005, 123_000_000));
        let later = Uuid::new_v7(Timestamp::from_unix(NoContext, 1_700_000_005, 124_000_000));
        let next_second = Uuid::new_v7(Timestamp::from_unix(NoContext, 1_700_000_006, 0));

        assert!(earlier.to_string() < later.to_string());
        assert!(later.to_string() < next_second.to_string());
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_replace_of_vanished_product_reports_no_match() {
        let mongo = TestMongo::new().await;
        let builder = TestDataBuilder::from_test_name("mongo_replace_vanished");
        let repo = MongoProductRepository::new(&mongo.database(&builder.database_name()));

        let product = repo
            .create(
                CreateProduct {
                    name: "Tablet".to_string(),
                    description: "Tablet description".to_string(),
                    price: 450.0,
                    rating: 0.0,
                    images: vec![],
                    category: "Computers".to_string(),
                    stock: 2,
                },
                builder.user_id(),
            )
            .await
            .unwrap();
        assert!(repo.replace(&product).await.unwrap());

        assert!(repo.delete(product.id).await.unwrap());
        assert!(!repo.replace(&product).await.unwrap());
    }
}
