use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Upper bound on price (the catalog caps prices at eight digits)
pub const MAX_PRICE: f64 = 99_999_999.0;

/// Upper bound on stock (four digits)
pub const MAX_STOCK: i32 = 9_999;

/// Stored fields holding numbers. Filter values on these are compared
/// numerically; every other field compares as a string.
pub const NUMERIC_FIELDS: [&str; 4] = ["price", "rating", "stock", "num_of_reviews"];

pub fn is_numeric_field(field: &str) -> bool {
    NUMERIC_FIELDS.contains(&field)
}

/// Numeric value of a raw filter value on a numeric field
pub fn numeric_value(field: &str, raw: &str) -> Option<f64> {
    if !is_numeric_field(field) {
        return None;
    }
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Uuids are persisted as hyphenated strings, whatever the serializer's
/// human-readable flag says, so store filters built from `Uuid::to_string`
/// match stored documents.
mod uuid_as_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&id.hyphenated())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Product image, referenced by its public id in the media store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    /// Identifier of the image in the external media store
    pub public_id: String,
    /// Public URL of the image
    pub url: String,
}

/// Product entity - represents a product stored in MongoDB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id", with = "uuid_as_string")]
    pub id: Uuid,
    /// Product name
    pub name: String,
    /// Product description
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Average review rating (0 to 5)
    #[serde(default)]
    pub rating: f64,
    /// Product images
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Free-form category label
    pub category: String,
    /// Units in stock
    pub stock: i32,
    /// Number of reviews behind `rating`
    #[serde(default)]
    pub num_of_reviews: i32,
    /// Owning user (the admin who created the product)
    #[serde(with = "uuid_as_string")]
    pub user: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new product
///
/// Server-assigned fields (id, owner, timestamps) are not accepted here.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(length(min = 1, message = "Please Enter product Description"))]
    pub description: String,
    #[validate(range(min = 0.0, max = 99_999_999.0, message = "Price cannot exceed 8 characters"))]
    pub price: f64,
    #[validate(range(min = 0.0, max = 5.0))]
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[validate(length(min = 1, message = "Please Enter Product Category"))]
    pub category: String,
    #[validate(range(min = 0, max = 9_999, message = "Stock cannot exceed 4 characters"))]
    #[serde(default = "default_stock")]
    pub stock: i32,
}

/// DTO for updating an existing product
///
/// Only the supplied fields are overwritten.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Please Enter product Description"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, max = 99_999_999.0, message = "Price cannot exceed 8 characters"))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    pub images: Option<Vec<ProductImage>>,
    #[validate(length(min = 1, message = "Please Enter Product Category"))]
    pub category: Option<String>,
    #[validate(range(min = 0, max = 9_999, message = "Stock cannot exceed 4 characters"))]
    pub stock: Option<i32>,
    #[validate(range(min = 0))]
    pub num_of_reviews: Option<i32>,
}

/// A page of the public listing
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Documents matching the predicates, regardless of the page window
    pub total: u64,
    /// Effective page size used for this page
    pub page_size: u64,
}

fn default_stock() -> i32 {
    1
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("required").with_message("Please Enter product Name".into()));
    }
    if trimmed.chars().count() > 200 {
        return Err(ValidationError::new("length")
            .with_message("Name cannot exceed 200 characters".into()));
    }
    Ok(())
}

impl Product {
    /// Create a new product owned by `user`
    pub fn new(input: CreateProduct, user: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            rating: input.rating,
            images: input.images,
            category: input.category,
            stock: input.stock,
            num_of_reviews: 0,
            user,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply updates from UpdateProduct DTO
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(rating) = update.rating {
            self.rating = rating;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(num_of_reviews) = update.num_of_reviews {
            self.num_of_reviews = num_of_reviews;
        }
        self.updated_at = Utc::now();
    }
}
