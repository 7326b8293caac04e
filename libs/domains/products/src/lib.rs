//! Products Domain
//!
//! Product catalog over MongoDB, with a listing endpoint whose query string is
//! translated into a storage-agnostic query description.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, admin gating
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business logic, validation
//! └──────┬──────┘
//!        │           ┌─────────────┐
//!        ├──────────►│    Query    │  ← query string → predicates + page
//!        │           └─────────────┘
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB and in-memory implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_products::{handlers, mongodb::MongoProductRepository, service::ProductService};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("shop");
//!
//! let repository = MongoProductRepository::new(&db);
//! let service = ProductService::new(repository);
//! let auth = JwtAuth::new(&JwtConfig::new("my-super-secret-key-that-is-at-least-32-chars"));
//!
//! let router = handlers::router(service, auth);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod query;
pub mod repository;
pub mod service;

pub use error::{ProductError, ProductResult};
pub use handlers::{ApiDoc, ADMIN_ROLE};
pub use memory::InMemoryProductRepository;
pub use models::{CreateProduct, Product, ProductImage, ProductPage, UpdateProduct};
pub use mongodb::MongoProductRepository;
pub use query::{
    translate, translate_with, Bound, ComparisonOp, Page, PaginationPolicy, ParamValue, Predicate,
    QueryDescriptor, QueryParams,
};
pub use repository::ProductRepository;
pub use service::ProductService;
