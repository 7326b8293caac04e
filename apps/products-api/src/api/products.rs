//! Products API routes

use axum::Router;
use axum_helpers::JwtAuth;
use domain_products::{handlers, MongoProductRepository, ProductService};

use crate::state::AppState;

/// Create products router backed by MongoDB
pub fn router(state: &AppState) -> Router {
    let repository = MongoProductRepository::new(&state.db);
    let service = ProductService::with_pagination(repository, state.config.pagination);
    handlers::router(service, JwtAuth::new(&state.config.jwt))
}

/// Initialize products indexes
pub async fn init_indexes(state: &AppState) -> eyre::Result<()> {
    let repository = MongoProductRepository::new(&state.db);
    repository.init_indexes().await?;
    Ok(())
}
