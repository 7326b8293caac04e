//! API routes module

pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Versioned API routes, mounted by the router under `/api`
pub fn routes(state: &AppState) -> Router {
    versioned(products::router(state))
}

fn versioned(products: Router) -> Router {
    Router::new().nest("/v1", products)
}

/// Initialize database indexes
pub async fn init_indexes(state: &AppState) -> eyre::Result<()> {
    products::init_indexes(state).await
}
