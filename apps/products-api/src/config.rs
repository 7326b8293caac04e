//! Configuration for Products API

use axum_helpers::JwtConfig;
use core_config::{app_info, env_parse, server::ServerConfig, AppInfo, ConfigError, FromEnv};
use database::mongodb::MongoConfig;
use domain_products::query::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE};
use domain_products::PaginationPolicy;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub pagination: PaginationPolicy,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let app = app_info!();

        Ok(Self {
            app,
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            mongodb: MongoConfig::from_env()?.with_app_name(app.name),
            jwt: JwtConfig::from_env()?,
            pagination: pagination_from_env()?,
        })
    }
}

/// `PRODUCTS_PAGE_SIZE` (default 5) and `PRODUCTS_MAX_PAGE_SIZE` (default 100)
fn pagination_from_env() -> Result<PaginationPolicy, ConfigError> {
    let default_page_size = env_parse("PRODUCTS_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
    let max_page_size = env_parse("PRODUCTS_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?;

    if default_page_size == 0 || max_page_size == 0 {
        return Err(ConfigError::ParseError {
            key: "PRODUCTS_PAGE_SIZE".to_string(),
            details: "page sizes must be positive".to_string(),
        });
    }
    if default_page_size > max_page_size {
        return Err(ConfigError::ParseError {
            key: "PRODUCTS_PAGE_SIZE".to_string(),
            details: format!("must not exceed PRODUCTS_MAX_PAGE_SIZE ({})", max_page_size),
        });
    }

    Ok(PaginationPolicy::new(default_page_size, max_page_size))
}
