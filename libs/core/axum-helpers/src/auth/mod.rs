//! Access gate: stateless JWT authentication and role checks.
//!
//! ```ignore
//! use axum_helpers::auth::{JwtAuth, JwtConfig, require_auth, require_role};
//! use core_config::FromEnv;
//!
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//!
//! let admin = Router::new()
//!     .route("/admin/products", get(handler))
//!     .layer(axum::middleware::from_fn(|req: Request, next: Next| {
//!         require_role("admin", req, next)
//!     }))
//!     .layer(axum::middleware::from_fn_with_state(auth, require_auth));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use jwt::{AuthError, JwtAuth, JwtClaims};
pub use middleware::{AuthUser, TOKEN_COOKIE, require_auth, require_role};
