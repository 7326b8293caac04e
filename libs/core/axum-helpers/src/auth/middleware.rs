use super::jwt::{AuthError, JwtAuth};
use crate::errors::{AppError, ErrorCode};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Cookie holding the session token
pub const TOKEN_COOKIE: &str = "token";

/// Authenticated caller, inserted into request extensions by [`require_auth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(login_required)
    }
}

fn login_required() -> AppError {
    AppError::Unauthorized(ErrorCode::Unauthorized.default_message().to_string())
}

/// Extract JWT from Authorization header or the `token` cookie
fn extract_token_from_request(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            headers
                .get_all(header::COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .flat_map(|cookies| cookies.split(';'))
                .find_map(|cookie| {
                    let (name, value) = cookie.trim().split_once('=')?;
                    (name == TOKEN_COOKIE && !value.is_empty()).then(|| value.to_string())
                })
        })
}

fn authenticate(auth: &JwtAuth, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
    let token = extract_token_from_request(headers).ok_or(AuthError::MissingToken)?;
    let claims = auth.verify_token(&token)?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidSubject(claims.sub))?;

    Ok(AuthUser {
        id,
        roles: claims.roles,
    })
}

/// JWT authentication middleware.
///
/// Rejects requests without a valid token with 401 and otherwise inserts
/// [`AuthUser`] into request extensions.
///
/// ```ignore
/// let protected = Router::new()
///     .route("/product/new", post(create))
///     .layer(axum::middleware::from_fn_with_state(auth, require_auth));
/// ```
pub async fn require_auth(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&auth, request.headers()).map_err(|e| {
        tracing::debug!("Authentication failed: {}", e);
        login_required()
    })?;

    tracing::debug!(user_id = %user.id, "Authenticated request");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Role check. Must run after [`require_auth`].
///
/// ```ignore
/// let admin = Router::new()
///     .route("/admin/products", get(list_all))
///     .layer(axum::middleware::from_fn(|req: Request, next: Next| require_role("admin", req, next)))
///     .layer(axum::middleware::from_fn_with_state(auth, require_auth));
/// ```
pub async fn require_role(
    role: &'static str,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(login_required)?;

    if !user.has_role(role) {
        let roles = if user.roles.is_empty() {
            "none".to_string()
        } else {
            user.roles.join(", ")
        };
        tracing::info!(user_id = %user.id, required = role, "Role check failed");
        return Err(AppError::Forbidden(format!(
            "Role: {} is not allowed to access this resource",
            roles
        )));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const SECRET: &str = "this-is-a-valid-secret-with-32-chars!";

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(SECRET))
    }

    fn app(auth: JwtAuth) -> Router {
        Router::new()
            .route(
                "/admin",
                get(|user: AuthUser| async move { user.id.to_string() }),
            )
            .layer(middleware::from_fn(|req: Request, next: Next| {
                require_role("admin", req, next)
            }))
            .layer(middleware::from_fn_with_state(auth, require_auth))
    }

    async fn send(auth: JwtAuth, request: HttpRequest<Body>) -> (StatusCode, String) {
        let response = app(auth).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let request = HttpRequest::get("/admin").body(Body::empty()).unwrap();
        let (status, body) = send(auth(), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Please Login to access this resource"));
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let request = HttpRequest::get("/admin")
            .header(header::AUTHORIZATION, "Bearer garbage")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(auth(), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let auth = auth();
        let token = auth.create_token(Uuid::now_v7(), &["user".to_string()]).unwrap();
        let request = HttpRequest::get("/admin")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(auth, request).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("Role: user is not allowed to access this resource"));
    }

    #[tokio::test]
    async fn test_admin_via_bearer_header() {
        let auth = auth();
        let user = Uuid::now_v7();
        let token = auth.create_token(user, &["admin".to_string()]).unwrap();
        let request = HttpRequest::get("/admin")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(auth, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user.to_string());
    }

    #[tokio::test]
    async fn test_admin_via_cookie() {
        let auth = auth();
        let token = auth.create_token(Uuid::now_v7(), &["admin".to_string()]).unwrap();
        let request = HttpRequest::get("/admin")
            .header(header::COOKIE, format!("theme=dark; token={}", token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(auth, request).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_user_extractor_without_middleware_is_unauthorized() {
        let app = Router::new().route("/me", get(|user: AuthUser| async move { user.id.to_string() }));
        let response = app
            .oneshot(HttpRequest::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());
        headers.insert(header::COOKIE, "token=from-cookie".parse().unwrap());

        assert_eq!(
            extract_token_from_request(&headers).as_deref(),
            Some("from-header")
        );
    }
}
