//! HTTP handlers for Products API

use axum::{
    extract::{rejection::JsonRejection, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post, put, MethodRouter},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    require_auth, require_role, AppError, AuthUser, JwtAuth, UuidPath, ValidatedJson,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::error::ProductResult;
use crate::models::{CreateProduct, Product, ProductImage, UpdateProduct};
use crate::query::QueryParams;
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// Role allowed to create, update and delete products
pub const ADMIN_ROLE: &str = "admin";

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        delete_product,
        list_all_products,
    ),
    components(
        schemas(
            Product, ProductImage, CreateProduct, UpdateProduct,
            ProductListResponse, ProductResponse, AdminProductListResponse, MessageResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Products", description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// One page of the public listing
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<Product>,
    /// Products matching the filters, across all pages
    pub products_count: u64,
    /// Effective page size
    pub result_per_page: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub success: bool,
    pub product: Product,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminProductListResponse {
    pub success: bool,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

type SharedService<R> = Arc<ProductService<R>>;

/// Create the products router.
///
/// Reads are public; writes and the admin listing require an authenticated
/// caller with the `admin` role.
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>, auth: JwtAuth) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/products", get(list_products::<R>))
        .route(
            "/product/new",
            admin_only(post(create_product::<R>), &auth),
        )
        .route(
            "/product/{id}",
            get(get_product::<R>).merge(admin_only(
                put(update_product::<R>).delete(delete_product::<R>),
                &auth,
            )),
        )
        .route(
            "/admin/products",
            admin_only(get(list_all_products::<R>), &auth),
        )
        .with_state(shared_service)
}

fn admin_only<S>(route: MethodRouter<S>, auth: &JwtAuth) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_role(ADMIN_ROLE, req, next)
        }))
        .route_layer(middleware::from_fn_with_state(auth.clone(), require_auth))
}

/// List products with search, filters and pagination
///
/// Any query key other than `keyword`, `page` and `limit` filters on the
/// product field of that name; `field[gt|gte|lt|lte]=value` filters by range.
#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    params(
        ("keyword" = Option<String>, Query, description = "Case-insensitive substring of the product name"),
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("category" = Option<String>, Query, description = "Exact category"),
        ("price[gte]" = Option<f64>, Query, description = "Minimum price"),
        ("price[lte]" = Option<f64>, Query, description = "Maximum price"),
    ),
    responses(
        (status = 200, description = "One page of products", body = ProductListResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ProductResult<Json<ProductListResponse>> {
    let page = service.list_products(&QueryParams::from_pairs(pairs)).await?;

    Ok(Json(ProductListResponse {
        success: true,
        products: page.products,
        products_count: page.total,
        result_per_page: page.page_size,
    }))
}

/// Create a new product owned by the caller
#[utoipa::path(
    post,
    path = "/product/new",
    tag = "Products",
    request_body = CreateProduct,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Product created successfully", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create_product(input, user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            product,
        }),
    ))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/product/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<ProductResponse>> {
    let product = service.get_product(id).await?;
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// Update a product
///
/// Only the supplied fields change. Updating a product that does not exist
/// answers 500 with "Product not found". A body that is not valid JSON is
/// rejected with 400 before the product is looked up, whatever the id.
#[utoipa::path(
    put,
    path = "/product/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product updated successfully", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    UuidPath(id): UuidPath,
    payload: Result<Json<UpdateProduct>, JsonRejection>,
) -> Result<Json<ProductResponse>, AppError> {
    let Json(input) = payload?;
    let product = service.update_product(id, input).await?;
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/product/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product deleted successfully", body = MessageResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<MessageResponse>> {
    service.delete_product(id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Product Delete Successfully".to_string(),
    }))
}

/// List every product, unpaginated
#[utoipa::path(
    get,
    path = "/admin/products",
    tag = "Products",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All products", body = AdminProductListResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_all_products<R: ProductRepository>(
    State(service): State<SharedService<R>>,
) -> ProductResult<Json<AdminProductListResponse>> {
    let products = service.list_all_products().await?;
    Ok(Json(AdminProductListResponse {
        success: true,
        products,
    }))
}
