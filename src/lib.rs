use axum::{
    Router,
    body::Body,
    extract::FromRef,
    http::{HeaderName, Request},
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod messages;
pub mod models;
pub mod password;
pub mod repository;
pub mod validation;

// Route tables, one module per resource.
pub mod routes;
use routes::{products, users};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// Every product and account route is mounted below this path.
pub const API_BASE: &str = "/api/productos";

/// Adds the bearer token scheme referenced by the protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Token returned by POST /api/productos/auth/login."))
                    .build(),
            ),
        );
    }
}

/// ApiDoc
///
/// The OpenAPI document, generated from the `#[utoipa::path]` annotations on
/// the handlers and served as JSON at `/api-docs/openapi.json`. The interactive
/// page lives at `/docs`.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "REST API Productos",
        description = "Product inventory CRUD with token-based authentication."
    ),
    paths(
        handlers::get_products, handlers::get_product_by_id, handlers::create_product,
        handlers::update_product, handlers::update_availability, handlers::delete_product,
        handlers::register_user, handlers::login
    ),
    components(
        schemas(
            models::Product, models::UserProfile, models::CreateProductRequest,
            models::UpdateProductRequest, models::RegisterUserRequest, models::LoginRequest,
            models::ProductResponse, models::ProductListResponse, models::MessageResponse,
            models::ErrorResponse, models::ValidationErrorResponse, error::FieldError,
            error::Location,
        )
    ),
    tags(
        (name = "Products", description = "Operaciones relacionadas con los productos"),
        (name = "Authentication", description = "Registro e inicio de sesión")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single container of shared services handed to every request: the
/// persistence layer and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors (notably `AuthUser`) pull single components out of AppState.

/// Hands the shared persistence layer to extractors that only need the
/// repository, such as `AuthUser` resolving a token to its user.
impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

/// Hands a copy of the configuration to extractors that need the signing
/// secret or environment without borrowing the whole state.
impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies global middleware and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS: a configured front-end origin is the only one allowed.
    let allow_origin = match &state.config.allowed_origin {
        Some(origin) => AllowOrigin::exact(origin.clone()),
        None => AllowOrigin::from(Any),
    };
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(allow_origin);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let api = products::product_routes(&state).merge(users::user_routes());

    let base_router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest(API_BASE, api)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` assigned by
/// `SetRequestIdLayer` so every log line of one request can be correlated.
fn trace_span_logger(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
