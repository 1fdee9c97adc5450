use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{ApiError, RepositoryError},
    messages,
    models::{
        CreateProductRequest, ErrorResponse, LoginRequest, MessageResponse, NewUser, Product,
        ProductListResponse, ProductResponse, RegisterUserRequest, UpdateProductRequest,
        UserProfile, ValidationErrorResponse,
    },
    password,
    repository::RepositoryState,
    validation::ValidJson,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

// --- Helpers ---

/// Loads a product or fails with the fixed 404 message.
async fn find_product_or_404(repo: &RepositoryState, id: i64) -> Result<Product, ApiError> {
    repo.find_product(id)
        .await?
        .ok_or(ApiError::NotFound(messages::PRODUCT_NOT_FOUND))
}

// --- Product Handlers ---

/// get_products
///
/// Lists every product, newest (highest id) first.
#[utoipa::path(
    get,
    path = "/api/productos",
    tag = "Products",
    responses(
        (status = 200, description = "All products", body = ProductListResponse)
    )
)]
pub async fn get_products(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state.repo.list_products().await?;
    Ok(Json(ProductListResponse { data: products }))
}

/// get_product_by_id
#[utoipa::path(
    get,
    path = "/api/productos/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Found", body = ProductResponse),
        (status = 400, description = "Invalid ID", body = ValidationErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_product_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = find_product_or_404(&state.repo, id).await?;
    Ok(Json(ProductResponse { data: product }))
}

/// create_product
///
/// [Authenticated Route] Persists a new product. Availability defaults to `true`.
#[utoipa::path(
    post,
    path = "/api/productos",
    tag = "Products",
    request_body = CreateProductRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created", body = ProductResponse),
        (status = 400, description = "Invalid data", body = ValidationErrorResponse),
        (status = 401, description = "No token", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse),
        (status = 500, description = "Invalid token", body = ErrorResponse)
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(payload): ValidJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state.repo.create_product(payload).await?;
    tracing::info!(product_id = product.id, user_id = user.id, "product created");
    Ok((StatusCode::CREATED, Json(ProductResponse { data: product })))
}

/// update_product
///
/// Full replacement of name, price and availability.
#[utoipa::path(
    put,
    path = "/api/productos/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated", body = ProductResponse),
        (status = 400, description = "Invalid data", body = ValidationErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse)
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let mut product = find_product_or_404(&state.repo, id).await?;
    product.name = payload.name;
    product.price = payload.price;
    product.availability = payload.availability;

    let saved = state.repo.save_product(&product).await?;
    Ok(Json(ProductResponse { data: saved }))
}

/// update_availability
///
/// Flips the availability flag. The request body is ignored.
#[utoipa::path(
    patch,
    path = "/api/productos/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Availability toggled", body = ProductResponse),
        (status = 400, description = "Invalid ID", body = ValidationErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_availability(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError> {
    let mut product = find_product_or_404(&state.repo, id).await?;
    product.availability = !product.availability;

    let saved = state.repo.save_product(&product).await?;
    Ok(Json(ProductResponse { data: saved }))
}

/// delete_product
#[utoipa::path(
    delete,
    path = "/api/productos/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Invalid ID", body = ValidationErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let product = find_product_or_404(&state.repo, id).await?;
    state.repo.delete_product(product.id).await?;
    Ok(Json(MessageResponse {
        data: messages::PRODUCT_DELETED.to_string(),
    }))
}

// --- User Handlers ---

/// register_user
///
/// Creates an account with an Argon2-hashed password. The response is the
/// public projection only; the password never leaves this handler.
#[utoipa::path(
    post,
    path = "/api/productos/auth/register",
    tag = "Authentication",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = UserProfile),
        (status = 400, description = "Invalid data", body = ValidationErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Unexpected failure", body = ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let failed = |e: &dyn std::fmt::Display| ApiError::internal(messages::REGISTRATION_FAILED, e);

    let existing = state
        .repo
        .find_user_by_email(&payload.email)
        .await
        .map_err(|e| failed(&e))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(messages::USER_ALREADY_REGISTERED));
    }

    let password_hash = password::hash_password(payload.password)
        .await
        .map_err(|e| failed(&e))?;

    let new_user = NewUser {
        name: payload.name,
        email: payload.email,
        password_hash,
    };

    let user = match state.repo.create_user(new_user).await {
        Ok(user) => user,
        // Lost a race with a concurrent registration for the same email.
        Err(RepositoryError::Conflict(_)) => {
            return Err(ApiError::Conflict(messages::USER_ALREADY_REGISTERED));
        }
        Err(e) => return Err(failed(&e)),
    };

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// login
///
/// Verifies the credentials and answers with the signed token itself as the
/// JSON body (a bare string, not an object).
#[utoipa::path(
    post,
    path = "/api/productos/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed bearer token", body = String),
        (status = 400, description = "Invalid data", body = ValidationErrorResponse),
        (status = 401, description = "Wrong password", body = ErrorResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse),
        (status = 500, description = "Unexpected failure", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<String>, ApiError> {
    let failed = |e: &dyn std::fmt::Display| ApiError::internal(messages::GENERIC_ERROR, e);

    let user = state
        .repo
        .find_user_by_email(&payload.email)
        .await
        .map_err(|e| failed(&e))?
        .ok_or(ApiError::NotFound(messages::USER_NOT_FOUND))?;

    let matches = password::verify_password(payload.password, user.password.clone())
        .await
        .map_err(|e| failed(&e))?;
    if !matches {
        return Err(ApiError::Unauthorized(messages::WRONG_PASSWORD));
    }

    let token = auth::issue_token(user.id, &state.config.jwt_secret).map_err(|e| failed(&e))?;
    tracing::info!(user_id = user.id, "token issued");
    Ok(Json(token))
}
