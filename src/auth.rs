use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::ApiError, messages, repository::RepositoryState};

/// Lifetime of a token issued by the login handler.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Claims
///
/// The payload signed into every bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Primary key of the user the token was issued to.
    pub id: i64,
    /// Issued At (seconds since the epoch).
    pub iat: usize,
    /// Expiration Time (seconds since the epoch). Checked on every request.
    pub exp: usize,
}

/// issue_token
///
/// Signs a token for `user_id` that expires `TOKEN_TTL_DAYS` from now.
pub fn issue_token(user_id: i64, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        id: user_id,
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// decode_token
///
/// Verifies signature and expiry and returns the claims. A payload without a
/// numeric `id` fails here too, so callers have a single invalid-token path.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

/// AuthUser
///
/// The identity resolved from a bearer token. Only the public projection of
/// the user is ever loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// AuthUser Extractor Implementation
///
/// 1. No `Authorization` header, or an empty one: 401 `No Autorizado`.
/// 2. The token is the second space-separated segment; the scheme word itself
///    is not checked.
/// 3. Any verification failure (bad signature, expired, malformed, no `id`)
///    or an `id` with no matching user: 500 `Token No Valido`.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::Unauthorized(messages::UNAUTHORIZED))?;

        let token = bearer
            .to_str()
            .ok()
            .and_then(|value| value.split(' ').nth(1))
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ApiError::internal(messages::INVALID_TOKEN, "authorization header carries no token")
            })?;

        let claims = decode_token(token, &config.jwt_secret)
            .map_err(|e| ApiError::internal(messages::INVALID_TOKEN, e))?;

        // Reject tokens whose user has since disappeared.
        let user = repo
            .find_user_profile(claims.id)
            .await
            .map_err(|e| ApiError::internal(messages::INVALID_TOKEN, e))?
            .ok_or_else(|| {
                ApiError::internal(
                    messages::INVALID_TOKEN,
                    format!("token references unknown user {}", claims.id),
                )
            })?;

        Ok(AuthUser {
            id: user.id,
            name: user.name,
            email: user.email,
        })
    }
}

/// auth_middleware
///
/// Route layer for protected operations. Resolves the `AuthUser` (rejecting
/// the request through the extractor on failure) and stores it in the request
/// extensions for the handler.
pub async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    tracing::debug!(user_id = auth_user.id, "request authenticated");
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}
