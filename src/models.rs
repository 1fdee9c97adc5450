use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::FieldError;

// --- Core Application Schemas (Mapped to Database) ---

/// Product
///
/// A row of the `products` table and the canonical JSON shape of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Product {
    #[schema(example = 2)]
    pub id: i64,
    #[schema(example = "Mouse Gamer")]
    pub name: String,
    #[schema(example = 350.5)]
    pub price: f64,
    // Whether the product can currently be ordered. New products start available.
    #[schema(example = true)]
    pub availability: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// User
///
/// A row of the `users` table. `password` holds the Argon2 PHC hash and is
/// never serialized, so a `User` can not leak it into a response body.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// UserProfile
///
/// The public projection of a user: what registration returns and what the
/// auth layer resolves a token to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    #[schema(example = "Tu Nombre")]
    pub name: String,
    #[schema(example = "correo@correo.com")]
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// NewUser
///
/// Insert payload for the repository. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// --- Request Payloads (Input Schemas) ---
//
// These are deserialized from a body that already passed the route's
// validation rules, so they accept the same loose shapes the rules accept
// (e.g. `"120.5"` for a price, `"true"` for availability).

/// CreateProductRequest
///
/// Input payload for POST /api/productos.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateProductRequest {
    #[serde(deserialize_with = "lenient::string")]
    #[schema(example = "Teclado Mecánico")]
    pub name: String,
    #[serde(deserialize_with = "lenient::number")]
    #[schema(example = 120.75)]
    pub price: f64,
    /// Defaults to `true` when omitted.
    #[serde(default, deserialize_with = "lenient::optional_boolean")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<bool>,
}

/// UpdateProductRequest
///
/// Full replacement payload for PUT /api/productos/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateProductRequest {
    #[serde(deserialize_with = "lenient::string")]
    #[schema(example = "Teclado Mecánico")]
    pub name: String,
    #[serde(deserialize_with = "lenient::number")]
    #[schema(example = 120.75)]
    pub price: f64,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schema(example = true)]
    pub availability: bool,
}

/// RegisterUserRequest
///
/// Input payload for POST /api/productos/auth/register.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    #[serde(deserialize_with = "lenient::string")]
    #[schema(example = "Tu Nombre")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    #[schema(example = "correo@correo.com")]
    pub email: String,
    #[serde(deserialize_with = "lenient::string")]
    #[schema(example = "password123")]
    pub password: String,
}

/// LoginRequest
///
/// Input payload for POST /api/productos/auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(deserialize_with = "lenient::string")]
    #[schema(example = "correo@correo.com")]
    pub email: String,
    #[serde(deserialize_with = "lenient::string")]
    #[schema(example = "password123")]
    pub password: String,
}

// --- Response Envelopes (Output Schemas) ---

/// ProductResponse
///
/// Envelope for every operation that answers with a single product
/// (lookup, creation, replacement and the availability toggle).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProductResponse {
    pub data: Product,
}

/// ProductListResponse
///
/// Envelope for the listing, newest product first. An empty inventory is an
/// empty `data` array, never a 404.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProductListResponse {
    pub data: Vec<Product>,
}

/// Envelope for operations that answer with a plain confirmation string.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    #[schema(example = "Producto eliminado")]
    pub data: String,
}

/// ErrorResponse
///
/// Body of every single-message failure: 401, 404, 409, 413 and 500.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    #[schema(example = "Producto no encontrado")]
    pub error: String,
}

/// ValidationErrorResponse
///
/// Body of a 400. Lists every failed rule of the route, in the order the
/// rules were declared.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ValidationErrorResponse {
    pub errors: Vec<FieldError>,
}

/// Loose deserializers for validated request bodies.
mod lenient {
    use serde::{Deserialize, Deserializer, de::Error};
    use serde_json::Value;

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(text),
            Value::Number(number) => Ok(number.to_string()),
            Value::Bool(flag) => Ok(flag.to_string()),
            other => Err(D::Error::custom(format!("expected a string, found {other}"))),
        }
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let parsed = match &value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|number| number.is_finite())
            .ok_or_else(|| D::Error::custom(format!("expected a number, found {value}")))
    }

    pub fn boolean<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        as_boolean(&value)
            .ok_or_else(|| D::Error::custom(format!("expected a boolean, found {value}")))
    }

    pub fn optional_boolean<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => as_boolean(&value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected a boolean, found {value}"))),
        }
    }

    fn as_boolean(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => match text.as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Value::Number(number) => match number.as_f64() {
                Some(n) if n == 1.0 => Some(true),
                Some(n) if n == 0.0 => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}
