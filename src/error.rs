use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    messages,
    models::{ErrorResponse, ValidationErrorResponse},
};

/// Location
///
/// The part of the request a validation rule read its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Location {
    Params,
    Body,
}

/// FieldError
///
/// One failed validation rule. Responses carry these in rule declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    #[schema(example = "price")]
    pub field: String,
    #[schema(example = "Precio no valido")]
    pub message: String,
    pub location: Location,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, location: Location) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            location,
        }
    }
}

/// ApiError
///
/// Every failure a handler or middleware can surface to the client. The
/// `IntoResponse` impl owns the mapping to status codes and JSON bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed validation with {} error(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// The body exceeded the validation layer's read limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(&'static str),

    /// The client only ever sees `message`; `detail` goes to the log.
    #[error("{message}: {detail}")]
    Internal {
        message: &'static str,
        detail: String,
    },
}

impl ApiError {
    pub fn internal(message: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::Internal {
            message,
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(errors) => {
                (status, Json(ValidationErrorResponse { errors })).into_response()
            }
            ApiError::Unauthorized(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::PayloadTooLarge(message) => (
                status,
                Json(ErrorResponse {
                    error: message.to_string(),
                }),
            )
                .into_response(),
            ApiError::Internal { message, detail } => {
                tracing::error!(%detail, "{}", message);
                (
                    status,
                    Json(ErrorResponse {
                        error: message.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// RepositoryError
///
/// Failures raised by the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Any persistence failure that reaches a handler boundary is a generic 500.
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::internal(messages::GENERIC_ERROR, err)
    }
}
