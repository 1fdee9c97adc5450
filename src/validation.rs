//! Declarative request validation.
//!
//! A [`RuleSet`] is an ordered list of `(field, check, message)` rules bound to
//! a route when the router is built. The [`validate_request`] middleware runs
//! every rule against the path parameters and JSON body, collects each failure
//! as a [`FieldError`] in declaration order, and either answers 400 with the
//! whole list or hands the request on with the parsed body attached. Handlers
//! read that body back through the [`ValidJson`] extractor.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use validator::ValidateEmail;

use crate::{
    error::{ApiError, FieldError, Location},
    messages,
};

/// Bodies above this size are rejected before any rule runs.
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Check
///
/// A predicate over a single field value.
#[derive(Clone, Copy)]
pub enum Check {
    IsInt,
    NotEmpty,
    IsNumeric,
    IsBoolean,
    IsEmail,
    MinLength(usize),
    Custom(fn(Option<&Value>) -> bool),
}

impl Check {
    /// passes
    ///
    /// Applies the predicate to one field value. `None` is an absent field.
    /// Every built-in check sees the value as text (absent and `null` become
    /// the empty string); `Custom` predicates receive the raw JSON value.
    pub fn passes(&self, value: Option<&Value>) -> bool {
        let text = as_text(value);
        match self {
            Check::IsInt => is_int(&text),
            Check::NotEmpty => !text.is_empty(),
            Check::IsNumeric => is_numeric(&text),
            Check::IsBoolean => matches!(text.as_str(), "true" | "false" | "1" | "0"),
            Check::IsEmail => text.validate_email(),
            Check::MinLength(min) => text.chars().count() >= *min,
            Check::Custom(predicate) => predicate(value),
        }
    }
}

/// Rule
///
/// One field-level predicate plus the message reported when it fails.
#[derive(Clone)]
pub struct Rule {
    pub field: &'static str,
    pub location: Location,
    pub check: Check,
    pub message: &'static str,
}

/// RuleSet
///
/// An ordered, cheaply clonable list of rules. Built with a cursor-style
/// builder: `param`/`body` select the field, and each check appended after it
/// applies to that field. Adding a check before selecting a field panics,
/// which surfaces at router construction.
///
/// ```
/// use inventory_api::validation::RuleSet;
///
/// let rules = RuleSet::new()
///     .param("id").is_int("ID no valido")
///     .body("name").not_empty("El nombre no puede ir vacío");
/// assert_eq!(rules.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Arc<[Rule]>,
    cursor: Option<(&'static str, Location)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a path parameter for the checks that follow.
    pub fn param(mut self, field: &'static str) -> Self {
        self.cursor = Some((field, Location::Params));
        self
    }

    /// Selects a top-level body field for the checks that follow.
    pub fn body(mut self, field: &'static str) -> Self {
        self.cursor = Some((field, Location::Body));
        self
    }

    /// Optionally signed digits that fit an `i64`.
    pub fn is_int(self, message: &'static str) -> Self {
        self.push(Check::IsInt, message)
    }

    /// Any non-empty text. An absent field is empty.
    pub fn not_empty(self, message: &'static str) -> Self {
        self.push(Check::NotEmpty, message)
    }

    /// A plain decimal such as `120`, `-2.5` or `.5`. No exponents.
    pub fn is_numeric(self, message: &'static str) -> Self {
        self.push(Check::IsNumeric, message)
    }

    /// One of `true`, `false`, `1` or `0`, as a JSON value or a string.
    pub fn is_boolean(self, message: &'static str) -> Self {
        self.push(Check::IsBoolean, message)
    }

    /// A syntactically valid e-mail address.
    pub fn is_email(self, message: &'static str) -> Self {
        self.push(Check::IsEmail, message)
    }

    /// At least `min` characters (not bytes).
    pub fn min_length(self, min: usize, message: &'static str) -> Self {
        self.push(Check::MinLength(min), message)
    }

    /// An arbitrary predicate over the raw JSON value.
    pub fn custom(self, predicate: fn(Option<&Value>) -> bool, message: &'static str) -> Self {
        self.push(Check::Custom(predicate), message)
    }

    /// Number of rules, counting each check on a field separately.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rules in declaration order, which is also the reporting order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    // Rule sets are built once at router construction, so rebuilding the
    // shared slice on every push is fine.
    fn push(mut self, check: Check, message: &'static str) -> Self {
        let Some((field, location)) = self.cursor else {
            panic!("RuleSet: call `param` or `body` before adding a check");
        };
        let mut rules = self.rules.to_vec();
        rules.push(Rule {
            field,
            location,
            check,
            message,
        });
        self.rules = rules.into();
        self
    }

    /// evaluate
    ///
    /// Runs every rule and returns the failures in declaration order. Every
    /// rule is evaluated; a failing check does not suppress later checks on the
    /// same field.
    pub fn evaluate(&self, params: &Map<String, Value>, body: &Value) -> Vec<FieldError> {
        self.rules
            .iter()
            .filter(|rule| {
                let value = match rule.location {
                    Location::Params => params.get(rule.field),
                    Location::Body => body.get(rule.field),
                };
                !rule.check.passes(value)
            })
            .map(|rule| FieldError::new(rule.field, rule.message, rule.location))
            .collect()
    }
}

/// ValidatedBody
///
/// The parsed JSON body of a request that passed validation, stored in the
/// request extensions.
#[derive(Clone, Debug)]
pub struct ValidatedBody(pub Arc<Value>);

/// validate_request
///
/// Middleware bound per route with `from_fn_with_state(rules, validate_request)`.
pub async fn validate_request(
    State(rules): State<RuleSet>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let params = path_params(&mut parts).await;

    // A read can only fail on the size limit or a dropped connection, and a
    // dropped connection never sees the response.
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("request body rejected: {:?}", e);
            return ApiError::PayloadTooLarge(messages::BODY_TOO_LARGE).into_response();
        }
    };

    let json = match parse_body(&parts.headers, &bytes) {
        Ok(json) => json,
        Err(e) => {
            tracing::debug!("request body is not valid JSON: {}", e);
            return body_error().into_response();
        }
    };

    let errors = rules.evaluate(&params, &json);
    if !errors.is_empty() {
        tracing::debug!(count = errors.len(), uri = %parts.uri, "request failed validation");
        return ApiError::Validation(errors).into_response();
    }

    parts.extensions.insert(ValidatedBody(Arc::new(json)));
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// ValidJson
///
/// Extracts the typed payload from a body that already passed the route's rules.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ValidatedBody(json) = parts.extensions.get::<ValidatedBody>().cloned().ok_or_else(|| {
            ApiError::internal(messages::GENERIC_ERROR, "route is missing its validation layer")
        })?;

        T::deserialize(json.as_ref())
            .map(ValidJson)
            .map_err(|e| {
                tracing::debug!("validated body does not fit the payload type: {}", e);
                body_error()
            })
    }
}

fn body_error() -> ApiError {
    ApiError::Validation(vec![FieldError::new(
        "body",
        messages::MALFORMED_BODY,
        Location::Body,
    )])
}

async fn path_params(parts: &mut Parts) -> Map<String, Value> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(raw) => raw
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect(),
        Err(_) => Map::new(),
    }
}

/// Non-JSON and empty bodies validate as `{}`.
fn parse_body(headers: &HeaderMap, bytes: &Bytes) -> Result<Value, serde_json::Error> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.contains("json"));

    if !is_json || bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
}

/// Renders a field value the way a form validator sees it.
fn as_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number_text(number),
        Some(other) => other.to_string(),
    }
}

/// Plain decimal form, never exponent notation: `1e20` renders as
/// `100000000000000000000`.
fn number_text(number: &serde_json::Number) -> String {
    if let Some(n) = number.as_i64() {
        n.to_string()
    } else if let Some(n) = number.as_u64() {
        n.to_string()
    } else {
        number.as_f64().map(|n| n.to_string()).unwrap_or_default()
    }
}

fn is_int(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) && text.parse::<i64>().is_ok()
}

/// `[+-]?([0-9]*\.)?[0-9]+`
fn is_numeric(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => ("", unsigned),
    };
    !fraction.is_empty()
        && integer.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

/// Custom predicate: the value is a finite number greater than zero.
/// Numeric strings too long to fit an `f64` fail here rather than later.
pub fn is_positive(value: Option<&Value>) -> bool {
    let positive = |n: f64| n.is_finite() && n > 0.0;
    match value {
        Some(Value::Number(number)) => number.as_f64().is_some_and(positive),
        Some(Value::String(text)) => text.trim().parse::<f64>().is_ok_and(positive),
        Some(Value::Bool(flag)) => *flag,
        _ => false,
    }
}

// --- Per-route rule sets ---

/// product_id
///
/// GET, PATCH and DELETE on `/{id}`: the id must be an integer.
pub fn product_id() -> RuleSet {
    RuleSet::new().param("id").is_int(messages::INVALID_ID)
}

/// create_product
///
/// POST `/`: a non-empty name and a numeric, non-empty, positive price. A bad
/// price reports every failing check, so a non-numeric value yields two errors.
pub fn create_product() -> RuleSet {
    RuleSet::new()
        .body("name")
        .not_empty(messages::PRODUCT_NAME_EMPTY)
        .body("price")
        .is_numeric(messages::PRICE_NOT_NUMERIC)
        .not_empty(messages::PRICE_EMPTY)
        .custom(is_positive, messages::PRICE_NOT_POSITIVE)
}

/// update_product
///
/// PUT `/{id}`: the id plus every field of a full replacement, availability
/// included.
pub fn update_product() -> RuleSet {
    RuleSet::new()
        .param("id")
        .is_int(messages::INVALID_ID)
        .body("name")
        .not_empty(messages::PRODUCT_NAME_EMPTY_UPDATE)
        .body("price")
        .is_numeric(messages::PRICE_NOT_NUMERIC)
        .not_empty(messages::PRICE_EMPTY)
        .custom(is_positive, messages::PRICE_NOT_POSITIVE)
        .body("availability")
        .is_boolean(messages::AVAILABILITY_INVALID)
}

/// Registration: name, a valid e-mail and a password of at least 8 characters.
pub fn register_user() -> RuleSet {
    RuleSet::new()
        .body("name")
        .not_empty(messages::USER_NAME_EMPTY)
        .body("email")
        .is_email(messages::EMAIL_INVALID)
        .body("password")
        .min_length(8, messages::PASSWORD_TOO_SHORT)
}

/// Login: both credentials present, the e-mail well formed.
pub fn login_user() -> RuleSet {
    RuleSet::new()
        .body("email")
        .is_email(messages::LOGIN_EMAIL_REQUIRED)
        .body("password")
        .not_empty(messages::LOGIN_PASSWORD_REQUIRED)
}
