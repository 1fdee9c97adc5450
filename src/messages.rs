//! Client-visible message strings.
//!
//! Every string a client can observe in a response body lives here so the
//! wording stays consistent across handlers, middleware and tests.

// --- Products ---
pub const INVALID_ID: &str = "ID no valido";
pub const PRODUCT_NOT_FOUND: &str = "Producto no encontrado";
pub const PRODUCT_DELETED: &str = "Producto eliminado";

pub const PRODUCT_NAME_EMPTY: &str = "El nombre del producto no puede ir vacío";
// The update route has always reported this spelling; clients match on it.
pub const PRODUCT_NAME_EMPTY_UPDATE: &str = "El nombme del producto no puede ir vacío";
pub const PRICE_NOT_NUMERIC: &str = "Valor no valido";
pub const PRICE_EMPTY: &str = "El precio del producto no puede ir vacío";
pub const PRICE_NOT_POSITIVE: &str = "Precio no valido";
pub const AVAILABILITY_INVALID: &str = "Valor para disponibilidad no valido";

// --- Users ---
pub const USER_NAME_EMPTY: &str = "El nombre no puede ir vacío";
pub const EMAIL_INVALID: &str = "E-mail no válido";
pub const PASSWORD_TOO_SHORT: &str = "El password debe ser de al menos 8 caracteres";
pub const LOGIN_EMAIL_REQUIRED: &str = "El email es obligatorio";
pub const LOGIN_PASSWORD_REQUIRED: &str = "El password es obligatorio";

pub const USER_ALREADY_REGISTERED: &str = "El usuario ya está registrado";
pub const REGISTRATION_FAILED: &str = "Hubo un error al crear la cuenta";
pub const USER_NOT_FOUND: &str = "El usuario no existe";
pub const WRONG_PASSWORD: &str = "Password incorrecto";

// --- Auth ---
pub const UNAUTHORIZED: &str = "No Autorizado";
pub const INVALID_TOKEN: &str = "Token No Valido";

// --- Generic ---
pub const GENERIC_ERROR: &str = "Hubo un error";
pub const MALFORMED_BODY: &str = "El cuerpo de la petición no es JSON valido";
pub const BODY_TOO_LARGE: &str = "El cuerpo de la petición es demasiado grande";
