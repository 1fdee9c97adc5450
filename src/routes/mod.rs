/// Router Module Index
///
/// Every route is bound to an ordered chain: validation rules first, then the
/// auth layer where the operation requires it, then the handler. Each
/// submodule returns a router relative to the API base path.

/// Product CRUD under the API base path.
pub mod products;

/// Account registration and login under `auth/`.
pub mod users;
