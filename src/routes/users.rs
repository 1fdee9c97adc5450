use crate::{AppState, handlers, validation};
use axum::{Router, middleware::from_fn_with_state, routing::post};

/// User Router Module
///
/// Public account endpoints. Neither route requires a token.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        // POST /auth/register
        // name non-empty, valid email, password of at least 8 characters.
        .route(
            "/auth/register",
            post(handlers::register_user).route_layer(from_fn_with_state(
                validation::register_user(),
                validation::validate_request,
            )),
        )
        // POST /auth/login
        // Answers with the raw signed token on success.
        .route(
            "/auth/login",
            post(handlers::login).route_layer(from_fn_with_state(
                validation::login_user(),
                validation::validate_request,
            )),
        )
}
