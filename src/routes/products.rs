use crate::{AppState, auth::auth_middleware, handlers, validation};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

/// Product Router Module
///
/// Only creation is protected by a bearer token; reads, updates, toggles and
/// deletes are public. Layers added with `route_layer` later wrap the earlier
/// ones, so the validation layer is always added last to run first.
pub fn product_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // GET /
        // Lists every product, newest first.
        // POST /
        // Validates name/price, then requires a bearer token, then creates.
        .route(
            "/",
            get(handlers::get_products).merge(
                post(handlers::create_product)
                    .route_layer(from_fn_with_state(state.clone(), auth_middleware))
                    .route_layer(from_fn_with_state(
                        validation::create_product(),
                        validation::validate_request,
                    )),
            ),
        )
        // GET    /{id}  Single product.
        // PUT    /{id}  Full replacement, validated as a whole.
        // PATCH  /{id}  Availability toggle; body ignored.
        // DELETE /{id}  Removal.
        .route(
            "/{id}",
            get(handlers::get_product_by_id)
                .patch(handlers::update_availability)
                .delete(handlers::delete_product)
                .route_layer(from_fn_with_state(
                    validation::product_id(),
                    validation::validate_request,
                ))
                .merge(
                    axum::routing::put(handlers::update_product).route_layer(from_fn_with_state(
                        validation::update_product(),
                        validation::validate_request,
                    )),
                ),
        )
}
