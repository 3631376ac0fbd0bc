use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::{ensure_correct_user, require_auth};
use crate::users;

/// All API routes with state applied. Transport layers (CORS, tracing) are
/// added by the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let own_routes = Router::new()
        .route("/users/{username}", get(users::detail))
        .route("/users/{username}/to", get(users::messages_to))
        .route("/users/{username}/from", get(users::messages_from))
        .route_layer(middleware::from_fn(ensure_correct_user));

    let protected_routes = Router::new()
        .route("/users", get(users::list))
        .merge(own_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
