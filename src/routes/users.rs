use axum::{middleware, routing::{get, post}, Router};

use crate::handlers::user::{admin_get_user, admin_list_users, get_me, login_user, register_user, update_user};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/auth/register", post(register_user))
        .route("/auth/login", post(login_user));

    let protected = Router::new()
        .route("/auth/me", get(get_me))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    open.merge(protected)
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin_list_users))
        .route("/users/{id}", get(admin_get_user).put(update_user))
}

