//! API routes

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::extractors::AppState;
use crate::handlers::{auth, permissions, roles, users};
use crate::middleware::require_auth;

/// Create the complete API router
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    let protected = Router::new()
        .route("/auth/profile", get(auth::profile))
        .nest("/users", users_router())
        .nest("/roles", roles_router())
        .nest("/permissions", permissions_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", public.merge(protected))
        .with_state(state)
}

fn users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
}

fn roles_router() -> Router<AppState> {
    Router::new()
        .route("/", get(roles::list_roles).post(roles::create_role))
        .route(
            "/:id",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route(
            "/:id/permissions",
            get(roles::get_role_permissions).post(roles::assign_role_permissions),
        )
}

fn permissions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(permissions::list_permissions).post(permissions::create_permission),
        )
        .route("/tree", get(permissions::permission_tree))
        .route(
            "/:id",
            get(permissions::get_permission)
                .put(permissions::update_permission)
                .delete(permissions::delete_permission),
        )
}
