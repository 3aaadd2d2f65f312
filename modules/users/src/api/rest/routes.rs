use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount the `/users` resource on `router`. The service is shared through an
/// `Extension` layer, so it only covers routes registered up to this point.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/{user_id}",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(Extension(service))
}
