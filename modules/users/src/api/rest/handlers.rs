use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    Extension, Json,
};
use tracing::{error, info};

use crate::api::rest::dto::{CreateUserReq, UpdateUserReq, UserDto};
use crate::api::rest::envelope::Envelope;
use crate::api::rest::error::{map_domain_error, ApiError};
use crate::domain::service::Service;

pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
) -> Result<Envelope<Vec<UserDto>>, ApiError> {
    info!("Listing users");

    match svc.list_users().await {
        Ok(users) => Ok(Envelope::ok(users.into_iter().map(UserDto::from).collect())),
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e, "getting users"))
        }
    }
}

/// Get a specific user by ID
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
) -> Result<Envelope<UserDto>, ApiError> {
    info!("Getting user with id: {}", user_id);

    match svc.get_user_by_id(&user_id).await {
        Ok(user) => Ok(Envelope::ok(UserDto::from(user))),
        Err(e) => {
            error!("Failed to get user {}: {}", user_id, e);
            Err(map_domain_error(&e, "getting user"))
        }
    }
}

/// Create a new user
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<Envelope<UserDto>, ApiError> {
    let Json(req) = body?;
    info!("Creating user: {:?}", req);

    match svc.create_user(req.into()).await {
        Ok(user) => Ok(Envelope::ok(UserDto::from(user))),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e, "creating new user"))
        }
    }
}

/// Apply a partial update; responds with the user as stored afterwards.
pub async fn update_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    body: Result<Json<UpdateUserReq>, JsonRejection>,
) -> Result<Envelope<UserDto>, ApiError> {
    let Json(req) = body?;
    info!("Updating user {} with: {:?}", user_id, req);

    match svc.update_user_by_id(&user_id, req.into()).await {
        Ok(user) => Ok(Envelope::ok(UserDto::from(user))),
        Err(e) => {
            error!("Failed to update user {}: {}", user_id, e);
            Err(map_domain_error(&e, "updating user"))
        }
    }
}

/// Delete a user. An unknown id still answers with success.
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    info!("Deleting user: {}", user_id);

    match svc.delete_user_by_id(&user_id).await {
        Ok(_) => Ok(Envelope::ok_empty()),
        Err(e) => {
            error!("Failed to delete user {}: {}", user_id, e);
            Err(map_domain_error(&e, "deleting user"))
        }
    }
}
