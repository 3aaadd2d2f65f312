use std::sync::Arc;

use crate::contract::model::{NewUser, User, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::repo::UsersRepository;
use tracing::{debug, info, instrument};

/// Domain service with business rules for user management.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
}

impl Service {
    pub fn new(repo: Arc<dyn UsersRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "users.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        debug!("Listing users");

        let users = self
            .repo
            .list()
            .await
            .map_err(|e| DomainError::storage("getting users", e))?;

        debug!("Successfully listed {} users", users.len());
        Ok(users)
    }

    #[instrument(name = "users.service.get_user_by_id", skip(self), fields(user_id = %id))]
    pub async fn get_user_by_id(&self, id: &str) -> Result<User, DomainError> {
        debug!("Getting user by id");

        if id.trim().is_empty() {
            return Err(DomainError::MissingId);
        }

        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::storage("getting user", e))?
            .ok_or_else(|| DomainError::not_found_by_id(id))
    }

    #[instrument(name = "users.service.get_user_by_email", skip(self), fields(email = %email))]
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, DomainError> {
        debug!("Getting user by email");

        self.repo
            .find_by_email(email)
            .await
            .map_err(|e| DomainError::storage("getting user", e))?
            .ok_or_else(|| DomainError::not_found_by_email(email))
    }

    /// Insert, then read the row back by email so storage-assigned fields are populated.
    #[instrument(
        name = "users.service.create_user",
        skip(self, new_user),
        fields(email = %new_user.email)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        self.repo
            .insert(&new_user)
            .await
            .map_err(|e| DomainError::storage("creating new user", e))?;

        let user = self.get_user_by_email(&new_user.email).await?;
        info!(user_id = %user.id, "Successfully created user");
        Ok(user)
    }

    /// Apply a partial update and return the row as stored afterwards.
    ///
    /// An empty patch is rejected before storage is touched. When no row has
    /// the given id the update is a no-op and the re-fetch yields `NotFound`.
    #[instrument(
        name = "users.service.update_user_by_id",
        skip(self, patch),
        fields(user_id = %id, fields = patch.field_count())
    )]
    pub async fn update_user_by_id(&self, id: &str, patch: UserPatch) -> Result<User, DomainError> {
        info!("Updating user");

        if id.trim().is_empty() {
            return Err(DomainError::MissingId);
        }
        if patch.is_empty() {
            return Err(DomainError::EmptyUpdate);
        }

        let affected = self
            .repo
            .update(id, &patch)
            .await
            .map_err(|e| DomainError::storage("updating user", e))?;
        debug!(affected, "Update statement applied");

        let user = self.get_user_by_id(id).await?;
        info!("Successfully updated user");
        Ok(user)
    }

    /// Delete by id. Returns whether a row was actually removed; a missing
    /// id is not an error.
    #[instrument(name = "users.service.delete_user_by_id", skip(self), fields(user_id = %id))]
    pub async fn delete_user_by_id(&self, id: &str) -> Result<bool, DomainError> {
        info!("Deleting user");

        if id.trim().is_empty() {
            return Err(DomainError::MissingId);
        }

        let affected = self
            .repo
            .delete(id)
            .await
            .map_err(|e| DomainError::storage("deleting user", e))?;

        if affected == 0 {
            debug!("No user with this id; nothing deleted");
        } else {
            info!("Successfully deleted user");
        }
        Ok(affected > 0)
    }
}
