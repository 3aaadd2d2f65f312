use crate::contract::model::{NewUser, User, UserPatch};
use async_trait::async_trait;

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// All rows in the engine's natural order.
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Insert a row; id and timestamps are assigned by storage.
    async fn insert(&self, new_user: &NewUser) -> anyhow::Result<()>;
    /// Apply a non-empty patch to one row. Returns the number of rows matched.
    async fn update(&self, id: &str, patch: &UserPatch) -> anyhow::Result<u64>;
    /// Delete by id. Returns the number of rows removed.
    async fn delete(&self, id: &str) -> anyhow::Result<u64>;
}
