//! SQLite-backed repository implementation for the domain port.
//!
//! Every statement goes through [`NamedQuery`], so values are always bound by
//! name and never reach the SQL text.

use anyhow::Context;
use userbase_db::{is_sqlx_unique_violation, DbError, DbHandle, NamedQuery};

use crate::contract::model::{NewUser, User, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::repo::UsersRepository;
use crate::infra::storage::update_query::{build_update, ID_PARAM};

const SELECT_USERS: &str =
    "SELECT id, email, emailVisibility, verified, name, avatar, created, updated FROM users";

/// Row shape as stored; column names follow the table, not Rust conventions.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    #[sqlx(rename = "emailVisibility")]
    pub email_visibility: bool,
    pub verified: bool,
    pub name: String,
    pub avatar: String,
    pub created: String,
    pub updated: String,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            email_visibility: r.email_visibility,
            verified: r.verified,
            name: r.name,
            avatar: r.avatar,
            created: r.created,
            updated: r.updated,
        }
    }
}

/// Holds a cloned pool handle; the pool itself is shared.
#[derive(Clone)]
pub struct SqliteUsersRepository {
    db: DbHandle,
}

impl SqliteUsersRepository {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl UsersRepository for SqliteUsersRepository {
    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let rows: Vec<UserRow> = NamedQuery::new(SELECT_USERS)
            .fetch_all(self.db.pool())
            .await
            .context("list failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        let row: Option<UserRow> = NamedQuery::new(format!("{SELECT_USERS} WHERE id = :{ID_PARAM}"))
            .bind(ID_PARAM, id)
            .fetch_optional(self.db.pool())
            .await
            .context("find_by_id failed")?;
        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row: Option<UserRow> = NamedQuery::new(format!("{SELECT_USERS} WHERE email = :email"))
            .bind("email", email)
            .fetch_optional(self.db.pool())
            .await
            .context("find_by_email failed")?;
        Ok(row.map(Into::into))
    }

    async fn insert(&self, new_user: &NewUser) -> anyhow::Result<()> {
        NamedQuery::new(
            "INSERT INTO users (email, emailVisibility, name) VALUES (:email, :emailVisibility, :name)",
        )
        .bind("email", new_user.email.as_str())
        .bind("emailVisibility", new_user.email_visibility)
        .bind("name", new_user.name.as_str())
        .execute(self.db.pool())
        .await
        .inspect_err(|e| {
            if let DbError::Sqlx(inner) = e {
                if is_sqlx_unique_violation(inner) {
                    tracing::warn!(email = %new_user.email, "email already taken");
                }
            }
        })
        .context("insert failed")?;
        Ok(())
    }

    async fn update(&self, id: &str, patch: &UserPatch) -> anyhow::Result<u64> {
        // Surfaces as the domain error so callers keep the client-error status.
        let query = build_update(id, patch).map_err(DomainError::from)?;
        tracing::debug!(sql = query.sql(), "applying user patch");
        let affected = query
            .execute(self.db.pool())
            .await
            .context("update failed")?;
        Ok(affected)
    }

    async fn delete(&self, id: &str) -> anyhow::Result<u64> {
        let affected = NamedQuery::new(format!("DELETE FROM users WHERE id = :{ID_PARAM}"))
            .bind(ID_PARAM, id)
            .execute(self.db.pool())
            .await
            .context("delete failed")?;
        Ok(affected)
    }
}
