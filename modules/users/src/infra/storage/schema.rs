//! Table provisioning for an empty database. Idempotent; not a migration system.

use anyhow::Context;
use userbase_db::DbHandle;

pub const USERS_TABLE: &str = "users";

const USERS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY NOT NULL DEFAULT ('r' || lower(hex(randomblob(7)))),
    email           TEXT NOT NULL DEFAULT '',
    emailVisibility BOOLEAN NOT NULL DEFAULT FALSE,
    verified        BOOLEAN NOT NULL DEFAULT FALSE,
    name            TEXT NOT NULL DEFAULT '',
    avatar          TEXT NOT NULL DEFAULT '',
    created         TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%fZ', 'now')),
    updated         TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%fZ', 'now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email);

CREATE TRIGGER IF NOT EXISTS users_touch_updated
AFTER UPDATE OF email, emailVisibility, verified, name, avatar ON users
FOR EACH ROW
BEGIN
    UPDATE users SET updated = strftime('%Y-%m-%d %H:%M:%fZ', 'now') WHERE id = NEW.id;
END;
"#;

/// Create the `users` table, its email index and the `updated` trigger if missing.
pub async fn ensure_schema(db: &DbHandle) -> anyhow::Result<()> {
    sqlx::raw_sql(USERS_SCHEMA)
        .execute(db.pool())
        .await
        .with_context(|| format!("bootstrap of table '{USERS_TABLE}' failed"))?;
    tracing::debug!(table = USERS_TABLE, "schema ensured");
    Ok(())
}
