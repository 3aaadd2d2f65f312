//! Database access crate for Userbase.
//!
//! Provides a pooled SQLite handle (`DbHandle`) and a small named-parameter
//! query layer (`NamedQuery`) on top of SQLx. Callers write SQL with `:name`
//! placeholders and bind values by name; values never end up in the SQL text.
//!
//! # Example
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> userbase_db::Result<()> {
//!     use userbase_db::{ConnectOpts, DbHandle, NamedQuery};
//!
//!     let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//!
//!     let affected = NamedQuery::new("DELETE FROM users WHERE id = :id")
//!         .bind("id", "r0123456789abcd")
//!         .execute(db.pool())
//!         .await?;
//!     println!("deleted {affected} rows");
//!
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod named;

pub use errors::{is_sqlx_unique_violation, is_unique_violation_code};
pub use named::{CompiledQuery, NamedQuery, Params, SqlValue};

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and named queries.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("SQL references parameter ':{0}' but no value was bound")]
    UnboundParam(String),

    #[error("Failed to bind parameter ':{name}': {message}")]
    Bind { name: String, message: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Sqlite,
}

/// Connection options.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool.
    pub max_conns: Option<u32>,
    /// Minimum number of connections in the pool.
    pub min_conns: Option<u32>,
    /// Timeout to acquire a connection from the pool.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime for a connection.
    pub max_lifetime: Option<Duration>,
    /// SQLite busy timeout.
    pub sqlite_busy_timeout: Option<Duration>,
    /// For SQLite file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            sqlite_busy_timeout: Some(Duration::from_millis(DEFAULT_SQLITE_BUSY_TIMEOUT_MS)),
            create_sqlite_dirs: true,
        }
    }
}

const DEFAULT_SQLITE_BUSY_TIMEOUT_MS: u64 = 5000;

/// Main handle. Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct DbHandle {
    engine: DbEngine,
    pool: SqlitePool,
    dsn: String,
}

impl DbHandle {
    /// Detect engine by DSN.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(dsn.to_string()))
        }
    }

    /// Connect and build handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        let dsn = dsn.trim().to_string();
        let in_memory = is_memory_dsn(&dsn);

        if opts.create_sqlite_dirs && !in_memory {
            prepare_sqlite_path(&dsn)?;
        }

        let mut conn_opts = SqliteConnectOptions::from_str(&dsn)?.create_if_missing(true);
        if !in_memory {
            conn_opts = conn_opts.journal_mode(SqliteJournalMode::Wal);
        }
        if let Some(t) = opts.sqlite_busy_timeout {
            conn_opts = conn_opts.busy_timeout(t);
        }

        let mut o = SqlitePoolOptions::new();
        if in_memory {
            // Every connection to ":memory:" opens its own database, so the pool
            // must hold exactly one connection that is never recycled.
            o = o
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            if let Some(n) = opts.max_conns {
                o = o.max_connections(n);
            }
            if let Some(n) = opts.min_conns {
                o = o.min_connections(n);
            }
            if let Some(t) = opts.idle_timeout {
                o = o.idle_timeout(t);
            }
            if let Some(t) = opts.max_lifetime {
                o = o.max_lifetime(t);
            }
        }
        if let Some(t) = opts.acquire_timeout {
            o = o.acquire_timeout(t);
        }

        let pool = o.connect_with(conn_opts).await?;
        tracing::debug!(dsn = %dsn, in_memory, "SQLite pool connected");

        Ok(Self { engine, pool, dsn })
    }

    /// Graceful pool close.
    pub async fn close(self) {
        self.pool.close().await
    }

    /// Get the backend.
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// Get the DSN used for this connection.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// Underlying sqlx pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_memory_dsn(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

/// Create the parent directory of a file-backed SQLite DSN.
fn prepare_sqlite_path(dsn: &str) -> Result<()> {
    let raw = if let Some(rest) = dsn.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = dsn.strip_prefix("sqlite:") {
        rest
    } else {
        dsn
    };

    // URI forms ("file:...") and DSNs with query strings are left to SQLite.
    if raw.starts_with("file:") || raw.contains('?') {
        return Ok(());
    }

    if let Some(parent) = Path::new(raw).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
