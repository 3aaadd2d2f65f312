//! Helpers for classifying driver errors.

/// SQLite extended result codes for uniqueness failures:
/// SQLITE_CONSTRAINT_UNIQUE (2067) and SQLITE_CONSTRAINT_PRIMARYKEY (1555).
pub fn is_unique_violation_code(code: &str) -> bool {
    matches!(code, "2067" | "1555")
}

/// True when the sqlx error is a database-level unique constraint failure.
pub fn is_sqlx_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .map(|c| is_unique_violation_code(c.as_ref()))
            .unwrap_or(false),
        _ => false,
    }
}
