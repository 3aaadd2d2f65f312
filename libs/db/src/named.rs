//! Named-parameter queries.
//!
//! SQL is written with `:name` placeholders and values are bound by name.
//! Before execution the text is compiled into SQLite's numbered form (`?1`,
//! `?2`, ...) and the values are handed to the driver as arguments, in the
//! order the numbers were assigned. A name used several times maps to a
//! single number.

use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Arguments, FromRow};

use crate::{DbError, Result};

/// A value that can be bound to a named placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Name → value bag. Keeps insertion order; rebinding a name replaces its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, SqlValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

/// SQL text with `:name` placeholders plus the values bound to them.
#[derive(Debug, Clone)]
pub struct NamedQuery {
    sql: String,
    params: Params,
}

impl NamedQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Bind `value` to every `:name` occurrence.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.params.insert(name, value);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Rewrite placeholders into numbered form and line up the values.
    pub fn compile(&self) -> Result<CompiledQuery> {
        let mut sql = String::with_capacity(self.sql.len());
        let mut names: Vec<String> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        let mut last = 0;

        for ph in scan_placeholders(&self.sql) {
            sql.push_str(&self.sql[last..ph.start]);

            let index = match names.iter().position(|n| n == ph.name) {
                Some(i) => i,
                None => {
                    let value = self
                        .params
                        .get(ph.name)
                        .ok_or_else(|| DbError::UnboundParam(ph.name.to_string()))?;
                    names.push(ph.name.to_string());
                    values.push(value.clone());
                    names.len() - 1
                }
            };

            sql.push('?');
            sql.push_str(&(index + 1).to_string());
            last = ph.end;
        }
        sql.push_str(&self.sql[last..]);

        for unused in self.params.names().filter(|n| !names.iter().any(|u| u == n)) {
            tracing::debug!(param = unused, "bound parameter not referenced by SQL");
        }

        Ok(CompiledQuery { sql, names, values })
    }

    /// Execute a statement; returns the number of affected rows.
    pub async fn execute(&self, pool: &SqlitePool) -> Result<u64> {
        let compiled = self.compile()?;
        let args = compiled.arguments()?;
        let res = sqlx::query_with::<sqlx::Sqlite, _>(&compiled.sql, args)
            .execute(pool)
            .await?;
        Ok(res.rows_affected())
    }

    /// Fetch exactly one row; `sqlx::Error::RowNotFound` when there is none.
    pub async fn fetch_one<T>(&self, pool: &SqlitePool) -> Result<T>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let compiled = self.compile()?;
        let args = compiled.arguments()?;
        let row = sqlx::query_as_with::<sqlx::Sqlite, T, _>(&compiled.sql, args)
            .fetch_one(pool)
            .await?;
        Ok(row)
    }

    /// Fetch zero or one row.
    pub async fn fetch_optional<T>(&self, pool: &SqlitePool) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let compiled = self.compile()?;
        let args = compiled.arguments()?;
        let row = sqlx::query_as_with::<sqlx::Sqlite, T, _>(&compiled.sql, args)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Fetch all rows in the order the engine returns them.
    pub async fn fetch_all<T>(&self, pool: &SqlitePool) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let compiled = self.compile()?;
        let args = compiled.arguments()?;
        let rows = sqlx::query_as_with::<sqlx::Sqlite, T, _>(&compiled.sql, args)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }
}

/// Driver-ready SQL plus positional values.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    sql: String,
    names: Vec<String>,
    values: Vec<SqlValue>,
}

impl CompiledQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameter names in positional order (`names()[0]` is `?1`).
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    fn arguments(&self) -> Result<SqliteArguments<'_>> {
        let mut args = SqliteArguments::default();
        for (name, value) in self.names.iter().zip(&self.values) {
            let res = match value {
                SqlValue::Null => args.add(Option::<String>::None),
                SqlValue::Bool(b) => args.add(*b),
                SqlValue::Int(i) => args.add(*i),
                SqlValue::Text(s) => args.add(s.as_str()),
            };
            res.map_err(|e| DbError::Bind {
                name: name.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(args)
    }
}

struct Placeholder<'a> {
    start: usize,
    end: usize,
    name: &'a str,
}

/// Find `:name` tokens outside quoted literals/identifiers. `::` is skipped.
fn scan_placeholders(sql: &str) -> Vec<Placeholder<'_>> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => {
                quote = Some(b);
                i += 1;
            }
            // Comments run to end of line or to the closing `*/`; quotes and
            // colons inside them are inert.
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = bytes[i..]
                    .iter()
                    .position(|&c| c == b'\n')
                    .map_or(bytes.len(), |n| i + n + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |n| i + 2 + n + 2);
            }
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if bytes
                .get(i + 1)
                .is_some_and(|c| c.is_ascii_alphabetic() || *c == b'_') =>
            {
                let start = i;
                let mut end = i + 1;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                out.push(Placeholder {
                    start,
                    end,
                    name: &sql[start + 1..end],
                });
                i = end;
            }
            _ => i += 1,
        }
    }
    out
}
