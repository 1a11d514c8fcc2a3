//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for one entity and dispatches every
//! statement to the SQLite or MySQL pool chosen at startup.

pub mod artwork;
pub mod contact;
pub mod review;
pub mod user;

pub use artwork::{ArtworkRepository, SqlxArtworkRepository};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use review::{ReviewRepository, SqlxReviewRepository};
pub use user::{SqlxUserRepository, UserRepository};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::Row;

use crate::db::{Backend, DynDatabasePool};

/// A positional bind value.
///
/// Queries whose WHERE clause is assembled at runtime collect their values
/// here, and the same list binds against either driver.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlArg {
    Int(i64),
    Text(String),
    OptText(Option<String>),
    Bool(bool),
    Time(DateTime<Utc>),
}

pub(crate) fn bind_sqlite<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    args: &'q [SqlArg],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            SqlArg::Int(v) => query.bind(*v),
            SqlArg::Text(v) => query.bind(v.as_str()),
            SqlArg::OptText(v) => query.bind(v.as_deref()),
            SqlArg::Bool(v) => query.bind(*v),
            SqlArg::Time(v) => query.bind(*v),
        };
    }
    query
}

pub(crate) fn bind_mysql<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    args: &'q [SqlArg],
) -> Query<'q, MySql, MySqlArguments> {
    for arg in args {
        query = match arg {
            SqlArg::Int(v) => query.bind(*v),
            SqlArg::Text(v) => query.bind(v.as_str()),
            SqlArg::OptText(v) => query.bind(v.as_deref()),
            SqlArg::Bool(v) => query.bind(*v),
            SqlArg::Time(v) => query.bind(*v),
        };
    }
    query
}

/// Escape character for LIKE patterns, the same on SQLite and MySQL
pub(crate) const LIKE_ESCAPE: char = '!';

/// `%term%` pattern for case-insensitive literal substring matching with
/// `LOWER(col) LIKE LOWER(?) ESCAPE '!'`.
///
/// `%`, `_` and the escape character itself match literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Outcome of a write statement
#[derive(Debug, Clone, Copy)]
pub(crate) struct WriteOutcome {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

/// Execute a write statement on whichever backend is configured
pub(crate) async fn execute(
    pool: &DynDatabasePool,
    sql: &str,
    args: &[SqlArg],
) -> Result<WriteOutcome> {
    match pool.backend()? {
        Backend::Sqlite(pool) => {
            let result = bind_sqlite(sqlx::query(sql), args).execute(pool).await?;
            Ok(WriteOutcome {
                rows_affected: result.rows_affected(),
                last_insert_id: result.last_insert_rowid(),
            })
        }
        Backend::Mysql(pool) => {
            let result = bind_mysql(sqlx::query(sql), args).execute(pool).await?;
            Ok(WriteOutcome {
                rows_affected: result.rows_affected(),
                last_insert_id: i64::try_from(result.last_insert_id())
                    .context("Insert id out of range")?,
            })
        }
    }
}

/// Run a query returning a single `count` column
pub(crate) async fn fetch_count(pool: &DynDatabasePool, sql: &str, args: &[SqlArg]) -> Result<i64> {
    match pool.backend()? {
        Backend::Sqlite(pool) => {
            let row = bind_sqlite(sqlx::query(sql), args).fetch_one(pool).await?;
            Ok(row.try_get("count")?)
        }
        Backend::Mysql(pool) => {
            let row = bind_mysql(sqlx::query(sql), args).fetch_one(pool).await?;
            Ok(row.try_get("count")?)
        }
    }
}
