// src/db/mod.rs
//! The database seam. Each chat turn opens a [`LiveDatabase`], reads the
//! schema text, runs one statement and closes the connection again.

mod decode;
mod live;
pub mod schema;
mod target;

pub use live::LiveDatabase;
pub use schema::{render_table_info, ColumnSchema, TableSchema};
pub use target::{ConnectionTarget, DatabaseKind};

use crate::models::QueryResult;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Unsupported database type: {0}")]
    UnsupportedType(String),
    #[error("Missing connection field: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    Connection(String),
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("driver error: {0}")]
    Driver(String),
}

impl DatabaseError {
    pub fn from_connect(err: sqlx::Error) -> Self {
        DatabaseError::Connection(err.to_string())
    }

    /// Sorts a driver error raised while running a statement into the
    /// categories the chat endpoint reports differently.
    pub fn from_query(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                if is_syntax_error(db_err.message(), code.as_deref()) {
                    DatabaseError::Syntax(err.to_string())
                } else {
                    DatabaseError::Database(err.to_string())
                }
            }
            _ => DatabaseError::Driver(err.to_string()),
        }
    }

    /// Short category name, used in logs and in the generic server-error message.
    pub fn kind(&self) -> &'static str {
        match self {
            DatabaseError::UnsupportedType(_) => "UnsupportedDatabaseType",
            DatabaseError::MissingField(_) => "MissingConnectionField",
            DatabaseError::Connection(_) => "ConnectionError",
            DatabaseError::Syntax(_) => "SyntaxError",
            DatabaseError::Database(_) => "DatabaseError",
            DatabaseError::Driver(_) => "DriverError",
        }
    }
}

/// SQLSTATE class 42 covers syntax errors and access-rule violations such as
/// unknown tables or columns. SQLite only reports numeric codes, so the
/// message is checked as well.
fn is_syntax_error(message: &str, sqlstate: Option<&str>) -> bool {
    message.to_lowercase().contains("syntax error") || sqlstate.map_or(false, |code| code.starts_with("42"))
}

#[async_trait]
pub trait SqlDatabase: Send {
    /// Dialect name handed to the prompt, e.g. `postgresql`.
    fn dialect(&self) -> &'static str;

    /// Human-readable schema: one CREATE TABLE block per table plus sample rows.
    async fn table_info(&mut self) -> Result<String, DatabaseError>;

    async fn execute(&mut self, sql: &str) -> Result<QueryResult, DatabaseError>;
}
