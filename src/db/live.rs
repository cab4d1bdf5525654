// src/db/live.rs
use super::decode::{fetch_mysql, fetch_pg, fetch_sqlite};
use super::schema::{self, render_table_info};
use super::{ConnectionTarget, DatabaseError, DatabaseKind, SqlDatabase};
use crate::models::QueryResult;
use async_trait::async_trait;
use sqlx::mysql::MySqlConnection;
use sqlx::postgres::PgConnection;
use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;

/// One open, unpooled connection. Lives for a single request.
pub enum LiveDatabase {
    Postgres(PgConnection),
    MySql(MySqlConnection),
    Sqlite(SqliteConnection),
}

impl LiveDatabase {
    pub async fn open(target: &ConnectionTarget) -> Result<Self, DatabaseError> {
        tracing::debug!("Opening {} connection to {}", target.kind().dialect(), target.redacted_uri());

        let db = match target.kind() {
            DatabaseKind::Postgres => LiveDatabase::Postgres(
                PgConnection::connect(target.uri())
                    .await
                    .map_err(DatabaseError::from_connect)?,
            ),
            DatabaseKind::MySql => LiveDatabase::MySql(
                MySqlConnection::connect(target.uri())
                    .await
                    .map_err(DatabaseError::from_connect)?,
            ),
            DatabaseKind::Sqlite => LiveDatabase::Sqlite(
                SqliteConnection::connect(target.uri())
                    .await
                    .map_err(DatabaseError::from_connect)?,
            ),
        };
        Ok(db)
    }

    pub async fn close(self) -> Result<(), DatabaseError> {
        let result = match self {
            LiveDatabase::Postgres(conn) => conn.close().await,
            LiveDatabase::MySql(conn) => conn.close().await,
            LiveDatabase::Sqlite(conn) => conn.close().await,
        };
        result.map_err(DatabaseError::from_connect)
    }
}

#[async_trait]
impl SqlDatabase for LiveDatabase {
    fn dialect(&self) -> &'static str {
        match self {
            LiveDatabase::Postgres(_) => DatabaseKind::Postgres.dialect(),
            LiveDatabase::MySql(_) => DatabaseKind::MySql.dialect(),
            LiveDatabase::Sqlite(_) => DatabaseKind::Sqlite.dialect(),
        }
    }

    async fn table_info(&mut self) -> Result<String, DatabaseError> {
        let tables = match self {
            LiveDatabase::Postgres(conn) => schema::postgres_tables(conn).await,
            LiveDatabase::MySql(conn) => schema::mysql_tables(conn).await,
            LiveDatabase::Sqlite(conn) => schema::sqlite_tables(conn).await,
        }
        .map_err(DatabaseError::from_query)?;

        tracing::debug!("Introspected {} tables", tables.len());
        Ok(render_table_info(&tables))
    }

    async fn execute(&mut self, sql: &str) -> Result<QueryResult, DatabaseError> {
        let result = match self {
            LiveDatabase::Postgres(conn) => fetch_pg(conn, sql).await,
            LiveDatabase::MySql(conn) => fetch_mysql(conn, sql).await,
            LiveDatabase::Sqlite(conn) => fetch_sqlite(conn, sql).await,
        };
        result.map_err(DatabaseError::from_query)
    }
}
