// src/db/schema.rs
//! Schema introspection, rendered as the text block the prompt embeds.

use super::decode::{fetch_mysql, fetch_pg, fetch_sqlite};
use crate::models::QueryResult;
use sqlx::mysql::MySqlConnection;
use sqlx::postgres::PgConnection;
use sqlx::sqlite::SqliteConnection;

/// Rows sampled from every table and shown under its definition.
pub const SAMPLE_ROWS: usize = 3;
const SAMPLE_VALUE_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
    pub primary_key: Vec<String>,
    /// Verbatim DDL when the backend keeps it (SQLite does).
    pub create_statement: Option<String>,
    pub sample: QueryResult,
}

impl TableSchema {
    fn ddl(&self) -> String {
        if let Some(sql) = &self.create_statement {
            return sql.trim().to_string();
        }

        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                format!(
                    "\t{} {}{}",
                    c.name,
                    c.data_type.to_uppercase(),
                    if c.nullable { "" } else { " NOT NULL" }
                )
            })
            .collect();
        if !self.primary_key.is_empty() {
            lines.push(format!("\tPRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        format!("CREATE TABLE {} (\n{}\n)", self.name, lines.join(", \n"))
    }

    fn sample_block(&self) -> String {
        let mut block = format!("/*\n{} rows from {} table:\n", SAMPLE_ROWS, self.name);
        if self.sample.columns.is_empty() {
            let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
            block.push_str(&names.join("\t"));
        } else {
            block.push_str(&self.sample.columns.join("\t"));
        }
        for row in &self.sample.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|v| v.to_string().chars().take(SAMPLE_VALUE_MAX_CHARS).collect())
                .collect();
            block.push('\n');
            block.push_str(&cells.join("\t"));
        }
        block.push_str("\n*/");
        block
    }
}

pub fn render_table_info(tables: &[TableSchema]) -> String {
    tables
        .iter()
        .map(|table| format!("\n{}\n\n{}", table.ddl(), table.sample_block()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn quote_ident(name: &str, quote: char) -> String {
    let escaped = name.replace(quote, &format!("{}{}", quote, quote));
    format!("{}{}{}", quote, escaped, quote)
}

pub(crate) async fn postgres_tables(conn: &mut PgConnection) -> Result<Vec<TableSchema>, sqlx::Error> {
    let names: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name::text FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
         ORDER BY table_name",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut tables = Vec::with_capacity(names.len());
    for (name,) in names {
        let columns: Vec<(String, String, bool)> = sqlx::query_as(
            "SELECT column_name::text, data_type::text, is_nullable::text = 'YES' \
             FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind(&name)
        .fetch_all(&mut *conn)
        .await?;

        let primary_key: Vec<(String,)> = sqlx::query_as(
            "SELECT kcu.column_name::text \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
               ON tc.constraint_name = kcu.constraint_name \
              AND tc.table_schema = kcu.table_schema \
              AND tc.table_name = kcu.table_name \
             WHERE tc.constraint_type = 'PRIMARY KEY' \
               AND tc.table_schema = current_schema() AND tc.table_name = $1 \
             ORDER BY kcu.ordinal_position",
        )
        .bind(&name)
        .fetch_all(&mut *conn)
        .await?;

        let sample_sql = format!("SELECT * FROM {} LIMIT {}", quote_ident(&name, '"'), SAMPLE_ROWS);
        let sample = fetch_pg(&mut *conn, &sample_sql).await?;

        tables.push(TableSchema {
            columns: columns
                .into_iter()
                .map(|(name, data_type, nullable)| ColumnSchema { name, data_type, nullable })
                .collect(),
            primary_key: primary_key.into_iter().map(|(c,)| c).collect(),
            create_statement: None,
            sample,
            name,
        });
    }
    Ok(tables)
}

pub(crate) async fn mysql_tables(conn: &mut MySqlConnection) -> Result<Vec<TableSchema>, sqlx::Error> {
    let names: Vec<(String,)> = sqlx::query_as(
        "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
         WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
         ORDER BY table_name",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut tables = Vec::with_capacity(names.len());
    for (name,) in names {
        let columns: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT CAST(column_name AS CHAR), CAST(column_type AS CHAR), CAST(is_nullable AS CHAR) \
             FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = ? \
             ORDER BY ordinal_position",
        )
        .bind(&name)
        .fetch_all(&mut *conn)
        .await?;

        let primary_key: Vec<(String,)> = sqlx::query_as(
            "SELECT CAST(column_name AS CHAR) FROM information_schema.key_column_usage \
             WHERE table_schema = DATABASE() AND table_name = ? AND constraint_name = 'PRIMARY' \
             ORDER BY ordinal_position",
        )
        .bind(&name)
        .fetch_all(&mut *conn)
        .await?;

        let sample_sql = format!("SELECT * FROM {} LIMIT {}", quote_ident(&name, '`'), SAMPLE_ROWS);
        let sample = fetch_mysql(&mut *conn, &sample_sql).await?;

        tables.push(TableSchema {
            columns: columns
                .into_iter()
                .map(|(name, data_type, nullable)| ColumnSchema {
                    name,
                    data_type,
                    nullable: nullable.eq_ignore_ascii_case("YES"),
                })
                .collect(),
            primary_key: primary_key.into_iter().map(|(c,)| c).collect(),
            create_statement: None,
            sample,
            name,
        });
    }
    Ok(tables)
}

pub(crate) async fn sqlite_tables(conn: &mut SqliteConnection) -> Result<Vec<TableSchema>, sqlx::Error> {
    let entries: Vec<(String, Option<String>)> = sqlx::query_as(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut tables = Vec::with_capacity(entries.len());
    for (name, create_statement) in entries {
        let sample_sql = format!("SELECT * FROM {} LIMIT {}", quote_ident(&name, '"'), SAMPLE_ROWS);
        let sample = fetch_sqlite(&mut *conn, &sample_sql).await?;

        tables.push(TableSchema {
            columns: Vec::new(),
            primary_key: Vec::new(),
            create_statement,
            sample,
            name,
        });
    }
    Ok(tables)
}
