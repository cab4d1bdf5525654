// src/db/decode.rs
//! Row decoding for each backend. The SQL is model-generated, so column types
//! are only known at runtime; each cell is mapped onto a [`Scalar`] by the
//! type name the driver reports.

use crate::models::{QueryResult, Scalar};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column, Executor, Row, TypeInfo, ValueRef};
use uuid::Uuid;

fn collect_rows<R, F>(rows: &[R], decode: F) -> Result<QueryResult, sqlx::Error>
where
    R: Row,
    F: Fn(&R, usize) -> Result<Scalar, sqlx::Error>,
{
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let mut decoded = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            values.push(decode(row, idx)?);
        }
        decoded.push(values);
    }

    Ok(QueryResult::new(columns, decoded))
}

/// Column names from the prepared statement, for results without a row to
/// read them from. A statement that cannot be described yields no names.
fn describe_columns<'c, E>(
    executor: E,
    sql: &'c str,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Vec<String>> + Send + 'c>>
where
    E: Executor<'c> + 'c,
{
    Box::pin(async move {
        match executor.describe(sql).await {
            Ok(described) => described.columns().iter().map(|c| c.name().to_string()).collect(),
            Err(e) => {
                tracing::debug!("Could not describe statement columns: {}", e);
                Vec::new()
            }
        }
    })
}

pub(crate) async fn fetch_pg(conn: &mut PgConnection, sql: &str) -> Result<QueryResult, sqlx::Error> {
    let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
    let mut result = collect_rows(&rows, pg_cell)?;
    if rows.is_empty() {
        result.columns = describe_columns(&mut *conn, sql).await;
    }
    Ok(result)
}

pub(crate) async fn fetch_mysql(conn: &mut MySqlConnection, sql: &str) -> Result<QueryResult, sqlx::Error> {
    let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
    let mut result = collect_rows(&rows, mysql_cell)?;
    if rows.is_empty() {
        result.columns = describe_columns(&mut *conn, sql).await;
    }
    Ok(result)
}

pub(crate) async fn fetch_sqlite(conn: &mut SqliteConnection, sql: &str) -> Result<QueryResult, sqlx::Error> {
    let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
    let mut result = collect_rows(&rows, sqlite_cell)?;
    if rows.is_empty() {
        result.columns = describe_columns(&mut *conn, sql).await;
    }
    Ok(result)
}

fn unknown(type_name: &str) -> Scalar {
    Scalar::Other(format!("<{}>", type_name.to_lowercase()))
}

fn pg_cell(row: &PgRow, idx: usize) -> Result<Scalar, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Scalar::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "BOOL" => Scalar::Bool(row.try_get(idx)?),
        "INT2" => Scalar::Int(row.try_get::<i16, _>(idx)?.into()),
        "INT4" => Scalar::Int(row.try_get::<i32, _>(idx)?.into()),
        "INT8" => Scalar::Int(row.try_get(idx)?),
        "FLOAT4" => Scalar::Float(row.try_get::<f32, _>(idx)?.into()),
        "FLOAT8" => Scalar::Float(row.try_get(idx)?),
        "NUMERIC" => Scalar::Decimal(row.try_get::<Decimal, _>(idx)?),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN" => Scalar::Text(row.try_get(idx)?),
        "DATE" => Scalar::Other(row.try_get::<NaiveDate, _>(idx)?.to_string()),
        "TIME" => Scalar::Other(row.try_get::<NaiveTime, _>(idx)?.to_string()),
        "TIMESTAMP" => Scalar::Other(row.try_get::<NaiveDateTime, _>(idx)?.to_string()),
        "TIMESTAMPTZ" => Scalar::Other(row.try_get::<DateTime<Utc>, _>(idx)?.to_string()),
        "UUID" => Scalar::Other(row.try_get::<Uuid, _>(idx)?.to_string()),
        "JSON" | "JSONB" => Scalar::Other(row.try_get::<serde_json::Value, _>(idx)?.to_string()),
        // enums, domains and friends are sent as text
        _ => row
            .try_get_unchecked::<String, _>(idx)
            .map(Scalar::Other)
            .unwrap_or_else(|_| unknown(&type_name)),
    };
    Ok(value)
}

fn mysql_cell(row: &MySqlRow, idx: usize) -> Result<Scalar, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Scalar::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "BOOLEAN" => Scalar::Bool(row.try_get(idx)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Scalar::Int(row.try_get_unchecked(idx)?),
        name if name.ends_with(" UNSIGNED") => {
            let value: u64 = row.try_get_unchecked(idx)?;
            i64::try_from(value)
                .map(Scalar::Int)
                .unwrap_or_else(|_| Scalar::Decimal(Decimal::from(value)))
        }
        "YEAR" => Scalar::Int(row.try_get_unchecked::<u16, _>(idx)?.into()),
        "FLOAT" => Scalar::Float(row.try_get::<f32, _>(idx)?.into()),
        "DOUBLE" => Scalar::Float(row.try_get(idx)?),
        "DECIMAL" => Scalar::Decimal(row.try_get::<Decimal, _>(idx)?),
        "VARCHAR" | "CHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            Scalar::Text(row.try_get(idx)?)
        }
        "DATE" => Scalar::Other(row.try_get::<NaiveDate, _>(idx)?.to_string()),
        "DATETIME" => Scalar::Other(row.try_get::<NaiveDateTime, _>(idx)?.to_string()),
        "TIMESTAMP" => Scalar::Other(row.try_get::<DateTime<Utc>, _>(idx)?.to_string()),
        "JSON" => Scalar::Other(row.try_get::<serde_json::Value, _>(idx)?.to_string()),
        // TIME (can exceed 24h), BLOB/BINARY and spatial types
        _ => row
            .try_get_unchecked::<Vec<u8>, _>(idx)
            .map(|bytes| Scalar::Other(String::from_utf8_lossy(&bytes).into_owned()))
            .unwrap_or_else(|_| unknown(&type_name)),
    };
    Ok(value)
}

fn sqlite_cell(row: &SqliteRow, idx: usize) -> Result<Scalar, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Scalar::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "INTEGER" => Scalar::Int(row.try_get(idx)?),
        "REAL" => Scalar::Float(row.try_get(idx)?),
        "BOOLEAN" => Scalar::Bool(row.try_get(idx)?),
        "TEXT" => Scalar::Text(row.try_get(idx)?),
        "NUMERIC" => match row.try_get_unchecked::<i64, _>(idx) {
            Ok(v) => Scalar::Int(v),
            Err(_) => Scalar::Float(row.try_get_unchecked::<f64, _>(idx)?),
        },
        "DATE" | "TIME" | "DATETIME" => Scalar::Other(row.try_get_unchecked::<String, _>(idx)?),
        _ => row
            .try_get_unchecked::<Vec<u8>, _>(idx)
            .map(|bytes| Scalar::Other(String::from_utf8_lossy(&bytes).into_owned()))
            .unwrap_or_else(|_| unknown(&type_name)),
    };
    Ok(value)
}
