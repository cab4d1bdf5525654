// src/models/query.rs
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// A single cell value as returned by the database driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    /// Dates, times, JSON, UUIDs and anything else we only ever display.
    Other(String),
}

impl Scalar {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::Int(_) | Scalar::Float(_) | Scalar::Decimal(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Int(v) => write!(f, "{}", v),
            // Keep a trailing ".0" on integral floats so 45000.0 doesn't read as an integer column
            Scalar::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => write!(f, "{:.1}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Decimal(v) => write!(f, "{}", v),
            Scalar::Text(s) | Scalar::Other(s) => f.write_str(s),
        }
    }
}

/// Column names plus rows, in the order the driver produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The only row, when there is exactly one.
    pub fn single_row(&self) -> Option<&[Scalar]> {
        match self.rows.as_slice() {
            [row] => Some(row.as_slice()),
            _ => None,
        }
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Scalar]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }
}
