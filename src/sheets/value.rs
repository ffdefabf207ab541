//! Cell values exchanged with the store
//!
//! Values travel as plain JSON scalars. On write the store applies
//! user-entered semantics, so `Text("3.14")` lands as a number and
//! `Text("=SUM(A1:A2)")` as a formula. On read values come back unformatted,
//! which keeps numbers and booleans typed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single scalar cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
    /// Explicit empty cell (JSON `null`)
    Empty,
}

/// One row of cells, left to right. Missing trailing cells are empty.
pub type Row = Vec<CellValue>;

/// Rows top to bottom; the unit of every read and write.
pub type Matrix = Vec<Row>;

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            // Integral numbers print without a trailing ".0"
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Number of columns spanned by the widest row
pub fn matrix_width(matrix: &[Row]) -> usize {
    matrix.iter().map(Vec::len).max().unwrap_or(0)
}

/// Total number of cells carried by the matrix (ragged rows counted as-is)
pub fn cell_count(matrix: &[Row]) -> usize {
    matrix.iter().map(Vec::len).sum()
}
