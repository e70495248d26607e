use std::collections::BTreeSet;
use std::fmt;

use ndarray::{Array1, Array2};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a feature table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell.
/// Row selection by label puts values in `BTreeSet`s, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

/// Renders the cell the way it is written back to CSV; `Null` is empty.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Interpret the cell as an `f64` feature value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Guess the type of a raw text cell (CSV input).
    pub fn infer(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Column errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ColumnError {
    #[error("column '{0}' not found in dataset")]
    Unknown(String),
    #[error("column '{column}', row {row}: '{value}' is not numeric")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error("no target feature selected")]
    NoTarget,
    #[error("building feature matrix: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

// ---------------------------------------------------------------------------
// Dataset – a loaded table with x/y feature selection
// ---------------------------------------------------------------------------

/// A parsed feature table.
///
/// Input ("x") and target ("y") features are selected by name and then
/// materialised as numeric arrays; every other column stays available for
/// labeling output rows.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Ordered column names, as found in the source.
    pub column_names: Vec<String>,
    /// Row-major cells; rows shorter than `column_names` read as `Null`.
    pub rows: Vec<Vec<CellValue>>,
    x_features: Vec<String>,
    y_feature: Option<String>,
}

impl Dataset {
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Dataset {
            column_names,
            rows,
            x_features: Vec::new(),
            y_feature: None,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Null)
    }

    /// Select the target column. Returns whether the column exists; a
    /// missing column clears any previous selection.
    pub fn set_y_feature(&mut self, name: &str) -> bool {
        if self.has_column(name) {
            self.y_feature = Some(name.to_string());
            true
        } else {
            self.y_feature = None;
            false
        }
    }

    /// Select the input columns, in order. Every name must exist.
    pub fn set_x_features(&mut self, names: &[String]) -> Result<(), ColumnError> {
        if let Some(missing) = names.iter().find(|n| !self.has_column(n)) {
            return Err(ColumnError::Unknown(missing.clone()));
        }
        self.x_features = names.to_vec();
        Ok(())
    }

    pub fn x_features(&self) -> &[String] {
        &self.x_features
    }

    pub fn y_feature(&self) -> Option<&str> {
        self.y_feature.as_deref()
    }

    /// Input features as an `(n_rows, n_features)` matrix.
    pub fn x_data(&self) -> Result<Array2<f64>, ColumnError> {
        let cols = self
            .x_features
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| ColumnError::Unknown(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut values = Vec::with_capacity(self.len() * cols.len());
        for row in 0..self.len() {
            for (&col, name) in cols.iter().zip(&self.x_features) {
                values.push(self.numeric(row, col, name)?);
            }
        }
        Ok(Array2::from_shape_vec((self.len(), cols.len()), values)?)
    }

    /// The target feature as a flat vector.
    pub fn y_data(&self) -> Result<Array1<f64>, ColumnError> {
        let name = self.y_feature.as_deref().ok_or(ColumnError::NoTarget)?;
        let col = self
            .column_index(name)
            .ok_or_else(|| ColumnError::Unknown(name.to_string()))?;
        (0..self.len())
            .map(|row| self.numeric(row, col, name))
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from)
    }

    /// All cells of a column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let col = self.column_index(name)?;
        Some((0..self.len()).map(|row| self.cell(row, col)).collect())
    }

    /// The column exists and every one of its cells is null.
    pub fn is_blank_column(&self, name: &str) -> bool {
        self.column(name).is_some_and(|cells| {
            !cells.is_empty() && cells.iter().all(|c| matches!(c, CellValue::Null))
        })
    }

    /// Sorted set of distinct values in a column.
    pub fn unique_values(&self, name: &str) -> Option<BTreeSet<CellValue>> {
        self.column(name)
            .map(|cells| cells.into_iter().cloned().collect())
    }

    fn numeric(&self, row: usize, col: usize, name: &str) -> Result<f64, ColumnError> {
        let cell = self.cell(row, col);
        cell.as_f64().ok_or_else(|| ColumnError::NonNumeric {
            column: name.to_string(),
            row,
            value: cell.to_string(),
        })
    }
}
