use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array1, Array2, Axis};
use thiserror::Error;

use super::model::{CellValue, Dataset};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("row index {index} is out of bounds for {len} rows")]
pub struct IndexOutOfBounds {
    pub index: usize,
    pub len: usize,
}

// ---------------------------------------------------------------------------
// Row selection stage
// ---------------------------------------------------------------------------

/// Decides which rows of a split take part in fitting or prediction.
pub trait RowSelector {
    /// `explicit` is the caller-supplied index list, if any.
    fn select(
        &self,
        dataset: &Dataset,
        explicit: Option<&[usize]>,
    ) -> Result<Vec<usize>, IndexOutOfBounds>;
}

/// Use the explicit indices when given, otherwise every row.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitOrAll;

impl RowSelector for ExplicitOrAll {
    fn select(
        &self,
        dataset: &Dataset,
        explicit: Option<&[usize]>,
    ) -> Result<Vec<usize>, IndexOutOfBounds> {
        let indices = resolve_indices(explicit, dataset.len());
        check_bounds(&indices, dataset.len())?;
        Ok(indices)
    }
}

/// Use the explicit indices when given, otherwise the rows whose label
/// columns pass a [`FilterState`].
#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    pub filters: FilterState,
}

impl RowSelector for MetadataFilter {
    fn select(
        &self,
        dataset: &Dataset,
        explicit: Option<&[usize]>,
    ) -> Result<Vec<usize>, IndexOutOfBounds> {
        match explicit {
            Some(indices) => {
                check_bounds(indices, dataset.len())?;
                Ok(indices.to_vec())
            }
            None => Ok(filtered_indices(dataset, &self.filters)),
        }
    }
}

// ---------------------------------------------------------------------------
// Index helpers
// ---------------------------------------------------------------------------

/// Explicit indices as given, or `0..n_rows` when absent.
pub fn resolve_indices(explicit: Option<&[usize]>, n_rows: usize) -> Vec<usize> {
    match explicit {
        Some(indices) => indices.to_vec(),
        None => (0..n_rows).collect(),
    }
}

/// Out-of-range indices are an error, never clipped.
pub fn check_bounds(indices: &[usize], len: usize) -> Result<(), IndexOutOfBounds> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(IndexOutOfBounds { index, len }),
        None => Ok(()),
    }
}

/// Rows of `matrix` in `indices` order (repeats allowed).
pub fn take_rows(matrix: &Array2<f64>, indices: &[usize]) -> Result<Array2<f64>, IndexOutOfBounds> {
    check_bounds(indices, matrix.nrows())?;
    Ok(matrix.select(Axis(0), indices))
}

/// Elements of `vector` in `indices` order.
pub fn take_values(vector: &Array1<f64>, indices: &[usize]) -> Result<Array1<f64>, IndexOutOfBounds> {
    check_bounds(indices, vector.len())?;
    Ok(vector.select(Axis(0), indices))
}

// ---------------------------------------------------------------------------
// Filter predicate: which unique values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// Columns absent from the map are unconstrained.
pub type FilterState = BTreeMap<String, BTreeSet<CellValue>>;

/// Initialise a [`FilterState`] with every value of `columns` selected.
pub fn init_filter_state(dataset: &Dataset, columns: &[String]) -> FilterState {
    columns
        .iter()
        .filter_map(|col| dataset.unique_values(col).map(|vals| (col.clone(), vals)))
        .collect()
}

/// Return indices of rows that pass all active filters.
///
/// A row passes a column filter when:
/// * The column is not present in `filters` → passes (no constraint)
/// * The filter set for that column is empty → nothing selected → fails
/// * The row's value for that column is in the selected set → passes
///
/// A filtered column the dataset lacks reads as `Null` for every row.
pub fn filtered_indices(dataset: &Dataset, filters: &FilterState) -> Vec<usize> {
    let columns: Vec<(Option<Vec<&CellValue>>, &BTreeSet<CellValue>)> = filters
        .iter()
        .map(|(col, selected)| (dataset.column(col), selected))
        .collect();

    (0..dataset.len())
        .filter(|&row| {
            columns.iter().all(|(cells, selected)| {
                let value = cells
                    .as_ref()
                    .map_or(&CellValue::Null, |cells| cells[row]);
                selected.contains(value)
            })
        })
        .collect()
}
