//! Validated numeric feature matrices.
//!
//! Every algorithm in this crate consumes a [`FeatureMatrix`]: `n ≥ 1` rows by
//! `d ≥ 1` columns of finite `f64`. Matrices are built either directly from
//! numbers ([`FeatureMatrix::from_rows`]) or from a [`Table`] through
//! [`FeatureMatrixBuilder`], which selects columns and drops incomplete rows.

use crate::error::{Error, Result};
use crate::table::{Table, Value};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Immutable `n × d` matrix of finite values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeatureMatrix {
    data: Array2<f64>,
    columns: Vec<String>,
    source_rows: Vec<usize>,
}

impl FeatureMatrix {
    /// Wrap an array, checking shape and finiteness.
    ///
    /// Columns are named `x0, x1, ...` and source rows are `0..n`.
    pub fn new(data: Array2<f64>) -> Result<Self> {
        let (n, d) = data.dim();
        let columns = (0..d).map(|j| format!("x{j}")).collect();
        Self::with_metadata(data, columns, (0..n).collect())
    }

    /// Build from row vectors.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        let d = rows.first().map_or(0, Vec::len);

        let mut flat = Vec::with_capacity(n * d);
        for row in rows {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let data = Array2::from_shape_vec((n, d), flat).map_err(|_| Error::DimensionMismatch {
            expected: n * d,
            found: rows.iter().map(Vec::len).sum(),
        })?;
        Self::new(data)
    }

    fn with_metadata(data: Array2<f64>, columns: Vec<String>, source_rows: Vec<usize>) -> Result<Self> {
        let (n, d) = data.dim();
        if n == 0 || d == 0 {
            return Err(Error::EmptyInput);
        }
        if let Some(((row, column), _)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::NonFiniteValue { row, column });
        }
        Ok(Self {
            data,
            columns,
            source_rows,
        })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Borrow the underlying array.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Borrow one row.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    /// Column names, in matrix order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// For each matrix row, the index of the table row it was taken from.
    pub fn source_rows(&self) -> &[usize] {
        &self.source_rows
    }

    /// Copy out one column.
    pub fn column_values(&self, j: usize) -> Vec<f64> {
        self.data.column(j).to_vec()
    }
}

/// Extracts a [`FeatureMatrix`] from selected table columns.
///
/// Rows with a missing value in any selected column are dropped. Text cells
/// in a selected column are rejected rather than coerced.
#[derive(Debug, Clone)]
pub struct FeatureMatrixBuilder {
    columns: Vec<String>,
    min_rows: usize,
    algorithm: &'static str,
}

impl FeatureMatrixBuilder {
    /// Select columns by name, in the order given.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            min_rows: 1,
            algorithm: "feature matrix",
        }
    }

    /// Name of the consumer, reported in errors.
    pub fn with_algorithm(mut self, algorithm: &'static str) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Require at least `min_rows` complete rows (clamped to 1).
    pub fn with_min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows.max(1);
        self
    }

    /// Extract the matrix.
    pub fn build(&self, table: &Table) -> Result<FeatureMatrix> {
        if self.columns.is_empty() {
            return Err(Error::EmptySelection);
        }

        let indices = self
            .columns
            .iter()
            .map(|name| table.column_index(name))
            .collect::<Result<Vec<_>>>()?;

        let d = indices.len();
        let mut flat = Vec::with_capacity(table.n_rows() * d);
        let mut source_rows = Vec::with_capacity(table.n_rows());

        'rows: for (i, row) in table.rows().iter().enumerate() {
            let start = flat.len();
            for (&j, name) in indices.iter().zip(&self.columns) {
                let cell = row.get(j).ok_or(Error::DimensionMismatch {
                    expected: table.columns().len(),
                    found: row.len(),
                })?;
                match cell {
                    Value::Text(_) => return Err(Error::NonNumericColumn(name.clone())),
                    cell => match cell.as_f64() {
                        Some(v) => flat.push(v),
                        None => {
                            flat.truncate(start);
                            continue 'rows;
                        }
                    },
                }
            }
            source_rows.push(i);
        }

        let n = source_rows.len();
        if n < self.min_rows {
            return Err(Error::InsufficientData {
                algorithm: self.algorithm,
                required: self.min_rows,
                found: n,
            });
        }

        tracing::debug!(
            rows = n,
            dropped = table.n_rows() - n,
            columns = d,
            "built feature matrix"
        );

        let data = Array2::from_shape_vec((n, d), flat).map_err(|_| Error::DimensionMismatch {
            expected: n * d,
            found: 0,
        })?;
        FeatureMatrix::with_metadata(data, self.columns.clone(), source_rows)
    }
}
