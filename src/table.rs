//! In-memory tabular input.
//!
//! A [`Table`] is what an ingestion layer (CSV reader, dataframe bridge, UI
//! upload) hands to the engine: named columns and rows of heterogeneous
//! [`Value`] cells. The engine never parses files itself.
//!
//! ```rust
//! use cohort::table::{Table, Value};
//!
//! let table = Table::new(
//!     vec!["Person".into(), "Sleep Duration".into()],
//!     vec![
//!         vec![Value::from("a"), Value::from(6.1)],
//!         vec![Value::from("b"), Value::Missing],
//!         vec![Value::from("c"), Value::from(7.8)],
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(table.numeric_columns(), vec!["Sleep Duration"]);
//! let summary = &table.describe(&["Sleep Duration"]).unwrap()[0];
//! assert_eq!(summary.count, 2);
//! ```

use crate::error::{Error, Result};

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Numeric cell. NaN and infinities count as missing.
    Number(f64),
    /// Text cell.
    Text(String),
    /// Empty cell.
    Missing,
}

impl Value {
    /// Finite numeric content, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Whether the cell carries no usable value.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Number(v) => !v.is_finite(),
            Value::Text(_) => false,
            Value::Missing => true,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

/// Named columns over rows of [`Value`]s.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawTable"))]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Unchecked wire form of [`Table`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawTable> for Table {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        Table::new(raw.columns, raw.rows)
    }
}

impl Table {
    /// Create a table, checking every row has one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(Error::DimensionMismatch {
                expected: columns.len(),
                found: row.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Column names in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Iterate over the cells of one column.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Columns usable as features: at least one number and no text cells.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|&(j, _)| {
                let mut seen_number = false;
                for row in &self.rows {
                    match &row[j] {
                        Value::Text(_) => return false,
                        Value::Number(v) if v.is_finite() => seen_number = true,
                        _ => {}
                    }
                }
                seen_number
            })
            .map(|(_, c)| c.as_str())
            .collect()
    }

    /// Summary statistics for the named numeric columns.
    ///
    /// Missing cells are skipped; text cells are an error.
    pub fn describe<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<ColumnSummary>> {
        columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let mut values = Vec::with_capacity(self.rows.len());
                for cell in self.column(name)? {
                    match cell {
                        Value::Text(_) => return Err(Error::NonNumericColumn(name.to_string())),
                        other => values.extend(other.as_f64()),
                    }
                }
                Ok(ColumnSummary::from_values(name, values))
            })
            .collect()
    }
}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ColumnSummary {
    /// Column name.
    pub name: String,
    /// Non-missing cells.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1 denominator).
    pub std: Option<f64>,
    /// Minimum.
    pub min: Option<f64>,
    /// 25th percentile.
    pub q25: Option<f64>,
    /// Median.
    pub median: Option<f64>,
    /// 75th percentile.
    pub q75: Option<f64>,
    /// Maximum.
    pub max: Option<f64>,
}

impl ColumnSummary {
    fn from_values(name: &str, mut values: Vec<f64>) -> Self {
        let count = values.len();
        values.sort_by(f64::total_cmp);

        let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
        let std = mean.filter(|_| count > 1).map(|m| {
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        Self {
            name: name.to_string(),
            count,
            mean,
            std,
            min: values.first().copied(),
            q25: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q75: quantile(&values, 0.75),
            max: values.last().copied(),
        }
    }
}

/// Linear-interpolation quantile over sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sleep_table() -> Table {
        Table::new(
            vec!["Gender".into(), "Age".into(), "Stress Level".into()],
            vec![
                vec!["Male".into(), 27.0.into(), 6.0.into()],
                vec!["Female".into(), 28.0.into(), Value::Missing],
                vec!["Male".into(), 29.0.into(), 8.0.into()],
                vec!["Female".into(), f64::NAN.into(), 4.0.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.0.into(), 2.0.into()], vec![1.0.into()]],
        );
        assert_eq!(
            result.unwrap_err(),
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_checks_row_lengths() {
        let ragged = serde_json::from_str::<Table>(r#"{"columns":["a","b"],"rows":[[1.0,2.0],[3.0]]}"#);
        let err = ragged.unwrap_err().to_string();
        assert!(err.contains("dimension mismatch"), "{err}");

        let table: Table =
            serde_json::from_str(r#"{"columns":["a","b"],"rows":[[1.0,null],[3.0,4.0]]}"#).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.rows()[0][1], Value::Missing);
    }

    #[test]
    fn test_numeric_columns_skip_text() {
        let table = sleep_table();
        assert_eq!(table.numeric_columns(), vec!["Age", "Stress Level"]);
    }

    #[test]
    fn test_all_missing_column_is_not_numeric() {
        let table = Table::new(
            vec!["empty".into()],
            vec![vec![Value::Missing], vec![Value::Number(f64::NAN)]],
        )
        .unwrap();
        assert!(table.numeric_columns().is_empty());
    }

    #[test]
    fn test_describe_skips_missing() {
        let table = sleep_table();
        let summary = table.describe(&["Age", "Stress Level"]).unwrap();

        assert_eq!(summary[0].count, 3);
        assert!((summary[0].mean.unwrap() - 28.0).abs() < 1e-12);
        assert!((summary[0].std.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(summary[0].min, Some(27.0));
        assert_eq!(summary[0].median, Some(28.0));
        assert_eq!(summary[0].q25, Some(27.5));
        assert_eq!(summary[0].max, Some(29.0));

        assert_eq!(summary[1].count, 3);
        assert_eq!(summary[1].median, Some(6.0));
    }

    #[test]
    fn test_describe_rejects_text_and_unknown() {
        let table = sleep_table();
        assert_eq!(
            table.describe(&["Gender"]).unwrap_err(),
            Error::NonNumericColumn("Gender".into())
        );
        assert_eq!(
            table.describe(&["Heart Rate"]).unwrap_err(),
            Error::UnknownColumn("Heart Rate".into())
        );
    }

    #[test]
    fn test_single_value_has_no_std() {
        let table = Table::new(vec!["x".into()], vec![vec![3.0.into()]]).unwrap();
        let summary = &table.describe(&["x"]).unwrap()[0];
        assert_eq!(summary.std, None);
        assert_eq!(summary.q75, Some(3.0));
    }
}
