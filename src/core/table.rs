use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DashError, DashResult};

/// Numeric result table in pandas "split" layout.
///
/// `index` holds row labels, `columns` the column labels and `data` the
/// row-major values. Missing cells arrive as JSON `null` and are stored as NaN.
/// Tables are never mutated once a model is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResultTable {
    pub index: Vec<String>,
    pub columns: Vec<String>,
    #[serde(deserialize_with = "nullable_matrix")]
    pub data: Vec<Vec<f64>>,
}

fn nullable_matrix<'de, D>(deserializer: D) -> Result<Vec<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Vec::<Vec<Option<f64>>>::deserialize(deserializer)?;
    Ok(rows
        .into_iter()
        .map(|cells| cells.into_iter().map(|cell| cell.unwrap_or(f64::NAN)).collect())
        .collect())
}

impl ResultTable {
    pub fn new(index: Vec<String>, columns: Vec<String>, data: Vec<Vec<f64>>) -> DashResult<Self> {
        let table = Self {
            index,
            columns,
            data,
        };
        table.validate()?;
        Ok(table)
    }

    /// Builds a table from column vectors. Every column must have `index.len()` values.
    pub fn from_columns(
        index: Vec<String>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> DashResult<Self> {
        let mut names = Vec::with_capacity(columns.len());
        let mut data = vec![Vec::with_capacity(columns.len()); index.len()];
        for (name, values) in columns {
            if values.len() != index.len() {
                return Err(DashError::InvalidData(format!(
                    "column `{name}` has {} values, expected {}",
                    values.len(),
                    index.len()
                )));
            }
            for (row, value) in data.iter_mut().zip(values) {
                row.push(value);
            }
            names.push(name);
        }
        Self::new(index, names, data)
    }

    pub fn validate(&self) -> DashResult<()> {
        if self.index.len() != self.data.len() {
            return Err(DashError::InvalidData(format!(
                "table has {} row labels but {} rows",
                self.index.len(),
                self.data.len()
            )));
        }
        if let Some((row, cells)) = self
            .data
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != self.columns.len())
        {
            return Err(DashError::InvalidData(format!(
                "row {row} has {} cells, expected {}",
                cells.len(),
                self.columns.len()
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.data.get(row).and_then(|cells| cells.get(column)).copied()
    }

    /// Values of the column at `column`, one per row.
    pub fn column(&self, column: usize) -> DashResult<Vec<f64>> {
        if column >= self.columns.len() {
            return Err(DashError::InvalidData(format!(
                "column {column} out of range (table has {})",
                self.columns.len()
            )));
        }
        Ok(self.data.iter().map(|cells| cells[column]).collect())
    }

    /// Case-insensitive column lookup.
    #[must_use]
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
    }

    pub fn column_by_name(&self, name: &str) -> DashResult<Vec<f64>> {
        let position = self
            .column_position(name)
            .ok_or_else(|| DashError::InvalidData(format!("table has no column `{name}`")))?;
        self.column(position)
    }

    #[must_use]
    pub fn row_position(&self, label: &str) -> Option<usize> {
        self.index.iter().position(|candidate| candidate == label)
    }

    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.len());
        Self {
            index: self.index[..n].to_vec(),
            columns: self.columns.clone(),
            data: self.data[..n].to_vec(),
        }
    }

    #[must_use]
    pub fn tail(&self, n: usize) -> Self {
        let start = self.len() - n.min(self.len());
        Self {
            index: self.index[start..].to_vec(),
            columns: self.columns.clone(),
            data: self.data[start..].to_vec(),
        }
    }
}

/// String-valued table holding qualitative columns of the raw dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CategoricalTable {
    pub index: Vec<String>,
    pub columns: Vec<String>,
    pub data: Vec<Vec<String>>,
}

impl CategoricalTable {
    pub fn validate(&self) -> DashResult<()> {
        if self.index.len() != self.data.len() {
            return Err(DashError::InvalidData(format!(
                "categorical table has {} row labels but {} rows",
                self.index.len(),
                self.data.len()
            )));
        }
        if self
            .data
            .iter()
            .any(|cells| cells.len() != self.columns.len())
        {
            return Err(DashError::InvalidData(
                "categorical table rows must match the column count".to_owned(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|candidate| candidate == name)
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let position = self.column_position(name)?;
        Some(
            self.data
                .iter()
                .map(|cells| cells[position].as_str())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("r{i}")).collect()
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = ResultTable::new(
            labels(2),
            vec!["a".to_owned(), "b".to_owned()],
            vec![vec![1.0, 2.0], vec![3.0]],
        )
        .expect_err("ragged");
        assert!(matches!(err, DashError::InvalidData(_)));
    }

    #[test]
    fn head_and_tail_are_bounded_by_row_count() {
        let table = ResultTable::from_columns(labels(3), vec![("x".to_owned(), vec![1.0, 2.0, 3.0])])
            .expect("table");
        assert_eq!(table.head(10).len(), 3);
        assert_eq!(table.tail(2).index, vec!["r1".to_owned(), "r2".to_owned()]);
        assert_eq!(table.column_by_name("X").expect("column"), vec![1.0, 2.0, 3.0]);
    }
}
