use serde::{Deserialize, Serialize};

use crate::core::{CategoricalTable, ResultTable};
use crate::error::{DashError, DashResult};

/// Rows kept by the `head` and `tail` policies.
pub const PREVIEW_ROWS: usize = 5;
const DISPLAY_DECIMALS: i32 = 4;

/// Display-length policy of a result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayLength {
    #[default]
    Head,
    Tail,
    All,
}

impl DisplayLength {
    pub const ALL: [Self; 3] = [Self::Head, Self::Tail, Self::All];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Tail => "tail",
            Self::All => "all",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Head => "Head",
            Self::Tail => "Tail",
            Self::All => "All",
        }
    }

    pub fn from_code(code: &str) -> DashResult<Self> {
        Self::ALL
            .into_iter()
            .find(|length| length.code() == code)
            .ok_or_else(|| DashError::InvalidData(format!("unknown display length `{code}`")))
    }

    /// Row range kept from a table of `rows` rows.
    #[must_use]
    pub fn range(self, rows: usize) -> std::ops::Range<usize> {
        match self {
            Self::Head => 0..rows.min(PREVIEW_ROWS),
            Self::Tail => rows.saturating_sub(PREVIEW_ROWS)..rows,
            Self::All => 0..rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// Rounds to four decimals; non-finite values display as missing.
    #[must_use]
    pub fn number(value: f64) -> Self {
        if !value.is_finite() {
            return Self::Missing;
        }
        let factor = 10f64.powi(DISPLAY_DECIMALS);
        Self::Number((value * factor).round() / factor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub label: String,
    pub cells: Vec<CellValue>,
}

/// Display-ready table with its length policy applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTable {
    pub row_header: String,
    pub columns: Vec<String>,
    pub rows: Vec<DisplayRow>,
    /// Per-column filter controls are shown in the browser.
    pub filter: bool,
    /// Row count before truncation.
    pub total_rows: usize,
}

impl DisplayTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row_labels(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.label.as_str()).collect()
    }

    /// Applies another policy to an already formatted table.
    #[must_use]
    pub fn reformat(&self, length: DisplayLength, filter: bool) -> Self {
        Self {
            row_header: self.row_header.clone(),
            columns: self.columns.clone(),
            rows: self.rows[length.range(self.rows.len())].to_vec(),
            filter,
            total_rows: self.total_rows,
        }
    }
}

/// Formats a result table for display without touching the source.
#[must_use]
pub fn format_table(
    table: &ResultTable,
    length: DisplayLength,
    filter: bool,
    row_header: &str,
) -> DisplayTable {
    let rows = length
        .range(table.len())
        .map(|row| DisplayRow {
            label: table.index[row].clone(),
            cells: table.data[row].iter().copied().map(CellValue::number).collect(),
        })
        .collect();

    DisplayTable {
        row_header: row_header.to_owned(),
        columns: table.columns.clone(),
        rows,
        filter,
        total_rows: table.len(),
    }
}

/// Joins quantitative and qualitative columns of the raw data by row label.
///
/// Rows are ordered as in the quantitative table, falling back to the
/// qualitative one when the dataset has no numeric columns.
#[must_use]
pub fn format_dataset(
    quantitative: Option<&ResultTable>,
    qualitative: Option<&CategoricalTable>,
    length: DisplayLength,
    filter: bool,
) -> DisplayTable {
    let labels: Vec<String> = quantitative
        .map(|table| table.index.clone())
        .or_else(|| qualitative.map(|table| table.index.clone()))
        .unwrap_or_default();

    let mut columns = Vec::new();
    if let Some(table) = quantitative {
        columns.extend(table.columns.iter().cloned());
    }
    if let Some(table) = qualitative {
        columns.extend(table.columns.iter().cloned());
    }

    let rows = length
        .range(labels.len())
        .map(|row| {
            let label = &labels[row];
            let mut cells = Vec::with_capacity(columns.len());
            if let Some(table) = quantitative {
                cells.extend(table.data[row].iter().copied().map(CellValue::number));
            }
            if let Some(table) = qualitative {
                let position = table.index.iter().position(|candidate| candidate == label);
                for column in 0..table.columns.len() {
                    cells.push(
                        position
                            .and_then(|row| table.data.get(row))
                            .and_then(|values| values.get(column))
                            .map_or(CellValue::Missing, |value| CellValue::Text(value.clone())),
                    );
                }
            }
            DisplayRow {
                label: label.clone(),
                cells,
            }
        })
        .collect();

    DisplayTable {
        row_header: String::new(),
        columns,
        rows,
        filter,
        total_rows: labels.len(),
    }
}
