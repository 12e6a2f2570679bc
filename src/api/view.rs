use serde::{Deserialize, Serialize};

use crate::api::chart::Chart;
use crate::api::table_format::DisplayTable;
use crate::error::DashError;

/// Derived content of one output slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum View {
    Table(DisplayTable),
    Chart(Chart),
    Modal(ModalView),
    Text(String),
}

impl View {
    #[must_use]
    pub fn as_chart(&self) -> Option<&Chart> {
        match self {
            Self::Chart(chart) => Some(chart),
            Self::Modal(modal) => Some(&modal.chart),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_table(&self) -> Option<&DisplayTable> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Chart(_) => "chart",
            Self::Modal(_) => "modal",
            Self::Text(_) => "text",
        }
    }
}

/// Dialog opened by an action button around a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalView {
    pub title: String,
    pub visible: bool,
    pub presses: i64,
    pub chart: Chart,
}

/// Failure recorded in an output slot instead of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewError {
    pub message: String,
    pub configuration: bool,
}

impl From<&DashError> for ViewError {
    fn from(err: &DashError) -> Self {
        Self {
            message: err.to_string(),
            configuration: err.is_configuration(),
        }
    }
}

pub type ViewSlot = Result<View, ViewError>;
