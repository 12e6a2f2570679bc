use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::api::chart::{BarPlot, Chart, ChartBar, ChartBody, ReferenceLine};
use crate::core::{EntityKind, FittedModel, Measure, ResultTable};
use crate::error::{DashError, DashResult};
use crate::render::Color;

/// Eigenvalues drawn by the scree plot at most.
pub const SCREE_MAX_BARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChartOptions {
    pub dimension: usize,
    pub top_n: usize,
    pub color: Color,
    /// Fraction of each band filled by its bar, in `(0, 1]`.
    pub bar_width: f64,
    pub title: Option<String>,
    /// Dashed horizontal line, such as the expected average contribution.
    pub reference_line: Option<f64>,
    pub grid: bool,
}

impl Default for BarChartOptions {
    fn default() -> Self {
        Self {
            dimension: 0,
            top_n: 10,
            color: Color::rgb(0.275, 0.51, 0.706),
            bar_width: 0.5,
            title: None,
            reference_line: None,
            grid: true,
        }
    }
}

/// Sorts one column of `table` in descending order and keeps the top N.
///
/// A top N beyond the row count keeps every row. Missing values are dropped.
pub fn build_bar_chart(
    table: &ResultTable,
    entity: EntityKind,
    measure: Measure,
    options: &BarChartOptions,
) -> DashResult<Chart> {
    if options.dimension >= table.column_count() {
        return Err(DashError::InvalidData(format!(
            "dimension {} is outside the {} available columns",
            options.dimension + 1,
            table.column_count()
        )));
    }
    if !(options.bar_width > 0.0 && options.bar_width <= 1.0) {
        return Err(DashError::InvalidData(format!(
            "bar width must be in (0, 1], got {}",
            options.bar_width
        )));
    }

    let column = table.column(options.dimension)?;
    let mut ranked: Vec<(&String, f64)> = table
        .index
        .iter()
        .zip(column)
        .filter(|(_, value)| value.is_finite())
        .collect();
    ranked.sort_by_key(|(_, value)| Reverse(OrderedFloat(*value)));
    ranked.truncate(options.top_n.min(ranked.len()));

    let dimension_name = format!("Dim-{}", options.dimension + 1);
    let title = options.title.clone().unwrap_or_else(|| match measure {
        Measure::Contrib => format!("Contribution of {} to {dimension_name}", entity.label().to_lowercase()),
        Measure::Cos2 => format!("Cos2 of {} to {dimension_name}", entity.label().to_lowercase()),
        other => format!("{} of {} on {dimension_name}", other.label(), entity.label().to_lowercase()),
    });
    let y_title = match measure {
        Measure::Contrib => "Contributions (%)".to_owned(),
        Measure::Cos2 => "Cos2 - Quality of representation".to_owned(),
        other => other.label().to_owned(),
    };

    Ok(Chart {
        title,
        x_title: String::new(),
        y_title,
        text_size: 8.0,
        body: ChartBody::Bars(BarPlot {
            bars: ranked
                .into_iter()
                .map(|(label, value)| ChartBar {
                    label: label.clone(),
                    value,
                    color: options.color,
                })
                .collect(),
            bar_width: options.bar_width,
            reference_line: options.reference_line.map(|value| ReferenceLine {
                value,
                color: Color::rgb(1.0, 0.0, 0.0),
            }),
            grid: options.grid,
            show_values: false,
            curve: Vec::new(),
            curve_color: options.color,
        }),
    })
}

/// Average contribution one row would have if all rows contributed equally.
#[must_use]
pub fn expected_contribution(rows: usize) -> Option<f64> {
    (rows > 0).then(|| 100.0 / rows as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScreeChoice {
    Eigenvalue,
    #[default]
    Proportion,
}

impl ScreeChoice {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Eigenvalue => "eigenvalue",
            Self::Proportion => "proportion",
        }
    }

    pub fn from_code(code: &str) -> DashResult<Self> {
        match code {
            "eigenvalue" => Ok(Self::Eigenvalue),
            "proportion" => Ok(Self::Proportion),
            other => Err(DashError::InvalidData(format!("unknown scree choice `{other}`"))),
        }
    }
}

/// Scree plot of the eigenvalues, with a line through the bar tops.
pub fn build_scree_plot(model: &FittedModel, choice: ScreeChoice, show_values: bool) -> DashResult<Chart> {
    let column = match choice {
        ScreeChoice::Eigenvalue => model.eig.column_position("eigenvalue").unwrap_or(0),
        ScreeChoice::Proportion => model.eig.column_position("proportion").ok_or_else(|| {
            DashError::Configuration("eigenvalue table has no proportion column".to_owned())
        })?,
    };
    let values = model.eig.column(column)?;
    let color = Color::rgb(0.275, 0.51, 0.706);
    let bars: Vec<ChartBar> = values
        .iter()
        .take(SCREE_MAX_BARS)
        .enumerate()
        .map(|(dimension, value)| ChartBar {
            label: (dimension + 1).to_string(),
            value: *value,
            color,
        })
        .collect();
    let curve = bars
        .iter()
        .enumerate()
        .map(|(position, bar)| (position as f64, bar.value))
        .collect();

    Ok(Chart {
        title: "Scree plot".to_owned(),
        x_title: "Dimensions".to_owned(),
        y_title: match choice {
            ScreeChoice::Eigenvalue => "Eigenvalue".to_owned(),
            ScreeChoice::Proportion => "Percentage of explained variances".to_owned(),
        },
        text_size: 8.0,
        body: ChartBody::Bars(BarPlot {
            bars,
            bar_width: 0.8,
            reference_line: None,
            grid: true,
            show_values,
            curve,
            curve_color: Color::BLACK,
        }),
    })
}
