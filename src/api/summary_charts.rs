use serde::{Deserialize, Serialize};

use crate::api::chart::{BarPlot, Chart, ChartBar, ChartBody, Heatmap};
use crate::core::{Dataset, ResultTable};
use crate::error::{DashError, DashResult};
use crate::render::Color;

const DENSITY_SAMPLES: usize = 128;

/// Histogram of one quantitative variable.
///
/// With `density`, bar heights are densities and the kernel density estimate
/// is overlaid.
pub fn histogram_chart(
    dataset: &Dataset,
    variable: &str,
    density: bool,
    color: Color,
) -> DashResult<Chart> {
    let histogram = dataset.histogram(variable, None)?;
    let width = histogram.bin_width();
    let total = histogram.total() as f64;
    let scale = if density && total > 0.0 && width > 0.0 {
        1.0 / (total * width)
    } else {
        1.0
    };

    let bars = histogram
        .counts
        .iter()
        .zip(histogram.edges.windows(2))
        .map(|(count, edges)| ChartBar {
            label: format!("{:.2}", (edges[0] + edges[1]) / 2.0),
            value: *count as f64 * scale,
            color,
        })
        .collect();

    let curve = if density && width > 0.0 {
        let start = histogram.edges.first().copied().unwrap_or(0.0);
        dataset
            .density(variable, DENSITY_SAMPLES)?
            .into_iter()
            .map(|(x, y)| ((x - start) / width - 0.5, y))
            .collect()
    } else {
        Vec::new()
    };

    Ok(Chart {
        title: format!("Histogram of {variable}"),
        x_title: variable.to_owned(),
        y_title: if density { "Density" } else { "Count" }.to_owned(),
        text_size: 8.0,
        body: ChartBody::Bars(BarPlot {
            bars,
            bar_width: 1.0,
            reference_line: None,
            grid: true,
            show_values: false,
            curve,
            curve_color: Color::rgb(0.8, 0.1, 0.1),
        }),
    })
}

/// Frequencies of the categories of one qualitative variable.
pub fn category_chart(dataset: &Dataset, variable: &str, color: Color) -> DashResult<Chart> {
    let counts = dataset.category_counts(variable)?;
    Ok(Chart {
        title: format!("Distribution of {variable}"),
        x_title: variable.to_owned(),
        y_title: "Count".to_owned(),
        text_size: 8.0,
        body: ChartBody::Bars(BarPlot {
            bars: counts
                .into_iter()
                .map(|(label, count)| ChartBar {
                    label,
                    value: count as f64,
                    color,
                })
                .collect(),
            bar_width: 0.7,
            reference_line: None,
            grid: true,
            show_values: true,
            curve: Vec::new(),
            curve_color: color,
        }),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapOptions {
    pub title: String,
    pub low: Color,
    pub mid: Color,
    pub high: Color,
    pub border: Color,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            low: Color::rgb(0.0, 0.0, 1.0),
            mid: Color::WHITE,
            high: Color::rgb(1.0, 0.0, 0.0),
            border: Color::rgb(0.5, 0.5, 0.5),
        }
    }
}

/// Heat map of a whole table.
///
/// Tables with negative values get a range symmetric around zero; others
/// span `[0, max]`.
pub fn heatmap_chart(table: &ResultTable, options: &HeatmapOptions) -> DashResult<Chart> {
    if table.is_empty() || table.column_count() == 0 {
        return Err(DashError::InvalidData("cannot draw a heat map of an empty table".to_owned()));
    }
    let (min, max) = table
        .data
        .iter()
        .flatten()
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let (min, max) = if !min.is_finite() {
        (0.0, 1.0)
    } else if min < 0.0 {
        let bound = min.abs().max(max.abs());
        (-bound, bound)
    } else {
        (0.0, if max > 0.0 { max } else { 1.0 })
    };

    Ok(Chart {
        title: options.title.clone(),
        x_title: String::new(),
        y_title: String::new(),
        text_size: 8.0,
        body: ChartBody::Heatmap(Heatmap {
            rows: table.index.clone(),
            columns: table.columns.clone(),
            values: table.data.clone(),
            min,
            max,
            low: options.low,
            mid: options.mid,
            high: options.high,
            border: options.border,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_range_is_symmetric() {
        let table = ResultTable::new(
            vec!["a".into(), "b".into()],
            vec!["a".into(), "b".into()],
            vec![vec![1.0, -0.5], vec![-0.5, 1.0]],
        )
        .expect("table");
        let chart = heatmap_chart(&table, &HeatmapOptions::default()).expect("chart");
        match chart.body {
            ChartBody::Heatmap(heatmap) => assert_eq!((heatmap.min, heatmap.max), (-1.0, 1.0)),
            other => panic!("unexpected body: {other:?}"),
        }
    }
}
