use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::table::{CategoricalTable, ResultTable};
use crate::error::{DashError, DashResult};

pub const DESCRIBE_COLUMNS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Raw dataset the model was fitted on.
///
/// Rows listed in `supplementary_rows` are shown in the data tab but excluded
/// from the dataset summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dataset {
    #[serde(default)]
    pub quantitative: Option<ResultTable>,
    #[serde(default)]
    pub qualitative: Option<CategoricalTable>,
    #[serde(default)]
    pub supplementary_rows: Vec<String>,
}

/// Histogram bins over a closed value range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    #[must_use]
    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.get(1)) {
            (Some(first), Some(second)) => second - first,
            _ => 0.0,
        }
    }
}

impl Dataset {
    pub fn validate(&self) -> DashResult<()> {
        if let Some(table) = &self.quantitative {
            table.validate()?;
        }
        if let Some(table) = &self.qualitative {
            table.validate()?;
        }
        Ok(())
    }

    fn is_active_row(&self, label: &str) -> bool {
        !self.supplementary_rows.iter().any(|row| row == label)
    }

    /// Quantitative values of `variable` keyed by row label, all rows included.
    #[must_use]
    pub fn quantitative_values(&self, variable: &str) -> Option<IndexMap<String, f64>> {
        let table = self.quantitative.as_ref()?;
        let position = table.columns.iter().position(|name| name == variable)?;
        Some(
            table
                .index
                .iter()
                .zip(&table.data)
                .map(|(label, cells)| (label.clone(), cells[position]))
                .collect(),
        )
    }

    /// Categories of `variable` keyed by row label, all rows included.
    #[must_use]
    pub fn qualitative_values(&self, variable: &str) -> Option<IndexMap<String, String>> {
        let table = self.qualitative.as_ref()?;
        let position = table.column_position(variable)?;
        Some(
            table
                .index
                .iter()
                .zip(&table.data)
                .map(|(label, cells)| (label.clone(), cells[position].clone()))
                .collect(),
        )
    }

    fn active_column(&self, variable: &str) -> DashResult<Vec<f64>> {
        let table = self
            .quantitative
            .as_ref()
            .ok_or_else(|| DashError::Configuration("dataset has no quantitative columns".to_owned()))?;
        let position = table
            .columns
            .iter()
            .position(|name| name == variable)
            .ok_or_else(|| {
                DashError::Configuration(format!("dataset has no quantitative variable `{variable}`"))
            })?;
        Ok(table
            .index
            .iter()
            .zip(&table.data)
            .filter(|(label, _)| self.is_active_row(label))
            .map(|(_, cells)| cells[position])
            .filter(|value| value.is_finite())
            .collect())
    }

    /// Descriptive statistics of the active rows, one row per quantitative variable.
    pub fn describe(&self) -> DashResult<ResultTable> {
        let table = self
            .quantitative
            .as_ref()
            .ok_or_else(|| DashError::Configuration("dataset has no quantitative columns".to_owned()))?;
        let mut data = Vec::with_capacity(table.columns.len());
        for variable in &table.columns {
            let mut values = self.active_column(variable)?;
            values.sort_by(f64::total_cmp);
            let (mean, std) = mean_and_std(&values);
            data.push(vec![
                values.len() as f64,
                mean,
                std,
                values.first().copied().unwrap_or(f64::NAN),
                quantile(&values, 0.25),
                quantile(&values, 0.5),
                quantile(&values, 0.75),
                values.last().copied().unwrap_or(f64::NAN),
            ]);
        }
        ResultTable::new(
            table.columns.clone(),
            DESCRIBE_COLUMNS.iter().map(|name| (*name).to_owned()).collect(),
            data,
        )
    }

    /// Pearson correlation matrix of the quantitative variables over active rows.
    pub fn correlation_matrix(&self) -> DashResult<ResultTable> {
        let table = self
            .quantitative
            .as_ref()
            .ok_or_else(|| DashError::Configuration("dataset has no quantitative columns".to_owned()))?;
        let rows: Vec<&Vec<f64>> = table
            .index
            .iter()
            .zip(&table.data)
            .filter(|(label, _)| self.is_active_row(label))
            .map(|(_, cells)| cells)
            .collect();
        let width = table.columns.len();
        let mut data = vec![vec![f64::NAN; width]; width];
        for i in 0..width {
            for j in i..width {
                let pairs: Vec<(f64, f64)> = rows
                    .iter()
                    .map(|cells| (cells[i], cells[j]))
                    .filter(|(a, b)| a.is_finite() && b.is_finite())
                    .collect();
                let r = pearson(&pairs);
                data[i][j] = r;
                data[j][i] = r;
            }
        }
        ResultTable::new(table.columns.clone(), table.columns.clone(), data)
    }

    /// Bins the active values of `variable`. `bins = None` uses Sturges' rule.
    pub fn histogram(&self, variable: &str, bins: Option<usize>) -> DashResult<Histogram> {
        let values = self.active_column(variable)?;
        if values.is_empty() {
            return Err(DashError::InvalidData(format!(
                "variable `{variable}` has no finite values"
            )));
        }
        let bins = bins
            .unwrap_or_else(|| (values.len() as f64).log2().ceil() as usize + 1)
            .max(1);
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        let (min, max) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
        let width = (max - min) / bins as f64;
        let edges = (0..=bins).map(|i| min + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for value in values {
            let slot = (((value - min) / width) as usize).min(bins - 1);
            counts[slot] += 1;
        }
        Ok(Histogram { edges, counts })
    }

    /// Gaussian kernel density of `variable` sampled at `samples` evenly spaced points.
    pub fn density(&self, variable: &str, samples: usize) -> DashResult<Vec<(f64, f64)>> {
        let values = self.active_column(variable)?;
        Ok(gaussian_density(&values, samples))
    }

    /// Category frequencies of a qualitative variable over active rows, in first-seen order.
    pub fn category_counts(&self, variable: &str) -> DashResult<IndexMap<String, usize>> {
        let table = self
            .qualitative
            .as_ref()
            .ok_or_else(|| DashError::Configuration("dataset has no qualitative columns".to_owned()))?;
        let position = table.column_position(variable).ok_or_else(|| {
            DashError::Configuration(format!("dataset has no qualitative variable `{variable}`"))
        })?;
        let mut counts = IndexMap::new();
        for (label, cells) in table.index.iter().zip(&table.data) {
            if self.is_active_row(label) {
                *counts.entry(cells[position].clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, f64::NAN);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let position = q * (len - 1) as f64;
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let fraction = position - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

fn pearson(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (a, b) in pairs {
        cov += (a - mean_a) * (b - mean_b);
        var_a += (a - mean_a).powi(2);
        var_b += (b - mean_b).powi(2);
    }
    let denominator = (var_a * var_b).sqrt();
    if denominator == 0.0 {
        f64::NAN
    } else {
        cov / denominator
    }
}

fn gaussian_density(values: &[f64], samples: usize) -> Vec<(f64, f64)> {
    let (_, std) = mean_and_std(values);
    if values.len() < 2 || !std.is_finite() || std == 0.0 || samples < 2 {
        return Vec::new();
    }
    let n = values.len() as f64;
    // Silverman's rule of thumb.
    let bandwidth = 1.06 * std * n.powf(-0.2);
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let (start, end) = (min - 3.0 * bandwidth, max + 3.0 * bandwidth);
    let step = (end - start) / (samples - 1) as f64;
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    (0..samples)
        .map(|i| {
            let x = start + step * i as f64;
            let y = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            (x, y)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn dataset() -> Dataset {
        let index: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| (*s).to_owned()).collect();
        Dataset {
            quantitative: Some(
                ResultTable::from_columns(
                    index.clone(),
                    vec![
                        ("x".to_owned(), vec![1.0, 2.0, 3.0, 4.0, 100.0]),
                        ("y".to_owned(), vec![2.0, 4.0, 6.0, 8.0, -1.0]),
                    ],
                )
                .expect("table"),
            ),
            qualitative: Some(CategoricalTable {
                index,
                columns: vec!["g".to_owned()],
                data: ["u", "v", "u", "u", "v"]
                    .iter()
                    .map(|s| vec![(*s).to_owned()])
                    .collect(),
            }),
            supplementary_rows: vec!["e".to_owned()],
        }
    }

    #[test]
    fn describe_skips_supplementary_rows() {
        let summary = dataset().describe().expect("describe");
        assert_eq!(summary.index, vec!["x".to_owned(), "y".to_owned()]);
        assert_relative_eq!(summary.data[0][0], 4.0);
        assert_relative_eq!(summary.data[0][1], 2.5);
        assert_relative_eq!(summary.data[0][5], 2.5);
        assert_relative_eq!(summary.data[0][7], 4.0);
    }

    #[test]
    fn correlation_of_linear_columns_is_one() {
        let corr = dataset().correlation_matrix().expect("corr");
        assert_relative_eq!(corr.data[0][1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(corr.data[1][1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn histogram_counts_every_active_value() {
        let histogram = dataset().histogram("x", Some(3)).expect("histogram");
        assert_eq!(histogram.total(), 4);
        assert_eq!(histogram.edges.len(), 4);
    }

    #[test]
    fn category_counts_follow_first_seen_order() {
        let counts = dataset().category_counts("g").expect("counts");
        assert_eq!(counts.get("u"), Some(&3));
        assert_eq!(counts.get("v"), Some(&1));
        assert_eq!(counts.keys().next().map(String::as_str), Some("u"));
    }

    #[test]
    fn unknown_variable_is_a_configuration_error() {
        let err = dataset().histogram("nope", None).expect_err("missing");
        assert!(err.is_configuration());
    }
}
