use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::api::chart::{
    Chart, ChartArrow, ChartBody, ChartPoint, ColorGradient, LegendEntry, PointGroup, ScatterPlot,
};
use crate::core::{AxisPair, EntityKind, FittedModel, Measure, ResultTable};
use crate::error::{DashError, DashResult};
use crate::render::Color;

const MISSING_VALUE_COLOR: Color = Color::rgb(0.6, 0.6, 0.6);

/// Which points of the active group get a text label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "by", content = "min", rename_all = "snake_case")]
pub enum LabelFilter {
    #[default]
    None,
    /// Summed cos2 on the two plotted axes.
    Cos2(f64),
    /// Contribution to the plane, in percent.
    Contrib(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "variable", rename_all = "snake_case")]
pub enum ColorMode {
    /// Active and supplementary groups in their own colors.
    #[default]
    Status,
    Cos2,
    Contrib,
    Quantitative(String),
    Qualitative(String),
}

impl ColorMode {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Cos2 => "cos2",
            Self::Contrib => "contrib",
            Self::Quantitative(_) => "quanti",
            Self::Qualitative(_) => "quali",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapColors {
    pub active: Color,
    pub supplementary: Color,
    pub categories: Color,
}

impl Default for MapColors {
    fn default() -> Self {
        Self {
            active: Color::BLACK,
            supplementary: Color::rgb(0.0, 0.0, 1.0),
            categories: Color::rgb(1.0, 0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorMapOptions {
    pub active: EntityKind,
    #[serde(default)]
    pub supplementary: Vec<EntityKind>,
    /// Draw the active entities as vectors inside the unit circle.
    #[serde(default)]
    pub arrows: bool,
    pub axes: AxisPair,
    pub title: String,
    pub text_size: f64,
    pub repel: bool,
    #[serde(default)]
    pub label_filter: LabelFilter,
    #[serde(default)]
    pub color_mode: ColorMode,
    #[serde(default)]
    pub colors: MapColors,
}

impl FactorMapOptions {
    #[must_use]
    pub fn new(active: EntityKind, axes: AxisPair) -> Self {
        Self {
            active,
            supplementary: Vec::new(),
            arrows: false,
            axes,
            title: format!("{} factor map", active.label()),
            text_size: 8.0,
            repel: true,
            label_filter: LabelFilter::None,
            color_mode: ColorMode::Status,
            colors: MapColors::default(),
        }
    }

    #[must_use]
    pub fn with_supplementary(mut self, supplementary: Vec<EntityKind>) -> Self {
        self.supplementary = supplementary;
        self
    }

    #[must_use]
    pub fn with_arrows(mut self, arrows: bool) -> Self {
        self.arrows = arrows;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_label_filter(mut self, label_filter: LabelFilter) -> Self {
        self.label_filter = label_filter;
        self
    }

    #[must_use]
    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }
}

/// Per-point coloring resolved from the color mode.
enum Coloring {
    Fixed,
    Gradient(ColorGradient, Vec<f64>),
    Categories(IndexMap<String, Color>, Vec<Option<String>>),
}

/// Builds the factor map of `options.active` on the selected plane.
///
/// All rows with finite coordinates are plotted; the label filter only
/// decides which of them carry text.
pub fn build_factor_map(model: &FittedModel, options: &FactorMapOptions) -> DashResult<Chart> {
    let axes = AxisPair::new(options.axes.x, options.axes.y, model.plottable_dimensions())?;
    let coord = model.table(options.active, Measure::Coord).ok_or_else(|| {
        DashError::Configuration(format!("model has no {} coordinates", options.active.label()))
    })?;

    let coloring = resolve_coloring(model, options, coord, axes)?;
    let labelled = label_visibility(model, options, coord.len(), axes);

    let mut points = Vec::new();
    let mut arrows = Vec::new();
    for row in 0..coord.len() {
        let (Some(x), Some(y)) = (coord.value(row, axes.x), coord.value(row, axes.y)) else {
            continue;
        };
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        let color = match &coloring {
            Coloring::Fixed => options.colors.active,
            Coloring::Gradient(gradient, values) => {
                let value = values[row];
                if value.is_finite() {
                    gradient.color_at(value)
                } else {
                    MISSING_VALUE_COLOR
                }
            }
            Coloring::Categories(palette, categories) => categories[row]
                .as_ref()
                .and_then(|category| palette.get(category).copied())
                .unwrap_or(MISSING_VALUE_COLOR),
        };
        let label = coord.index[row].clone();
        if options.arrows {
            arrows.push(ChartArrow {
                label,
                x,
                y,
                color,
                group: PointGroup::Active,
                show_label: labelled[row],
            });
        } else {
            points.push(ChartPoint {
                label,
                x,
                y,
                color,
                group: PointGroup::Active,
                show_label: labelled[row],
            });
        }
    }

    let mut legend = Vec::new();
    if matches!(coloring, Coloring::Fixed) {
        legend.push(LegendEntry {
            label: "Active".to_owned(),
            color: options.colors.active,
        });
    }

    for &entity in &options.supplementary {
        let Some(table) = model.table(entity, Measure::Coord) else {
            continue;
        };
        let (group, color, legend_label) = match entity {
            EntityKind::SupplementaryQualitative => (
                PointGroup::Category,
                options.colors.categories,
                "Categories",
            ),
            _ => (
                PointGroup::Supplementary,
                options.colors.supplementary,
                "Supplementary",
            ),
        };
        let as_arrows = options.arrows && entity == EntityKind::SupplementaryQuantitative;
        let mut plotted = false;
        for row in 0..table.len() {
            let (Some(x), Some(y)) = (table.value(row, axes.x), table.value(row, axes.y)) else {
                continue;
            };
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            plotted = true;
            let label = table.index[row].clone();
            if as_arrows {
                arrows.push(ChartArrow {
                    label,
                    x,
                    y,
                    color,
                    group,
                    show_label: true,
                });
            } else {
                points.push(ChartPoint {
                    label,
                    x,
                    y,
                    color,
                    group,
                    show_label: true,
                });
            }
        }
        if plotted && !legend.iter().any(|entry: &LegendEntry| entry.label == legend_label) {
            legend.push(LegendEntry {
                label: legend_label.to_owned(),
                color,
            });
        }
    }

    let gradient = match coloring {
        Coloring::Fixed => None,
        Coloring::Gradient(gradient, _) => Some(gradient),
        Coloring::Categories(palette, _) => {
            legend.extend(palette.into_iter().map(|(label, color)| LegendEntry { label, color }));
            None
        }
    };
    // A lone "Active" entry says nothing.
    if legend.len() == 1 && gradient.is_none() && legend[0].label == "Active" {
        legend.clear();
    }

    Ok(Chart {
        title: options.title.clone(),
        x_title: model.dimension_label(axes.x),
        y_title: model.dimension_label(axes.y),
        text_size: options.text_size,
        body: ChartBody::Scatter(ScatterPlot {
            axes,
            points,
            arrows,
            unit_circle: options.arrows,
            repel: options.repel,
            legend,
            gradient,
        }),
    })
}

fn resolve_coloring(
    model: &FittedModel,
    options: &FactorMapOptions,
    coord: &ResultTable,
    axes: AxisPair,
) -> DashResult<Coloring> {
    match &options.color_mode {
        ColorMode::Status => Ok(Coloring::Fixed),
        ColorMode::Cos2 => {
            let values = plane_quality(model, options.active, coord, axes).ok_or_else(|| {
                DashError::Configuration(format!("model has no cos2 for {}", options.active.label()))
            })?;
            Ok(Coloring::Gradient(
                ColorGradient::spanning("Cos2", values.iter().copied()),
                values,
            ))
        }
        ColorMode::Contrib => {
            let values = plane_contribution(model, options.active, coord, axes).ok_or_else(|| {
                DashError::Configuration(format!(
                    "model has no contributions for {}",
                    options.active.label()
                ))
            })?;
            Ok(Coloring::Gradient(
                ColorGradient::spanning("Contrib", values.iter().copied()),
                values,
            ))
        }
        ColorMode::Quantitative(variable) => {
            let by_label = model
                .data
                .as_ref()
                .and_then(|data| data.quantitative_values(variable))
                .ok_or_else(|| {
                    DashError::Configuration(format!(
                        "quantitative variable `{variable}` is not in the model"
                    ))
                })?;
            let values: Vec<f64> = coord
                .index
                .iter()
                .map(|label| by_label.get(label).copied().unwrap_or(f64::NAN))
                .collect();
            Ok(Coloring::Gradient(
                ColorGradient::spanning(variable.clone(), values.iter().copied()),
                values,
            ))
        }
        ColorMode::Qualitative(variable) => {
            let by_label = model
                .data
                .as_ref()
                .and_then(|data| data.qualitative_values(variable))
                .ok_or_else(|| {
                    DashError::Configuration(format!(
                        "qualitative variable `{variable}` is not in the model"
                    ))
                })?;
            let categories: Vec<Option<String>> = coord
                .index
                .iter()
                .map(|label| by_label.get(label).cloned())
                .collect();
            let mut levels: Vec<String> = Vec::new();
            for category in categories.iter().flatten() {
                if !levels.contains(category) {
                    levels.push(category.clone());
                }
            }
            let palette = levels
                .iter()
                .cloned()
                .zip(category_palette(levels.len()))
                .collect();
            Ok(Coloring::Categories(palette, categories))
        }
    }
}

/// Summed cos2 of each row on the plotted plane.
fn plane_quality(
    model: &FittedModel,
    entity: EntityKind,
    coord: &ResultTable,
    axes: AxisPair,
) -> Option<Vec<f64>> {
    let cos2 = model.table(entity, Measure::Cos2)?;
    Some(
        coord
            .index
            .iter()
            .map(|label| {
                cos2.row_position(label)
                    .and_then(|row| Some(cos2.value(row, axes.x)? + cos2.value(row, axes.y)?))
                    .unwrap_or(f64::NAN)
            })
            .collect(),
    )
}

/// Contribution of each row to the plotted plane, weighted by eigenvalue.
fn plane_contribution(
    model: &FittedModel,
    entity: EntityKind,
    coord: &ResultTable,
    axes: AxisPair,
) -> Option<Vec<f64>> {
    let contrib = model.table(entity, Measure::Contrib)?;
    let weight_x = model.eigenvalue(axes.x).filter(|value| value.is_finite()).unwrap_or(1.0);
    let weight_y = model.eigenvalue(axes.y).filter(|value| value.is_finite()).unwrap_or(1.0);
    let total = weight_x + weight_y;
    Some(
        coord
            .index
            .iter()
            .map(|label| {
                contrib
                    .row_position(label)
                    .and_then(|row| {
                        let x = contrib.value(row, axes.x)?;
                        let y = contrib.value(row, axes.y)?;
                        Some(if total > 0.0 {
                            (x * weight_x + y * weight_y) / total
                        } else {
                            (x + y) / 2.0
                        })
                    })
                    .unwrap_or(f64::NAN)
            })
            .collect(),
    )
}

/// Label flags for the active rows.
///
/// When the measure behind the filter is missing, every row keeps its label.
fn label_visibility(
    model: &FittedModel,
    options: &FactorMapOptions,
    rows: usize,
    axes: AxisPair,
) -> Vec<bool> {
    let Some(coord) = model.table(options.active, Measure::Coord) else {
        return vec![true; rows];
    };
    let (values, threshold) = match options.label_filter {
        LabelFilter::None => return vec![true; rows],
        LabelFilter::Cos2(threshold) => (plane_quality(model, options.active, coord, axes), threshold),
        LabelFilter::Contrib(threshold) => {
            (plane_contribution(model, options.active, coord, axes), threshold)
        }
    };
    match values {
        Some(values) => values
            .into_iter()
            .map(|value| value.is_nan() || value >= threshold)
            .collect(),
        None => vec![true; rows],
    }
}

/// Evenly spaced hues for categorical coloring.
#[must_use]
pub fn category_palette(count: usize) -> Vec<Color> {
    (0..count)
        .map(|index| {
            let hue = (15.0 + 360.0 * index as f64 / count.max(1) as f64) % 360.0;
            hsl_to_color(hue, 0.65, 0.5)
        })
        .collect()
}

fn hsl_to_color(hue: f64, saturation: f64, lightness: f64) -> Color {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let second = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (red, green, blue) = match sector as u32 {
        0 => (chroma, second, 0.0),
        1 => (second, chroma, 0.0),
        2 => (0.0, chroma, second),
        3 => (0.0, second, chroma),
        4 => (second, 0.0, chroma),
        _ => (chroma, 0.0, second),
    };
    let offset = lightness - chroma / 2.0;
    Color::rgb(red + offset, green + offset, blue + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_distinct_valid_colors() {
        let palette = category_palette(4);
        assert_eq!(palette.len(), 4);
        for color in &palette {
            color.validate().expect("valid color");
        }
        assert_ne!(palette[0], palette[1]);
    }

    #[test]
    fn color_mode_codes_are_stable() {
        assert_eq!(ColorMode::Quantitative("x".to_owned()).code(), "quanti");
        assert_eq!(ColorMode::default().code(), "status");
    }
}
