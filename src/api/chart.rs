use serde::{Deserialize, Serialize};

use crate::core::{AxisPair, LinearScale, Viewport};
use crate::error::DashResult;
use crate::render::{
    CirclePrimitive, Color, LinePrimitive, RectPrimitive, RenderFrame, TextHAlign, TextPrimitive,
};

const TITLE_FONT_PX: f64 = 16.0;
const AXIS_TITLE_FONT_PX: f64 = 13.0;
const TICK_FONT_PX: f64 = 11.0;
const POINT_RADIUS_PX: f64 = 3.0;
const LEGEND_WIDTH_PX: f64 = 130.0;
const UNIT_CIRCLE_SEGMENTS: usize = 96;
const HEATMAP_VALUE_CELLS: usize = 225;
const GRID_COLOR: Color = Color::rgb(0.9, 0.9, 0.9);
const AXIS_COLOR: Color = Color::rgb(0.2, 0.2, 0.2);

/// Renderable chart produced by the plot builders.
///
/// Charts are plain data: they serialize to JSON for the browser and project
/// into a [`RenderFrame`] for image export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    /// Label size in points.
    pub text_size: f64,
    pub body: ChartBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartBody {
    Scatter(ScatterPlot),
    Bars(BarPlot),
    Heatmap(Heatmap),
    /// Placeholder shown when the requested view has no data.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointGroup {
    Active,
    Supplementary,
    Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub color: Color,
    pub group: PointGroup,
    pub show_label: bool,
}

/// Vector drawn from the origin, used by correlation circles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartArrow {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub color: Color,
    pub group: PointGroup,
    pub show_label: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

/// Continuous color scale shared by gradient colorings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorGradient {
    pub title: String,
    pub min: f64,
    pub max: f64,
    pub low: Color,
    pub high: Color,
}

impl ColorGradient {
    pub const DEFAULT_LOW: Color = Color::rgb(0.075, 0.169, 0.263);
    pub const DEFAULT_HIGH: Color = Color::rgb(0.337, 0.694, 0.969);

    /// Builds a gradient spanning the finite `values`.
    #[must_use]
    pub fn spanning(title: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|value| value.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let (min, max) = if min.is_finite() { (min, max) } else { (0.0, 1.0) };
        Self {
            title: title.into(),
            min,
            max,
            low: Self::DEFAULT_LOW,
            high: Self::DEFAULT_HIGH,
        }
    }

    #[must_use]
    pub fn color_at(&self, value: f64) -> Color {
        let span = self.max - self.min;
        let t = if span > 0.0 { (value - self.min) / span } else { 0.5 };
        self.low.lerp(self.high, t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPlot {
    pub axes: AxisPair,
    pub points: Vec<ChartPoint>,
    pub arrows: Vec<ChartArrow>,
    pub unit_circle: bool,
    pub repel: bool,
    pub legend: Vec<LegendEntry>,
    pub gradient: Option<ColorGradient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub value: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarPlot {
    pub bars: Vec<ChartBar>,
    /// Fraction of each band filled by its bar.
    pub bar_width: f64,
    pub reference_line: Option<ReferenceLine>,
    pub grid: bool,
    pub show_values: bool,
    /// Polyline in bar coordinates: `x` is a bar position, `y` a value.
    pub curve: Vec<(f64, f64)>,
    pub curve_color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
    pub min: f64,
    pub max: f64,
    pub low: Color,
    pub mid: Color,
    pub high: Color,
    pub border: Color,
}

impl Heatmap {
    /// Diverging color: `low` at `min`, `mid` halfway, `high` at `max`.
    #[must_use]
    pub fn color_at(&self, value: f64) -> Color {
        if !value.is_finite() {
            return Color::rgb(0.8, 0.8, 0.8);
        }
        let span = self.max - self.min;
        let t = if span > 0.0 { (value - self.min) / span } else { 0.5 };
        if t < 0.5 {
            self.low.lerp(self.mid, t * 2.0)
        } else {
            self.mid.lerp(self.high, (t - 0.5) * 2.0)
        }
    }
}

impl Chart {
    #[must_use]
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_title: String::new(),
            y_title: String::new(),
            text_size: 8.0,
            body: ChartBody::Empty,
        }
    }

    /// Axis pair of a factor map.
    #[must_use]
    pub fn axes(&self) -> Option<AxisPair> {
        match &self.body {
            ChartBody::Scatter(scatter) => Some(scatter.axes),
            _ => None,
        }
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        match &self.body {
            ChartBody::Scatter(scatter) => scatter.points.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn labelled_count(&self) -> usize {
        match &self.body {
            ChartBody::Scatter(scatter) => {
                scatter.points.iter().filter(|point| point.show_label).count()
                    + scatter.arrows.iter().filter(|arrow| arrow.show_label).count()
            }
            _ => 0,
        }
    }

    #[must_use]
    pub fn bars(&self) -> &[ChartBar] {
        match &self.body {
            ChartBody::Bars(plot) => &plot.bars,
            _ => &[],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.body, ChartBody::Empty)
    }

    fn label_font_px(&self) -> f64 {
        (self.text_size * 4.0 / 3.0).max(6.0)
    }

    /// Projects the chart into pixel-space primitives for `viewport`.
    pub fn to_render_frame(&self, viewport: Viewport) -> DashResult<RenderFrame> {
        let viewport = viewport.validate()?;
        let mut frame = RenderFrame::new(viewport);
        let width = f64::from(viewport.width);

        if !self.title.is_empty() {
            frame.texts.push(TextPrimitive::new(
                self.title.clone(),
                width / 2.0,
                20.0,
                TITLE_FONT_PX,
                Color::BLACK,
                TextHAlign::Center,
            ));
        }

        match &self.body {
            ChartBody::Scatter(scatter) => self.project_scatter(scatter, &mut frame)?,
            ChartBody::Bars(plot) => self.project_bars(plot, &mut frame)?,
            ChartBody::Heatmap(heatmap) => self.project_heatmap(heatmap, &mut frame)?,
            ChartBody::Empty => {
                let plot = PlotArea::for_viewport(viewport, 0.0, 60.0);
                frame.texts.push(TextPrimitive::new(
                    "No data to display",
                    plot.center_x(),
                    plot.center_y(),
                    AXIS_TITLE_FONT_PX,
                    Color::rgb(0.5, 0.5, 0.5),
                    TextHAlign::Center,
                ));
            }
        }
        Ok(frame)
    }

    fn push_axis_titles(&self, plot: &PlotArea, frame: &mut RenderFrame) {
        if !self.x_title.is_empty() {
            frame.texts.push(TextPrimitive::new(
                self.x_title.clone(),
                plot.center_x(),
                plot.bottom() + 38.0,
                AXIS_TITLE_FONT_PX,
                AXIS_COLOR,
                TextHAlign::Center,
            ));
        }
        if !self.y_title.is_empty() {
            frame.texts.push(
                TextPrimitive::new(
                    self.y_title.clone(),
                    16.0,
                    plot.center_y(),
                    AXIS_TITLE_FONT_PX,
                    AXIS_COLOR,
                    TextHAlign::Center,
                )
                .vertical(),
            );
        }
    }

    fn project_scatter(&self, scatter: &ScatterPlot, frame: &mut RenderFrame) -> DashResult<()> {
        let has_legend = !scatter.legend.is_empty() || scatter.gradient.is_some();
        let plot = PlotArea::for_viewport(
            frame.viewport,
            if has_legend { LEGEND_WIDTH_PX } else { 0.0 },
            70.0,
        );

        let mut xs: Vec<f64> = scatter.points.iter().map(|point| point.x).collect();
        let mut ys: Vec<f64> = scatter.points.iter().map(|point| point.y).collect();
        xs.extend(scatter.arrows.iter().map(|arrow| arrow.x));
        ys.extend(scatter.arrows.iter().map(|arrow| arrow.y));
        xs.push(0.0);
        ys.push(0.0);
        if scatter.unit_circle {
            xs.extend([-1.0, 1.0]);
            ys.extend([-1.0, 1.0]);
        }
        let mut x_scale = LinearScale::fit(xs, 0.08)?;
        let mut y_scale = LinearScale::fit(ys, 0.08)?;
        if scatter.unit_circle {
            (x_scale, y_scale) = equal_aspect(x_scale, y_scale, &plot)?;
        }

        push_grid(frame, &plot, x_scale, y_scale)?;

        if y_scale.contains(0.0) {
            let y = plot.y(y_scale, 0.0)?;
            frame.lines.push(
                LinePrimitive::new(plot.left, y, plot.right(), y, 1.0, AXIS_COLOR).dashed(),
            );
        }
        if x_scale.contains(0.0) {
            let x = plot.x(x_scale, 0.0)?;
            frame.lines.push(
                LinePrimitive::new(x, plot.top, x, plot.bottom(), 1.0, AXIS_COLOR).dashed(),
            );
        }

        if scatter.unit_circle {
            let mut previous = None;
            for step in 0..=UNIT_CIRCLE_SEGMENTS {
                let angle = std::f64::consts::TAU * step as f64 / UNIT_CIRCLE_SEGMENTS as f64;
                let current = (plot.x(x_scale, angle.cos())?, plot.y(y_scale, angle.sin())?);
                if let Some((px, py)) = previous {
                    frame.lines.push(LinePrimitive::new(
                        px,
                        py,
                        current.0,
                        current.1,
                        1.0,
                        Color::rgb(0.4, 0.4, 0.4),
                    ));
                }
                previous = Some(current);
            }
        }

        let font_px = self.label_font_px();
        let mut anchors = Vec::new();

        let origin = (plot.x(x_scale, 0.0)?, plot.y(y_scale, 0.0)?);
        for arrow in &scatter.arrows {
            let tip = (plot.x(x_scale, arrow.x)?, plot.y(y_scale, arrow.y)?);
            let mut shaft = LinePrimitive::new(origin.0, origin.1, tip.0, tip.1, 1.5, arrow.color);
            if arrow.group != PointGroup::Active {
                shaft = shaft.dashed();
            }
            frame.lines.push(shaft);
            for head in arrow_head(origin, tip) {
                frame
                    .lines
                    .push(LinePrimitive::new(tip.0, tip.1, head.0, head.1, 1.5, arrow.color));
            }
            if arrow.show_label {
                anchors.push(LabelAnchor {
                    text: arrow.label.clone(),
                    x: tip.0,
                    y: tip.1,
                    color: arrow.color,
                });
            }
        }

        for point in &scatter.points {
            let (x, y) = (plot.x(x_scale, point.x)?, plot.y(y_scale, point.y)?);
            let radius = match point.group {
                PointGroup::Category => POINT_RADIUS_PX + 1.0,
                PointGroup::Active | PointGroup::Supplementary => POINT_RADIUS_PX,
            };
            frame.circles.push(CirclePrimitive::new(x, y, radius, point.color));
            if point.show_label {
                anchors.push(LabelAnchor {
                    text: point.label.clone(),
                    x,
                    y,
                    color: point.color,
                });
            }
        }

        for (anchor, position) in anchors
            .iter()
            .zip(place_labels(&anchors, font_px, &plot, scatter.repel))
        {
            if anchor.text.is_empty() {
                continue;
            }
            frame.texts.push(TextPrimitive::new(
                anchor.text.clone(),
                position.0,
                position.1,
                font_px,
                anchor.color,
                TextHAlign::Center,
            ));
        }

        push_frame_border(frame, &plot);
        self.push_axis_titles(&plot, frame);

        let legend_x = plot.right() + 16.0;
        let mut legend_y = plot.top + 10.0;
        if let Some(gradient) = &scatter.gradient {
            push_legend_title(frame, &gradient.title, legend_x, legend_y);
            legend_y += 18.0;
            for step in 0..5 {
                let value = gradient.min + (gradient.max - gradient.min) * f64::from(step) / 4.0;
                push_legend_entry(
                    frame,
                    &format!("{value:.2}"),
                    gradient.color_at(value),
                    legend_x,
                    legend_y,
                );
                legend_y += 18.0;
            }
            legend_y += 8.0;
        }
        for entry in &scatter.legend {
            push_legend_entry(frame, &entry.label, entry.color, legend_x, legend_y);
            legend_y += 18.0;
        }
        Ok(())
    }

    fn project_bars(&self, plot_data: &BarPlot, frame: &mut RenderFrame) -> DashResult<()> {
        let vertical_labels = plot_data.bars.len() > 8
            || plot_data.bars.iter().any(|bar| bar.label.chars().count() > 10);
        let bottom = if vertical_labels { 110.0 } else { 70.0 };
        let plot = PlotArea::for_viewport_with_bottom(frame.viewport, 0.0, 70.0, bottom);

        let values = plot_data
            .bars
            .iter()
            .map(|bar| bar.value)
            .chain(plot_data.curve.iter().map(|(_, value)| *value))
            .chain(plot_data.reference_line.iter().map(|line| line.value));
        let (min, max) = values
            .filter(|value| value.is_finite())
            .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let top = if max > 0.0 { max * 1.08 } else { 1.0 };
        let y_scale = LinearScale::new(min.min(0.0) * 1.08, top)?;

        if plot_data.grid {
            for tick in y_scale.ticks(5) {
                let y = plot.y(y_scale, tick)?;
                frame
                    .lines
                    .push(LinePrimitive::new(plot.left, y, plot.right(), y, 1.0, GRID_COLOR));
                frame.texts.push(TextPrimitive::new(
                    format_tick(tick),
                    plot.left - 6.0,
                    y,
                    TICK_FONT_PX,
                    AXIS_COLOR,
                    TextHAlign::Right,
                ));
            }
        }

        let count = plot_data.bars.len().max(1) as f64;
        let band = plot.width / count;
        let bar_width = band * plot_data.bar_width.clamp(0.05, 1.0);
        let baseline = plot.y(y_scale, 0.0)?;
        let label_font = self.label_font_px();

        for (position, bar) in plot_data.bars.iter().enumerate() {
            let center = plot.left + band * (position as f64 + 0.5);
            if bar.value.is_finite() {
                let y = plot.y(y_scale, bar.value)?;
                let (top, height) = if y < baseline { (y, baseline - y) } else { (baseline, y - baseline) };
                frame.rects.push(RectPrimitive::new(
                    center - bar_width / 2.0,
                    top,
                    bar_width,
                    height,
                    bar.color,
                ));
                if plot_data.show_values {
                    frame.texts.push(TextPrimitive::new(
                        format_tick(bar.value),
                        center,
                        top - label_font * 0.7,
                        label_font,
                        AXIS_COLOR,
                        TextHAlign::Center,
                    ));
                }
            }
            if !bar.label.is_empty() {
                let label = TextPrimitive::new(
                    bar.label.clone(),
                    center,
                    plot.bottom() + 12.0,
                    TICK_FONT_PX,
                    AXIS_COLOR,
                    if vertical_labels { TextHAlign::Right } else { TextHAlign::Center },
                );
                frame.texts.push(if vertical_labels { label.vertical() } else { label });
            }
        }

        let mut previous = None;
        for (position, value) in &plot_data.curve {
            if !position.is_finite() || !value.is_finite() {
                previous = None;
                continue;
            }
            let current = (plot.left + band * (position + 0.5), plot.y(y_scale, *value)?);
            if let Some((px, py)) = previous {
                frame.lines.push(LinePrimitive::new(
                    px,
                    py,
                    current.0,
                    current.1,
                    2.0,
                    plot_data.curve_color,
                ));
            }
            previous = Some(current);
        }

        if let Some(reference) = &plot_data.reference_line {
            let y = plot.y(y_scale, reference.value)?;
            frame.lines.push(
                LinePrimitive::new(plot.left, y, plot.right(), y, 1.0, reference.color).dashed(),
            );
        }

        frame.lines.push(LinePrimitive::new(
            plot.left,
            baseline,
            plot.right(),
            baseline,
            1.0,
            AXIS_COLOR,
        ));
        frame.lines.push(LinePrimitive::new(
            plot.left,
            plot.top,
            plot.left,
            plot.bottom(),
            1.0,
            AXIS_COLOR,
        ));
        self.push_axis_titles(&plot, frame);
        Ok(())
    }

    fn project_heatmap(&self, heatmap: &Heatmap, frame: &mut RenderFrame) -> DashResult<()> {
        let longest_row = heatmap
            .rows
            .iter()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0) as f64;
        let longest_column = heatmap
            .columns
            .iter()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0) as f64;
        let left = (longest_row * TICK_FONT_PX * 0.6 + 16.0).clamp(40.0, 220.0);
        let bottom = (longest_column * TICK_FONT_PX * 0.6 + 16.0).clamp(40.0, 220.0);
        let plot = PlotArea::for_viewport_with_bottom(frame.viewport, LEGEND_WIDTH_PX, left, bottom);

        let rows = heatmap.rows.len().max(1) as f64;
        let columns = heatmap.columns.len().max(1) as f64;
        let cell_width = plot.width / columns;
        let cell_height = plot.height / rows;
        let show_values = heatmap.rows.len() * heatmap.columns.len() <= HEATMAP_VALUE_CELLS;
        let value_font = (cell_height * 0.35).clamp(6.0, 12.0);

        for (row, values) in heatmap.values.iter().enumerate() {
            for (column, value) in values.iter().enumerate() {
                let x = plot.left + cell_width * column as f64;
                let y = plot.top + cell_height * row as f64;
                let fill = heatmap.color_at(*value);
                frame.rects.push(
                    RectPrimitive::new(x, y, cell_width, cell_height, fill)
                        .with_border(1.0, heatmap.border),
                );
                if show_values && value.is_finite() {
                    frame.texts.push(TextPrimitive::new(
                        format!("{value:.2}"),
                        x + cell_width / 2.0,
                        y + cell_height / 2.0,
                        value_font,
                        Color::BLACK,
                        TextHAlign::Center,
                    ));
                }
            }
        }

        for (row, label) in heatmap.rows.iter().enumerate() {
            frame.texts.push(TextPrimitive::new(
                label.clone(),
                plot.left - 6.0,
                plot.top + cell_height * (row as f64 + 0.5),
                TICK_FONT_PX,
                AXIS_COLOR,
                TextHAlign::Right,
            ));
        }
        for (column, label) in heatmap.columns.iter().enumerate() {
            frame.texts.push(
                TextPrimitive::new(
                    label.clone(),
                    plot.left + cell_width * (column as f64 + 0.5),
                    plot.bottom() + 8.0,
                    TICK_FONT_PX,
                    AXIS_COLOR,
                    TextHAlign::Right,
                )
                .vertical(),
            );
        }

        let legend_x = plot.right() + 16.0;
        let mut legend_y = plot.top + 10.0;
        for step in 0..5 {
            let value = heatmap.max - (heatmap.max - heatmap.min) * f64::from(step) / 4.0;
            push_legend_entry(
                frame,
                &format!("{value:.2}"),
                heatmap.color_at(value),
                legend_x,
                legend_y,
            );
            legend_y += 18.0;
        }
        Ok(())
    }
}

/// Pixel rectangle holding the data area of a chart.
#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn for_viewport(viewport: Viewport, legend: f64, left: f64) -> Self {
        Self::for_viewport_with_bottom(viewport, legend, left, 60.0)
    }

    fn for_viewport_with_bottom(viewport: Viewport, legend: f64, left: f64, bottom: f64) -> Self {
        let top = 40.0;
        let right = 20.0 + legend;
        let width = (f64::from(viewport.width) - left - right).max(10.0);
        let height = (f64::from(viewport.height) - top - bottom).max(10.0);
        Self {
            left,
            top,
            width,
            height,
        }
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    fn x(&self, scale: LinearScale, value: f64) -> DashResult<f64> {
        scale.to_pixel(value, self.left, self.right())
    }

    fn y(&self, scale: LinearScale, value: f64) -> DashResult<f64> {
        scale.to_pixel(value, self.bottom(), self.top)
    }

    fn contains(&self, bounds: &LabelBounds) -> bool {
        bounds.left >= self.left
            && bounds.right <= self.right()
            && bounds.top >= self.top
            && bounds.bottom <= self.bottom()
    }
}

/// Widens the shorter domain so one data unit spans the same pixels on both axes.
fn equal_aspect(
    x_scale: LinearScale,
    y_scale: LinearScale,
    plot: &PlotArea,
) -> DashResult<(LinearScale, LinearScale)> {
    let (x0, x1) = x_scale.domain();
    let (y0, y1) = y_scale.domain();
    let x_units_per_px = (x1 - x0) / plot.width;
    let y_units_per_px = (y1 - y0) / plot.height;
    if x_units_per_px > y_units_per_px {
        let half = x_units_per_px * plot.height / 2.0;
        let mid = (y0 + y1) / 2.0;
        Ok((x_scale, LinearScale::new(mid - half, mid + half)?))
    } else {
        let half = y_units_per_px * plot.width / 2.0;
        let mid = (x0 + x1) / 2.0;
        Ok((LinearScale::new(mid - half, mid + half)?, y_scale))
    }
}

fn push_grid(
    frame: &mut RenderFrame,
    plot: &PlotArea,
    x_scale: LinearScale,
    y_scale: LinearScale,
) -> DashResult<()> {
    for tick in x_scale.ticks(6) {
        let x = plot.x(x_scale, tick)?;
        frame
            .lines
            .push(LinePrimitive::new(x, plot.top, x, plot.bottom(), 1.0, GRID_COLOR));
        frame.texts.push(TextPrimitive::new(
            format_tick(tick),
            x,
            plot.bottom() + 14.0,
            TICK_FONT_PX,
            AXIS_COLOR,
            TextHAlign::Center,
        ));
    }
    for tick in y_scale.ticks(6) {
        let y = plot.y(y_scale, tick)?;
        frame
            .lines
            .push(LinePrimitive::new(plot.left, y, plot.right(), y, 1.0, GRID_COLOR));
        frame.texts.push(TextPrimitive::new(
            format_tick(tick),
            plot.left - 6.0,
            y,
            TICK_FONT_PX,
            AXIS_COLOR,
            TextHAlign::Right,
        ));
    }
    Ok(())
}

fn push_frame_border(frame: &mut RenderFrame, plot: &PlotArea) {
    let corners = [
        (plot.left, plot.top),
        (plot.right(), plot.top),
        (plot.right(), plot.bottom()),
        (plot.left, plot.bottom()),
    ];
    for (index, start) in corners.iter().enumerate() {
        let end = corners[(index + 1) % corners.len()];
        frame
            .lines
            .push(LinePrimitive::new(start.0, start.1, end.0, end.1, 1.0, AXIS_COLOR));
    }
}

fn push_legend_title(frame: &mut RenderFrame, title: &str, x: f64, y: f64) {
    if title.is_empty() {
        return;
    }
    frame.texts.push(TextPrimitive::new(
        title.to_owned(),
        x,
        y,
        TICK_FONT_PX,
        Color::BLACK,
        TextHAlign::Left,
    ));
}

fn push_legend_entry(frame: &mut RenderFrame, label: &str, color: Color, x: f64, y: f64) {
    frame
        .rects
        .push(RectPrimitive::new(x, y - 6.0, 12.0, 12.0, color));
    if !label.is_empty() {
        frame.texts.push(TextPrimitive::new(
            label.to_owned(),
            x + 18.0,
            y,
            TICK_FONT_PX,
            AXIS_COLOR,
            TextHAlign::Left,
        ));
    }
}

fn format_tick(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded}")
    }
}

fn arrow_head(origin: (f64, f64), tip: (f64, f64)) -> [(f64, f64); 2] {
    let angle = (tip.1 - origin.1).atan2(tip.0 - origin.0);
    let spread = 0.45;
    let length = 8.0;
    [
        (
            tip.0 - length * (angle - spread).cos(),
            tip.1 - length * (angle - spread).sin(),
        ),
        (
            tip.0 - length * (angle + spread).cos(),
            tip.1 - length * (angle + spread).sin(),
        ),
    ]
}

struct LabelAnchor {
    text: String,
    x: f64,
    y: f64,
    color: Color,
}

#[derive(Debug, Clone, Copy)]
struct LabelBounds {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl LabelBounds {
    fn centered(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            left: x - width / 2.0,
            right: x + width / 2.0,
            top: y - height / 2.0,
            bottom: y + height / 2.0,
        }
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Label centers for `anchors`.
///
/// Without repel every label sits just above its anchor. With repel, labels
/// are placed greedily on rings of candidate offsets, taking the first slot
/// that stays inside the plot and clear of already placed labels.
fn place_labels(anchors: &[LabelAnchor], font_px: f64, plot: &PlotArea, repel: bool) -> Vec<(f64, f64)> {
    const DIRECTIONS: [(f64, f64); 8] = [
        (0.0, -1.0),
        (0.0, 1.0),
        (1.0, 0.0),
        (-1.0, 0.0),
        (1.0, -1.0),
        (-1.0, -1.0),
        (1.0, 1.0),
        (-1.0, 1.0),
    ];
    const RINGS: usize = 4;

    let height = font_px * 1.1;
    let mut placed: Vec<LabelBounds> = Vec::with_capacity(anchors.len());
    anchors
        .iter()
        .map(|anchor| {
            let width = anchor.text.chars().count() as f64 * font_px * 0.6;
            let default = (anchor.x, anchor.y - height * 0.9);
            if !repel {
                return default;
            }

            let mut chosen = None;
            'search: for ring in 1..=RINGS {
                let scale = ring as f64;
                for (dx, dy) in DIRECTIONS {
                    let x = anchor.x + dx * (width / 2.0 + POINT_RADIUS_PX + 2.0) * scale;
                    let y = anchor.y + dy * (height * 0.9) * scale;
                    let bounds = LabelBounds::centered(x, y, width, height);
                    if plot.contains(&bounds) && placed.iter().all(|other| !other.overlaps(&bounds)) {
                        chosen = Some((x, y, bounds));
                        break 'search;
                    }
                }
            }
            let (x, y, bounds) = chosen.unwrap_or_else(|| {
                let (x, y) = default;
                (x, y, LabelBounds::centered(x, y, width, height))
            });
            placed.push(bounds);
            (x, y)
        })
        .collect()
}
