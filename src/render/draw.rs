use std::fmt::Display;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{Color as _, FontTransform, RGBAColor};
use tracing::warn;

use crate::error::{DashError, DashResult};
use crate::render::{Color, LineStrokeStyle, RenderFrame, RenderStats, TextHAlign};

const DASH_LENGTH_PX: f64 = 6.0;
const DASH_GAP_PX: f64 = 4.0;
pub(crate) const FONT_FAMILY: &str = "sans-serif";

/// How a backend reacts to a text element it cannot draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextFailure {
    Fail,
    Skip,
}

/// Draws `frame` onto a plotters drawing area in primitive order.
pub(crate) fn draw_frame<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    frame: &RenderFrame,
    text_failure: TextFailure,
) -> DashResult<RenderStats> {
    frame.validate()?;
    let mut stats = RenderStats::default();

    area.fill(&to_rgba(frame.background))
        .map_err(|err| map_backend_error("failed to clear background", err))?;

    for rect in &frame.rects {
        let top_left = to_point(rect.x, rect.y);
        let bottom_right = to_point(rect.x + rect.width, rect.y + rect.height);
        area.draw(&Rectangle::new(
            [top_left, bottom_right],
            to_rgba(rect.fill_color).filled(),
        ))
        .map_err(|err| map_backend_error("failed to fill rect", err))?;
        if rect.border_width > 0.0 {
            area.draw(&Rectangle::new(
                [top_left, bottom_right],
                stroke(rect.border_color, rect.border_width),
            ))
            .map_err(|err| map_backend_error("failed to stroke rect border", err))?;
        }
        stats.rects_drawn += 1;
    }

    for line in &frame.lines {
        let style = stroke(line.color, line.stroke_width);
        let segments = match line.stroke_style {
            LineStrokeStyle::Solid => vec![((line.x1, line.y1), (line.x2, line.y2))],
            LineStrokeStyle::Dashed => dash_segments((line.x1, line.y1), (line.x2, line.y2)),
        };
        for (start, end) in segments {
            area.draw(&PathElement::new(
                vec![to_point(start.0, start.1), to_point(end.0, end.1)],
                style,
            ))
            .map_err(|err| map_backend_error("failed to stroke line", err))?;
        }
        stats.lines_drawn += 1;
    }

    for circle in &frame.circles {
        area.draw(&Circle::new(
            to_point(circle.x, circle.y),
            circle.radius.round().max(1.0) as u32,
            to_rgba(circle.fill_color).filled(),
        ))
        .map_err(|err| map_backend_error("failed to fill circle", err))?;
        stats.circles_drawn += 1;
    }

    for text in &frame.texts {
        let h_pos = match text.h_align {
            TextHAlign::Left => HPos::Left,
            TextHAlign::Center => HPos::Center,
            TextHAlign::Right => HPos::Right,
        };
        let mut style = (FONT_FAMILY, text.font_size_px)
            .into_font()
            .color(&to_rgba(text.color))
            .pos(Pos::new(h_pos, VPos::Center));
        if text.vertical {
            style = style.transform(FontTransform::Rotate270);
        }

        match area.draw(&Text::new(text.text.as_str(), to_point(text.x, text.y), style)) {
            Ok(()) => stats.texts_drawn += 1,
            Err(err) if text_failure == TextFailure::Skip => {
                warn!(error = %err, text = %text.text, "skipping text without a usable font");
                stats.texts_skipped += 1;
            }
            Err(err) => return Err(map_backend_error("failed to draw text", err)),
        }
    }

    area.present()
        .map_err(|err| map_backend_error("failed to present drawing", err))?;
    Ok(stats)
}

pub(crate) fn dash_segments(start: (f64, f64), end: (f64, f64)) -> Vec<((f64, f64), (f64, f64))> {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let length = dx.hypot(dy);
    if length <= DASH_LENGTH_PX {
        return vec![(start, end)];
    }

    let (ux, uy) = (dx / length, dy / length);
    let mut segments = Vec::new();
    let mut offset = 0.0;
    while offset < length {
        let stop = (offset + DASH_LENGTH_PX).min(length);
        segments.push((
            (start.0 + ux * offset, start.1 + uy * offset),
            (start.0 + ux * stop, start.1 + uy * stop),
        ));
        offset += DASH_LENGTH_PX + DASH_GAP_PX;
    }
    segments
}

fn to_point(x: f64, y: f64) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn to_rgba(color: Color) -> RGBAColor {
    let (red, green, blue) = color.to_rgb8();
    RGBAColor(red, green, blue, color.alpha)
}

fn stroke(color: Color, width: f64) -> ShapeStyle {
    ShapeStyle {
        color: to_rgba(color),
        filled: false,
        stroke_width: width.round().max(1.0) as u32,
    }
}

fn map_backend_error(prefix: &str, err: impl Display) -> DashError {
    DashError::Render(format!("{prefix}: {err}"))
}
