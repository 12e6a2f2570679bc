use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color as PdfColor, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Polygon, Pt, Rgb, TextMatrix,
};

use crate::error::{DashError, DashResult};
use crate::render::draw::dash_segments;
use crate::render::{Color, LineStrokeStyle, RenderFrame, RenderStats, Renderer, TextHAlign};

const MM_PER_PX: f64 = 25.4 / 96.0;
const PT_PER_PX: f64 = 0.75;
const CIRCLE_SEGMENTS: usize = 24;
// Average Helvetica glyph advance in ems, used to anchor centered and right-aligned text.
const GLYPH_ADVANCE_EM: f64 = 0.52;

/// Renders frames into a single-page PDF document.
///
/// Text uses the built-in Helvetica font, so no font file is needed.
#[derive(Debug, Default)]
pub struct PdfRenderer {
    document: Vec<u8>,
    last_stats: RenderStats,
}

impl PdfRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn document(&self) -> &[u8] {
        &self.document
    }

    #[must_use]
    pub fn into_document(self) -> Vec<u8> {
        self.document
    }

    #[must_use]
    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }
}

impl Renderer for PdfRenderer {
    fn render(&mut self, frame: &RenderFrame) -> DashResult<()> {
        frame.validate()?;
        let width = f64::from(frame.viewport.width);
        let height = f64::from(frame.viewport.height);

        let (doc, page, layer) = PdfDocument::new("chart", mm(width), mm(height), "chart");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| DashError::Render(format!("failed to load pdf font: {err}")))?;
        let stats = {
            let canvas = PageCanvas {
                layer: doc.get_page(page).get_layer(layer),
                height,
            };
            canvas.draw(frame, &font)
        };

        self.document = doc
            .save_to_bytes()
            .map_err(|err| DashError::Render(format!("failed to write pdf: {err}")))?;
        self.last_stats = stats;
        Ok(())
    }
}

struct PageCanvas {
    layer: PdfLayerReference,
    height: f64,
}

impl PageCanvas {
    fn draw(&self, frame: &RenderFrame, font: &IndirectFontRef) -> RenderStats {
        let mut stats = RenderStats::default();
        let width = f64::from(frame.viewport.width);
        self.fill(frame.background, vec![(0.0, 0.0), (width, 0.0), (width, self.height), (0.0, self.height)]);

        for rect in &frame.rects {
            let corners = vec![
                (rect.x, rect.y),
                (rect.x + rect.width, rect.y),
                (rect.x + rect.width, rect.y + rect.height),
                (rect.x, rect.y + rect.height),
            ];
            self.fill(rect.fill_color, corners.clone());
            if rect.border_width > 0.0 {
                self.stroke(rect.border_color, rect.border_width, corners, true);
            }
            stats.rects_drawn += 1;
        }

        for line in &frame.lines {
            let start = (line.x1, line.y1);
            let end = (line.x2, line.y2);
            let segments = match line.stroke_style {
                LineStrokeStyle::Solid => vec![(start, end)],
                LineStrokeStyle::Dashed => dash_segments(start, end),
            };
            for (from, to) in segments {
                self.stroke(line.color, line.stroke_width, vec![from, to], false);
            }
            stats.lines_drawn += 1;
        }

        for circle in &frame.circles {
            let radius = circle.radius.max(1.0);
            let outline = (0..CIRCLE_SEGMENTS)
                .map(|step| {
                    let angle = std::f64::consts::TAU * step as f64 / CIRCLE_SEGMENTS as f64;
                    (circle.x + radius * angle.cos(), circle.y + radius * angle.sin())
                })
                .collect();
            self.fill(circle.fill_color, outline);
            stats.circles_drawn += 1;
        }

        for text in &frame.texts {
            let advance = GLYPH_ADVANCE_EM * text.font_size_px * text.text.chars().count() as f64;
            let shift = match text.h_align {
                TextHAlign::Left => 0.0,
                TextHAlign::Center => advance / 2.0,
                TextHAlign::Right => advance,
            };
            // Baseline sits a third of the font size below the anchor to center the glyphs.
            let baseline = text.font_size_px / 3.0;
            let (x, y, rotation) = if text.vertical {
                (text.x + baseline, text.y + shift, 90.0)
            } else {
                (text.x - shift, text.y + baseline, 0.0)
            };

            self.layer.set_fill_color(pdf_color(text.color));
            self.layer.begin_text_section();
            self.layer.set_font(font, (text.font_size_px * PT_PER_PX) as f32);
            self.layer.set_text_matrix(TextMatrix::TranslateRotate(
                Pt((x * PT_PER_PX) as f32),
                Pt(((self.height - y) * PT_PER_PX) as f32),
                rotation,
            ));
            self.layer.write_text(text.text.as_str(), font);
            self.layer.end_text_section();
            stats.texts_drawn += 1;
        }

        stats
    }

    fn fill(&self, color: Color, outline: Vec<(f64, f64)>) {
        self.layer.set_fill_color(pdf_color(color));
        self.layer.add_polygon(Polygon {
            rings: vec![self.points(outline)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn stroke(&self, color: Color, width: f64, path: Vec<(f64, f64)>, closed: bool) {
        self.layer.set_outline_color(pdf_color(color));
        self.layer.set_outline_thickness((width * PT_PER_PX) as f32);
        self.layer.add_line(Line {
            points: self.points(path),
            is_closed: closed,
        });
    }

    fn points(&self, path: Vec<(f64, f64)>) -> Vec<(Point, bool)> {
        path.into_iter()
            .map(|(x, y)| (Point::new(mm(x), mm(self.height - y)), false))
            .collect()
    }
}

fn mm(px: f64) -> Mm {
    Mm((px * MM_PER_PX) as f32)
}

fn pdf_color(color: Color) -> PdfColor {
    PdfColor::Rgb(Rgb::new(
        color.red as f32,
        color.green as f32,
        color.blue as f32,
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Viewport;
    use crate::render::{CirclePrimitive, LinePrimitive, TextPrimitive};

    #[test]
    fn writes_a_pdf_document_with_every_primitive() {
        let frame = RenderFrame::new(Viewport::new(320, 200))
            .with_line(LinePrimitive::new(10.0, 10.0, 300.0, 10.0, 1.0, Color::BLACK).dashed())
            .with_circle(CirclePrimitive::new(50.0, 50.0, 4.0, Color::BLACK))
            .with_text(TextPrimitive::new("Dim.1", 160.0, 190.0, 12.0, Color::BLACK, TextHAlign::Center));

        let mut renderer = PdfRenderer::new();
        renderer.render(&frame).expect("render");
        assert!(renderer.document().starts_with(b"%PDF"));
        assert_eq!(renderer.last_stats().lines_drawn, 1);
        assert_eq!(renderer.last_stats().circles_drawn, 1);
        assert_eq!(renderer.last_stats().texts_drawn, 1);
    }
}
