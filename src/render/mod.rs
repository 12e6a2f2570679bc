mod bitmap;
mod draw;
mod frame;
mod null_renderer;
pub mod palette;
mod pdf;
mod primitives;
mod svg;

use serde::{Deserialize, Serialize};

pub use bitmap::{register_bitmap_font, BitmapRenderer};
pub use frame::RenderFrame;
pub use null_renderer::NullRenderer;
pub use pdf::PdfRenderer;
pub use primitives::{
    CirclePrimitive, Color, LinePrimitive, LineStrokeStyle, RectPrimitive, TextHAlign,
    TextPrimitive,
};
pub use svg::SvgRenderer;

use crate::error::{DashError, DashResult};

/// Contract implemented by any rendering backend.
///
/// Backends receive a fully materialized `RenderFrame` so drawing code stays
/// isolated from the dashboard and its reactive state.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> DashResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub lines_drawn: usize,
    pub rects_drawn: usize,
    pub circles_drawn: usize,
    pub texts_drawn: usize,
    pub texts_skipped: usize,
}

/// Image formats offered by the factor-map export buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Png,
    Jpeg,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [Self; 4] = [Self::Png, Self::Jpeg, Self::Pdf, Self::Svg];

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn from_extension(extension: &str) -> DashResult<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            other => Err(DashError::Render(format!(
                "unsupported export format `{other}`"
            ))),
        }
    }
}

/// Renders `frame` with the backend matching `format` and returns the encoded file.
pub fn export_frame(frame: &RenderFrame, format: ExportFormat) -> DashResult<Vec<u8>> {
    match format {
        ExportFormat::Svg => {
            let mut renderer = SvgRenderer::new();
            renderer.render(frame)?;
            Ok(renderer.into_document().into_bytes())
        }
        ExportFormat::Png | ExportFormat::Jpeg => {
            let mut renderer = BitmapRenderer::new(format)?;
            renderer.render(frame)?;
            Ok(renderer.into_encoded())
        }
        ExportFormat::Pdf => {
            let mut renderer = PdfRenderer::new();
            renderer.render(frame)?;
            Ok(renderer.into_document())
        }
    }
}
