use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters::style::FontStyle;
use tracing::debug;

use crate::error::{DashError, DashResult};
use crate::render::draw::{draw_frame, TextFailure, FONT_FAMILY};
use crate::render::{ExportFormat, RenderFrame, RenderStats, Renderer};

/// Rasterizes frames and encodes them as PNG or JPEG.
///
/// Text needs a font registered through [`register_bitmap_font`]; without one,
/// labels are skipped and markers are still drawn.
#[derive(Debug)]
pub struct BitmapRenderer {
    format: ImageFormat,
    encoded: Vec<u8>,
    last_stats: RenderStats,
}

impl BitmapRenderer {
    pub fn new(format: ExportFormat) -> DashResult<Self> {
        let format = match format {
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::Jpeg => ImageFormat::Jpeg,
            ExportFormat::Svg | ExportFormat::Pdf => {
                return Err(DashError::Render(format!(
                    "{} is not a bitmap format",
                    format.extension()
                )))
            }
        };
        Ok(Self {
            format,
            encoded: Vec::new(),
            last_stats: RenderStats::default(),
        })
    }

    #[must_use]
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    #[must_use]
    pub fn into_encoded(self) -> Vec<u8> {
        self.encoded
    }

    #[must_use]
    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }
}

impl Renderer for BitmapRenderer {
    fn render(&mut self, frame: &RenderFrame) -> DashResult<()> {
        let (width, height) = (frame.viewport.width, frame.viewport.height);
        let mut pixels = vec![0_u8; width as usize * height as usize * 3];
        let stats = {
            let area = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            draw_frame(&area, frame, TextFailure::Skip)?
        };

        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| DashError::Render("pixel buffer does not match viewport".to_owned()))?;
        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut encoded, self.format)
            .map_err(|err| DashError::Render(format!("failed to encode image: {err}")))?;

        self.encoded = encoded.into_inner();
        self.last_stats = stats;
        Ok(())
    }
}

/// Registers a TrueType font for bitmap text.
///
/// The font bytes live for the rest of the process, as the plotters font
/// registry requires.
pub fn register_bitmap_font(path: &Path) -> DashResult<()> {
    let bytes: &'static [u8] = Box::leak(std::fs::read(path)?.into_boxed_slice());
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes).map_err(|_| {
        DashError::Render(format!("`{}` is not a usable TrueType font", path.display()))
    })?;
    debug!(path = %path.display(), "registered bitmap font");
    Ok(())
}
