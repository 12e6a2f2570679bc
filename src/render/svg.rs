use plotters::prelude::*;

use crate::error::DashResult;
use crate::render::draw::{draw_frame, TextFailure};
use crate::render::{RenderFrame, RenderStats, Renderer};

/// Renders frames into an in-memory SVG document.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    document: String,
    last_stats: RenderStats,
}

impl SvgRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    #[must_use]
    pub fn into_document(self) -> String {
        self.document
    }

    #[must_use]
    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, frame: &RenderFrame) -> DashResult<()> {
        let mut document = String::new();
        let stats = {
            let size = (frame.viewport.width, frame.viewport.height);
            let area = SVGBackend::with_string(&mut document, size).into_drawing_area();
            draw_frame(&area, frame, TextFailure::Fail)?
        };
        self.document = document;
        self.last_stats = stats;
        Ok(())
    }
}
