use crate::error::DashResult;
use crate::render::{RenderFrame, RenderStats, Renderer};

/// No-op renderer used by tests and headless sessions.
///
/// It still validates frame content so invalid geometry surfaces without a
/// real backend.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub last_stats: RenderStats,
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &RenderFrame) -> DashResult<()> {
        frame.validate()?;
        self.last_stats = RenderStats {
            lines_drawn: frame.lines.len(),
            rects_drawn: frame.rects.len(),
            circles_drawn: frame.circles.len(),
            texts_drawn: frame.texts.len(),
            texts_skipped: 0,
        };
        Ok(())
    }
}
