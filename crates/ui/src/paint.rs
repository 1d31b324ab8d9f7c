//! Recording paint context
//!
//! Captures draw calls as a flat op list instead of touching a surface.
//! Hosts that batch on the GPU take the rect instances as raw bytes; tests
//! inspect the ops directly.

use tiny_sdk::{Color, PaintContext, RectInstance, TextStyle, ViewPos, ViewRect};

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    Rect { rect: ViewRect, color: Color },
    Line { from: ViewPos, to: ViewPos, color: Color },
    Text { pos: ViewPos, text: String, style: TextStyle },
    SetClip(Option<ViewRect>),
}

pub struct RecordingPainter {
    ops: Vec<PaintOp>,
    /// Fixed advance used by `text_width`
    char_width: f32,
}

impl Default for RecordingPainter {
    fn default() -> Self {
        Self::new(7.0)
    }
}

impl RecordingPainter {
    pub fn new(char_width: f32) -> Self {
        Self {
            ops: Vec::new(),
            char_width,
        }
    }

    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn fill_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, PaintOp::Rect { .. })).count()
    }

    /// Text runs in paint order
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Filled rectangles packed the way a GPU instance buffer wants them
    pub fn rect_instances(&self) -> Vec<RectInstance> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Rect { rect, color } => Some(RectInstance {
                    rect: *rect,
                    color: color.to_u32(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn rect_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.rect_instances()).to_vec()
    }
}

impl PaintContext for RecordingPainter {
    fn fill_rect(&mut self, rect: ViewRect, color: Color) {
        self.ops.push(PaintOp::Rect { rect, color });
    }

    fn draw_line(&mut self, from: ViewPos, to: ViewPos, color: Color) {
        self.ops.push(PaintOp::Line { from, to, color });
    }

    fn draw_text(&mut self, pos: ViewPos, text: &str, style: TextStyle) {
        self.ops.push(PaintOp::Text {
            pos,
            text: text.to_string(),
            style,
        });
    }

    fn text_width(&self, text: &str, _style: TextStyle) -> f32 {
        text.chars().count() as f32 * self.char_width
    }

    fn set_clip(&mut self, clip: Option<ViewRect>) {
        self.ops.push(PaintOp::SetClip(clip));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_bytes_match_instance_layout() {
        let mut painter = RecordingPainter::default();
        painter.fill_rect(ViewRect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        painter.draw_text(ViewPos::new(1.0, 1.0), "abc", TextStyle::plain(Color::BLACK));
        painter.fill_rect(ViewRect::new(0.0, 10.0, 10.0, 10.0), Color::BLACK);

        assert_eq!(painter.fill_count(), 2);
        assert_eq!(painter.texts(), vec!["abc"]);
        assert_eq!(
            painter.rect_bytes().len(),
            2 * std::mem::size_of::<RectInstance>()
        );
        assert_eq!(painter.text_width("abc", TextStyle::plain(Color::BLACK)), 21.0);
    }
}
