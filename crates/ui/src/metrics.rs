//! Grid metrics - single source of truth for row geometry
//!
//! Two spaces, as in `tiny_sdk`: layout (pre-scroll) and view (post-scroll).
//! Rows live in layout space; everything handed to a `PaintContext` is in
//! view space.

use serde::{Deserialize, Serialize};
use tiny_sdk::{LayoutRect, ViewPos};
use tiny_tree::{NodeId, PropertyNode, PropertyTree};

use crate::visibility::VisibilityCache;

/// Smallest width either column may shrink to when dragging the splitter
pub const MIN_COLUMN_WIDTH: f32 = 24.0;

/// All geometry configuration in one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridMetrics {
    /// Height of every value row in logical pixels
    pub row_height: f32,
    /// Height of category caption rows
    pub caption_height: f32,
    /// Extra indentation per depth level
    pub indent: f32,
    /// Width of the left gutter holding top-level expand glyphs
    pub margin_width: f32,
    /// X of the label/value divider
    pub splitter_x: f32,
    /// Side of the expand/collapse box
    pub glyph_size: f32,
    /// Width reserved for an inline custom-painted value (colour swatch)
    pub custom_paint_width: f32,
    /// Gap between a column edge and its text
    pub text_padding: f32,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            row_height: 20.0,
            caption_height: 22.0,
            indent: 16.0,
            margin_width: 18.0,
            splitter_x: 140.0,
            glyph_size: 9.0,
            custom_paint_width: 20.0,
            text_padding: 4.0,
        }
    }
}

/// What a point in the grid lands on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    /// Expand/collapse box of a node with children
    Expander(NodeId),
    Label(NodeId),
    Value(NodeId),
    /// Within grab distance of the label/value divider
    Splitter,
    /// Below the last row
    Empty,
}

impl GridMetrics {
    pub fn row_height_for(&self, node: &PropertyNode) -> f32 {
        if node.is_category() {
            self.caption_height
        } else {
            self.row_height
        }
    }

    /// Left edge of the indentation for a node at `depth` (top level is 1)
    pub fn indent_x(&self, depth: u32) -> f32 {
        depth.saturating_sub(1) as f32 * self.indent
    }

    /// Where the label text starts
    pub fn label_x(&self, depth: u32) -> f32 {
        self.margin_width + self.indent_x(depth) + self.text_padding
    }

    /// Expand box for a row, centered in its indentation slot
    pub fn glyph_rect(&self, depth: u32, row_top: f32, row_height: f32) -> LayoutRect {
        let x = self.indent_x(depth) + (self.margin_width - self.glyph_size) / 2.0;
        let y = row_top + (row_height - self.glyph_size) / 2.0;
        LayoutRect::new(x, y, self.glyph_size, self.glyph_size)
    }

    /// Value column of a row in layout space
    pub fn value_rect(&self, row_top: f32, row_height: f32, width: f32) -> LayoutRect {
        LayoutRect::new(
            self.splitter_x + 1.0,
            row_top,
            (width - self.splitter_x - 1.0).max(0.0),
            row_height,
        )
    }

    /// Keep the splitter inside the grid with both columns usable
    pub fn clamp_splitter(&self, x: f32, width: f32) -> f32 {
        let min = self.margin_width + MIN_COLUMN_WIDTH;
        let max = (width - MIN_COLUMN_WIDTH).max(min);
        x.clamp(min, max)
    }

    /// Resolve a view-space point against the laid-out rows
    pub fn hit_test(
        &self,
        tree: &PropertyTree,
        cache: &VisibilityCache,
        pos: ViewPos,
        scroll_y: f32,
    ) -> HitTarget {
        if (pos.x.0 - self.splitter_x).abs() <= 3.0 {
            return HitTarget::Splitter;
        }
        let layout = pos.to_layout(scroll_y);
        let Some(row) = cache.row_at(layout.y.0) else {
            return HitTarget::Empty;
        };
        let Some(node) = tree.get(row.node) else {
            return HitTarget::Empty;
        };
        if node.has_children() {
            let glyph = self.glyph_rect(node.depth(), row.top, row.height);
            // Generous horizontal slop, the box itself is tiny
            if layout.x.0 >= glyph.x.0 - 2.0 && layout.x.0 <= glyph.right() + 2.0 {
                return HitTarget::Expander(row.node);
            }
        }
        if node.is_category() || layout.x.0 < self.splitter_x {
            HitTarget::Label(row.node)
        } else {
            HitTarget::Value(row.node)
        }
    }

    /// Rows that fit in `height`, at least one
    pub fn page_rows(&self, height: f32) -> usize {
        ((height / self.row_height).floor() as usize).max(1)
    }
}
