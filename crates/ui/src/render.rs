//! Three-pass grid painter
//!
//! Pass 1 paints backgrounds and grid lines, pass 2 expand glyphs and
//! labels, pass 3 values. Each pass sets its own clip, so a long label
//! never bleeds into the value column and a value never paints over the
//! next row's wireframe.
//!
//! Row backgrounds are batched: consecutive rows with the same fill become
//! one rectangle, so a block of data rows between two captions costs one
//! fill however long it is.

use tiny_sdk::{Color, LayoutRect, PaintContext, TextStyle, ViewPos, ViewRect};
use tiny_tree::{NodeFlags, NodeId, PropertyNode, PropertyTree};

use crate::editor::EditorRegistry;
use crate::metrics::GridMetrics;
use crate::selection::SelectionController;
use crate::theme::GridTheme;
use crate::visibility::{VisibilityCache, VisibleRow};

/// Part of the grid that needs repainting, in layout space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepaintRegion {
    Full,
    Span { top: f32, bottom: f32 },
}

impl RepaintRegion {
    pub fn span(top: f32, bottom: f32) -> Self {
        Self::Span {
            top: top.min(bottom),
            bottom: top.max(bottom),
        }
    }

    pub fn row(row: &VisibleRow) -> Self {
        Self::span(row.top, row.bottom())
    }

    pub fn union(self, other: RepaintRegion) -> Self {
        match (self, other) {
            (Self::Span { top: a, bottom: b }, Self::Span { top: c, bottom: d }) => Self::Span {
                top: a.min(c),
                bottom: b.max(d),
            },
            _ => Self::Full,
        }
    }

    pub fn intersects(&self, top: f32, bottom: f32) -> bool {
        match *self {
            Self::Full => true,
            Self::Span { top: t, bottom: b } => bottom > t && top < b,
        }
    }
}

/// What one paint call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// `fill_rect` calls, including background runs
    pub fills: usize,
    pub rows: usize,
    /// Rows whose value went through `draw_inactive_value`
    pub values: usize,
    pub glyphs: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum RowFill {
    Caption,
    Data(u8),
    /// Never merged; painted in two halves
    Selected(u8),
}

pub struct RenderPipeline<'a> {
    pub tree: &'a PropertyTree,
    pub cache: &'a VisibilityCache,
    pub metrics: &'a GridMetrics,
    pub theme: &'a GridTheme,
    pub editors: &'a EditorRegistry,
    pub selection: &'a SelectionController,
    /// Grid width in logical pixels
    pub width: f32,
}

impl RenderPipeline<'_> {
    pub fn paint(&self, ctx: &mut dyn PaintContext, region: RepaintRegion) -> RenderStats {
        let rows: Vec<VisibleRow> = self
            .cache
            .rows()
            .iter()
            .filter(|row| region.intersects(row.top, row.bottom()))
            .copied()
            .collect();
        let mut stats = RenderStats {
            rows: rows.len(),
            ..RenderStats::default()
        };
        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            return stats;
        };
        let span = (first.top, last.bottom());

        self.paint_wireframe(ctx, &rows, span, &mut stats);
        self.paint_labels(ctx, &rows, span, &mut stats);
        self.paint_values(ctx, &rows, span, &mut stats);
        ctx.set_clip(None);
        stats
    }

    fn view(&self, rect: LayoutRect) -> ViewRect {
        rect.to_view(self.cache.scroll_y())
    }

    fn view_y(&self, y: f32) -> f32 {
        y - self.cache.scroll_y()
    }

    fn selected(&self) -> Option<NodeId> {
        self.selection.node()
    }

    fn fill_for(&self, row: &VisibleRow, node: &PropertyNode) -> RowFill {
        if node.is_category() {
            RowFill::Caption
        } else if Some(row.node) == self.selected() {
            RowFill::Selected(node.background())
        } else {
            RowFill::Data(node.background())
        }
    }

    // === Pass 1: wireframe ===

    fn paint_wireframe(&self, ctx: &mut dyn PaintContext, rows: &[VisibleRow], span: (f32, f32), stats: &mut RenderStats) {
        let m = self.metrics;
        let height = span.1 - span.0;
        ctx.set_clip(Some(self.view(LayoutRect::new(0.0, span.0, self.width, height))));

        ctx.fill_rect(self.view(LayoutRect::new(0.0, span.0, m.margin_width, height)), self.theme.margin);
        stats.fills += 1;

        let mut run: Option<(RowFill, f32, f32)> = None;
        for row in rows {
            let Some(node) = self.tree.get(row.node) else {
                continue;
            };
            let fill = self.fill_for(row, node);
            match run {
                Some((current, top, _)) if current == fill && !matches!(fill, RowFill::Selected(_)) => {
                    run = Some((current, top, row.bottom()));
                }
                _ => {
                    if let Some(done) = run.take() {
                        self.fill_run(ctx, done, stats);
                    }
                    run = Some((fill, row.top, row.bottom()));
                }
            }
        }
        if let Some(done) = run {
            self.fill_run(ctx, done, stats);
        }

        let right = self.width;
        for row in rows {
            let y = self.view_y(row.bottom()) - 1.0;
            ctx.draw_line(ViewPos::new(m.margin_width, y), ViewPos::new(right, y), self.theme.line);
        }
        let (top, bottom) = (self.view_y(span.0), self.view_y(span.1));
        ctx.draw_line(ViewPos::new(m.margin_width, top), ViewPos::new(m.margin_width, bottom), self.theme.line);

        // Divider skips caption rows, which span both columns
        for row in rows {
            if self.tree.get(row.node).is_some_and(|n| n.is_category()) {
                continue;
            }
            let (top, bottom) = (self.view_y(row.top), self.view_y(row.bottom()));
            ctx.draw_line(ViewPos::new(m.splitter_x, top), ViewPos::new(m.splitter_x, bottom), self.theme.line);
        }
    }

    fn fill_run(&self, ctx: &mut dyn PaintContext, (fill, top, bottom): (RowFill, f32, f32), stats: &mut RenderStats) {
        let m = self.metrics;
        let body = LayoutRect::new(m.margin_width, top, (self.width - m.margin_width).max(0.0), bottom - top);
        match fill {
            RowFill::Caption => {
                ctx.fill_rect(self.view(body), self.theme.caption_background);
                stats.fills += 1;
            }
            RowFill::Data(index) => {
                ctx.fill_rect(self.view(body), self.theme.background(index));
                stats.fills += 1;
            }
            RowFill::Selected(index) => {
                let label = LayoutRect::new(m.margin_width, top, (m.splitter_x - m.margin_width).max(0.0), bottom - top);
                let value = m.value_rect(top, bottom - top, self.width);
                ctx.fill_rect(self.view(label), self.theme.selection_background);
                ctx.fill_rect(self.view(value), self.theme.background(index));
                stats.fills += 2;
            }
        }
    }

    // === Pass 2: glyphs and labels ===

    fn paint_labels(&self, ctx: &mut dyn PaintContext, rows: &[VisibleRow], span: (f32, f32), stats: &mut RenderStats) {
        let m = self.metrics;
        let label_clip = LayoutRect::new(0.0, span.0, m.splitter_x, span.1 - span.0);
        ctx.set_clip(Some(self.view(label_clip)));

        let mut captions = Vec::new();
        for row in rows {
            let Some(node) = self.tree.get(row.node) else {
                continue;
            };
            if node.has_children() {
                self.paint_glyph(ctx, row, node);
                stats.glyphs += 1;
            }
            if node.is_category() {
                captions.push((row, node));
                continue;
            }
            let color = if Some(row.node) == self.selected() {
                self.theme.selection_text
            } else if node.has_flag(NodeFlags::DISABLED) {
                self.theme.disabled_text
            } else {
                self.theme.text
            };
            ctx.draw_text(self.text_pos(m.label_x(node.depth()), row), &node.label, TextStyle::plain(color));
        }

        if captions.is_empty() {
            return;
        }
        ctx.set_clip(Some(self.view(LayoutRect::new(0.0, span.0, self.width, span.1 - span.0))));
        for (row, node) in captions {
            ctx.draw_text(
                self.text_pos(m.label_x(node.depth()), row),
                &node.label,
                TextStyle::bold(self.theme.caption_text),
            );
        }
    }

    /// `+`/`-` box
    fn paint_glyph(&self, ctx: &mut dyn PaintContext, row: &VisibleRow, node: &PropertyNode) {
        let rect = self.view(self.metrics.glyph_rect(node.depth(), row.top, row.height));
        let (left, top, right, bottom) = (rect.x.0, rect.y.0, rect.right(), rect.bottom());
        let color = self.theme.glyph;
        ctx.draw_line(ViewPos::new(left, top), ViewPos::new(right, top), color);
        ctx.draw_line(ViewPos::new(right, top), ViewPos::new(right, bottom), color);
        ctx.draw_line(ViewPos::new(right, bottom), ViewPos::new(left, bottom), color);
        ctx.draw_line(ViewPos::new(left, bottom), ViewPos::new(left, top), color);

        let mid_y = (top + bottom) / 2.0;
        let mid_x = (left + right) / 2.0;
        ctx.draw_line(ViewPos::new(left + 2.0, mid_y), ViewPos::new(right - 2.0, mid_y), color);
        if !node.is_expanded() {
            ctx.draw_line(ViewPos::new(mid_x, top + 2.0), ViewPos::new(mid_x, bottom - 2.0), color);
        }
    }

    fn text_pos(&self, x: f32, row: &VisibleRow) -> ViewPos {
        ViewPos::new(x, self.view_y(row.top) + (row.height - self.metrics.row_height) / 2.0 + 3.0)
    }

    // === Pass 3: values ===

    fn paint_values(&self, ctx: &mut dyn PaintContext, rows: &[VisibleRow], span: (f32, f32), stats: &mut RenderStats) {
        let m = self.metrics;
        let column = m.value_rect(span.0, span.1 - span.0, self.width);
        ctx.set_clip(Some(self.view(column)));

        for row in rows {
            let Some(node) = self.tree.get(row.node) else {
                continue;
            };
            if node.is_category() {
                continue;
            }
            if Some(row.node) == self.selected() {
                if let Some(control) = self.selection.control() {
                    if self.selection.is_invalid() {
                        self.outline(ctx, self.view(control.rect), self.theme.invalid);
                    }
                    continue;
                }
            }
            let Some(descriptor) = self.editors.editor_for(node) else {
                continue;
            };

            let cell = m.value_rect(row.top, row.height, self.width);
            let mut x = cell.x.0 + m.text_padding;
            if descriptor.supports_inline_custom_paint() || node.has_flag(NodeFlags::HAS_CUSTOM_PAINT) {
                let custom = descriptor.custom_paint_width(m);
                let swatch = LayoutRect::new(x, row.top + 3.0, custom, (row.height - 6.0).max(0.0));
                descriptor.paint_custom(ctx, self.view(swatch), node, self.theme);
                x += custom + m.text_padding;
            }
            let text = LayoutRect::new(x, row.top, (cell.right() - x).max(0.0), row.height);
            let mut rect = self.view(text);
            rect.y = self.text_pos(x, row).y;
            descriptor.draw_inactive_value(ctx, rect, node, self.theme);
            stats.values += 1;
        }
    }

    fn outline(&self, ctx: &mut dyn PaintContext, rect: ViewRect, color: Color) {
        let (left, top, right, bottom) = (rect.x.0, rect.y.0, rect.right(), rect.bottom());
        ctx.draw_line(ViewPos::new(left, top), ViewPos::new(right, top), color);
        ctx.draw_line(ViewPos::new(right, top), ViewPos::new(right, bottom), color);
        ctx.draw_line(ViewPos::new(right, bottom), ViewPos::new(left, bottom), color);
        ctx.draw_line(ViewPos::new(left, bottom), ViewPos::new(left, top), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{PaintOp, RecordingPainter};
    use std::sync::Arc;
    use tiny_tree::{NodeSpec, ValueTypeRegistry, Variant};

    struct Grid {
        tree: PropertyTree,
        cache: VisibilityCache,
        metrics: GridMetrics,
        theme: GridTheme,
        editors: EditorRegistry,
        selection: SelectionController,
    }

    impl Grid {
        fn new() -> Self {
            let types = Arc::new(ValueTypeRegistry::with_builtins());
            Self {
                editors: EditorRegistry::with_builtins(types.clone()),
                tree: PropertyTree::new(types),
                cache: VisibilityCache::new(),
                metrics: GridMetrics::default(),
                theme: GridTheme::default(),
                selection: SelectionController::new(),
            }
        }

        fn paint(&mut self, region: RepaintRegion) -> (RenderStats, RecordingPainter) {
            self.cache.update(&mut self.tree, &self.metrics, 0.0, 400.0);
            let mut painter = RecordingPainter::default();
            let stats = RenderPipeline {
                tree: &self.tree,
                cache: &self.cache,
                metrics: &self.metrics,
                theme: &self.theme,
                editors: &self.editors,
                selection: &self.selection,
                width: 300.0,
            }
            .paint(&mut painter, region);
            (stats, painter)
        }
    }

    #[test]
    fn test_data_rows_between_captions_share_one_fill() {
        let mut grid = Grid::new();
        let root = grid.tree.root();
        let a = grid.tree.append(root, NodeSpec::category("A")).unwrap();
        for i in 0..5 {
            let name = format!("a{}", i);
            grid.tree.append(a, NodeSpec::leaf(&name, &name, "int")).unwrap();
        }
        let b = grid.tree.append(root, NodeSpec::category("B")).unwrap();
        grid.tree.append(b, NodeSpec::leaf("b0", "b0", "int")).unwrap();

        let (stats, painter) = grid.paint(RepaintRegion::Full);
        assert_eq!(stats.rows, 8);
        // margin + caption A + run a0..a4 + caption B + run b0
        assert_eq!(stats.fills, 5);
        assert_eq!(painter.fill_count(), stats.fills);
        assert_eq!(stats.values, 6);
        assert_eq!(stats.glyphs, 2);
    }

    #[test]
    fn test_passes_clip_separately() {
        let mut grid = Grid::new();
        let root = grid.tree.root();
        grid.tree.append(root, NodeSpec::leaf("x", "X", "int").with_value(3i64)).unwrap();
        let (_, painter) = grid.paint(RepaintRegion::Full);
        let clips: Vec<_> = painter
            .ops()
            .iter()
            .filter_map(|op| match op {
                PaintOp::SetClip(clip) => Some(*clip),
                _ => None,
            })
            .collect();
        assert_eq!(clips.len(), 4);
        assert_eq!(clips.last(), Some(&None));
        assert_eq!(painter.texts(), vec!["X", "3"]);
    }

    #[test]
    fn test_live_editor_row_skips_inactive_value() {
        let mut grid = Grid::new();
        let root = grid.tree.root();
        let x = grid.tree.append(root, NodeSpec::leaf("x", "X", "int").with_value(3i64)).unwrap();
        grid.tree.append(root, NodeSpec::leaf("y", "Y", "int").with_value(4i64)).unwrap();
        let anchor = grid.metrics.value_rect(0.0, grid.metrics.row_height, 300.0);
        grid.selection
            .select(&mut grid.tree, &grid.editors, Some(x), anchor, false)
            .unwrap();

        let (stats, painter) = grid.paint(RepaintRegion::Full);
        assert_eq!(stats.values, 1);
        assert_eq!(painter.texts(), vec!["X", "Y", "4"]);
        // selected row paints label highlight and value background separately
        assert_eq!(stats.fills, 4);
    }

    #[test]
    fn test_region_limits_rows() {
        let mut grid = Grid::new();
        let root = grid.tree.root();
        for i in 0..10 {
            let name = format!("p{}", i);
            grid.tree.append(root, NodeSpec::leaf(&name, &name, "int")).unwrap();
        }
        let row = grid.metrics.row_height;
        let (stats, _) = grid.paint(RepaintRegion::span(row * 2.0, row * 4.0));
        assert_eq!(stats.rows, 2);

        let merged = RepaintRegion::span(0.0, 10.0).union(RepaintRegion::span(30.0, 40.0));
        assert_eq!(merged, RepaintRegion::span(0.0, 40.0));
        assert_eq!(merged.union(RepaintRegion::Full), RepaintRegion::Full);
    }

    fn value_text_x(painter: &RecordingPainter, value: &str) -> f32 {
        painter
            .ops()
            .iter()
            .find_map(|op| match op {
                PaintOp::Text { pos, text, .. } if text == value => Some(pos.x.0),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_custom_paint_flag_reserves_region() {
        let mut plain = Grid::new();
        let root = plain.tree.root();
        plain.tree.append(root, NodeSpec::leaf("n", "N", "int").with_value(7i64)).unwrap();
        let (_, plain_ops) = plain.paint(RepaintRegion::Full);

        let mut flagged = Grid::new();
        let root = flagged.tree.root();
        flagged
            .tree
            .append(
                root,
                NodeSpec::leaf("n", "N", "int")
                    .with_value(7i64)
                    .with_flags(NodeFlags::HAS_CUSTOM_PAINT),
            )
            .unwrap();
        let (_, flagged_ops) = flagged.paint(RepaintRegion::Full);

        let m = &plain.metrics;
        let shift = value_text_x(&flagged_ops, "7") - value_text_x(&plain_ops, "7");
        assert!((shift - (m.custom_paint_width + m.text_padding)).abs() < 0.01);
    }

    #[test]
    fn test_colour_swatch_precedes_text() {
        let mut grid = Grid::new();
        let root = grid.tree.root();
        grid.tree
            .append(root, NodeSpec::leaf("c", "C", "colour").with_value(Variant::Int(0xFF0000)))
            .unwrap();
        let (_, painter) = grid.paint(RepaintRegion::Full);
        let swatch = painter
            .ops()
            .iter()
            .position(|op| matches!(op, PaintOp::Rect { color, .. } if *color == Color::from_rgb(0xFF0000)))
            .unwrap();
        let text = painter
            .ops()
            .iter()
            .position(|op| matches!(op, PaintOp::Text { text, .. } if text == "#FF0000"))
            .unwrap();
        assert!(swatch < text);
    }
}
