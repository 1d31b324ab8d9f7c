//! Visibility cache
//!
//! Keeps the ordered list of rows intersecting the viewport. Each update
//! picks the cheapest path that yields the same rows a full scan would:
//!
//! - tree generation changed, or the scroll jumped more than one row:
//!   full scan from the first row
//! - scroll moved exactly one row: drop the row that left, add its
//!   neighbour
//! - anything smaller (sub-row scroll, taller viewport): extend or trim
//!   from the cached edges
//!
//! Row positions are layout space and are written back into the tree's
//! `cached_top_y`.

use std::collections::VecDeque;

use tiny_tree::{NodeId, PropertyTree};

use crate::metrics::GridMetrics;

/// Scroll deltas within this distance of one row count as one row
const STEP_EPSILON: f32 = 0.01;

/// One laid-out row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRow {
    pub node: NodeId,
    /// Layout-space top
    pub top: f32,
    pub height: f32,
}

impl VisibleRow {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    fn intersects(&self, top: f32, bottom: f32) -> bool {
        self.bottom() > top && self.top < bottom
    }
}

/// Which update path the last `update` took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePath {
    Unchanged,
    Full,
    StepDown,
    StepUp,
    Extended,
}

pub struct VisibilityCache {
    rows: VecDeque<VisibleRow>,
    /// Tree generation the rows were computed for
    generation: Option<u64>,
    scroll_y: f32,
    viewport_height: f32,
    /// (generation, height) of the last content-height walk
    content_height: Option<(u64, f32)>,
    last_path: CachePath,
}

impl Default for VisibilityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityCache {
    pub fn new() -> Self {
        Self {
            rows: VecDeque::new(),
            generation: None,
            scroll_y: 0.0,
            viewport_height: 0.0,
            content_height: None,
            last_path: CachePath::Unchanged,
        }
    }

    pub fn rows(&self) -> &VecDeque<VisibleRow> {
        &self.rows
    }

    pub fn last_path(&self) -> CachePath {
        self.last_path
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// Force the next update onto the full path
    pub fn invalidate(&mut self) {
        self.generation = None;
        self.content_height = None;
    }

    /// Bring the rows up to date for a window of `viewport_height` starting
    /// at `scroll_y` (layout space).
    pub fn update(
        &mut self,
        tree: &mut PropertyTree,
        metrics: &GridMetrics,
        scroll_y: f32,
        viewport_height: f32,
    ) -> CachePath {
        let delta = scroll_y - self.scroll_y;
        let path = if self.generation != Some(tree.generation()) || self.rows.is_empty() {
            CachePath::Full
        } else if delta.abs() > metrics.row_height + STEP_EPSILON {
            CachePath::Full
        } else if delta == 0.0 && viewport_height == self.viewport_height {
            CachePath::Unchanged
        } else if (delta.abs() - metrics.row_height).abs() <= STEP_EPSILON {
            if delta > 0.0 {
                CachePath::StepDown
            } else {
                CachePath::StepUp
            }
        } else {
            CachePath::Extended
        };

        self.scroll_y = scroll_y;
        self.viewport_height = viewport_height;
        match path {
            CachePath::Unchanged => {}
            CachePath::Full => self.recalculate(tree, metrics),
            _ => {
                if !self.settle(tree, metrics) {
                    self.recalculate(tree, metrics);
                }
            }
        }
        if path != CachePath::Unchanged {
            log::debug!(
                "visibility {:?}: {} rows at y={} (generation {})",
                path,
                self.rows.len(),
                scroll_y,
                tree.generation()
            );
        }
        self.last_path = path;
        path
    }

    /// Linear scan from the first row until the window is filled
    fn recalculate(&mut self, tree: &mut PropertyTree, metrics: &GridMetrics) {
        let generation = tree.generation();
        if self.generation != Some(generation) {
            tree.clear_cached_tops();
        }
        self.rows.clear();
        let (top, bottom) = self.window();

        let mut y = 0.0;
        let mut current = tree.first_visible();
        while let Some(id) = current {
            if y >= bottom {
                break;
            }
            let Some(node) = tree.get(id) else {
                break;
            };
            let row = VisibleRow {
                node: id,
                top: y,
                height: metrics.row_height_for(node),
            };
            tree.set_cached_top(id, Some(y));
            if row.intersects(top, bottom) {
                self.rows.push_back(row);
            }
            y = row.bottom();
            current = tree.next_visible(id);
        }
        self.generation = Some(generation);
    }

    /// Grow and trim the cached rows toward the window. Returns false when
    /// there is nothing left to anchor on.
    fn settle(&mut self, tree: &mut PropertyTree, metrics: &GridMetrics) -> bool {
        let (top, bottom) = self.window();

        // Extend downward
        while let Some(last) = self.rows.back().copied() {
            if last.bottom() >= bottom {
                break;
            }
            let Some(next) = tree.next_visible(last.node) else {
                break;
            };
            let Some(node) = tree.get(next) else {
                break;
            };
            let row = VisibleRow {
                node: next,
                top: last.bottom(),
                height: metrics.row_height_for(node),
            };
            tree.set_cached_top(next, Some(row.top));
            self.rows.push_back(row);
        }

        // Extend upward
        while let Some(first) = self.rows.front().copied() {
            if first.top <= top {
                break;
            }
            let Some(prev) = tree.prev_visible(first.node) else {
                break;
            };
            let Some(node) = tree.get(prev) else {
                break;
            };
            let height = metrics.row_height_for(node);
            let row = VisibleRow {
                node: prev,
                top: first.top - height,
                height,
            };
            tree.set_cached_top(prev, Some(row.top));
            self.rows.push_front(row);
        }

        // Trim, keeping one row as anchor
        while self.rows.len() > 1 && self.rows.front().is_some_and(|r| r.bottom() <= top) {
            self.rows.pop_front();
        }
        while self.rows.len() > 1 && self.rows.back().is_some_and(|r| r.top >= bottom) {
            self.rows.pop_back();
        }
        match self.rows.front() {
            Some(row) if row.intersects(top, bottom) => true,
            Some(_) => {
                self.rows.clear();
                false
            }
            None => false,
        }
    }

    fn window(&self) -> (f32, f32) {
        (self.scroll_y, self.scroll_y + self.viewport_height)
    }

    /// Row covering layout-space `y`
    pub fn row_at(&self, y: f32) -> Option<&VisibleRow> {
        let index = self
            .rows
            .partition_point(|row| row.bottom() <= y);
        self.rows.get(index).filter(|row| row.top <= y)
    }

    /// Cached row of a node, if it is inside the window
    pub fn row_of(&self, node: NodeId) -> Option<&VisibleRow> {
        self.rows.iter().find(|row| row.node == node)
    }

    /// Height of every laid-out row together
    pub fn content_height(&mut self, tree: &PropertyTree, metrics: &GridMetrics) -> f32 {
        let generation = tree.generation();
        if let Some((cached_generation, height)) = self.content_height {
            if cached_generation == generation {
                return height;
            }
        }
        let mut height = 0.0;
        let mut current = tree.first_visible();
        while let Some(id) = current {
            if let Some(node) = tree.get(id) {
                height += metrics.row_height_for(node);
            }
            current = tree.next_visible(id);
        }
        self.content_height = Some((generation, height));
        height
    }

    /// Layout-space top of a laid-out node, walking from the first row when
    /// it has no recorded position.
    pub fn top_of(&self, tree: &PropertyTree, metrics: &GridMetrics, target: NodeId) -> Option<f32> {
        if let Some(row) = self.row_of(target) {
            return Some(row.top);
        }
        if self.generation == Some(tree.generation()) {
            if let Some(top) = tree.get(target).and_then(|n| n.cached_top_y()) {
                return Some(top);
            }
        }
        let mut y = 0.0;
        let mut current = tree.first_visible();
        while let Some(id) = current {
            if id == target {
                return Some(y);
            }
            if let Some(node) = tree.get(id) {
                y += metrics.row_height_for(node);
            }
            current = tree.next_visible(id);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_tree::NodeSpec;

    fn tree_with_rows(count: usize) -> PropertyTree {
        let mut tree = PropertyTree::default();
        let root = tree.root();
        for i in 0..count {
            let name = format!("p{}", i);
            tree.append(root, NodeSpec::leaf(&name, &name, "int")).unwrap();
        }
        tree
    }

    fn nodes(cache: &VisibilityCache) -> Vec<NodeId> {
        cache.rows().iter().map(|r| r.node).collect()
    }

    #[test]
    fn test_single_row_step_matches_full() {
        let mut tree = tree_with_rows(40);
        let metrics = GridMetrics::default();
        let height = metrics.row_height * 10.0;
        let mut cache = VisibilityCache::new();
        assert_eq!(cache.update(&mut tree, &metrics, 0.0, height), CachePath::Full);
        assert_eq!(cache.rows().len(), 10);

        let path = cache.update(&mut tree, &metrics, metrics.row_height, height);
        assert_eq!(path, CachePath::StepDown);

        let mut fresh = VisibilityCache::new();
        fresh.update(&mut tree, &metrics, metrics.row_height, height);
        assert_eq!(nodes(&cache), nodes(&fresh));
        assert_eq!(cache.rows().front().map(|r| r.node), tree.find("p1"));
        assert_eq!(cache.rows().back().map(|r| r.node), tree.find("p10"));

        assert_eq!(cache.update(&mut tree, &metrics, 0.0, height), CachePath::StepUp);
        assert_eq!(cache.rows().front().map(|r| r.node), tree.find("p0"));
    }

    #[test]
    fn test_jump_and_generation_force_full() {
        let mut tree = tree_with_rows(40);
        let metrics = GridMetrics::default();
        let mut cache = VisibilityCache::new();
        cache.update(&mut tree, &metrics, 0.0, 200.0);
        assert_eq!(cache.update(&mut tree, &metrics, 300.0, 200.0), CachePath::Full);
        assert_eq!(cache.update(&mut tree, &metrics, 300.0, 200.0), CachePath::Unchanged);

        let p20 = tree.find("p20").unwrap();
        tree.delete(p20).unwrap();
        assert_eq!(cache.update(&mut tree, &metrics, 300.0, 200.0), CachePath::Full);
    }

    #[test]
    fn test_partial_scroll_extends() {
        let mut tree = tree_with_rows(40);
        let metrics = GridMetrics::default();
        let mut cache = VisibilityCache::new();
        cache.update(&mut tree, &metrics, 0.0, 200.0);
        assert_eq!(cache.update(&mut tree, &metrics, 7.0, 200.0), CachePath::Extended);
        assert_eq!(cache.rows().len(), 11);
        assert_eq!(cache.update(&mut tree, &metrics, 7.0, 300.0), CachePath::Extended);

        let mut fresh = VisibilityCache::new();
        fresh.update(&mut tree, &metrics, 7.0, 300.0);
        assert_eq!(nodes(&cache), nodes(&fresh));
    }

    #[test]
    fn test_row_at_and_top_of() {
        let mut tree = tree_with_rows(5);
        let metrics = GridMetrics::default();
        let mut cache = VisibilityCache::new();
        cache.update(&mut tree, &metrics, 0.0, 1000.0);
        let p2 = tree.find("p2").unwrap();
        assert_eq!(cache.row_at(45.0).map(|r| r.node), Some(p2));
        assert!(cache.row_at(500.0).is_none());
        assert_eq!(cache.top_of(&tree, &metrics, p2), Some(40.0));
        assert_eq!(tree.get(p2).unwrap().cached_top_y(), Some(40.0));
        assert_eq!(cache.content_height(&tree, &metrics), 100.0);
    }
}
