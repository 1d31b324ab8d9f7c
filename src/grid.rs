//! PropertyGrid - the facade a host talks to
//!
//! Owns one tree and everything needed to show and edit it: the visibility
//! cache, the selection controller, geometry, theme and scroll state. Every
//! mutation records what needs repainting; `paint` consumes it.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use tiny_sdk::{
    HostServices, InputEvent, Key, KeyEvent, LayoutRect, MouseButton, MouseEvent, PaintContext,
    PaintContextFactory, ViewportHost,
};
use tiny_tree::{
    records_from_json, records_to_json, GridError, NodeFlags, NodeId, NodeSpec, PropertyRecord,
    PropertyTree, Result, TreeOrder, Variant,
};
use tiny_ui::{
    CachePath, EditorControl, EngineContext, GridMetrics, GridTheme, HitTarget, RenderPipeline,
    RenderStats, RepaintRegion, SelectOutcome, SelectionController, SelectionState,
    VisibilityCache,
};

use crate::config::{BehaviorConfig, GridConfig};
use crate::events::{EventHub, GridEvent};

/// Settings key the splitter position is stored under
pub const SPLITTER_KEY: &str = "propgrid.splitter";

pub struct PropertyGrid {
    context: Arc<EngineContext>,
    tree: PropertyTree,
    cache: VisibilityCache,
    selection: SelectionController,
    metrics: GridMetrics,
    theme: GridTheme,
    behavior: BehaviorConfig,
    scroll_y: f32,
    width: f32,
    height: f32,
    repaint: Option<RepaintRegion>,
    events: EventHub,
    host: HostServices,
    dragging_splitter: bool,
}

impl PropertyGrid {
    pub fn new(context: Arc<EngineContext>) -> Self {
        Self::with_config(context, &GridConfig::default())
    }

    pub fn with_config(context: Arc<EngineContext>, config: &GridConfig) -> Self {
        let mut tree = PropertyTree::new(context.types());
        if !config.behavior.categorized {
            tree.switch_ordering(TreeOrder::Flat);
        }
        tree.set_compact(config.behavior.compact);
        Self {
            context,
            tree,
            cache: VisibilityCache::new(),
            selection: SelectionController::new(),
            metrics: config.metrics.clone(),
            theme: config.theme.resolve(),
            behavior: config.behavior.clone(),
            scroll_y: 0.0,
            width: 400.0,
            height: 300.0,
            repaint: Some(RepaintRegion::Full),
            events: EventHub::new(),
            host: HostServices::new(),
            dragging_splitter: false,
        }
    }

    /// Attach host services; a remembered splitter position is restored
    pub fn with_host(mut self, host: HostServices) -> Self {
        self.host = host;
        if self.behavior.remember_splitter {
            let stored = self
                .host
                .settings
                .as_ref()
                .and_then(|s| s.read(SPLITTER_KEY))
                .and_then(|text| text.trim().parse::<f32>().ok());
            if let Some(x) = stored {
                self.metrics.splitter_x = self.metrics.clamp_splitter(x, self.width);
            }
        }
        self
    }

    // === Accessors ===

    pub fn tree(&self) -> &PropertyTree {
        &self.tree
    }

    pub fn context(&self) -> &Arc<EngineContext> {
        &self.context
    }

    pub fn metrics(&self) -> &GridMetrics {
        &self.metrics
    }

    pub fn theme(&self) -> &GridTheme {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: GridTheme) {
        self.theme = theme;
        self.invalidate();
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selection.node()
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    /// Live editor control of the selected node
    pub fn control(&self) -> Option<&EditorControl> {
        self.selection.control()
    }

    pub fn is_value_invalid(&self) -> bool {
        self.selection.is_invalid()
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn splitter_x(&self) -> f32 {
        self.metrics.splitter_x
    }

    pub fn content_height(&mut self) -> f32 {
        self.cache.content_height(&self.tree, &self.metrics)
    }

    pub fn subscribe(&mut self) -> Receiver<GridEvent> {
        self.events.subscribe()
    }

    /// Pending repaint, if any
    pub fn pending_repaint(&self) -> Option<RepaintRegion> {
        self.repaint
    }

    pub fn take_repaint(&mut self) -> Option<RepaintRegion> {
        self.repaint.take()
    }

    fn invalidate(&mut self) {
        self.repaint = Some(RepaintRegion::Full);
    }

    fn invalidate_node(&mut self, id: Option<NodeId>) {
        let Some(row) = id.and_then(|id| self.cache.row_of(id)) else {
            return;
        };
        let region = RepaintRegion::row(row);
        self.repaint = Some(match self.repaint {
            Some(pending) => pending.union(region),
            None => region,
        });
    }

    // === Structure ===

    pub fn append(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId> {
        let id = self.tree.append(parent, spec)?;
        self.invalidate();
        Ok(id)
    }

    pub fn insert(&mut self, parent: NodeId, index: Option<usize>, spec: NodeSpec) -> Result<NodeId> {
        let id = self.tree.insert(parent, index, spec)?;
        self.invalidate();
        Ok(id)
    }

    /// Remove a subtree. A selection inside it is released first; a delete
    /// the tree would refuse leaves the selection alone.
    pub fn delete(&mut self, id: NodeId) -> Result<()> {
        self.tree.check_delete(id)?;
        if self.selection.node().is_some_and(|s| self.tree.is_within(s, id)) {
            self.release_selection();
        }
        self.tree.delete(id)?;
        self.invalidate();
        Ok(())
    }

    pub fn clear(&mut self) {
        if self.selection.node().is_some() {
            self.release_selection();
        }
        self.tree.clear();
        self.scroll_y = 0.0;
        self.invalidate();
    }

    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<()> {
        self.tree.rename(id, name)
    }

    pub fn set_label(&mut self, id: NodeId, label: &str) -> Result<()> {
        self.tree.set_label(id, label)?;
        self.invalidate_node(Some(id));
        Ok(())
    }

    pub fn set_flag(&mut self, id: NodeId, flag: NodeFlags, on: bool) -> Result<()> {
        self.tree.set_flag(id, flag, on)?;
        if self.selection.node() == Some(id) && flag.intersects(NodeFlags::DISABLED | NodeFlags::NO_EDITOR) {
            // Reopen so the editor reflects the new flags
            self.reselect();
        }
        self.drop_hidden_selection();
        self.invalidate();
        Ok(())
    }

    /// Sort one level (`Some`) or the whole tree
    pub fn sort(&mut self, target: Option<NodeId>) -> Result<()> {
        self.tree.sort(target)?;
        self.invalidate();
        Ok(())
    }

    pub fn expand(&mut self, id: NodeId) -> Result<bool> {
        self.set_expanded(id, true)
    }

    /// Collapse; a selection inside the collapsed subtree moves to `id`
    pub fn collapse(&mut self, id: NodeId) -> Result<bool> {
        self.set_expanded(id, false)
    }

    pub fn toggle(&mut self, id: NodeId) -> Result<bool> {
        let expanded = self.tree.node(id)?.is_expanded();
        self.set_expanded(id, !expanded)
    }

    fn set_expanded(&mut self, id: NodeId, expanded: bool) -> Result<bool> {
        if !expanded {
            if let Some(selected) = self.selection.node() {
                if selected != id && self.tree.is_within(selected, id) {
                    self.select(Some(id))?;
                }
            }
        }
        let changed = self.tree.set_expanded(id, expanded)?;
        if changed {
            self.events.emit(if expanded {
                GridEvent::NodeExpanded(id)
            } else {
                GridEvent::NodeCollapsed(id)
            });
            self.invalidate();
        }
        Ok(changed)
    }

    pub fn switch_ordering(&mut self, order: TreeOrder) -> bool {
        let changed = self.tree.switch_ordering(order);
        if changed {
            self.drop_hidden_selection();
            self.invalidate();
        }
        changed
    }

    pub fn set_compact(&mut self, compact: bool) -> bool {
        let changed = self.tree.set_compact(compact);
        if changed {
            self.drop_hidden_selection();
            self.invalidate();
        }
        changed
    }

    // === Values ===

    /// Programmatic value change. An open, clean editor follows the model.
    pub fn set_value(&mut self, id: NodeId, value: Variant) -> Result<()> {
        self.tree.set_value(id, value)?;
        if self.selection.node().is_some() && !self.selection.is_dirty() {
            self.selection.cancel(&self.tree)?;
        }
        self.invalidate();
        Ok(())
    }

    // === Selection ===

    /// Move the selection. A dirty editor is committed first; if its value
    /// is rejected the selection stays where it is.
    pub fn select(&mut self, target: Option<NodeId>) -> Result<bool> {
        let anchor = match target {
            Some(id) => self.anchor_for(id)?,
            None => LayoutRect::default(),
        };
        let previous = self.selection.node();
        let editors = self.context.editors();
        match self.selection.select(&mut self.tree, &editors, target, anchor, false) {
            Ok(outcome) => {
                self.after_select(outcome, previous);
                Ok(outcome.changed)
            }
            Err(err) => {
                self.report(&err);
                self.invalidate_node(previous);
                Err(err)
            }
        }
    }

    fn after_select(&mut self, outcome: SelectOutcome, previous: Option<NodeId>) {
        if let Some(commit) = outcome.commit {
            self.events.emit(GridEvent::ValueCommitted(commit.notify));
            self.invalidate();
        }
        if !outcome.changed {
            return;
        }
        let current = self.selection.node();
        self.events.emit(GridEvent::SelectionChanged(current));
        let help = current
            .and_then(|id| self.tree.get(id))
            .and_then(|n| n.help.clone())
            .unwrap_or_default();
        self.host.status(&help);
        self.invalidate_node(previous);
        self.invalidate_node(current);
    }

    /// Re-create the editor of the current selection from the model
    fn reselect(&mut self) {
        let Some(id) = self.selection.node() else {
            return;
        };
        let Ok(anchor) = self.anchor_for(id) else {
            return;
        };
        let editors = self.context.editors();
        if let Err(err) = self.selection.select(&mut self.tree, &editors, Some(id), anchor, true) {
            log::warn!("could not reopen editor: {}", err);
        }
    }

    /// Commit if possible, then drop the selection whatever happened
    fn release_selection(&mut self) {
        match self.selection.commit(&mut self.tree) {
            Ok(Some(commit)) => self.events.emit(GridEvent::ValueCommitted(commit.notify)),
            Ok(None) => {}
            Err(err) => log::info!("discarding uncommitted edit: {}", err),
        }
        if self.selection.teardown().is_some() {
            self.events.emit(GridEvent::SelectionChanged(None));
        }
        self.invalidate();
    }

    fn drop_hidden_selection(&mut self) {
        if self.selection.node().is_some_and(|id| !self.tree.is_laid_out(id)) {
            self.release_selection();
        }
    }

    fn anchor_for(&self, id: NodeId) -> Result<LayoutRect> {
        let height = self.metrics.row_height_for(self.tree.node(id)?);
        let top = self
            .cache
            .top_of(&self.tree, &self.metrics, id)
            .unwrap_or(0.0);
        Ok(self.metrics.value_rect(top, height, self.width))
    }

    fn report(&mut self, err: &GridError) {
        match err {
            GridError::ValidationFailed { message, .. } => self.host.status(message),
            other => log::warn!("{}", other),
        }
    }

    /// Replace the transient value of the live editor
    pub fn set_transient_value(&mut self, value: Variant) -> Result<bool> {
        let changed = self.selection.set_transient_value(&self.tree, &value)?;
        self.invalidate_node(self.selection.node());
        Ok(changed)
    }

    /// Replace the text of a text-like editor
    pub fn set_editor_text(&mut self, text: &str) -> Result<bool> {
        self.edit_control(|control| control.text = text.to_string())
    }

    pub fn edit_control(&mut self, edit: impl FnOnce(&mut EditorControl)) -> Result<bool> {
        let changed = self.selection.edit_control(edit)?;
        self.invalidate_node(self.selection.node());
        Ok(changed)
    }

    /// Commit the live editor. Returns the node observers were told about.
    pub fn commit(&mut self) -> Result<Option<NodeId>> {
        match self.selection.commit(&mut self.tree) {
            Ok(Some(commit)) => {
                self.events.emit(GridEvent::ValueCommitted(commit.notify));
                self.invalidate();
                Ok(Some(commit.notify))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                self.report(&err);
                self.invalidate_node(self.selection.node());
                Err(err)
            }
        }
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.selection.cancel(&self.tree)?;
        self.invalidate_node(self.selection.node());
        Ok(())
    }

    /// Free the editor without validating (window teardown)
    pub fn teardown(&mut self) {
        if self.selection.teardown().is_some() {
            self.events.emit(GridEvent::SelectionChanged(None));
            self.invalidate();
        }
    }

    // === Viewport ===

    /// Scroll to `y`, clamped to the content. Returns the applied offset.
    pub fn scroll_to(&mut self, y: f32) -> f32 {
        let max = (self.content_height() - self.height).max(0.0);
        let y = y.clamp(0.0, max);
        if y != self.scroll_y {
            self.scroll_y = y;
            self.invalidate();
        }
        y
    }

    /// Expand ancestors and scroll until `id` is in view. Returns false
    /// when the node cannot be shown (hidden, or a category in flat mode).
    pub fn ensure_visible(&mut self, id: NodeId) -> Result<bool> {
        self.tree.node(id)?;
        for ancestor in self.tree.visual_ancestors(id) {
            if self.tree.set_expanded(ancestor, true)? {
                self.events.emit(GridEvent::NodeExpanded(ancestor));
                self.invalidate();
            }
        }
        if !self.tree.is_laid_out(id) {
            return Ok(false);
        }
        let Some(top) = self.cache.top_of(&self.tree, &self.metrics, id) else {
            return Ok(false);
        };
        let bottom = top + self.metrics.row_height_for(self.tree.node(id)?);
        if top < self.scroll_y {
            self.scroll_to(top);
        } else if bottom > self.scroll_y + self.height {
            self.scroll_to(bottom - self.height);
        }
        Ok(true)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.metrics.splitter_x = self.metrics.clamp_splitter(self.metrics.splitter_x, self.width);
        self.scroll_to(self.scroll_y);
        self.move_editor();
        self.invalidate();
    }

    /// Pull size and scroll from the host; push back a clamped scroll
    pub fn sync_viewport(&mut self, host: &mut dyn ViewportHost) {
        let size = host.viewport_size();
        if size.width.0 != self.width || size.height.0 != self.height {
            self.resize(size.width.0, size.height.0);
        }
        let wanted = host.scroll_y();
        let applied = self.scroll_to(wanted);
        if applied != wanted {
            host.set_scroll_y(applied);
        }
    }

    /// Move the label/value divider and remember it
    pub fn set_splitter(&mut self, x: f32) {
        self.move_splitter(x);
        self.persist_splitter();
    }

    fn move_splitter(&mut self, x: f32) {
        let x = self.metrics.clamp_splitter(x, self.width);
        if x != self.metrics.splitter_x {
            self.metrics.splitter_x = x;
            self.move_editor();
            self.invalidate();
        }
    }

    fn persist_splitter(&mut self) {
        if !self.behavior.remember_splitter {
            return;
        }
        let value = self.metrics.splitter_x.to_string();
        if let Some(settings) = self.host.settings.as_mut() {
            settings.write(SPLITTER_KEY, &value);
        }
    }

    fn move_editor(&mut self) {
        if let Some(id) = self.selection.node() {
            if let Ok(anchor) = self.anchor_for(id) {
                self.selection.move_editor(anchor);
            }
        }
    }

    fn refresh_layout(&mut self) {
        let path = self.cache.update(&mut self.tree, &self.metrics, self.scroll_y, self.height);
        if path != CachePath::Unchanged {
            self.invalidate();
        }
    }

    // === Input ===

    pub fn handle_input(&mut self, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::MouseDown(mouse) => self.mouse_down(mouse),
            InputEvent::MouseUp(_) => {
                if self.dragging_splitter {
                    self.dragging_splitter = false;
                    self.persist_splitter();
                }
                Ok(())
            }
            InputEvent::MouseMove(pos) => {
                if self.dragging_splitter {
                    self.move_splitter(pos.x.0);
                }
                Ok(())
            }
            InputEvent::DoubleClick(mouse) => {
                self.refresh_layout();
                match self.metrics.hit_test(&self.tree, &self.cache, mouse.pos, self.scroll_y) {
                    HitTarget::Label(id) if self.tree.get(id).is_some_and(|n| n.has_children()) => {
                        self.toggle(id).map(|_| ())
                    }
                    _ => Ok(()),
                }
            }
            InputEvent::Key(key) => self.key_down(key),
            InputEvent::Scroll(delta) => {
                self.scroll_to(self.scroll_y + delta);
                Ok(())
            }
        }
    }

    fn mouse_down(&mut self, mouse: MouseEvent) -> Result<()> {
        self.refresh_layout();
        let hit = self.metrics.hit_test(&self.tree, &self.cache, mouse.pos, self.scroll_y);
        match (mouse.button, hit) {
            (MouseButton::Left, HitTarget::Splitter) => self.dragging_splitter = true,
            (MouseButton::Left, HitTarget::Expander(id)) => {
                self.toggle(id)?;
            }
            (MouseButton::Left, HitTarget::Label(id) | HitTarget::Value(id)) => {
                self.select(Some(id))?;
            }
            (MouseButton::Right, HitTarget::Label(id) | HitTarget::Value(id) | HitTarget::Expander(id)) => {
                self.select(Some(id))?;
                self.events.emit(GridEvent::RightClick(id));
            }
            _ => {}
        }
        Ok(())
    }

    fn key_down(&mut self, key: KeyEvent) -> Result<()> {
        let current = self.selection.node();
        let target = match key.key {
            Key::Enter => return self.commit().map(|_| ()),
            Key::Escape => return self.cancel(),
            Key::Down => self.step(current, 1),
            Key::Up => self.step(current, -1),
            Key::Tab if key.modifiers.shift => self.step(current, -1),
            Key::Tab => self.step(current, 1),
            Key::Home => self.tree.first_visible(),
            Key::End => self.tree.last_visible(),
            Key::PageDown => self.step(current, self.metrics.page_rows(self.height) as i32),
            Key::PageUp => self.step(current, -(self.metrics.page_rows(self.height) as i32)),
            Key::Left => {
                let Some(id) = current else {
                    return Ok(());
                };
                let node = self.tree.node(id)?;
                if node.has_children() && node.is_expanded() {
                    return self.collapse(id).map(|_| ());
                }
                self.tree.visual_parent(id).filter(|&p| p != self.tree.root())
            }
            Key::Right => {
                if let Some(id) = current {
                    self.expand(id)?;
                }
                return Ok(());
            }
        };
        if let Some(target) = target.filter(|&t| Some(t) != current) {
            self.select(Some(target))?;
            self.ensure_visible(target)?;
        }
        Ok(())
    }

    /// Walk `rows` visible rows from `from`; with no selection start at the
    /// first row
    fn step(&self, from: Option<NodeId>, rows: i32) -> Option<NodeId> {
        let Some(mut id) = from else {
            return self.tree.first_visible();
        };
        for _ in 0..rows.unsigned_abs() {
            let next = if rows > 0 {
                self.tree.next_visible(id)
            } else {
                self.tree.prev_visible(id)
            };
            match next {
                Some(next) => id = next,
                None => break,
            }
        }
        Some(id)
    }

    // === Painting ===

    /// Paint the pending region (everything when nothing is pending)
    pub fn paint(&mut self, ctx: &mut dyn PaintContext) -> RenderStats {
        let path = self.cache.update(&mut self.tree, &self.metrics, self.scroll_y, self.height);
        let mut region = self.repaint.take().unwrap_or(RepaintRegion::Full);
        if path != CachePath::Unchanged {
            region = RepaintRegion::Full;
        }
        let editors = self.context.editors();
        let stats = RenderPipeline {
            tree: &self.tree,
            cache: &self.cache,
            metrics: &self.metrics,
            theme: &self.theme,
            editors: &editors,
            selection: &self.selection,
            width: self.width,
        }
        .paint(ctx, region);
        log::trace!("painted {:?}: {:?}", region, stats);
        stats
    }

    pub fn paint_with(&mut self, factory: &mut dyn PaintContextFactory) -> RenderStats {
        let mut ctx = factory.begin_paint();
        self.paint(ctx.as_mut())
    }

    // === Records ===

    /// Bulk load; either every record lands or nothing changes
    pub fn load_records(&mut self, records: &[PropertyRecord]) -> Result<Vec<NodeId>> {
        let root = self.tree.root();
        let ids = {
            let choices = self.context.choices();
            self.tree.load_records(root, records, &choices)?
        };
        if self.behavior.sort_on_load {
            self.tree.sort(None)?;
        }
        self.invalidate();
        log::info!("loaded {} records", records.len());
        Ok(ids)
    }

    pub fn save_records(&self) -> Vec<PropertyRecord> {
        self.tree.to_records()
    }

    pub fn load_json(&mut self, text: &str) -> Result<Vec<NodeId>> {
        let records = records_from_json(text)?;
        self.load_records(&records)
    }

    pub fn save_json(&self) -> Result<String> {
        records_to_json(&self.save_records())
    }
}
