//! Tiny UI - the property grid engine above the tree
//!
//! - Metrics: row geometry and hit testing
//! - Visibility: the cache of rows inside the viewport
//! - Render: the three-pass painter and repaint regions
//! - Editor/Editors: descriptor trait, capability table, built-ins
//! - Selection: the select/edit/commit state machine
//! - Context: registries shared between grids
//! - Theme: colour palettes
//! - Paint: a recording `PaintContext`

pub mod context;
pub mod editor;
pub mod editors;
pub mod metrics;
pub mod paint;
pub mod render;
pub mod selection;
pub mod theme;
pub mod visibility;

// Re-export common types
pub use context::EngineContext;
pub use editor::{validate_common, EditorControl, EditorDescriptor, EditorRegistry, Rejection};
pub use editors::{CheckBoxEditor, ChoiceEditor, ColourEditor, MultiChoiceEditor, TextCtrlEditor};
pub use metrics::{GridMetrics, HitTarget, MIN_COLUMN_WIDTH};
pub use paint::{PaintOp, RecordingPainter};
pub use render::{RenderPipeline, RenderStats, RepaintRegion};
pub use selection::{Commit, LiveEditor, SelectOutcome, SelectionController, SelectionState};
pub use theme::{GridTheme, Themes};
pub use visibility::{CachePath, VisibilityCache, VisibleRow};
