//! Tiny property grid
//!
//! A hierarchical property editor engine: a categorized tree of typed
//! values, a virtualized three-pass renderer and an in-place editing state
//! machine. The host supplies painting, scrolling and settings through the
//! `tiny_sdk` traits and drives the grid with discrete input events.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod config;
pub mod events;
pub mod grid;

// Re-export core types
pub use config::{BehaviorConfig, GridConfig, ThemeConfig};
pub use events::{EventHub, GridEvent};
pub use grid::{PropertyGrid, SPLITTER_KEY};

pub use tiny_sdk as sdk;
pub use tiny_tree::{
    ChoiceRegistry, ChoiceSet, GridError, NodeFlags, NodeId, NodeKind, NodeSpec, PropertyNode,
    PropertyRecord, PropertyTree, Result, TreeOrder, ValueKind, ValueType, ValueTypeRegistry,
    Variant,
};
pub use tiny_ui::{
    EditorDescriptor, EditorRegistry, EngineContext, GridMetrics, GridTheme, RecordingPainter,
    RenderStats, RepaintRegion, SelectionState, Themes,
};
