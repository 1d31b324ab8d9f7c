//! Tiny property grid SDK
//!
//! This crate defines the boundary between the engine and its host.
//! Everything the host must supply (painting, scroll position, status line,
//! persisted settings) is a trait here, and the geometry types both sides
//! agree on live in `types`.

pub use crate::traits::{
    HostServices, PaintContext, PaintContextFactory, SettingsStore, StatusSink, ViewportHost,
};

pub use crate::types::{
    Color, InputEvent, Key, KeyEvent, LayoutPos, LayoutRect, LogicalPixels, LogicalSize,
    Modifiers, MouseButton, MouseEvent, RectInstance, TextStyle, ViewPos, ViewRect,
};

pub use bytemuck;
pub use bytemuck::{Pod, Zeroable};

mod traits;
pub mod types;
