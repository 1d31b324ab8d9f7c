//! Shared types used across the grid crates
//!
//! These types are part of the SDK because both the tree and the ui crates,
//! as well as the host, need them. We keep this minimal.

// === Coordinate System Types ===
//
// Two coordinate spaces with explicit transformations:
// 1. Layout space: logical pixels, pre-scroll (where rows live)
// 2. View space: logical pixels, post-scroll (what the host paints)

use bytemuck::{Pod, Zeroable};

// === Logical Pixels (DPI-independent unit) ===

/// Logical pixels - DPI-independent unit used by Layout and View spaces
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Pod, Zeroable)]
pub struct LogicalPixels(pub f32);

impl std::ops::Add for LogicalPixels {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        LogicalPixels(self.0 + rhs.0)
    }
}

impl std::ops::Add<f32> for LogicalPixels {
    type Output = Self;
    fn add(self, rhs: f32) -> Self {
        LogicalPixels(self.0 + rhs)
    }
}

impl std::ops::Sub for LogicalPixels {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        LogicalPixels(self.0 - rhs.0)
    }
}

impl std::ops::Sub<f32> for LogicalPixels {
    type Output = Self;
    fn sub(self, rhs: f32) -> Self {
        LogicalPixels(self.0 - rhs)
    }
}

impl std::fmt::Display for LogicalPixels {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// === Layout Space (pre-scroll) ===

/// Position in layout space - where rows are before scrolling
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LayoutPos {
    pub x: LogicalPixels,
    pub y: LogicalPixels,
}

impl LayoutPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: LogicalPixels(x),
            y: LogicalPixels(y),
        }
    }
}

/// Size in layout/logical space
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LogicalSize {
    pub width: LogicalPixels,
    pub height: LogicalPixels,
}

impl LogicalSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: LogicalPixels(width),
            height: LogicalPixels(height),
        }
    }
}

/// Rectangle in layout space
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LayoutRect {
    pub x: LogicalPixels,
    pub y: LogicalPixels,
    pub width: LogicalPixels,
    pub height: LogicalPixels,
}

impl LayoutRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x: LogicalPixels(x),
            y: LogicalPixels(y),
            width: LogicalPixels(width),
            height: LogicalPixels(height),
        }
    }

    pub fn contains(&self, pt: LayoutPos) -> bool {
        pt.x.0 >= self.x.0
            && pt.x.0 <= self.x.0 + self.width.0
            && pt.y.0 >= self.y.0
            && pt.y.0 <= self.y.0 + self.height.0
    }

    pub fn bottom(&self) -> f32 {
        self.y.0 + self.height.0
    }

    pub fn right(&self) -> f32 {
        self.x.0 + self.width.0
    }

    /// Shift into view space by subtracting the vertical scroll offset
    pub fn to_view(&self, scroll_y: f32) -> ViewRect {
        ViewRect::new(self.x.0, self.y.0 - scroll_y, self.width.0, self.height.0)
    }
}

// === View Space (post-scroll) ===

/// Position in view space - layout minus scroll offset
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct ViewPos {
    pub x: LogicalPixels,
    pub y: LogicalPixels,
}

impl ViewPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: LogicalPixels(x),
            y: LogicalPixels(y),
        }
    }

    pub fn to_layout(&self, scroll_y: f32) -> LayoutPos {
        LayoutPos::new(self.x.0, self.y.0 + scroll_y)
    }
}

/// Rectangle in view space
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct ViewRect {
    pub x: LogicalPixels,
    pub y: LogicalPixels,
    pub width: LogicalPixels,
    pub height: LogicalPixels,
}

impl ViewRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x: LogicalPixels(x),
            y: LogicalPixels(y),
            width: LogicalPixels(width),
            height: LogicalPixels(height),
        }
    }

    pub fn contains(&self, pos: ViewPos) -> bool {
        pos.x >= self.x
            && pos.x <= self.x + self.width
            && pos.y >= self.y
            && pos.y <= self.y + self.height
    }

    pub fn bottom(&self) -> f32 {
        self.y.0 + self.height.0
    }

    pub fn right(&self) -> f32 {
        self.x.0 + self.width.0
    }
}

// === Paint Data ===

/// A filled rectangle queued for the host
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct RectInstance {
    pub rect: ViewRect,
    pub color: u32,
}

/// RGBA color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Build an opaque color from a packed `0xRRGGBB` value
    pub fn from_rgb(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as f32 / 255.0,
            g: ((rgb >> 8) & 0xFF) as f32 / 255.0,
            b: (rgb & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    /// Convert to u32 for the host (ABGR byte order, like GPU instance data)
    pub fn to_u32(&self) -> u32 {
        let r = (self.r * 255.0) as u32;
        let g = (self.g * 255.0) as u32;
        let b = (self.b * 255.0) as u32;
        let a = (self.a * 255.0) as u32;
        (a << 24) | (b << 16) | (g << 8) | r
    }
}

/// Style for a text run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    pub bold: bool,
}

impl TextStyle {
    pub fn plain(color: Color) -> Self {
        Self { color, bold: false }
    }

    pub fn bold(color: Color) -> Self {
        Self { color, bold: true }
    }
}

// === Input ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Mouse event in view space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub pos: ViewPos,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

/// Keys the grid reacts to; everything else belongs to the live editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Escape,
    Tab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

/// Discrete input delivered by the host event loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    MouseDown(MouseEvent),
    MouseUp(MouseEvent),
    MouseMove(ViewPos),
    DoubleClick(MouseEvent),
    Key(KeyEvent),
    /// Wheel delta in logical pixels, positive scrolls down
    Scroll(f32),
}
