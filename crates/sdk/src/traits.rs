//! Host service traits
//!
//! The engine never draws or measures text itself. Everything that touches
//! the windowing toolkit goes through these traits.

use crate::types::{Color, LogicalSize, TextStyle, ViewPos, ViewRect};

// === Painting ===

/// Drawing surface supplied by the host for one paint request
pub trait PaintContext {
    /// Fill a rectangle in view space
    fn fill_rect(&mut self, rect: ViewRect, color: Color);

    /// Draw a one pixel line in view space
    fn draw_line(&mut self, from: ViewPos, to: ViewPos, color: Color);

    /// Draw a single line of text with its top-left corner at `pos`
    fn draw_text(&mut self, pos: ViewPos, text: &str, style: TextStyle);

    /// Measure text width in logical pixels
    fn text_width(&self, text: &str, style: TextStyle) -> f32;

    /// Restrict subsequent drawing, `None` clears the clip
    fn set_clip(&mut self, clip: Option<ViewRect>);
}

/// Creates paint contexts on demand (one per repaint)
pub trait PaintContextFactory {
    fn begin_paint(&mut self) -> Box<dyn PaintContext + '_>;
}

// === Viewport ===

/// Scroll position and viewport size accessor
pub trait ViewportHost {
    /// Current vertical scroll offset in logical pixels
    fn scroll_y(&self) -> f32;

    /// Size of the visible area
    fn viewport_size(&self) -> LogicalSize;

    /// Ask the host to move its scrollbar (e.g. to keep the selection visible)
    fn set_scroll_y(&mut self, y: f32);
}

// === Optional services ===

/// Status line sink, used for per-node help text and validation messages
pub trait StatusSink {
    fn set_status(&mut self, text: &str);
}

/// Persisted key/value settings (splitter position memory)
pub trait SettingsStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str);
}

/// Optional host services bundle
#[derive(Default)]
pub struct HostServices {
    pub status: Option<Box<dyn StatusSink>>,
    pub settings: Option<Box<dyn SettingsStore>>,
}

impl HostServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, sink: impl StatusSink + 'static) -> Self {
        self.status = Some(Box::new(sink));
        self
    }

    pub fn with_settings(mut self, store: impl SettingsStore + 'static) -> Self {
        self.settings = Some(Box::new(store));
        self
    }

    /// Forward text to the status sink if one is registered
    pub fn status(&mut self, text: &str) {
        if let Some(sink) = self.status.as_mut() {
            sink.set_status(text);
        }
    }
}
