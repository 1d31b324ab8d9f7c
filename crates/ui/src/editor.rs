//! Editor descriptors and the editor table
//!
//! A descriptor knows how to turn a node value into a live control, read the
//! user's transient value back out, validate it and draw the value while no
//! control is open. Descriptors are stateless and shared; the control state
//! lives in `EditorControl`, owned by the selection controller.

use std::sync::Arc;

use ahash::AHashMap as HashMap;
use regex::Regex;
use tiny_sdk::{LayoutRect, PaintContext, TextStyle, ViewPos, ViewRect};
use tiny_tree::{GridError, NodeFlags, NodeKind, PropertyNode, ValueKind, ValueTypeRegistry, Variant};

use crate::editors::{CheckBoxEditor, ChoiceEditor, ColourEditor, MultiChoiceEditor, TextCtrlEditor};
use crate::metrics::GridMetrics;
use crate::theme::GridTheme;

/// State of a live editor widget
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorControl {
    /// Anchor in layout space (the value cell)
    pub rect: LayoutRect,
    /// Text buffer for text-like editors
    pub text: String,
    /// Selected entry for enumerated editors
    pub choice: Option<usize>,
    pub checked: bool,
}

/// A transient value the editor refused
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub value: Variant,
    pub message: String,
}

impl Rejection {
    pub fn new(value: Variant, message: impl Into<String>) -> Self {
        Self {
            value,
            message: message.into(),
        }
    }
}

impl From<Rejection> for GridError {
    fn from(rejection: Rejection) -> Self {
        GridError::ValidationFailed {
            value: rejection.value,
            message: rejection.message,
        }
    }
}

/// Per-value-type editing behaviour
pub trait EditorDescriptor: Send + Sync {
    /// Name editors are registered and looked up by
    fn name(&self) -> &'static str;

    /// Build a control anchored at `anchor` showing `value`. `None` when this
    /// editor cannot edit the node (e.g. a choice editor without choices).
    fn create_control(&self, anchor: LayoutRect, value: &Variant, node: &PropertyNode) -> Option<EditorControl>;

    /// Current transient value. Text that does not parse comes back as a
    /// string for `validate` to reject.
    fn read_control(&self, control: &EditorControl, node: &PropertyNode) -> Variant;

    /// Replace the control's transient value
    fn write_control(&self, control: &mut EditorControl, value: &Variant, node: &PropertyNode);

    fn validate(&self, value: &Variant, node: &PropertyNode) -> Result<(), Rejection> {
        validate_common(value, node)
    }

    /// Text shown while the node is not being edited
    fn value_text(&self, node: &PropertyNode) -> String {
        if node.has_flag(NodeFlags::UNSPECIFIED) {
            return String::new();
        }
        node.value.to_string()
    }

    /// Draw the value of a node that has no live control
    fn draw_inactive_value(&self, ctx: &mut dyn PaintContext, rect: ViewRect, node: &PropertyNode, theme: &GridTheme) {
        let text = self.value_text(node);
        if text.is_empty() {
            return;
        }
        let color = if node.has_flag(NodeFlags::DISABLED) {
            theme.disabled_text
        } else {
            theme.text
        };
        let style = if node.has_flag(NodeFlags::MODIFIED) {
            TextStyle::bold(color)
        } else {
            TextStyle::plain(color)
        };
        ctx.draw_text(ViewPos::new(rect.x.0, rect.y.0), &text, style);
    }

    /// Whether the value cell starts with a custom-painted area
    fn supports_inline_custom_paint(&self) -> bool {
        false
    }

    /// Width of the custom-painted area
    fn custom_paint_width(&self, metrics: &GridMetrics) -> f32 {
        metrics.custom_paint_width
    }

    /// Paint the custom area (swatch, icon) of the value cell
    fn paint_custom(&self, _ctx: &mut dyn PaintContext, _rect: ViewRect, _node: &PropertyNode, _theme: &GridTheme) {}
}

/// Checks every editor applies: variant tag, `min`/`max` for numbers,
/// `pattern` for strings.
pub fn validate_common(value: &Variant, node: &PropertyNode) -> Result<(), Rejection> {
    if value.kind() != node.value.kind() {
        return Err(Rejection::new(
            value.clone(),
            format!("'{}' is not a valid {} for {}", value, node.value_type, node.label),
        ));
    }

    let number = match value {
        Variant::Int(v) => Some(*v as f64),
        Variant::Real(v) => Some(*v),
        _ => None,
    };
    if let Some(number) = number {
        if let Some(min) = node.attributes.get_f64("min") {
            if number < min {
                return Err(Rejection::new(
                    value.clone(),
                    format!("{} must be at least {}", node.label, min),
                ));
            }
        }
        if let Some(max) = node.attributes.get_f64("max") {
            if number > max {
                return Err(Rejection::new(
                    value.clone(),
                    format!("{} must be at most {}", node.label, max),
                ));
            }
        }
    }

    if let (Variant::Str(text), Some(pattern)) = (value, node.attributes.get("pattern")) {
        match Regex::new(&format!("^(?:{})$", pattern)) {
            Ok(re) if !re.is_match(text) => {
                return Err(Rejection::new(
                    value.clone(),
                    format!("'{}' does not match the format of {}", text, node.label),
                ))
            }
            Ok(_) => {}
            Err(err) => log::warn!("ignoring bad pattern on '{}': {}", node.key(), err),
        }
    }
    Ok(())
}

/// Capability table: explicit names, value-type tags and variant kinds
/// mapped to descriptors.
#[derive(Clone, Default)]
pub struct EditorRegistry {
    by_name: HashMap<String, Arc<dyn EditorDescriptor>>,
    by_tag: HashMap<String, String>,
    by_kind: HashMap<ValueKind, String>,
    /// Editor used for nodes that carry a choice set
    choice_editor: Option<String>,
}

impl EditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in editors bound to the built-in value types
    pub fn with_builtins(types: Arc<ValueTypeRegistry>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextCtrlEditor::new(types.clone())));
        registry.register(Arc::new(ChoiceEditor));
        registry.register(Arc::new(CheckBoxEditor));
        registry.register(Arc::new(MultiChoiceEditor));
        registry.register(Arc::new(ColourEditor::new(types)));

        for kind in [
            ValueKind::Int,
            ValueKind::Real,
            ValueKind::Str,
            ValueKind::StrList,
            ValueKind::Opaque,
        ] {
            registry.bind_kind(kind, TextCtrlEditor::NAME);
        }
        registry.bind_kind(ValueKind::Bool, CheckBoxEditor::NAME);
        registry.bind_tag("choice", ChoiceEditor::NAME);
        registry.bind_tag("multichoice", MultiChoiceEditor::NAME);
        registry.bind_tag("colour", ColourEditor::NAME);
        registry.choice_editor = Some(ChoiceEditor::NAME.to_string());
        registry
    }

    /// Register or replace a descriptor under its name
    pub fn register(&mut self, editor: Arc<dyn EditorDescriptor>) {
        log::debug!("registered editor '{}'", editor.name());
        self.by_name.insert(editor.name().to_string(), editor);
    }

    pub fn bind_tag(&mut self, tag: &str, editor: &str) {
        self.by_tag.insert(tag.to_string(), editor.to_string());
    }

    pub fn bind_kind(&mut self, kind: ValueKind, editor: &str) {
        self.by_kind.insert(kind, editor.to_string());
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn EditorDescriptor>> {
        self.by_name.get(name).cloned()
    }

    /// Descriptor for drawing and editing a node: explicit editor name,
    /// then value-type tag, then choice set, then variant kind.
    pub fn editor_for(&self, node: &PropertyNode) -> Option<Arc<dyn EditorDescriptor>> {
        if node.kind == NodeKind::Category || node.kind == NodeKind::Root {
            return None;
        }
        if let Some(name) = &node.editor {
            match self.get(name) {
                Some(editor) => return Some(editor),
                None => log::warn!("'{}' asks for unknown editor '{}'", node.key(), name),
            }
        }
        if let Some(editor) = self.by_tag.get(&node.value_type).and_then(|n| self.get(n)) {
            return Some(editor);
        }
        if node.choices.is_some() {
            if let Some(editor) = self.choice_editor.as_deref().and_then(|n| self.get(n)) {
                return Some(editor);
            }
        }
        self.by_kind
            .get(&node.value.kind())
            .and_then(|n| self.get(n))
    }

    /// Descriptor only if the node may open a live control
    pub fn control_editor_for(&self, node: &PropertyNode) -> Option<Arc<dyn EditorDescriptor>> {
        if node.flags.intersects(NodeFlags::NO_EDITOR | NodeFlags::DISABLED) {
            return None;
        }
        self.editor_for(node)
    }
}
