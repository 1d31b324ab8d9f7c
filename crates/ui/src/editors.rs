//! Built-in editor descriptors

use std::sync::Arc;

use tiny_sdk::{Color, LayoutRect, PaintContext, ViewPos, ViewRect};
use tiny_tree::text::{join_quoted, split_quoted};
use tiny_tree::{NodeFlags, PropertyNode, ValueKind, ValueTypeRegistry, Variant};

use crate::editor::{validate_common, EditorControl, EditorDescriptor, Rejection};
use crate::theme::GridTheme;

/// Format with the node's value-type codec, falling back to `Display`
fn format_value(types: &ValueTypeRegistry, node: &PropertyNode, value: &Variant) -> String {
    types
        .format(&node.value_type, value)
        .unwrap_or_else(|_| value.to_string())
}

/// Parse with the node's codec; unparseable text is handed back as a string
fn parse_text(types: &ValueTypeRegistry, node: &PropertyNode, text: &str) -> Variant {
    if text.is_empty() && node.value.kind() == ValueKind::Str {
        return Variant::Str(String::new());
    }
    types
        .parse(&node.value_type, text)
        .unwrap_or_else(|_| Variant::Str(text.to_string()))
}

// === TextCtrl ===

/// Single-line text entry, the default for every scalar kind
pub struct TextCtrlEditor {
    types: Arc<ValueTypeRegistry>,
}

impl TextCtrlEditor {
    pub const NAME: &'static str = "TextCtrl";

    pub fn new(types: Arc<ValueTypeRegistry>) -> Self {
        Self { types }
    }
}

impl EditorDescriptor for TextCtrlEditor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn create_control(&self, anchor: LayoutRect, value: &Variant, node: &PropertyNode) -> Option<EditorControl> {
        let text = if node.has_flag(NodeFlags::UNSPECIFIED) {
            String::new()
        } else {
            format_value(&self.types, node, value)
        };
        Some(EditorControl {
            rect: anchor,
            text,
            ..EditorControl::default()
        })
    }

    fn read_control(&self, control: &EditorControl, node: &PropertyNode) -> Variant {
        parse_text(&self.types, node, control.text.trim_end())
    }

    fn write_control(&self, control: &mut EditorControl, value: &Variant, node: &PropertyNode) {
        control.text = format_value(&self.types, node, value);
    }

    fn value_text(&self, node: &PropertyNode) -> String {
        if node.has_flag(NodeFlags::UNSPECIFIED) {
            return String::new();
        }
        format_value(&self.types, node, &node.value)
    }
}

// === Choice ===

/// Drop-down over the node's choice set
pub struct ChoiceEditor;

impl ChoiceEditor {
    pub const NAME: &'static str = "Choice";

    fn index_for(node: &PropertyNode, value: &Variant) -> Option<usize> {
        let choices = node.choices.as_ref()?;
        match value {
            Variant::Int(v) => choices.index_of_value(*v),
            Variant::Str(label) => choices.index_of_label(label),
            _ => None,
        }
    }
}

impl EditorDescriptor for ChoiceEditor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn create_control(&self, anchor: LayoutRect, value: &Variant, node: &PropertyNode) -> Option<EditorControl> {
        let choices = node.choices.as_ref()?;
        let mut control = EditorControl {
            rect: anchor,
            ..EditorControl::default()
        };
        if !node.has_flag(NodeFlags::UNSPECIFIED) {
            control.choice = Self::index_for(node, value);
            control.text = control
                .choice
                .and_then(|i| choices.entries().get(i))
                .map(|e| e.label.clone())
                .unwrap_or_default();
        }
        Some(control)
    }

    fn read_control(&self, control: &EditorControl, node: &PropertyNode) -> Variant {
        let entry = node
            .choices
            .as_ref()
            .zip(control.choice)
            .and_then(|(choices, i)| choices.entries().get(i));
        match (entry, node.value.kind()) {
            (Some(entry), ValueKind::Str) => Variant::Str(entry.label.clone()),
            (Some(entry), _) => Variant::Int(entry.value),
            (None, _) => Variant::Str(control.text.clone()),
        }
    }

    fn write_control(&self, control: &mut EditorControl, value: &Variant, node: &PropertyNode) {
        control.choice = Self::index_for(node, value);
        control.text = match (&node.choices, control.choice) {
            (Some(choices), Some(i)) => choices.entries()[i].label.clone(),
            _ => value.to_string(),
        };
    }

    fn validate(&self, value: &Variant, node: &PropertyNode) -> Result<(), Rejection> {
        validate_common(value, node)?;
        if Self::index_for(node, value).is_none() {
            return Err(Rejection::new(
                value.clone(),
                format!("'{}' is not one of the choices for {}", value, node.label),
            ));
        }
        Ok(())
    }

    fn value_text(&self, node: &PropertyNode) -> String {
        if node.has_flag(NodeFlags::UNSPECIFIED) {
            return String::new();
        }
        Self::index_for(node, &node.value)
            .and_then(|i| node.choices.as_ref().map(|c| c.entries()[i].label.clone()))
            .unwrap_or_else(|| node.value.to_string())
    }
}

// === CheckBox ===

pub struct CheckBoxEditor;

impl CheckBoxEditor {
    pub const NAME: &'static str = "CheckBox";

    fn is_checked(value: &Variant) -> bool {
        match value {
            Variant::Bool(v) => *v,
            Variant::Int(v) => *v != 0,
            _ => false,
        }
    }
}

impl EditorDescriptor for CheckBoxEditor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn create_control(&self, anchor: LayoutRect, value: &Variant, _node: &PropertyNode) -> Option<EditorControl> {
        Some(EditorControl {
            rect: anchor,
            checked: Self::is_checked(value),
            ..EditorControl::default()
        })
    }

    fn read_control(&self, control: &EditorControl, node: &PropertyNode) -> Variant {
        match node.value.kind() {
            ValueKind::Int => Variant::Int(control.checked as i64),
            _ => Variant::Bool(control.checked),
        }
    }

    fn write_control(&self, control: &mut EditorControl, value: &Variant, _node: &PropertyNode) {
        control.checked = Self::is_checked(value);
    }

    fn value_text(&self, node: &PropertyNode) -> String {
        if node.has_flag(NodeFlags::UNSPECIFIED) {
            return String::new();
        }
        Variant::Bool(Self::is_checked(&node.value)).to_string()
    }
}

// === MultiChoice ===

/// Several labels of the choice set, edited as quoted tokens
pub struct MultiChoiceEditor;

impl MultiChoiceEditor {
    pub const NAME: &'static str = "MultiChoice";

    fn items(value: &Variant) -> Vec<String> {
        match value {
            Variant::StrList(items) => items.clone(),
            Variant::Str(text) => split_quoted(text),
            _ => Vec::new(),
        }
    }
}

impl EditorDescriptor for MultiChoiceEditor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn create_control(&self, anchor: LayoutRect, value: &Variant, node: &PropertyNode) -> Option<EditorControl> {
        let text = if node.has_flag(NodeFlags::UNSPECIFIED) {
            String::new()
        } else {
            join_quoted(&Self::items(value))
        };
        Some(EditorControl {
            rect: anchor,
            text,
            ..EditorControl::default()
        })
    }

    fn read_control(&self, control: &EditorControl, _node: &PropertyNode) -> Variant {
        Variant::StrList(split_quoted(&control.text))
    }

    fn write_control(&self, control: &mut EditorControl, value: &Variant, _node: &PropertyNode) {
        control.text = join_quoted(&Self::items(value));
    }

    fn validate(&self, value: &Variant, node: &PropertyNode) -> Result<(), Rejection> {
        validate_common(value, node)?;
        if let (Some(choices), Some(items)) = (&node.choices, value.as_str_list()) {
            if let Some(unknown) = items.iter().find(|item| choices.index_of_label(item).is_none()) {
                return Err(Rejection::new(
                    value.clone(),
                    format!("'{}' is not one of the choices for {}", unknown, node.label),
                ));
            }
        }
        Ok(())
    }

    fn value_text(&self, node: &PropertyNode) -> String {
        if node.has_flag(NodeFlags::UNSPECIFIED) {
            return String::new();
        }
        join_quoted(&Self::items(&node.value))
    }
}

// === Colour ===

/// `#RRGGBB` text with a swatch painted ahead of it
pub struct ColourEditor {
    types: Arc<ValueTypeRegistry>,
}

impl ColourEditor {
    pub const NAME: &'static str = "Colour";

    pub fn new(types: Arc<ValueTypeRegistry>) -> Self {
        Self { types }
    }
}

impl EditorDescriptor for ColourEditor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn create_control(&self, anchor: LayoutRect, value: &Variant, node: &PropertyNode) -> Option<EditorControl> {
        let text = if node.has_flag(NodeFlags::UNSPECIFIED) {
            String::new()
        } else {
            format_value(&self.types, node, value)
        };
        Some(EditorControl {
            rect: anchor,
            text,
            ..EditorControl::default()
        })
    }

    fn read_control(&self, control: &EditorControl, node: &PropertyNode) -> Variant {
        parse_text(&self.types, node, control.text.trim())
    }

    fn write_control(&self, control: &mut EditorControl, value: &Variant, node: &PropertyNode) {
        control.text = format_value(&self.types, node, value);
    }

    fn value_text(&self, node: &PropertyNode) -> String {
        if node.has_flag(NodeFlags::UNSPECIFIED) {
            return String::new();
        }
        format_value(&self.types, node, &node.value)
    }

    fn supports_inline_custom_paint(&self) -> bool {
        true
    }

    fn paint_custom(&self, ctx: &mut dyn PaintContext, rect: ViewRect, node: &PropertyNode, theme: &GridTheme) {
        let Some(rgb) = node.value.as_int() else {
            return;
        };
        if node.has_flag(NodeFlags::UNSPECIFIED) {
            return;
        }
        ctx.fill_rect(rect, Color::from_rgb((rgb & 0xFF_FFFF) as u32));

        let (left, top, right, bottom) = (rect.x.0, rect.y.0, rect.right(), rect.bottom());
        ctx.draw_line(ViewPos::new(left, top), ViewPos::new(right, top), theme.line);
        ctx.draw_line(ViewPos::new(right, top), ViewPos::new(right, bottom), theme.line);
        ctx.draw_line(ViewPos::new(right, bottom), ViewPos::new(left, bottom), theme.line);
        ctx.draw_line(ViewPos::new(left, bottom), ViewPos::new(left, top), theme.line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_tree::{ChoiceSet, NodeSpec, PropertyTree};

    fn anchor() -> LayoutRect {
        LayoutRect::new(140.0, 0.0, 100.0, 20.0)
    }

    #[test]
    fn test_text_ctrl_reads_unparseable_as_string() {
        let types = Arc::new(ValueTypeRegistry::with_builtins());
        let editor = TextCtrlEditor::new(types);
        let mut tree = PropertyTree::default();
        let root = tree.root();
        let id = tree
            .append(root, NodeSpec::leaf("p", "Perimeter", "real").unspecified())
            .unwrap();
        let node = tree.get(id).unwrap();

        let mut control = editor.create_control(anchor(), &node.value, node).unwrap();
        assert_eq!(control.text, "");
        control.text = "12.5".into();
        assert_eq!(editor.read_control(&control, node), Variant::Real(12.5));
        control.text = "twelve".into();
        let value = editor.read_control(&control, node);
        assert_eq!(value, Variant::Str("twelve".into()));
        assert!(editor.validate(&value, node).is_err());
    }

    #[test]
    fn test_choice_round_trip() {
        let mut tree = PropertyTree::default();
        let root = tree.root();
        let choices = ChoiceSet::from_labels(&["Low", "High"]);
        let id = tree
            .append(root, NodeSpec::leaf("q", "Quality", "choice").with_choices(choices).with_value(1i64))
            .unwrap();
        let node = tree.get(id).unwrap();
        let editor = ChoiceEditor;
        let mut control = editor.create_control(anchor(), &node.value, node).unwrap();
        assert_eq!(control.text, "High");
        control.choice = Some(0);
        assert_eq!(editor.read_control(&control, node), Variant::Int(0));
        assert!(editor.validate(&Variant::Int(7), node).is_err());
        assert_eq!(editor.value_text(node), "High");
    }

    #[test]
    fn test_multichoice_rejects_unknown_label() {
        let mut tree = PropertyTree::default();
        let root = tree.root();
        let id = tree
            .append(
                root,
                NodeSpec::leaf("layers", "Layers", "multichoice")
                    .with_choices(ChoiceSet::from_labels(&["Roads", "Rivers"])),
            )
            .unwrap();
        let node = tree.get(id).unwrap();
        let editor = MultiChoiceEditor;
        let control = EditorControl {
            text: r#""Roads" "Rivers""#.into(),
            ..EditorControl::default()
        };
        let value = editor.read_control(&control, node);
        assert!(editor.validate(&value, node).is_ok());
        let bad = Variant::StrList(vec!["Lakes".into()]);
        assert!(editor.validate(&bad, node).is_err());
    }
}
