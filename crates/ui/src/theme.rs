//! Grid colour themes
//!
//! A theme is a small palette: row backgrounds are indexed by the node's
//! background index (inherited down the tree), everything else is a fixed
//! role colour.

use tiny_sdk::Color;

/// Colours for every role the render passes paint
#[derive(Clone, Debug, PartialEq)]
pub struct GridTheme {
    pub name: String,
    /// Row background palette, indexed by `PropertyNode::background`
    pub backgrounds: Vec<Color>,
    pub caption_background: Color,
    pub caption_text: Color,
    pub selection_background: Color,
    pub selection_text: Color,
    pub text: Color,
    pub disabled_text: Color,
    pub margin: Color,
    pub line: Color,
    pub glyph: Color,
    /// Outline drawn around a value the editor rejected
    pub invalid: Color,
}

impl GridTheme {
    /// Background for a palette index; out-of-range indices wrap
    pub fn background(&self, index: u8) -> Color {
        if self.backgrounds.is_empty() {
            return Color::WHITE;
        }
        self.backgrounds[index as usize % self.backgrounds.len()]
    }
}

impl Default for GridTheme {
    fn default() -> Self {
        Themes::light()
    }
}

/// Built-in themes
pub struct Themes;

impl Themes {
    /// Light grey caption bars on white rows
    pub fn light() -> GridTheme {
        GridTheme {
            name: "light".into(),
            backgrounds: vec![
                Color::WHITE,
                Color::from_rgb(0xF4F7FB), // pale blue
                Color::from_rgb(0xFBF6EC), // pale sand
                Color::from_rgb(0xF1F8EE), // pale green
            ],
            caption_background: Color::from_rgb(0xD8DCE2),
            caption_text: Color::from_rgb(0x202020),
            selection_background: Color::from_rgb(0x3875D7),
            selection_text: Color::WHITE,
            text: Color::from_rgb(0x101010),
            disabled_text: Color::from_rgb(0x9A9A9A),
            margin: Color::from_rgb(0xD8DCE2),
            line: Color::from_rgb(0xC8CCD2),
            glyph: Color::from_rgb(0x505050),
            invalid: Color::from_rgb(0xD03030),
        }
    }

    /// One Dark inspired palette
    pub fn dark() -> GridTheme {
        GridTheme {
            name: "dark".into(),
            backgrounds: vec![
                Color::from_rgb(0x282C34),
                Color::from_rgb(0x2C313C),
                Color::from_rgb(0x31302C),
                Color::from_rgb(0x2A322C),
            ],
            caption_background: Color::from_rgb(0x3E4451),
            caption_text: Color::from_rgb(0xE5C07B), // yellow
            selection_background: Color::from_rgb(0x528BFF),
            selection_text: Color::WHITE,
            text: Color::from_rgb(0xABB2BF),
            disabled_text: Color::from_rgb(0x5C6370),
            margin: Color::from_rgb(0x3E4451),
            line: Color::from_rgb(0x3B4048),
            glyph: Color::from_rgb(0x9DA5B4),
            invalid: Color::from_rgb(0xE06C75), // red
        }
    }

    /// Look a theme up by its config name
    pub fn by_name(name: &str) -> Option<GridTheme> {
        match name.to_ascii_lowercase().as_str() {
            "light" => Some(Self::light()),
            "dark" | "one dark" => Some(Self::dark()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_wraps() {
        let theme = Themes::light();
        assert_eq!(theme.background(0), Color::WHITE);
        assert_eq!(theme.background(4), theme.background(0));
        assert_eq!(Themes::by_name("Dark").map(|t| t.name), Some("dark".to_string()));
        assert!(Themes::by_name("solarized").is_none());
    }
}
