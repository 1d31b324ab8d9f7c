//! Grid configuration
//!
//! ```toml
//! [metrics]
//! row_height = 22.0
//! splitter_x = 180.0
//!
//! [behavior]
//! categorized = true
//! compact = false
//! remember_splitter = true
//!
//! [theme]
//! name = "dark"
//! ```
//!
//! A malformed file is an error. A well-formed file with a bad section
//! keeps the other sections and uses defaults for the bad one.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tiny_tree::{GridError, Result};
use tiny_ui::{GridMetrics, GridTheme, Themes};

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct GridConfig {
    #[serde(default)]
    pub metrics: GridMetrics,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BehaviorConfig {
    /// Start in categorized (true) or flat ordering
    #[serde(default = "default_true")]
    pub categorized: bool,
    /// Hide `HIDEABLE` nodes
    #[serde(default)]
    pub compact: bool,
    /// Persist the splitter through the host's settings store
    #[serde(default = "default_true")]
    pub remember_splitter: bool,
    /// Sort every level after a bulk load
    #[serde(default)]
    pub sort_on_load: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThemeConfig {
    #[serde(default = "default_theme")]
    pub name: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            categorized: true,
            compact: false,
            remember_splitter: true,
            sort_on_load: false,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: default_theme(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_theme() -> String {
    "light".to_string()
}

impl ThemeConfig {
    /// Resolve the named theme, falling back to light
    pub fn resolve(&self) -> GridTheme {
        Themes::by_name(&self.name).unwrap_or_else(|| {
            log::warn!("unknown theme '{}', using light", self.name);
            Themes::light()
        })
    }
}

impl GridConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("no {} found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| GridError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        log::info!("loaded grid configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: toml::Value =
            toml::from_str(content).map_err(|e| GridError::Config(format!("invalid TOML: {}", e)))?;
        Ok(Self {
            metrics: parse_section(&value, "metrics").unwrap_or_default(),
            behavior: parse_section(&value, "behavior").unwrap_or_default(),
            theme: parse_section(&value, "theme").unwrap_or_default(),
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| GridError::Config(e.to_string()))
    }
}

/// Parse one section; a bad section is logged and skipped
fn parse_section<T: DeserializeOwned>(value: &toml::Value, name: &str) -> Option<T> {
    let section = value.get(name)?;
    match section.clone().try_into() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("error in [{}] section: {}; using defaults for it", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = GridConfig::from_toml_str(
            r#"
            [metrics]
            row_height = 24.0

            [theme]
            name = "dark"
            "#,
        )
        .unwrap();
        assert_eq!(config.metrics.row_height, 24.0);
        assert_eq!(config.metrics.splitter_x, GridMetrics::default().splitter_x);
        assert!(config.behavior.categorized);
        assert_eq!(config.theme.resolve().name, "dark");
    }

    #[test]
    fn test_bad_section_falls_back() {
        let config = GridConfig::from_toml_str(
            r#"
            [metrics]
            row_height = "tall"

            [behavior]
            compact = true
            "#,
        )
        .unwrap();
        assert_eq!(config.metrics, GridMetrics::default());
        assert!(config.behavior.compact);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = GridConfig::from_toml_str("[metrics").unwrap_err();
        assert!(matches!(err, GridError::Config(_)));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = GridConfig::default();
        config.behavior.sort_on_load = true;
        let text = config.to_toml_string().unwrap();
        assert_eq!(GridConfig::from_toml_str(&text).unwrap(), config);
    }
}
