//! Configuration system
//!
//! Serializable settings for windows, the window manager thread and the
//! default skin. Files are TOML or RON, chosen by extension.

pub use serde::{Deserialize, Serialize};

use crate::window::WindowStyle;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Initial window attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Client area width in pixels
    pub width: u32,
    /// Client area height in pixels
    pub height: u32,
    /// Title bar text
    pub title: String,
    /// Decorations and affordances
    pub style: WindowStyle,
}

impl WindowSettings {
    /// Settings with the given size and title and the default style
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            style: WindowStyle::DEFAULT,
        }
    }

    /// Replace the style (builder style)
    #[must_use]
    pub fn with_style(mut self, style: WindowStyle) -> Self {
        self.style = style;
        self
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self::new(800, 600, "rust_gui")
    }
}

/// Window manager thread settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Name given to the manager thread
    pub thread_name: String,
    /// Window class registered with the platform on start-up
    pub window_class: String,
    /// Upper bound on one event wait for backends that cannot be interrupted
    pub event_poll_interval_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            thread_name: "rust_gui-window-manager".to_string(),
            window_class: "rust_gui.window".to_string(),
            event_poll_interval_ms: 16,
        }
    }
}

/// Flat skin colours and metrics; colours are `[r, g, b, a]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinConfig {
    /// Window background
    pub window_background: [f32; 4],
    /// Button in its resting state
    pub button_normal: [f32; 4],
    /// Button under the pointer
    pub button_hovered: [f32; 4],
    /// Button being pressed
    pub button_pressed: [f32; 4],
    /// Disabled button
    pub button_disabled: [f32; 4],
    /// Custom control fill
    pub custom_fill: [f32; 4],
    /// Frame colour
    pub border_color: [f32; 4],
    /// Frame width in pixels
    pub border_width: f32,
    /// Text colour
    pub text_color: [f32; 4],
    /// Text colour on disabled elements
    pub disabled_text_color: [f32; 4],
    /// Height of one line of text
    pub line_height: f32,
    /// Space between a frame and its content
    pub padding: f32,
}

impl Default for SkinConfig {
    fn default() -> Self {
        Self {
            window_background: [0.12, 0.12, 0.14, 1.0],
            button_normal: [0.3, 0.3, 0.3, 0.9],
            button_hovered: [0.4, 0.4, 0.5, 1.0],
            button_pressed: [0.5, 0.5, 0.6, 1.0],
            button_disabled: [0.2, 0.2, 0.2, 0.5],
            custom_fill: [0.25, 0.28, 0.32, 1.0],
            border_color: [0.6, 0.6, 0.6, 1.0],
            border_width: 1.0,
            text_color: [1.0, 1.0, 1.0, 1.0],
            disabled_text_color: [0.6, 0.6, 0.6, 1.0],
            line_height: 20.0,
            padding: 4.0,
        }
    }
}

/// Top-level toolkit configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Defaults for windows created by a context
    pub window: WindowSettings,
    /// Window manager thread
    pub manager: ManagerConfig,
    /// Default skin
    pub skin: SkinConfig,
}

impl Config for ToolkitConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ToolkitConfig::from_toml_str(
            r#"
            [window]
            title = "Settings"
            width = 320

            [skin]
            padding = 6.0
            "#,
        )
        .unwrap();

        assert_eq!(config.window.title, "Settings");
        assert_eq!(config.window.width, 320);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.style, WindowStyle::DEFAULT);
        assert_eq!(config.skin.padding, 6.0);
        assert_eq!(config.manager, ManagerConfig::default());
    }

    #[test]
    fn test_round_trip_through_files() {
        let dir = std::env::temp_dir();
        let toml_path = dir.join(format!("rust_gui_config_{}.toml", std::process::id()));
        let ron_path = dir.join(format!("rust_gui_config_{}.ron", std::process::id()));

        let mut config = ToolkitConfig::default();
        config.window.style = WindowStyle::TITLE_BAR | WindowStyle::CLOSE;
        config.manager.thread_name = "ui".to_string();

        for path in [&toml_path, &ron_path] {
            let path = path.to_str().unwrap();
            config.save_to_file(path).unwrap();
            let loaded = ToolkitConfig::load_from_file(path).unwrap();
            assert_eq!(loaded, config);
            std::fs::remove_file(path).unwrap();
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ToolkitConfig::default().save_to_file("settings.ini");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
