use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DesignerError, Result};

const DEFAULT_FILL: &str = "#ffffff";
const DEFAULT_STROKE: &str = "#000000";
const DEFAULT_STROKE_WIDTH: f32 = 2.0;
const DEFAULT_ICON_BASE: &str = "/icons";
const DEFAULT_FLOW_STROKE: &str = "#22242a";
const DEFAULT_LABEL_COLOR: &str = "#22242a";
const DEFAULT_BACKGROUND: &str = "#ffffff";
const DEFAULT_FONT_SIZE: f32 = 12.0;
const DEFAULT_PADDING: f32 = 20.0;
const DEFAULT_PNG_SCALE: f32 = 1.0;

/// Language used for user-facing rule messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Vi,
    En,
}

/// Colors and strokes for custom shapes and the exported document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderStyle {
    #[serde(default = "default_fill")]
    pub fill: String,
    #[serde(default = "default_stroke")]
    pub stroke: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    #[serde(default = "default_icon_base")]
    pub icon_base: String,
    #[serde(default = "default_flow_stroke")]
    pub flow_stroke: String,
    #[serde(default = "default_label_color")]
    pub label_color: String,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_fill() -> String {
    DEFAULT_FILL.to_string()
}
fn default_stroke() -> String {
    DEFAULT_STROKE.to_string()
}
fn default_stroke_width() -> f32 {
    DEFAULT_STROKE_WIDTH
}
fn default_icon_base() -> String {
    DEFAULT_ICON_BASE.to_string()
}
fn default_flow_stroke() -> String {
    DEFAULT_FLOW_STROKE.to_string()
}
fn default_label_color() -> String {
    DEFAULT_LABEL_COLOR.to_string()
}
fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}
fn default_font_family() -> String {
    "sans-serif".to_string()
}
fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}
fn default_padding() -> f32 {
    DEFAULT_PADDING
}
fn default_png_scale() -> f32 {
    DEFAULT_PNG_SCALE
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            fill: default_fill(),
            stroke: default_stroke(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            icon_base: default_icon_base(),
            flow_stroke: default_flow_stroke(),
            label_color: default_label_color(),
            background: default_background(),
            font_family: default_font_family(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl RenderStyle {
    /// Full href of an icon file under the configured base path.
    pub fn icon_href(&self, file_name: &str) -> String {
        format!("{}/{}", self.icon_base.trim_end_matches('/'), file_name)
    }
}

/// Export settings for the standalone document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default = "default_png_scale")]
    pub png_scale: f32,
    /// Local directory holding the icon files; when set, icons are inlined.
    #[serde(default)]
    pub icon_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            png_scale: DEFAULT_PNG_SCALE,
            icon_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignerConfig {
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub style: RenderStyle,
    #[serde(default)]
    pub export: ExportConfig,
}

impl DesignerConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DesignerError::Config(format!("Failed to parse TOML: {}", e)))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| DesignerError::Config(format!("Failed to parse YAML: {}", e)))
    }

    /// Load a config file, trying TOML first and then YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DesignerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if let Ok(config) = Self::from_toml(&content) {
            return Ok(config);
        }
        Self::from_yaml(&content).map_err(|_| {
            DesignerError::Config(format!(
                "{} is neither valid TOML nor valid YAML",
                path.display()
            ))
        })
    }
}
