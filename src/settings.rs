//! Runtime configuration for widget layout and the color widget

use std::path::Path;

use egui::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::{is_color_bright, Rgb};
use crate::constants::{color, layout};
use crate::error::SettingsError;

/// Tunable values used by the conversion state machine and the color widget.
///
/// Every field falls back to its default from [`crate::constants`] when
/// missing from a settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetSettings {
    /// Height of one socket row; widget offsets shift by this on conversion
    pub slot_height: f32,
    /// Row height for widgets without their own size computation
    pub widget_height: f32,
    /// Gap the layout adds after each widget row
    pub widget_gap: f32,
    /// General bright/dark decision threshold
    pub bright_threshold: u8,
    /// Threshold for black vs. white label text on color swatches
    pub label_contrast_threshold: u8,
    /// View scale above which non-color tagged widgets are culled
    pub cull_scale: f32,
    /// Color used when a COLOR input has no declared default
    pub default_color: String,
    /// Height of the hit band of a color row
    pub picker_hit_height: f32,
    /// Minimum node area a color widget requests
    pub color_min_size: [f32; 2],
    /// Minimum node width
    pub min_node_width: f32,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            slot_height: layout::SLOT_HEIGHT,
            widget_height: layout::WIDGET_HEIGHT,
            widget_gap: layout::WIDGET_GAP,
            bright_threshold: color::BRIGHT_THRESHOLD,
            label_contrast_threshold: color::LABEL_CONTRAST_THRESHOLD,
            cull_scale: color::CULL_SCALE,
            default_color: color::DEFAULT_COLOR.to_string(),
            picker_hit_height: color::PICKER_HIT_HEIGHT,
            color_min_size: color::MIN_SIZE,
            min_node_width: layout::MIN_NODE_WIDTH,
        }
    }
}

impl WidgetSettings {
    /// Parse settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json_str(&contents)?;
        log::debug!("Loaded widget settings from {}", path.display());
        Ok(settings)
    }

    /// General bright/dark decision, using `bright_threshold`
    pub fn is_bright(&self, rgb: Rgb) -> bool {
        is_color_bright(rgb, self.bright_threshold)
    }

    /// Minimum color widget area as a vector
    pub fn color_min_size(&self) -> Vec2 {
        Vec2::new(self.color_min_size[0], self.color_min_size[1])
    }
}
