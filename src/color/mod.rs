//! Color parsing and brightness helpers
//!
//! Widgets never parse color strings themselves: they go through a
//! [`ColorParser`], so hosts can plug in their own CSS implementation.
//! [`CssColorParser`] covers hex notation, `rgb()`/`rgba()` and the common
//! named colors.

pub mod brightness;

use std::collections::HashMap;

use egui::Color32;
use once_cell::sync::Lazy;
use serde_json::Value;

pub use brightness::{brightness, is_color_bright};

/// Three 8-bit color channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Opaque egui color with these channels
    pub fn to_color32(self) -> Color32 {
        Color32::from_rgb(self.r, self.g, self.b)
    }
}

/// Maps a color string to channel intensities
pub trait ColorParser: Send + Sync {
    /// Parse `input`, returning `None` for anything unparseable
    fn parse(&self, input: &str) -> Option<Rgb>;
}

/// Extract the color string from a widget value.
///
/// Accepts either a plain string or an object with a `default` string field.
pub fn color_string(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("default").and_then(Value::as_str),
        _ => None,
    }
}

static NAMED_COLORS: Lazy<HashMap<&'static str, Rgb>> = Lazy::new(|| {
    HashMap::from([
        ("black", Rgb::new(0, 0, 0)),
        ("white", Rgb::new(255, 255, 255)),
        ("red", Rgb::new(255, 0, 0)),
        ("lime", Rgb::new(0, 255, 0)),
        ("green", Rgb::new(0, 128, 0)),
        ("blue", Rgb::new(0, 0, 255)),
        ("yellow", Rgb::new(255, 255, 0)),
        ("cyan", Rgb::new(0, 255, 255)),
        ("aqua", Rgb::new(0, 255, 255)),
        ("magenta", Rgb::new(255, 0, 255)),
        ("fuchsia", Rgb::new(255, 0, 255)),
        ("silver", Rgb::new(192, 192, 192)),
        ("gray", Rgb::new(128, 128, 128)),
        ("grey", Rgb::new(128, 128, 128)),
        ("maroon", Rgb::new(128, 0, 0)),
        ("olive", Rgb::new(128, 128, 0)),
        ("purple", Rgb::new(128, 0, 128)),
        ("teal", Rgb::new(0, 128, 128)),
        ("navy", Rgb::new(0, 0, 128)),
        ("orange", Rgb::new(255, 165, 0)),
        ("pink", Rgb::new(255, 192, 203)),
        ("brown", Rgb::new(165, 42, 42)),
    ])
});

/// Default CSS color parser
#[derive(Debug, Clone, Copy, Default)]
pub struct CssColorParser;

impl CssColorParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_hex(input: &str) -> Option<Rgb> {
        let color = Color32::from_hex(input).ok()?;
        let [r, g, b, _] = color.to_srgba_unmultiplied();
        Some(Rgb::new(r, g, b))
    }

    fn parse_functional(input: &str) -> Option<Rgb> {
        let args = input
            .strip_prefix("rgba(")
            .or_else(|| input.strip_prefix("rgb("))?
            .strip_suffix(')')?;

        // Both legacy `r, g, b[, a]` and modern `r g b[ / a]` syntax
        let channels: Vec<&str> = args
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect();
        if channels.len() < 3 || channels.len() > 4 {
            return None;
        }

        let r = Self::parse_channel(channels[0])?;
        let g = Self::parse_channel(channels[1])?;
        let b = Self::parse_channel(channels[2])?;
        Some(Rgb::new(r, g, b))
    }

    fn parse_channel(part: &str) -> Option<u8> {
        let value = if let Some(percent) = part.strip_suffix('%') {
            percent.parse::<f64>().ok()? * 255.0 / 100.0
        } else {
            part.parse::<f64>().ok()?
        };
        if !value.is_finite() {
            return None;
        }
        Some(value.round().clamp(0.0, 255.0) as u8)
    }
}

impl ColorParser for CssColorParser {
    fn parse(&self, input: &str) -> Option<Rgb> {
        let normalized = input.trim().to_ascii_lowercase();
        if normalized.starts_with('#') {
            Self::parse_hex(&normalized)
        } else if normalized.starts_with("rgb") {
            Self::parse_functional(&normalized)
        } else {
            NAMED_COLORS.get(normalized.as_str()).copied()
        }
    }
}
