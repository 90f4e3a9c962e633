//! Perceived brightness of RGB colors

use super::Rgb;

/// Perceived brightness using the weighted luma formula, rounded to the
/// nearest integer (0..=255)
pub fn brightness(rgb: Rgb) -> u8 {
    let weighted =
        u32::from(rgb.r) * 299 + u32::from(rgb.g) * 587 + u32::from(rgb.b) * 114;
    // weights sum to 1000, so the result always fits in a u8
    (f64::from(weighted) / 1000.0).round() as u8
}

/// Whether a color is brighter than `threshold`
pub fn is_color_bright(rgb: Rgb, threshold: u8) -> bool {
    brightness(rgb) > threshold
}
