//! Drawing surface used by widget draw procedures
//!
//! Widgets paint through [`WidgetCanvas`] so the same draw code runs against
//! an `egui::Painter` in the editor and a [`RecordingCanvas`] in headless
//! contexts.

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, StrokeKind};

/// Minimal set of painting operations widgets need
pub trait WidgetCanvas {
    /// Fill a rounded rectangle
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, fill: Color32);

    /// Outline a rounded rectangle
    fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, stroke: Stroke);

    /// Draw a line of text anchored at `pos`
    fn draw_text(&mut self, pos: Pos2, anchor: Align2, text: &str, font: FontId, color: Color32);
}

impl WidgetCanvas for Painter {
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, fill: Color32) {
        self.rect_filled(rect, radius, fill);
    }

    fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, stroke: Stroke) {
        self.rect_stroke(rect, radius, stroke, StrokeKind::Inside);
    }

    fn draw_text(&mut self, pos: Pos2, anchor: Align2, text: &str, font: FontId, color: Color32) {
        self.text(pos, anchor, text, font, color);
    }
}

/// A recorded painting operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRoundedRect {
        rect: Rect,
        radius: f32,
        fill: Color32,
    },
    StrokeRoundedRect {
        rect: Rect,
        radius: f32,
        stroke: Stroke,
    },
    Text {
        pos: Pos2,
        anchor: Align2,
        text: String,
        color: Color32,
    },
}

/// Canvas that records operations instead of painting them
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text operations in draw order
    pub fn texts(&self) -> Vec<(&str, Color32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, color, .. } => Some((text.as_str(), *color)),
                _ => None,
            })
            .collect()
    }
}

impl WidgetCanvas for RecordingCanvas {
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, fill: Color32) {
        self.ops.push(DrawOp::FillRoundedRect { rect, radius, fill });
    }

    fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, stroke: Stroke) {
        self.ops.push(DrawOp::StrokeRoundedRect { rect, radius, stroke });
    }

    fn draw_text(&mut self, pos: Pos2, anchor: Align2, text: &str, _font: FontId, color: Color32) {
        self.ops.push(DrawOp::Text {
            pos,
            anchor,
            text: text.to_string(),
            color,
        });
    }
}
