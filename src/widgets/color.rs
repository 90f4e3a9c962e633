//! COLOR widget: a swatch row that opens the native color picker

use egui::{Align2, Color32, FontId, Rect, Stroke, Vec2};
use log::debug;
use serde_json::{json, Value};

use super::canvas::WidgetCanvas;
use super::picker::PickerTarget;
use super::widget::{DrawContext, PointerContext, PointerEvent, PointerEventKind, Widget, WidgetBehavior};
use crate::color::{color_string, is_color_bright};
use crate::constants::color::{KIND, LABEL_FONT_SIZE, ROW_HEIGHT, SWATCH_MARGIN};
use crate::settings::WidgetSettings;

/// Behavior of `COLOR` widgets
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorWidget;

impl ColorWidget {
    /// A color widget for input `name`, starting at `value`
    pub fn create(name: &str, value: Value, settings: &WidgetSettings) -> Widget {
        Widget::new(name, KIND, value, ColorWidget)
            .with_options(json!({ "default": settings.default_color }))
    }
}

impl WidgetBehavior for ColorWidget {
    fn draw(&self, widget: &Widget, canvas: &mut dyn WidgetCanvas, ctx: &DrawContext<'_>) {
        if widget.type_tag() != KIND && ctx.scale > ctx.settings.cull_scale {
            return;
        }

        let Some(rgb) = color_string(&widget.value).and_then(|s| ctx.color_parser.parse(s)) else {
            debug!("Skipping swatch `{}`: unparseable color {}", widget.name, widget.value);
            return;
        };

        let min = ctx.origin + Vec2::new(SWATCH_MARGIN, ctx.y);
        let max = ctx.origin + Vec2::new(ctx.width - SWATCH_MARGIN, ctx.y + ctx.height);
        let rect = Rect::from_min_max(min, max);
        let radius = ctx.height * 0.5;

        canvas.fill_rounded_rect(rect, radius, rgb.to_color32());
        canvas.stroke_rounded_rect(rect, radius, Stroke::new(1.0, Color32::BLACK));

        let label = if is_color_bright(rgb, ctx.settings.label_contrast_threshold) {
            Color32::BLACK
        } else {
            Color32::WHITE
        };
        canvas.draw_text(
            ctx.origin + Vec2::new(ctx.width * 0.5, ctx.y + ctx.height * 0.5),
            Align2::CENTER_CENTER,
            &widget.name,
            FontId::proportional(LABEL_FONT_SIZE),
            label,
        );
    }

    fn on_pointer_event(&self, _widget: &Widget, event: &PointerEvent, ctx: &mut PointerContext<'_>) -> bool {
        if event.kind != PointerEventKind::Down {
            return false;
        }

        // Bands are taller than rows; the row starting nearest at or above wins
        let band = ctx.settings.picker_hit_height;
        let y = event.pos.y;
        let Some(hit) = ctx
            .node
            .widgets
            .iter()
            .filter(|w| w.type_tag() == KIND)
            .rev()
            .find(|w| y >= w.last_y && y < w.last_y + band)
        else {
            return false;
        };

        let initial = color_string(&hit.value).unwrap_or(ctx.settings.default_color.as_str());
        let target = PickerTarget {
            node: ctx.node.id,
            widget: hit.name.clone(),
        };
        ctx.pickers.open(&mut *ctx.picker_backend, target, initial);
        true
    }

    fn compute_size(&self, width: f32, _settings: &WidgetSettings) -> Vec2 {
        Vec2::new(width, ROW_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::CssColorParser;
    use crate::nodes::{Node, NodeGraph};
    use crate::widgets::canvas::{DrawOp, RecordingCanvas};
    use crate::widgets::picker::{HeadlessColorPicker, PickerEvent, PickerSessions};
    use crate::widgets::convert_to_input;
    use egui::Pos2;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn color_node(values: &[(&str, &str)]) -> Node {
        let settings = WidgetSettings::default();
        let mut node = Node::new(0, "Colors", Pos2::ZERO);
        for (name, value) in values {
            node.add_widget(ColorWidget::create(name, json!(value), &settings));
        }
        node.set_size(node.compute_size(&settings));
        node.layout_widgets(&settings);
        node
    }

    fn draw(node: &Node, scale: f32) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new();
        node.draw_widgets(&mut canvas, scale, &WidgetSettings::default(), &CssColorParser::new());
        canvas
    }

    #[test]
    fn test_row_height_is_fixed() {
        let settings = WidgetSettings::default();
        assert_eq!(ColorWidget.compute_size(10.0, &settings), Vec2::new(10.0, 20.0));
        assert_eq!(ColorWidget.compute_size(500.0, &settings), Vec2::new(500.0, 20.0));
    }

    #[test]
    fn test_swatch_geometry_and_fill() {
        let node = color_node(&[("tint", "#00ff00")]);
        let canvas = draw(&node, 1.0);

        let DrawOp::FillRoundedRect { rect, radius, fill } = &canvas.ops[0] else {
            panic!("expected a fill first, got {:?}", canvas.ops[0]);
        };
        assert_eq!(rect.min.x, 15.0);
        assert_eq!(rect.max.x, node.size.x - 15.0);
        assert_eq!(rect.height(), 20.0);
        assert_eq!(*radius, 10.0);
        assert_eq!(*fill, Color32::from_rgb(0, 255, 0));
        assert!(matches!(canvas.ops[1], DrawOp::StrokeRoundedRect { .. }));
    }

    #[test]
    fn test_label_contrast() {
        // green has brightness 150: bright for labels, dark in general
        let canvas = draw(&color_node(&[("light", "#00ff00"), ("dark", "#0000ff")]), 1.0);
        assert_eq!(
            canvas.texts(),
            vec![("light", Color32::BLACK), ("dark", Color32::WHITE)]
        );
    }

    #[test]
    fn test_default_object_values_are_read() {
        let mut node = color_node(&[]);
        node.add_widget(ColorWidget::create(
            "wrapped",
            json!({"default": "#ffffff"}),
            &WidgetSettings::default(),
        ));
        let canvas = draw(&node, 1.0);
        assert_eq!(canvas.texts(), vec![("wrapped", Color32::BLACK)]);
    }

    #[test]
    fn test_unparseable_color_paints_nothing() {
        let canvas = draw(&color_node(&[("broken", "not a color")]), 1.0);
        assert!(canvas.ops.is_empty());
    }

    #[test]
    fn test_culled_when_tag_differs_and_zoomed() {
        let settings = WidgetSettings::default();
        let parser = CssColorParser::new();
        let node = color_node(&[("tint", "#ff0000")]);
        let mut retagged = ColorWidget::create("tint", json!("#ff0000"), &settings);
        retagged.kind = "NOT_COLOR".to_string();

        let ctx = |scale| DrawContext {
            node: &node,
            origin: Pos2::ZERO,
            width: 200.0,
            y: 0.0,
            height: 20.0,
            scale,
            settings: &settings,
            color_parser: &parser,
        };

        let mut zoomed = RecordingCanvas::new();
        retagged.draw(&mut zoomed, &ctx(1.0));
        assert!(zoomed.ops.is_empty());

        let mut overview = RecordingCanvas::new();
        retagged.draw(&mut overview, &ctx(0.4));
        assert_eq!(overview.ops.len(), 3);
    }

    #[test]
    fn test_pointer_down_opens_picker_for_hit_row() {
        let settings = WidgetSettings::default();
        let node = color_node(&[("first", "#ff0000"), ("second", "#0000ff")]);
        let second_y = node.widgets[1].last_y;
        let mut sessions = PickerSessions::new();
        let mut backend = HeadlessColorPicker::new();

        let consumed = node.dispatch_pointer_event(
            &PointerEvent::down(Pos2::new(50.0, second_y + 5.0)),
            &mut sessions,
            &mut backend,
            &settings,
        );
        assert!(consumed);
        assert_eq!(sessions.len(), 1);
        assert_eq!(backend.alive[0].1, "#0000ff");
        let id = backend.alive[0].0;
        assert_eq!(sessions.target(id).unwrap().widget, "second");
    }

    #[test]
    fn test_pointer_on_row_top_edge_picks_that_row() {
        let settings = WidgetSettings::default();
        let node = color_node(&[("first", "#ff0000"), ("second", "#0000ff")]);
        let second_y = node.widgets[1].last_y;
        // still inside the first row's band
        assert!(second_y < node.widgets[0].last_y + settings.picker_hit_height);

        let mut sessions = PickerSessions::new();
        let mut backend = HeadlessColorPicker::new();
        assert!(node.dispatch_pointer_event(
            &PointerEvent::down(Pos2::new(50.0, second_y)),
            &mut sessions,
            &mut backend,
            &settings,
        ));
        let id = backend.alive[0].0;
        assert_eq!(sessions.target(id).unwrap().widget, "second");
    }

    #[test]
    fn test_pointer_ignores_other_events_and_misses() {
        let settings = WidgetSettings::default();
        let node = color_node(&[("first", "#ff0000")]);
        let mut sessions = PickerSessions::new();
        let mut backend = HeadlessColorPicker::new();
        let row = node.widgets[0].last_y;

        let moved = PointerEvent {
            kind: PointerEventKind::Move,
            pos: Pos2::new(50.0, row + 5.0),
        };
        assert!(!node.dispatch_pointer_event(&moved, &mut sessions, &mut backend, &settings));
        assert!(!node.dispatch_pointer_event(
            &PointerEvent::down(Pos2::new(50.0, row + 200.0)),
            &mut sessions,
            &mut backend,
            &settings,
        ));
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_picker_change_commits_value() {
        let settings = WidgetSettings::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let mut node = color_node(&[]);
        node.add_widget(
            ColorWidget::create("tint", json!("#ff0000"), &settings).with_callback(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );
        node.layout_widgets(&settings);
        let row = node.widgets[0].last_y;

        let mut graph = NodeGraph::new();
        let node_id = graph.add_node(node);
        let version = graph.version();

        let mut sessions = PickerSessions::new();
        let mut backend = HeadlessColorPicker::new();
        graph.nodes[&node_id].dispatch_pointer_event(
            &PointerEvent::down(Pos2::new(40.0, row + 1.0)),
            &mut sessions,
            &mut backend,
            &settings,
        );
        let id = backend.alive[0].0;

        sessions
            .handle_event(
                &mut backend,
                &mut graph,
                PickerEvent::Changed {
                    id,
                    value: "#123456".to_string(),
                },
            )
            .unwrap();

        assert_eq!(graph.nodes[&node_id].widgets[0].value, json!("#123456"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(graph.version(), version + 1);
        assert_eq!(graph.dirty_canvas(), (true, true));
        assert!(backend.alive.is_empty());
        assert_eq!(backend.removed, vec![id]);
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_converted_color_rows_are_not_hit() {
        let settings = WidgetSettings::default();
        let mut node = color_node(&[("tint", "#ff0000")]);
        convert_to_input(&mut node, "tint", &json!(["COLOR"]), &settings).unwrap();
        let mut sessions = PickerSessions::new();
        let mut backend = HeadlessColorPicker::new();

        let row = node.widgets[0].last_y;
        assert!(!node.dispatch_pointer_event(
            &PointerEvent::down(Pos2::new(40.0, row + 1.0)),
            &mut sessions,
            &mut backend,
            &settings,
        ));
        assert!(draw(&node, 1.0).ops.is_empty());
    }
}
