//! Stock value widgets built from declared input configs

use egui::{Align2, Color32, FontId, Rect, Stroke, Vec2};
use serde_json::{json, Value};

use super::canvas::WidgetCanvas;
use super::widget::{DrawContext, Widget, WidgetBehavior};
use crate::constants::widget::COMBO;

/// Name of the widget paired with seed-like INT inputs
pub const CONTROL_AFTER_GENERATE: &str = "control_after_generate";

/// Choices offered by the control-after-generate widget
pub const CONTROL_MODES: [&str; 4] = ["fixed", "increment", "decrement", "randomize"];

const ROW_MARGIN: f32 = 15.0;
const ROW_FILL: Color32 = Color32::from_rgb(34, 34, 34);
const ROW_OUTLINE: Color32 = Color32::from_rgb(102, 102, 102);
const LABEL_COLOR: Color32 = Color32::from_rgb(153, 153, 153);
const VALUE_COLOR: Color32 = Color32::from_rgb(221, 221, 221);

/// Plain value row: label on the left, value on the right
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueWidget;

impl WidgetBehavior for ValueWidget {
    fn draw(&self, widget: &Widget, canvas: &mut dyn WidgetCanvas, ctx: &DrawContext<'_>) {
        let min = ctx.origin + Vec2::new(ROW_MARGIN, ctx.y);
        let max = ctx.origin + Vec2::new(ctx.width - ROW_MARGIN, ctx.y + ctx.height);
        let rect = Rect::from_min_max(min, max);
        let radius = ctx.height * 0.5;

        canvas.fill_rounded_rect(rect, radius, ROW_FILL);
        canvas.stroke_rounded_rect(rect, radius, Stroke::new(1.0, ROW_OUTLINE));

        let font = FontId::proportional(12.0);
        canvas.draw_text(
            rect.left_center() + Vec2::new(radius, 0.0),
            Align2::LEFT_CENTER,
            &widget.name,
            font.clone(),
            LABEL_COLOR,
        );
        canvas.draw_text(
            rect.right_center() - Vec2::new(radius, 0.0),
            Align2::RIGHT_CENTER,
            &display_value(&widget.value),
            font,
            VALUE_COLOR,
        );
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.3}", f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Build the stock widgets for one declared input.
///
/// Returns `None` for kinds that are not shown as widgets (link-only types
/// such as `IMAGE`). An INT declaring `control_after_generate` also gets its
/// linked choice widget.
pub fn create_widgets(name: &str, config: &Value) -> Option<Vec<Widget>> {
    let options = config.get(1).cloned().unwrap_or_else(|| json!({}));
    let default = options.get("default").cloned();

    let widget = match config.get(0)? {
        Value::Array(choices) => {
            let value = default.or_else(|| choices.first().cloned()).unwrap_or(Value::Null);
            let mut combo_options = options.clone();
            if let Value::Object(map) = &mut combo_options {
                map.insert("values".to_string(), Value::Array(choices.clone()));
            }
            Widget::new(name, COMBO, value, ValueWidget).with_options(combo_options)
        }
        Value::String(kind) => {
            let value = match kind.as_str() {
                "INT" => default.unwrap_or(json!(0)),
                "FLOAT" => default.unwrap_or(json!(0.0)),
                "STRING" => default.unwrap_or(json!("")),
                "BOOLEAN" => default.unwrap_or(json!(false)),
                _ => return None,
            };
            Widget::new(name, kind.as_str(), value, ValueWidget).with_options(options.clone())
        }
        _ => return None,
    };

    let controlled = widget.kind == "INT"
        && options
            .get(CONTROL_AFTER_GENERATE)
            .and_then(Value::as_bool)
            .unwrap_or(false);
    if !controlled {
        return Some(vec![widget]);
    }

    let control = Widget::new(CONTROL_AFTER_GENERATE, COMBO, json!("randomize"), ValueWidget)
        .with_options(json!({ "values": CONTROL_MODES }));
    Some(vec![widget.with_linked_widget(CONTROL_AFTER_GENERATE), control])
}
