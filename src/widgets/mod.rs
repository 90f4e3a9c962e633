//! Widgets: inline node parameters and their conversion to input sockets

pub mod builtin;
pub mod canvas;
pub mod color;
pub mod convert;
pub mod picker;
pub mod widget;

pub use color::ColorWidget;
pub use convert::{
    convert_to_input, convert_to_widget, hide_widget_for_good, reconcile_widgets,
    resolve_widget_type, WidgetTypeInfo,
};
pub use widget::{
    DrawContext, PointerContext, PointerEvent, PointerEventKind, Widget, WidgetBehavior,
    WidgetMode,
};

use log::debug;

use crate::nodes::Node;

/// Release every widget's sub-resources and run its teardown callback
pub fn cleanup_node(node: &mut Node) {
    if node.widgets.is_empty() {
        return;
    }
    for widget in &mut node.widgets {
        widget.release();
    }
    debug!("Released {} widgets of node {}", node.widgets.len(), node.id);
}
