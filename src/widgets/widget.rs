//! Widget data model
//!
//! A [`Widget`] is one node parameter shown as an inline control. Its
//! procedures (draw, pointer handling, sizing, serialization) live in a
//! [`WidgetBehavior`]; where that behavior sits depends on the widget's
//! [`WidgetMode`]:
//!
//! * `Active` owns the live behavior.
//! * `ConvertedToInput` keeps the original behavior aside while an input
//!   socket represents the parameter. The widget takes no layout space and
//!   only serializes when its socket is linked.
//! * `Hidden` is the permanent variant of the above, with no socket and no
//!   way back for the user.

use std::borrow::Cow;
use std::fmt;

use egui::{Pos2, Vec2};
use serde_json::Value;

use super::canvas::WidgetCanvas;
use super::picker::{NativeColorPicker, PickerSessions};
use crate::color::ColorParser;
use crate::constants::widget::CONVERTED_TYPE;
use crate::nodes::port::InputSocket;
use crate::nodes::Node;
use crate::settings::WidgetSettings;

/// Change callback, invoked with the new value
pub type WidgetCallback = Box<dyn FnMut(&Value) + Send + Sync>;

/// Teardown callback, invoked when the owning node is removed
pub type RemovedCallback = Box<dyn FnMut() + Send + Sync>;

/// Everything a draw procedure needs to paint one row
pub struct DrawContext<'a> {
    /// Node owning the widget
    pub node: &'a Node,
    /// Screen position of the node's top-left corner
    pub origin: Pos2,
    /// Row width
    pub width: f32,
    /// Row offset from the node's top
    pub y: f32,
    /// Row height
    pub height: f32,
    /// Current view zoom factor
    pub scale: f32,
    pub settings: &'a WidgetSettings,
    pub color_parser: &'a dyn ColorParser,
}

/// Kind of pointer interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
}

/// A pointer event in node-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub pos: Pos2,
}

impl PointerEvent {
    pub fn down(pos: Pos2) -> Self {
        Self {
            kind: PointerEventKind::Down,
            pos,
        }
    }
}

/// Services available to pointer handlers
pub struct PointerContext<'a> {
    /// Node owning the widget
    pub node: &'a Node,
    pub pickers: &'a mut PickerSessions,
    pub picker_backend: &'a mut dyn NativeColorPicker,
    pub settings: &'a WidgetSettings,
}

/// Procedures that make up a widget kind
pub trait WidgetBehavior: Send + Sync {
    /// Paint the widget row
    fn draw(&self, _widget: &Widget, _canvas: &mut dyn WidgetCanvas, _ctx: &DrawContext<'_>) {}

    /// Handle a pointer event; returns `true` when the event was consumed
    fn on_pointer_event(
        &self,
        _widget: &Widget,
        _event: &PointerEvent,
        _ctx: &mut PointerContext<'_>,
    ) -> bool {
        false
    }

    /// Size of the row at the given node width
    fn compute_size(&self, width: f32, settings: &WidgetSettings) -> Vec2 {
        Vec2::new(width, settings.widget_height)
    }

    /// Value sent for this parameter; `None` omits it
    fn serialize_value(&self, value: &Value) -> Option<Value> {
        Some(value.clone())
    }

    /// Release canvas or element resources owned by the widget
    fn release(&mut self) {}
}

/// Placeholder left in a widget for the instant its behavior changes hands
struct Detached;

impl WidgetBehavior for Detached {}

/// Presentation mode of a widget, carrying the behavior it owns
pub enum WidgetMode {
    Active(Box<dyn WidgetBehavior>),
    ConvertedToInput {
        preserved: Box<dyn WidgetBehavior>,
        suffix: String,
    },
    Hidden {
        preserved: Box<dyn WidgetBehavior>,
        suffix: String,
    },
}

impl fmt::Debug for WidgetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetMode::Active(_) => f.write_str("Active"),
            WidgetMode::ConvertedToInput { suffix, .. } => f
                .debug_struct("ConvertedToInput")
                .field("suffix", suffix)
                .finish_non_exhaustive(),
            WidgetMode::Hidden { suffix, .. } => f
                .debug_struct("Hidden")
                .field("suffix", suffix)
                .finish_non_exhaustive(),
        }
    }
}

/// One node parameter in widget presentation
pub struct Widget {
    /// Parameter name, unique within its node
    pub name: String,
    /// Semantic kind tag such as `COLOR` or `INT`
    pub kind: String,
    pub value: Value,
    /// Kind-specific configuration
    pub options: Value,
    /// Vertical offset of the row inside the node
    pub last_y: f32,
    /// Sibling widgets that change mode together with this one
    pub linked_widgets: Vec<String>,
    pub callback: Option<WidgetCallback>,
    pub on_removed: Option<RemovedCallback>,
    mode: WidgetMode,
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("options", &self.options)
            .field("last_y", &self.last_y)
            .field("linked_widgets", &self.linked_widgets)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Widget {
    /// Creates an active widget
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        value: Value,
        behavior: impl WidgetBehavior + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            value,
            options: Value::Object(Default::default()),
            last_y: 0.0,
            linked_widgets: Vec::new(),
            callback: None,
            on_removed: None,
            mode: WidgetMode::Active(Box::new(behavior)),
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    pub fn with_linked_widget(mut self, name: impl Into<String>) -> Self {
        self.linked_widgets.push(name.into());
        self
    }

    pub fn with_callback(mut self, callback: impl FnMut(&Value) + Send + Sync + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn mode(&self) -> &WidgetMode {
        &self.mode
    }

    pub fn is_active(&self) -> bool {
        matches!(self.mode, WidgetMode::Active(_))
    }

    pub fn is_converted(&self) -> bool {
        matches!(self.mode, WidgetMode::ConvertedToInput { .. })
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.mode, WidgetMode::Hidden { .. })
    }

    /// Type tag as host rendering code sees it.
    ///
    /// Active widgets report their kind; converted and hidden widgets report
    /// the reserved `converted-widget` tag plus their suffix.
    pub fn type_tag(&self) -> Cow<'_, str> {
        match &self.mode {
            WidgetMode::Active(_) => Cow::Borrowed(&self.kind),
            WidgetMode::ConvertedToInput { suffix, .. } | WidgetMode::Hidden { suffix, .. } => {
                Cow::Owned(format!("{CONVERTED_TYPE}{suffix}"))
            }
        }
    }

    /// Row size at the given width
    pub fn compute_size(&self, width: f32, settings: &WidgetSettings) -> Vec2 {
        match &self.mode {
            WidgetMode::Active(behavior) => behavior.compute_size(width, settings),
            // cancels the gap the layout adds after every row
            WidgetMode::ConvertedToInput { .. } => Vec2::new(0.0, -settings.widget_gap),
            WidgetMode::Hidden { .. } => Vec2::ZERO,
        }
    }

    /// Paint the row; converted and hidden widgets paint nothing
    pub fn draw(&self, canvas: &mut dyn WidgetCanvas, ctx: &DrawContext<'_>) {
        if let WidgetMode::Active(behavior) = &self.mode {
            behavior.draw(self, canvas, ctx);
        }
    }

    /// Dispatch a pointer event to the live behavior
    pub fn on_pointer_event(&self, event: &PointerEvent, ctx: &mut PointerContext<'_>) -> bool {
        match &self.mode {
            WidgetMode::Active(behavior) => behavior.on_pointer_event(self, event, ctx),
            _ => false,
        }
    }

    /// Serialized value given the socket that may stand in for this widget.
    ///
    /// A converted widget is omitted unless its socket is linked.
    pub fn serialize_value(&self, socket: Option<&InputSocket>) -> Option<Value> {
        match &self.mode {
            WidgetMode::Active(behavior) => behavior.serialize_value(&self.value),
            WidgetMode::ConvertedToInput { preserved, .. } => {
                if socket.is_some_and(InputSocket::is_connected) {
                    preserved.serialize_value(&self.value)
                } else {
                    None
                }
            }
            WidgetMode::Hidden { preserved, .. } => preserved.serialize_value(&self.value),
        }
    }

    /// Set the value and notify the change callback
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
        if let Some(callback) = self.callback.as_mut() {
            callback(&self.value);
        }
    }

    /// Release sub-resources and run the teardown callback
    pub fn release(&mut self) {
        match &mut self.mode {
            WidgetMode::Active(behavior)
            | WidgetMode::ConvertedToInput {
                preserved: behavior,
                ..
            }
            | WidgetMode::Hidden {
                preserved: behavior,
                ..
            } => behavior.release(),
        }
        if let Some(on_removed) = self.on_removed.as_mut() {
            on_removed();
        }
    }

    fn take_behavior(&mut self) -> Box<dyn WidgetBehavior> {
        match std::mem::replace(&mut self.mode, WidgetMode::Active(Box::new(Detached))) {
            WidgetMode::Active(behavior)
            | WidgetMode::ConvertedToInput {
                preserved: behavior,
                ..
            }
            | WidgetMode::Hidden {
                preserved: behavior,
                ..
            } => behavior,
        }
    }

    /// Active -> ConvertedToInput. Callers check the current mode first.
    pub(crate) fn enter_converted(&mut self, suffix: String) {
        debug_assert!(self.is_active(), "widget `{}` converted twice", self.name);
        let preserved = self.take_behavior();
        self.mode = WidgetMode::ConvertedToInput { preserved, suffix };
    }

    /// Active -> Hidden. Callers check the current mode first.
    pub(crate) fn enter_hidden(&mut self, suffix: String) {
        debug_assert!(self.is_active(), "widget `{}` hidden twice", self.name);
        let preserved = self.take_behavior();
        self.mode = WidgetMode::Hidden { preserved, suffix };
    }

    /// ConvertedToInput -> Active. Callers check the current mode first.
    pub(crate) fn restore(&mut self) {
        debug_assert!(self.is_converted(), "widget `{}` is not converted", self.name);
        let behavior = self.take_behavior();
        self.mode = WidgetMode::Active(behavior);
    }
}
