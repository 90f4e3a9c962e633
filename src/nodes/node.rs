//! Node types and core node functionality

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::graph::NodeGraph;
use super::port::{InputSocket, OutputSocket};
use crate::color::ColorParser;
use crate::constants::layout::{TITLE_CHAR_WIDTH, TITLE_PADDING, WIDGET_BLOCK_PADDING};
use crate::settings::WidgetSettings;
use crate::widgets::canvas::WidgetCanvas;
use crate::widgets::picker::{NativeColorPicker, PickerSessions};
use crate::widgets::{reconcile_widgets, DrawContext, PointerContext, PointerEvent, Widget};

/// Unique identifier for a node
pub type NodeId = usize;

/// Per-node enable state, stored as the host's integer tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NodeMode {
    /// Normal execution
    #[default]
    Always,
    OnEvent,
    /// Muted: skipped by execution
    Never,
    OnTrigger,
    /// Bypassed: inputs pass straight through
    Bypass,
}

impl NodeMode {
    /// Integer tag used by the host
    pub fn tag(self) -> u8 {
        match self {
            NodeMode::Always => 0,
            NodeMode::OnEvent => 1,
            NodeMode::Never => 2,
            NodeMode::OnTrigger => 3,
            NodeMode::Bypass => 4,
        }
    }

    /// Muted or bypassed nodes don't take part in execution
    pub fn is_disabled(self) -> bool {
        matches!(self, NodeMode::Never | NodeMode::Bypass)
    }
}

impl TryFrom<u8> for NodeMode {
    type Error = String;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(NodeMode::Always),
            1 => Ok(NodeMode::OnEvent),
            2 => Ok(NodeMode::Never),
            3 => Ok(NodeMode::OnTrigger),
            4 => Ok(NodeMode::Bypass),
            other => Err(format!("unknown node mode {}", other)),
        }
    }
}

impl From<NodeMode> for u8 {
    fn from(mode: NodeMode) -> Self {
        mode.tag()
    }
}

/// Type of node - regular node or a context node holding its own graph
#[derive(Debug)]
pub enum NodeType {
    /// Regular processing node
    Regular,
    /// Context node whose inner nodes run in place of it
    Context {
        /// The internal graph contained within this context node
        graph: NodeGraph,
        /// The context type (e.g., "Group")
        context_type: String,
    },
}

/// A node in the graph: its widgets, sockets, size and mode
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    /// Registered node type this node was created from
    pub type_name: String,
    pub title: String,
    pub position: Pos2,
    pub size: Vec2,
    /// Lower bound requested by widgets at creation
    pub min_size: Vec2,
    pub mode: NodeMode,
    pub widgets: Vec<Widget>,
    pub inputs: Vec<InputSocket>,
    pub outputs: Vec<OutputSocket>,
    /// Whether widget values are stored when the node is saved
    pub serialize_widgets: bool,
    pub node_type: NodeType,
}

impl Node {
    /// Creates a new regular node
    pub fn new(id: NodeId, type_name: impl Into<String>, position: Pos2) -> Self {
        let type_name = type_name.into();
        Self {
            id,
            title: type_name.clone(),
            type_name,
            position,
            size: Vec2::new(150.0, 30.0),
            min_size: Vec2::ZERO,
            mode: NodeMode::Always,
            widgets: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            serialize_widgets: false,
            node_type: NodeType::Regular,
        }
    }

    /// Creates a new context node around `graph`
    pub fn new_context(
        id: NodeId,
        context_type: impl Into<String>,
        graph: NodeGraph,
        position: Pos2,
    ) -> Self {
        let context_type = context_type.into();
        let mut node = Self::new(id, format!("{} Context", context_type), position);
        node.node_type = NodeType::Context {
            graph,
            context_type,
        };
        node
    }

    /// Sets the mode of the node
    pub fn with_mode(mut self, mode: NodeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check if this is a context node
    pub fn is_context(&self) -> bool {
        matches!(self.node_type, NodeType::Context { .. })
    }

    /// Get the internal graph if this is a context node
    pub fn internal_graph(&self) -> Option<&NodeGraph> {
        match &self.node_type {
            NodeType::Context { graph, .. } => Some(graph),
            NodeType::Regular => None,
        }
    }

    /// Get the mutable internal graph if this is a context node
    pub fn internal_graph_mut(&mut self) -> Option<&mut NodeGraph> {
        match &mut self.node_type {
            NodeType::Context { graph, .. } => Some(graph),
            NodeType::Regular => None,
        }
    }

    /// Appends a widget and returns it
    pub fn add_widget(&mut self, widget: Widget) -> &mut Widget {
        let index = self.widgets.len();
        self.widgets.push(widget);
        &mut self.widgets[index]
    }

    /// Find a widget by name
    pub fn widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.name == name)
    }

    /// Find a widget by name for modification
    pub fn widget_mut(&mut self, name: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.name == name)
    }

    /// Index of a widget by name
    pub fn widget_index(&self, name: &str) -> Option<usize> {
        self.widgets.iter().position(|w| w.name == name)
    }

    /// Adds an input socket
    pub fn add_input(&mut self, socket: InputSocket) -> &mut Self {
        self.inputs.push(socket);
        self
    }

    /// Removes the input socket at `index`
    pub fn remove_input(&mut self, index: usize) -> Option<InputSocket> {
        (index < self.inputs.len()).then(|| self.inputs.remove(index))
    }

    /// Adds an output socket
    pub fn add_output(&mut self, socket: OutputSocket) -> &mut Self {
        self.outputs.push(socket);
        self
    }

    /// Find an input socket by name
    pub fn input(&self, name: &str) -> Option<&InputSocket> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Index of an input socket by name
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|i| i.name == name)
    }

    /// Index of the socket standing in for widget `name`
    pub fn input_index_for_widget(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|i| i.widget_name() == Some(name))
    }

    /// The socket standing in for widget `name`
    pub fn input_for_widget(&self, name: &str) -> Option<&InputSocket> {
        self.inputs.iter().find(|i| i.widget_name() == Some(name))
    }

    /// Size the node needs for its title, sockets and widgets
    pub fn compute_size(&self, settings: &WidgetSettings) -> Vec2 {
        let rows = self.inputs.len().max(self.outputs.len()).max(1) as f32;
        let title_width = self.title.chars().count() as f32 * TITLE_CHAR_WIDTH + TITLE_PADDING;

        let mut width = settings.min_node_width.max(title_width);
        let mut height = rows * settings.slot_height + 6.0;

        if !self.widgets.is_empty() {
            let mut widgets_height = 0.0;
            for widget in &self.widgets {
                let size = widget.compute_size(width, settings);
                width = width.max(size.x);
                widgets_height += size.y + settings.widget_gap;
            }
            height += widgets_height + WIDGET_BLOCK_PADDING;
        }

        Vec2::new(width.max(self.min_size.x), height.max(self.min_size.y))
    }

    /// Sets the size of the node
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    /// Recompute the size without shrinking below `previous` on either axis
    pub fn grow_to_fit(&mut self, previous: Vec2, settings: &WidgetSettings) {
        let computed = self.compute_size(settings);
        self.set_size(previous.max(computed));
    }

    /// Move every widget row by `dy`
    pub fn shift_widgets(&mut self, dy: f32) {
        for widget in &mut self.widgets {
            widget.last_y += dy;
        }
    }

    /// Assign row offsets to all widgets, stacked below the socket rows
    pub fn layout_widgets(&mut self, settings: &WidgetSettings) {
        let rows = self.inputs.len().max(self.outputs.len()) as f32;
        let width = self.size.x;
        let mut y = rows * settings.slot_height + 2.0;
        for widget in &mut self.widgets {
            widget.last_y = y;
            y += widget.compute_size(width, settings).y + settings.widget_gap;
        }
    }

    /// Draw every active widget row
    pub fn draw_widgets(
        &self,
        canvas: &mut dyn WidgetCanvas,
        scale: f32,
        settings: &WidgetSettings,
        color_parser: &dyn ColorParser,
    ) {
        for widget in self.widgets.iter().filter(|w| w.is_active()) {
            let ctx = DrawContext {
                node: self,
                origin: self.position,
                width: self.size.x,
                y: widget.last_y,
                height: widget.compute_size(self.size.x, settings).y,
                scale,
                settings,
                color_parser,
            };
            widget.draw(canvas, &ctx);
        }
    }

    /// Route a pointer event to the active widget whose row contains it
    pub fn dispatch_pointer_event(
        &self,
        event: &PointerEvent,
        pickers: &mut PickerSessions,
        picker_backend: &mut dyn NativeColorPicker,
        settings: &WidgetSettings,
    ) -> bool {
        let Some(widget) = self.widgets.iter().filter(|w| w.is_active()).find(|w| {
            let height = w.compute_size(self.size.x, settings).y;
            event.pos.y >= w.last_y && event.pos.y <= w.last_y + height
        }) else {
            return false;
        };

        let mut ctx = PointerContext {
            node: self,
            pickers,
            picker_backend,
            settings,
        };
        widget.on_pointer_event(event, &mut ctx)
    }

    /// Gated widget values keyed by parameter name.
    ///
    /// Converted widgets only appear while their socket is linked.
    pub fn widget_inputs(&self) -> Map<String, Value> {
        let mut values = Map::new();
        for widget in &self.widgets {
            if let Some(value) = widget.serialize_value(self.input_for_widget(&widget.name)) {
                values.insert(widget.name.clone(), value);
            }
        }
        values
    }

    /// Snapshot for saving
    pub fn serialize(&self) -> SerializedNode {
        SerializedNode {
            id: self.id,
            type_name: self.type_name.clone(),
            title: self.title.clone(),
            position: self.position,
            size: self.size,
            mode: self.mode,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            widgets_values: if self.serialize_widgets {
                self.widgets.iter().map(|w| w.value.clone()).collect()
            } else {
                Vec::new()
            },
        }
    }

    /// Restore a freshly created node from a snapshot.
    ///
    /// Widget values are applied by position, sockets are taken as saved and
    /// widgets whose sockets were saved come back converted.
    pub fn configure(&mut self, data: &SerializedNode) {
        self.title = data.title.clone();
        self.position = data.position;
        self.size = data.size;
        self.mode = data.mode;
        self.inputs = data.inputs.clone();
        self.outputs = data.outputs.clone();

        for (widget, value) in self.widgets.iter_mut().zip(&data.widgets_values) {
            widget.value = value.clone();
        }
        reconcile_widgets(self);
    }
}

/// Saved form of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub type_name: String,
    pub title: String,
    #[serde(rename = "pos", with = "pos2_serde")]
    pub position: Pos2,
    #[serde(with = "vec2_serde")]
    pub size: Vec2,
    #[serde(default)]
    pub mode: NodeMode,
    #[serde(default)]
    pub inputs: Vec<InputSocket>,
    #[serde(default)]
    pub outputs: Vec<OutputSocket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widgets_values: Vec<Value>,
}

// Serde helper modules for egui types
mod pos2_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(pos: &Pos2, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [pos.x, pos.y].serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pos2, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [x, y] = <[f32; 2]>::deserialize(deserializer)?;
        Ok(Pos2::new(x, y))
    }
}

mod vec2_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(vec: &Vec2, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [vec.x, vec.y].serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec2, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [x, y] = <[f32; 2]>::deserialize(deserializer)?;
        Ok(Vec2::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::builtin::ValueWidget;
    use serde_json::json;

    fn node_with_widgets() -> Node {
        let mut node = Node::new(1, "Sampler", Pos2::ZERO);
        node.add_widget(Widget::new("steps", "INT", json!(20), ValueWidget));
        node.add_widget(Widget::new("cfg", "FLOAT", json!(7.5), ValueWidget));
        node
    }

    #[test]
    fn test_node_mode_tags() {
        assert_eq!(NodeMode::Never.tag(), 2);
        assert_eq!(NodeMode::Bypass.tag(), 4);
        assert_eq!(NodeMode::try_from(4), Ok(NodeMode::Bypass));
        assert!(NodeMode::try_from(9).is_err());
        assert!(NodeMode::Never.is_disabled());
        assert!(!NodeMode::Always.is_disabled());
    }

    #[test]
    fn test_compute_size_counts_widget_rows() {
        let settings = WidgetSettings::default();
        let node = node_with_widgets();
        let size = node.compute_size(&settings);
        // one slot row + 6, two 20px widgets with 4px gaps, 8px padding
        assert_eq!(size.y, 20.0 + 6.0 + 2.0 * 24.0 + 8.0);
        assert_eq!(size.x, 140.0);
    }

    #[test]
    fn test_min_size_is_respected() {
        let settings = WidgetSettings::default();
        let mut node = node_with_widgets();
        node.min_size = Vec2::new(300.0, 200.0);
        assert_eq!(node.compute_size(&settings), Vec2::new(300.0, 200.0));
    }

    #[test]
    fn test_layout_stacks_rows() {
        let settings = WidgetSettings::default();
        let mut node = node_with_widgets();
        node.add_output(OutputSocket::new("LATENT", "LATENT"));
        node.layout_widgets(&settings);
        assert_eq!(node.widgets[0].last_y, 22.0);
        assert_eq!(node.widgets[1].last_y, 46.0);
    }

    #[test]
    fn test_serialize_respects_flag() {
        let mut node = node_with_widgets();
        assert!(node.serialize().widgets_values.is_empty());

        node.serialize_widgets = true;
        let saved = node.serialize();
        assert_eq!(saved.widgets_values, vec![json!(20), json!(7.5)]);

        let text = serde_json::to_value(&saved).unwrap();
        assert_eq!(text["type"], json!("Sampler"));
        assert_eq!(text["mode"], json!(0));
    }

    #[test]
    fn test_configure_restores_values_and_mode() {
        let mut source = node_with_widgets();
        source.serialize_widgets = true;
        source.widgets[0].value = json!(42);
        source.mode = NodeMode::Bypass;
        let saved = source.serialize();

        let mut restored = node_with_widgets();
        restored.configure(&saved);
        assert_eq!(restored.widgets[0].value, json!(42));
        assert_eq!(restored.mode, NodeMode::Bypass);
    }
}
