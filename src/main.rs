//! Headless walkthrough of the widget/input conversion
//!
//! Usage: `nodle-widgets [node_defs.json] [settings.json]`
//!
//! Loads node definitions (the bundled color nodes by default), builds a
//! small graph, drives the color picker and converts a widget into an input,
//! then prints the saved node and the execution prompt.

use std::error::Error;

use egui::Pos2;
use log::info;

use nodle_widgets::nodes::menu::MenuAction;
use nodle_widgets::widgets::canvas::RecordingCanvas;
use nodle_widgets::widgets::picker::{HeadlessColorPicker, PickerEvent, PickerSessions};
use nodle_widgets::widgets::PointerEvent;
use nodle_widgets::{
    ColorWidgetsExtension, CssColorParser, ExtensionRegistry, NodeDef, NodeGraph, NodeTypeRegistry,
    WidgetSettings,
};

const SAMPLE_DEFS: &str = include_str!("../demos/color_nodes.json");

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let defs_json = match args.next() {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE_DEFS.to_string(),
    };
    let settings = match args.next() {
        Some(path) => WidgetSettings::load(path)?,
        None => WidgetSettings::default(),
    };

    let mut extensions = ExtensionRegistry::new();
    extensions.register(ColorWidgetsExtension::new(settings.clone()))?;
    let mut registry = NodeTypeRegistry::new(extensions);
    registry.register_all(NodeDef::parse_object_info(&defs_json)?)?;

    let mut graph = NodeGraph::new();
    let picker = registry
        .create_node("ColorPicker", Pos2::new(0.0, 0.0), &settings)
        .ok_or("ColorPicker is not defined")?;
    let invert = registry
        .create_node("InvertColor", Pos2::new(240.0, 0.0), &settings)
        .ok_or("InvertColor is not defined")?;
    let picker_id = graph.add_node(picker);
    let invert_id = graph.add_node(invert);

    // Click the swatch and pick a color
    let mut sessions = PickerSessions::new();
    let mut backend = HeadlessColorPicker::new();
    let picker_node = graph.node(picker_id).ok_or("picker node vanished")?;
    let row = picker_node.widgets.first().map_or(0.0, |w| w.last_y);
    picker_node.dispatch_pointer_event(
        &PointerEvent::down(Pos2::new(60.0, row + 4.0)),
        &mut sessions,
        &mut backend,
        &settings,
    );
    if let Some((id, initial)) = backend.alive.first().cloned() {
        info!("Picker opened on {}", initial);
        sessions.handle_event(
            &mut backend,
            &mut graph,
            PickerEvent::Changed {
                id,
                value: "#3366ff".to_string(),
            },
        )?;
    }

    // Convert the inverter's swatch into an input fed by the picker node
    let invert_node = graph.node_mut(invert_id).ok_or("invert node vanished")?;
    let items = registry.menu_options(invert_node);
    for item in &items {
        if let Some(label) = item.label() {
            info!("Menu: {}", label);
        }
    }
    if let Some(action) = items
        .iter()
        .filter_map(|item| item.action())
        .find(|action| matches!(action, MenuAction::ConvertToInput { .. }))
    {
        invert_node.apply_menu_action(action, &settings)?;
    }
    graph.connect(picker_id, 0, invert_id, "color")?;

    let mut canvas = RecordingCanvas::new();
    let parser = CssColorParser::new();
    for node in graph.ordered_nodes(true)? {
        node.draw_widgets(&mut canvas, 1.0, &settings, &parser);
    }
    info!("Recorded {} draw operations", canvas.ops.len());

    let saved = graph
        .node(invert_id)
        .map(|node| node.serialize())
        .ok_or("invert node vanished")?;
    println!("{}", serde_json::to_string_pretty(&saved)?);
    println!("{}", serde_json::to_string_pretty(&graph.to_prompt()?)?);

    registry.remove_node(&mut graph, invert_id);
    sessions.release_node(&mut backend, invert_id);
    Ok(())
}
