//! End-to-end checks across registry, conversion, picker and prompt

use egui::Pos2;
use pretty_assertions::assert_eq;
use serde_json::json;

use nodle_widgets::nodes::menu::MenuAction;
use nodle_widgets::nodes::SerializedNode;
use nodle_widgets::widgets::picker::{HeadlessColorPicker, PickerEvent, PickerSessions};
use nodle_widgets::widgets::PointerEvent;
use nodle_widgets::{
    ColorWidgetsExtension, ExtensionRegistry, NodeDef, NodeGraph, NodeMode, NodeTypeRegistry,
    WidgetSettings,
};

const DEFS: &str = include_str!("../demos/color_nodes.json");

fn registry() -> NodeTypeRegistry {
    let mut extensions = ExtensionRegistry::new();
    extensions
        .register(ColorWidgetsExtension::default())
        .unwrap();
    let mut registry = NodeTypeRegistry::new(extensions);
    registry
        .register_all(NodeDef::parse_object_info(DEFS).unwrap())
        .unwrap();
    registry
}

#[test]
fn test_sample_definitions_register() {
    let registry = registry();
    assert_eq!(registry.type_names().count(), 7);
    // types without a required COLOR input are left alone
    assert!(registry
        .get("HexToRGB")
        .unwrap()
        .hooks
        .extra_menu_options
        .is_empty());
    assert!(!registry
        .get("ColorToHex")
        .unwrap()
        .hooks
        .extra_menu_options
        .is_empty());
}

#[test]
fn test_convert_link_and_prompt() {
    let settings = WidgetSettings::default();
    let registry = registry();
    let mut graph = NodeGraph::new();

    let source = graph.add_node(registry.create_node("ColorPicker", Pos2::ZERO, &settings).unwrap());
    let target = graph.add_node(registry.create_node("InvertColor", Pos2::ZERO, &settings).unwrap());

    let action = MenuAction::ConvertToInput {
        widget: "color".to_string(),
        config: json!(["COLOR"]),
    };
    graph
        .node_mut(target)
        .unwrap()
        .apply_menu_action(&action, &settings)
        .unwrap();

    // converted but unlinked: the parameter is left out
    let prompt = graph.to_prompt().unwrap();
    assert_eq!(prompt[&target.to_string()]["inputs"], json!({}));

    graph.connect(source, 0, target, "color").unwrap();
    let prompt = graph.to_prompt().unwrap();
    assert_eq!(
        prompt[&target.to_string()]["inputs"]["color"],
        json!([source.to_string(), 0])
    );
    assert_eq!(
        prompt[&source.to_string()],
        json!({"class_type": "ColorPicker", "inputs": {"color": "#ff0000"}})
    );

    graph.convert_to_widget(target, "color", &settings).unwrap();
    assert!(graph.links.is_empty());
    assert!(graph.node(target).unwrap().inputs.is_empty());
}

#[test]
fn test_bypassed_nodes_leave_the_prompt() {
    let settings = WidgetSettings::default();
    let registry = registry();
    let mut graph = NodeGraph::new();

    let kept = graph.add_node(registry.create_node("ColorPicker", Pos2::ZERO, &settings).unwrap());
    let bypassed = graph.add_node(
        registry
            .create_node("ColorToHex", Pos2::ZERO, &settings)
            .unwrap()
            .with_mode(NodeMode::Bypass),
    );

    let prompt = graph.to_prompt().unwrap();
    assert!(prompt.contains_key(&kept.to_string()));
    assert!(!prompt.contains_key(&bypassed.to_string()));
}

#[test]
fn test_saved_node_reloads_converted() {
    let settings = WidgetSettings::default();
    let registry = registry();

    let mut node = registry.create_node("ImageReplaceColor", Pos2::ZERO, &settings).unwrap();
    node.widget_mut("target_color").unwrap().value = json!("#abcdef");
    nodle_widgets::convert_to_input(&mut node, "replace_color", &json!(["COLOR"]), &settings).unwrap();

    let text = serde_json::to_string(&node.serialize()).unwrap();
    let saved: SerializedNode = serde_json::from_str(&text).unwrap();

    let mut restored = registry.create_node("ImageReplaceColor", Pos2::ZERO, &settings).unwrap();
    restored.configure(&saved);

    assert!(restored.widget("replace_color").unwrap().is_converted());
    assert!(restored.widget("target_color").unwrap().is_active());
    assert_eq!(restored.widget("target_color").unwrap().value, json!("#abcdef"));
    assert_eq!(restored.inputs.len(), 2);
    assert_eq!(restored.size, saved.size);
}

#[test]
fn test_picker_round_trip_through_graph() {
    let settings = WidgetSettings::default();
    let registry = registry();
    let mut graph = NodeGraph::new();
    let id = graph.add_node(registry.create_node("ColorPicker", Pos2::ZERO, &settings).unwrap());

    let mut sessions = PickerSessions::new();
    let mut backend = HeadlessColorPicker::new();
    let node = graph.node(id).unwrap();
    let row = node.widgets[0].last_y;
    assert!(node.dispatch_pointer_event(
        &PointerEvent::down(Pos2::new(30.0, row + 2.0)),
        &mut sessions,
        &mut backend,
        &settings,
    ));

    let (picker, initial) = backend.alive[0].clone();
    assert_eq!(initial, "#ff0000");
    sessions
        .handle_event(
            &mut backend,
            &mut graph,
            PickerEvent::Changed {
                id: picker,
                value: "#00ffaa".to_string(),
            },
        )
        .unwrap();

    assert_eq!(graph.node(id).unwrap().widgets[0].value, json!("#00ffaa"));
    assert_eq!(graph.dirty_canvas(), (true, true));
    assert!(backend.alive.is_empty());
}
